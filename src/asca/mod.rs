//! # ANOVA-Simultaneous Component Analysis
//!
//! [`Asca::fit`] decomposes the response into factor, interaction and residual
//! matrices, then runs a sign-stable component analysis on every factor and
//! interaction matrix against the shared residuals. The returned
//! [`AscaResult`] is immutable.
//!
//! ```ignore
//! let result = AscaBuilder::default()
//!     .sign_override(EffectTarget::Factor(1), 1)
//!     .build()
//!     .fit(x.view(), design.view(), &[(0, 1)])?;
//!
//! println!("{}", result.percentage_effects());
//! let scores = result.factor_components()[0].scores();
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use log::{debug, info};
use ndarray::{Array1, Array2, ArrayView2};
use rayon::prelude::*;

use crate::anova::{validate_inputs, Decomposition, EffectDecomposer, LevelPooling, PercentageEffects};
use crate::error::{AscaError, Result};
use crate::sca::{ComponentAnalyzer, ComponentResult};
use crate::svd::{NalgebraSvd, SvdBackend};
use crate::utils::LevelLabel;

/// Addresses one component model of a fitted result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectTarget {
    /// Factor by design column index.
    Factor(usize),
    /// Interaction by position in the interaction list passed to `fit`.
    Interaction(usize),
}

/// Negates one score column after fitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignOverride {
    pub target: EffectTarget,
    pub component: usize,
}

/// The flip applied in the published reference analysis: second component of
/// the second factor. Only tuned to that dataset.
pub const REFERENCE_SIGN_OVERRIDE: SignOverride = SignOverride {
    target: EffectTarget::Factor(1),
    component: 1,
};

pub struct AscaBuilder<S: SvdBackend> {
    sign_overrides: Vec<SignOverride>,
    level_pooling: LevelPooling,
    parallel: bool,
    svd_backend: Arc<S>,
}

impl<S: SvdBackend> AscaBuilder<S> {
    pub fn new(svd_backend: S) -> Self {
        AscaBuilder {
            sign_overrides: Vec::new(),
            level_pooling: LevelPooling::default(),
            parallel: true,
            svd_backend: Arc::new(svd_backend),
        }
    }

    /// Adds one score-column sign flip, applied after the generic pipeline.
    pub fn sign_override(mut self, target: EffectTarget, component: usize) -> Self {
        self.sign_overrides.push(SignOverride { target, component });
        self
    }

    pub fn sign_overrides(mut self, overrides: Vec<SignOverride>) -> Self {
        self.sign_overrides = overrides;
        self
    }

    pub fn level_pooling(mut self, level_pooling: LevelPooling) -> Self {
        self.level_pooling = level_pooling;
        self
    }

    /// Runs the per-effect component analyses on the rayon pool.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn build(self) -> Asca<S> {
        Asca {
            sign_overrides: self.sign_overrides,
            decomposer: EffectDecomposer::new(self.level_pooling),
            parallel: self.parallel,
            svd_backend: self.svd_backend,
        }
    }
}

impl Default for AscaBuilder<NalgebraSvd> {
    fn default() -> Self {
        Self::new(NalgebraSvd::default())
    }
}

/// Configured ASCA model. Fitting does not mutate it, so one instance can fit
/// many datasets, also concurrently.
pub struct Asca<S: SvdBackend> {
    sign_overrides: Vec<SignOverride>,
    decomposer: EffectDecomposer,
    parallel: bool,
    svd_backend: Arc<S>,
}

impl<S: SvdBackend> Asca<S> {
    pub fn sign_overrides(&self) -> &[SignOverride] {
        &self.sign_overrides
    }

    pub fn fit<L: LevelLabel>(
        &self,
        x: ArrayView2<f64>,
        design: ArrayView2<L>,
        interactions: &[(usize, usize)],
    ) -> Result<AscaResult<L>> {
        validate_inputs(x, design, interactions)?;
        self.validate_overrides(x.dim(), design.ncols(), interactions.len())?;
        info!(
            "Fitting ASCA on {} samples x {} variables ({} factors, {} interactions)",
            x.nrows(),
            x.ncols(),
            design.ncols(),
            interactions.len()
        );

        let decomposition = self.decomposer.decompose_unchecked(x, design, interactions)?;

        let analyzer = ComponentAnalyzer::new(self.svd_backend.as_ref());
        let residuals = decomposition.residuals().view();
        let mut factor_components =
            self.analyze_all(&analyzer, decomposition.factor_effects(), residuals)?;
        let mut interaction_components =
            self.analyze_all(&analyzer, decomposition.interaction_effects(), residuals)?;

        for flip in &self.sign_overrides {
            debug!(
                "Flipping score column {} of {:?}",
                flip.component, flip.target
            );
            match flip.target {
                EffectTarget::Factor(i) => factor_components[i].flip_score_sign(flip.component),
                EffectTarget::Interaction(i) => {
                    interaction_components[i].flip_score_sign(flip.component)
                }
            }
        }

        info!(
            "ASCA fit complete: {} factor and {} interaction component models",
            factor_components.len(),
            interaction_components.len()
        );

        Ok(AscaResult {
            data: x.to_owned(),
            design: design.to_owned(),
            interactions: interactions.to_vec(),
            decomposition,
            factor_components,
            interaction_components,
        })
    }

    fn analyze_all(
        &self,
        analyzer: &ComponentAnalyzer<'_, S>,
        effects: &[Array2<f64>],
        residuals: ArrayView2<f64>,
    ) -> Result<Vec<ComponentResult>> {
        if self.parallel {
            effects
                .par_iter()
                .map(|effect| analyzer.analyze(effect.view(), residuals))
                .collect()
        } else {
            effects
                .iter()
                .map(|effect| analyzer.analyze(effect.view(), residuals))
                .collect()
        }
    }

    fn validate_overrides(
        &self,
        (n, p): (usize, usize),
        n_factors: usize,
        n_interactions: usize,
    ) -> Result<()> {
        let n_components = n.min(p);
        for flip in &self.sign_overrides {
            let (index, available) = match flip.target {
                EffectTarget::Factor(i) => (i, n_factors),
                EffectTarget::Interaction(i) => (i, n_interactions),
            };
            if index >= available {
                return Err(AscaError::InvalidInput(format!(
                    "sign override targets {:?} but only {} such effects exist",
                    flip.target, available
                )));
            }
            if flip.component >= n_components {
                return Err(AscaError::InvalidInput(format!(
                    "sign override targets component {} but effects have {} components",
                    flip.component, n_components
                )));
            }
        }
        Ok(())
    }
}

/// Everything a fit produces, together with the inputs it was computed from.
///
/// Factor and interaction component models are index-aligned with the design
/// columns and the interaction list respectively.
#[derive(Debug, Clone, PartialEq)]
pub struct AscaResult<L> {
    data: Array2<f64>,
    design: Array2<L>,
    interactions: Vec<(usize, usize)>,
    decomposition: Decomposition,
    factor_components: Vec<ComponentResult>,
    interaction_components: Vec<ComponentResult>,
}

impl<L: LevelLabel> AscaResult<L> {
    /// The response matrix as passed to `fit`.
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn design(&self) -> &Array2<L> {
        &self.design
    }

    pub fn interactions(&self) -> &[(usize, usize)] {
        &self.interactions
    }

    pub fn n_factors(&self) -> usize {
        self.design.ncols()
    }

    pub fn n_interactions(&self) -> usize {
        self.interactions.len()
    }

    /// Sorted distinct levels of one design column.
    pub fn levels(&self, factor: usize) -> Vec<L> {
        self.design
            .column(factor)
            .iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn decomposition(&self) -> &Decomposition {
        &self.decomposition
    }

    pub fn grand_mean(&self) -> &Array1<f64> {
        self.decomposition.grand_mean()
    }

    pub fn factor_effects(&self) -> &[Array2<f64>] {
        self.decomposition.factor_effects()
    }

    pub fn interaction_effects(&self) -> &[Array2<f64>] {
        self.decomposition.interaction_effects()
    }

    pub fn residuals(&self) -> &Array2<f64> {
        self.decomposition.residuals()
    }

    pub fn percentage_effects(&self) -> &PercentageEffects {
        self.decomposition.percentage_effects()
    }

    pub fn factor_components(&self) -> &[ComponentResult] {
        &self.factor_components
    }

    pub fn interaction_components(&self) -> &[ComponentResult] {
        &self.interaction_components
    }

    pub fn component(&self, target: EffectTarget) -> Option<&ComponentResult> {
        match target {
            EffectTarget::Factor(i) => self.factor_components.get(i),
            EffectTarget::Interaction(i) => self.interaction_components.get(i),
        }
    }
}
