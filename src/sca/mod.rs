//! # Simultaneous Component Analysis
//!
//! Component analysis of a single effect matrix. The residuals of the whole
//! model are projected into the same component space so individual samples
//! can be drawn around the level scores they belong to.

use log::{debug, warn};
use ndarray::{Array1, Array2, ArrayView2};

use crate::error::{AscaError, Result};
use crate::svd::{NalgebraSvd, SignStableSvd, SvdBackend};
use crate::utils::sum_of_squares;

/// Component model of one effect (or interaction) matrix.
///
/// With k = min(n, p): `scores` is n×k, `loadings` p×k, `singular_values`
/// k×k (diagonal), `projected` n×k and `explained` has length k.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentResult {
    scores: Array2<f64>,
    loadings: Array2<f64>,
    singular_values: Array2<f64>,
    projected: Array2<f64>,
    explained: Array1<f64>,
}

impl ComponentResult {
    pub fn scores(&self) -> &Array2<f64> {
        &self.scores
    }

    pub fn loadings(&self) -> &Array2<f64> {
        &self.loadings
    }

    /// Diagonal matrix of singular values.
    pub fn singular_values(&self) -> &Array2<f64> {
        &self.singular_values
    }

    /// Residual matrix expressed in this effect's component coordinates.
    pub fn projected(&self) -> &Array2<f64> {
        &self.projected
    }

    /// Percentage of the effect matrix's sum of squares per component.
    pub fn explained(&self) -> &Array1<f64> {
        &self.explained
    }

    pub fn n_components(&self) -> usize {
        self.explained.len()
    }

    /// Running total of [`explained`](Self::explained), ending at 100 for a
    /// non-zero effect.
    pub fn cumulative_explained(&self) -> Array1<f64> {
        let mut cumulative = Array1::zeros(self.explained.len());
        let mut sum = 0.0;
        for (i, &pct) in self.explained.iter().enumerate() {
            sum += pct;
            cumulative[i] = sum;
        }
        cumulative
    }

    /// Per-sample position `scores + projected`: the level score shifted by
    /// that sample's residual.
    pub fn overlay(&self) -> Array2<f64> {
        &self.scores + &self.projected
    }

    /// `scores · loadingsᵗ`; equals the analysed effect matrix unless a score
    /// column has been sign-overridden.
    pub fn reconstruct(&self) -> Array2<f64> {
        self.scores.dot(&self.loadings.t())
    }

    pub(crate) fn flip_score_sign(&mut self, component: usize) {
        self.scores.column_mut(component).mapv_inplace(|e| -e);
    }
}

pub struct ComponentAnalyzer<'a, S: SvdBackend + ?Sized> {
    svd_backend: &'a S,
}

static DEFAULT_SVD: NalgebraSvd = NalgebraSvd::DEFAULT;

impl ComponentAnalyzer<'static, NalgebraSvd> {
    /// Analyzer backed by a default-configured [`NalgebraSvd`].
    pub fn nalgebra() -> Self {
        ComponentAnalyzer {
            svd_backend: &DEFAULT_SVD,
        }
    }
}

impl<'a, S: SvdBackend + ?Sized> ComponentAnalyzer<'a, S> {
    pub fn new(svd_backend: &'a S) -> Self {
        ComponentAnalyzer { svd_backend }
    }

    /// Sign-stable SVD of `effect`, with `residuals` projected onto its
    /// loadings.
    pub fn analyze(
        &self,
        effect: ArrayView2<f64>,
        residuals: ArrayView2<f64>,
    ) -> Result<ComponentResult> {
        if effect.dim() != residuals.dim() {
            return Err(AscaError::ShapeMismatch(format!(
                "effect matrix is {:?} but residual matrix is {:?}",
                effect.dim(),
                residuals.dim()
            )));
        }

        let svd = SignStableSvd::with_backend(effect, self.svd_backend)?;
        let (u, s, v) = svd.into_parts();

        let scores = &u * &s;
        let projected = residuals.dot(&v);
        let singular_values = Array2::from_diag(&s);

        let total = sum_of_squares(&s);
        let explained = if total > 0.0 {
            s.mapv(|sv| sv * sv / total * 100.0)
        } else {
            warn!(
                "Effect matrix of shape {:?} is identically zero; reporting 0% explained variance",
                effect.dim()
            );
            Array1::zeros(s.len())
        };
        debug!(
            "Component analysis of {:?} effect: explained = {:.3}",
            effect.dim(),
            explained
        );

        Ok(ComponentResult {
            scores,
            loadings: v,
            singular_values,
            projected,
            explained,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use ndarray::array;

    fn effect_and_residuals() -> (Array2<f64>, Array2<f64>) {
        let effect = array![
            [-1.0, -0.5, 0.2],
            [-1.0, -0.5, 0.2],
            [1.0, 0.5, -0.2],
            [1.0, 0.5, -0.2],
            [0.3, -0.8, 0.0],
        ];
        let residuals = array![
            [0.1, -0.1, 0.05],
            [-0.1, 0.1, -0.05],
            [0.2, 0.0, 0.1],
            [-0.2, 0.0, -0.1],
            [0.0, 0.3, -0.2],
        ];
        (effect, residuals)
    }

    #[test]
    fn test_scores_times_loadings_reconstructs_effect() {
        let (effect, residuals) = effect_and_residuals();
        let result = ComponentAnalyzer::nalgebra()
            .analyze(effect.view(), residuals.view())
            .unwrap();

        assert_eq!(result.scores().dim(), (5, 3));
        assert_eq!(result.loadings().dim(), (3, 3));
        assert_eq!(result.singular_values().dim(), (3, 3));
        assert_eq!(result.projected().dim(), (5, 3));
        assert_eq!(result.n_components(), 3);

        for (r, e) in result.reconstruct().iter().zip(effect.iter()) {
            assert_abs_diff_eq!(*r, *e, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_projection_uses_loadings() {
        let (effect, residuals) = effect_and_residuals();
        let result = ComponentAnalyzer::nalgebra()
            .analyze(effect.view(), residuals.view())
            .unwrap();

        let expected = residuals.dot(result.loadings());
        assert_eq!(result.projected(), &expected);

        let overlay = result.overlay();
        assert_abs_diff_eq!(
            overlay[[4, 0]],
            result.scores()[[4, 0]] + expected[[4, 0]],
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_explained_variance_sums_to_hundred() {
        let (effect, residuals) = effect_and_residuals();
        let result = ComponentAnalyzer::nalgebra()
            .analyze(effect.view(), residuals.view())
            .unwrap();

        assert_relative_eq!(result.explained().sum(), 100.0, epsilon = 1e-6);
        assert_relative_eq!(result.cumulative_explained()[2], 100.0, epsilon = 1e-6);
        assert!(result.explained()[0] >= result.explained()[1]);

        let sv = result.singular_values();
        let ss_effect = sum_of_squares(&effect);
        assert_relative_eq!(
            result.explained()[0],
            sv[[0, 0]] * sv[[0, 0]] / ss_effect * 100.0,
            epsilon = 1e-9
        );
        assert_eq!(sv[[0, 1]], 0.0);
    }

    #[test]
    fn test_zero_effect_reports_zero_explained() {
        let effect = Array2::<f64>::zeros((4, 2));
        let residuals = array![[1.0, 0.0], [0.0, 1.0], [-1.0, 0.0], [0.0, -1.0]];
        let result = ComponentAnalyzer::nalgebra()
            .analyze(effect.view(), residuals.view())
            .unwrap();

        assert_eq!(result.explained(), &Array1::<f64>::zeros(2));
        assert!(result.scores().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_default_analyzer_uses_default_backend() {
        let (effect, residuals) = effect_and_residuals();
        let backend = NalgebraSvd::default();
        let explicit = ComponentAnalyzer::new(&backend)
            .analyze(effect.view(), residuals.view())
            .unwrap();
        let implicit = ComponentAnalyzer::nalgebra()
            .analyze(effect.view(), residuals.view())
            .unwrap();

        assert_eq!(explicit, implicit);
    }

    #[test]
    fn test_shape_mismatch() {
        let effect = Array2::<f64>::zeros((4, 2));
        let residuals = Array2::<f64>::zeros((3, 2));
        let err = ComponentAnalyzer::nalgebra()
            .analyze(effect.view(), residuals.view())
            .unwrap_err();

        assert!(matches!(err, AscaError::ShapeMismatch(_)));
    }

    #[test]
    fn test_flip_score_sign_keeps_loadings() {
        let (effect, residuals) = effect_and_residuals();
        let original = ComponentAnalyzer::nalgebra()
            .analyze(effect.view(), residuals.view())
            .unwrap();
        let mut flipped = original.clone();
        flipped.flip_score_sign(1);

        assert_eq!(flipped.loadings(), original.loadings());
        assert_eq!(flipped.projected(), original.projected());
        assert_eq!(flipped.scores().column(0), original.scores().column(0));
        for (a, b) in flipped.scores().column(1).iter().zip(original.scores().column(1).iter()) {
            assert_eq!(*a, -*b);
        }
    }
}
