//! # ANOVA Effect Decomposition
//!
//! Splits a column-centred response matrix into additive parts:
//!
//! ```text
//! Xc = mean deviation + Σ factor effects + Σ interaction effects + residuals
//! ```
//!
//! Each factor effect holds, in every row, the centred mean of the rows that
//! share that row's level. Interaction effects hold the joint-level mean with
//! the summed factor effects removed. Only two-way interactions are supported.
//!
//! ## Level sets
//! By default one set of level labels is pooled across all design columns and
//! every factor is scanned against the whole pool ([`LevelPooling::Pooled`]).
//! Labels that never occur in a column simply select no rows there, so
//! [`LevelPooling::PerFactor`] yields the same matrices while scanning fewer
//! levels.

use std::collections::BTreeSet;
use std::fmt;

use log::{debug, info, warn};
use ndarray::{Array1, Array2, ArrayView2, Axis};

use crate::error::{AscaError, Result};
use crate::utils::{column_center, ensure_finite, sum_of_squares, LevelLabel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LevelPooling {
    /// One label set drawn from every design column.
    #[default]
    Pooled,
    /// Each factor only scans the labels found in its own column.
    PerFactor,
}

/// Share of the raw response's sum of squares per model term, in percent.
///
/// The terms only add up to 100 for balanced designs (equal replication in
/// every cell). With unequal cell counts the factor effects are not
/// orthogonal, their cross products are not attributed to any term, and
/// [`total`](Self::total) may drift above or below 100.
#[derive(Debug, Clone, PartialEq)]
pub struct PercentageEffects {
    mean: f64,
    factors: Vec<f64>,
    interactions: f64,
    residuals: f64,
}

impl PercentageEffects {
    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn factors(&self) -> &[f64] {
        &self.factors
    }

    /// All interaction terms combined.
    pub fn interactions(&self) -> f64 {
        self.interactions
    }

    pub fn residuals(&self) -> f64 {
        self.residuals
    }

    /// `[mean, factor 1 .. factor q, interactions, residuals]`
    pub fn to_vec(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.factors.len() + 3);
        out.push(self.mean);
        out.extend_from_slice(&self.factors);
        out.push(self.interactions);
        out.push(self.residuals);
        out
    }

    pub fn as_array(&self) -> Array1<f64> {
        Array1::from(self.to_vec())
    }

    pub fn total(&self) -> f64 {
        self.to_vec().iter().sum()
    }
}

impl fmt::Display for PercentageEffects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<14}{:>9.2}%", "Mean", self.mean)?;
        for (i, pct) in self.factors.iter().enumerate() {
            writeln!(f, "{:<14}{:>9.2}%", format!("Factor {}", i + 1), pct)?;
        }
        writeln!(f, "{:<14}{:>9.2}%", "Interactions", self.interactions)?;
        write!(f, "{:<14}{:>9.2}%", "Residuals", self.residuals)
    }
}

/// Every matrix produced by [`EffectDecomposer::decompose`].
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    grand_mean: Array1<f64>,
    centered: Array2<f64>,
    mean_deviation: Array1<f64>,
    factor_effects: Vec<Array2<f64>>,
    total_effect: Array2<f64>,
    interaction_effects: Vec<Array2<f64>>,
    total_interactions: Array2<f64>,
    residuals: Array2<f64>,
    percentage_effects: PercentageEffects,
}

impl Decomposition {
    /// Column means of the raw response.
    pub fn grand_mean(&self) -> &Array1<f64> {
        &self.grand_mean
    }

    pub fn centered(&self) -> &Array2<f64> {
        &self.centered
    }

    /// Column means left in the centred response (zero up to rounding).
    pub fn mean_deviation(&self) -> &Array1<f64> {
        &self.mean_deviation
    }

    pub fn factor_effects(&self) -> &[Array2<f64>] {
        &self.factor_effects
    }

    pub fn total_effect(&self) -> &Array2<f64> {
        &self.total_effect
    }

    pub fn interaction_effects(&self) -> &[Array2<f64>] {
        &self.interaction_effects
    }

    pub fn total_interactions(&self) -> &Array2<f64> {
        &self.total_interactions
    }

    pub fn residuals(&self) -> &Array2<f64> {
        &self.residuals
    }

    pub fn percentage_effects(&self) -> &PercentageEffects {
        &self.percentage_effects
    }

    /// Sum of all model terms; matches [`centered`](Self::centered) up to
    /// rounding.
    pub fn reconstruct(&self) -> Array2<f64> {
        let mut total = &self.residuals + &self.mean_deviation;
        for effect in self.factor_effects.iter().chain(&self.interaction_effects) {
            total += effect;
        }
        total
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EffectDecomposer {
    pooling: LevelPooling,
}

impl EffectDecomposer {
    pub fn new(pooling: LevelPooling) -> Self {
        EffectDecomposer { pooling }
    }

    pub fn pooling(&self) -> LevelPooling {
        self.pooling
    }

    pub fn decompose<L: LevelLabel>(
        &self,
        x: ArrayView2<f64>,
        design: ArrayView2<L>,
        interactions: &[(usize, usize)],
    ) -> Result<Decomposition> {
        validate_inputs(x, design, interactions)?;
        self.decompose_unchecked(x, design, interactions)
    }

    /// [`decompose`](Self::decompose) for inputs that already passed
    /// [`validate_inputs`].
    pub(crate) fn decompose_unchecked<L: LevelLabel>(
        &self,
        x: ArrayView2<f64>,
        design: ArrayView2<L>,
        interactions: &[(usize, usize)],
    ) -> Result<Decomposition> {
        let (n, p) = x.dim();
        info!(
            "Decomposing {}x{} response over {} factors and {} interactions",
            n,
            p,
            design.ncols(),
            interactions.len()
        );

        let (grand_mean, centered) = column_center(x)?;
        let levels = self.level_sets(design);

        let factor_effects: Vec<Array2<f64>> = levels
            .iter()
            .enumerate()
            .map(|(factor, factor_levels)| {
                debug!("Factor {}: scanning {} levels", factor + 1, factor_levels.len());
                let mut effect = Array2::zeros((n, p));
                for &level in factor_levels {
                    effect += &level_contribution(centered.view(), design, factor, level);
                }
                effect
            })
            .collect();
        let total_effect = sum_matrices(&factor_effects, (n, p));

        let interaction_effects: Vec<Array2<f64>> = interactions
            .iter()
            .map(|&(a, b)| {
                debug!("Interaction {}x{}", a + 1, b + 1);
                interaction_effect(
                    centered.view(),
                    total_effect.view(),
                    design,
                    (a, b),
                    (levels[a].as_slice(), levels[b].as_slice()),
                )
            })
            .collect();
        let total_interactions = sum_matrices(&interaction_effects, (n, p));

        let mean_deviation = centered
            .mean_axis(Axis(0))
            .ok_or_else(|| AscaError::InvalidInput("response matrix has no rows".to_string()))?;
        let residuals = &centered - &mean_deviation - &total_effect - &total_interactions;

        let percentage_effects = percentage_effects(
            x,
            &grand_mean,
            &factor_effects,
            &total_interactions,
            &residuals,
        );
        debug!("Percentage effects: {:?}", percentage_effects.to_vec());

        Ok(Decomposition {
            grand_mean,
            centered,
            mean_deviation,
            factor_effects,
            total_effect,
            interaction_effects,
            total_interactions,
            residuals,
            percentage_effects,
        })
    }

    fn level_sets<'d, L: LevelLabel>(&self, design: ArrayView2<'d, L>) -> Vec<Vec<&'d L>> {
        match self.pooling {
            LevelPooling::Pooled => {
                let pooled: Vec<&'d L> = design
                    .into_iter()
                    .collect::<BTreeSet<&'d L>>()
                    .into_iter()
                    .collect();
                vec![pooled; design.ncols()]
            }
            LevelPooling::PerFactor => (0..design.ncols())
                .map(|factor| {
                    design
                        .index_axis_move(Axis(1), factor)
                        .into_iter()
                        .collect::<BTreeSet<&'d L>>()
                        .into_iter()
                        .collect()
                })
                .collect(),
        }
    }
}

/// Contribution of one level of one factor: the centred group mean written
/// into every row at that level, zero elsewhere.
///
/// The mean divides by `count + f64::EPSILON`, so a level without rows yields
/// an all-zero matrix instead of a division by zero.
pub fn level_contribution<L: LevelLabel>(
    centered: ArrayView2<f64>,
    design: ArrayView2<L>,
    factor: usize,
    level: &L,
) -> Array2<f64> {
    let rows: Vec<usize> = design
        .column(factor)
        .indexed_iter()
        .filter(|(_, label)| *label == level)
        .map(|(i, _)| i)
        .collect();

    let mut contribution = Array2::zeros(centered.raw_dim());
    if rows.is_empty() {
        debug!("Factor {}: level {:?} has no observations", factor + 1, level);
        return contribution;
    }

    let average = group_average(centered, &rows);
    for &i in &rows {
        contribution.row_mut(i).assign(&average);
    }
    contribution
}

fn interaction_effect<L: LevelLabel>(
    centered: ArrayView2<f64>,
    total_effect: ArrayView2<f64>,
    design: ArrayView2<L>,
    (a, b): (usize, usize),
    (levels_a, levels_b): (&[&L], &[&L]),
) -> Array2<f64> {
    let mut effect = Array2::zeros(centered.raw_dim());
    for &level_a in levels_a {
        for &level_b in levels_b {
            let rows: Vec<usize> = (0..design.nrows())
                .filter(|&i| design[[i, a]] == *level_a && design[[i, b]] == *level_b)
                .collect();
            if rows.is_empty() {
                continue;
            }

            let average = group_average(centered, &rows);
            for &i in &rows {
                let mut row = effect.row_mut(i);
                row += &average;
                row -= &total_effect.row(i);
            }
        }
    }
    effect
}

fn group_average(centered: ArrayView2<f64>, rows: &[usize]) -> Array1<f64> {
    let sum = centered.select(Axis(0), rows).sum_axis(Axis(0));
    sum / (rows.len() as f64 + f64::EPSILON)
}

fn sum_matrices(matrices: &[Array2<f64>], shape: (usize, usize)) -> Array2<f64> {
    let mut total = Array2::zeros(shape);
    for m in matrices {
        total += m;
    }
    total
}

fn percentage_effects(
    x: ArrayView2<f64>,
    grand_mean: &Array1<f64>,
    factor_effects: &[Array2<f64>],
    total_interactions: &Array2<f64>,
    residuals: &Array2<f64>,
) -> PercentageEffects {
    let ss_x = sum_of_squares(&x);
    let ss_mean = x.nrows() as f64 * sum_of_squares(grand_mean);
    let ss_factors: Vec<f64> = factor_effects.iter().map(|e| sum_of_squares(e)).collect();
    let ss_interactions = sum_of_squares(total_interactions);
    let ss_residuals = sum_of_squares(residuals);

    let scale = if ss_x > 0.0 {
        100.0 / ss_x
    } else {
        warn!("Response matrix is identically zero; percentage effects are reported as 0");
        0.0
    };

    PercentageEffects {
        mean: ss_mean * scale,
        factors: ss_factors.iter().map(|ss| ss * scale).collect(),
        interactions: ss_interactions * scale,
        residuals: ss_residuals * scale,
    }
}

pub(crate) fn validate_inputs<L>(
    x: ArrayView2<f64>,
    design: ArrayView2<L>,
    interactions: &[(usize, usize)],
) -> Result<()> {
    let (n, p) = x.dim();
    if n == 0 || p == 0 {
        return Err(AscaError::InvalidInput(format!(
            "response matrix must be non-empty, got {}x{}",
            n, p
        )));
    }
    if design.nrows() != n {
        return Err(AscaError::ShapeMismatch(format!(
            "response matrix has {} rows but design matrix has {}",
            n,
            design.nrows()
        )));
    }
    let q = design.ncols();
    if q == 0 {
        return Err(AscaError::InvalidInput(
            "design matrix has no factor columns".to_string(),
        ));
    }
    ensure_finite(x, "response matrix")?;

    for &(a, b) in interactions {
        if a >= q || b >= q {
            return Err(AscaError::InvalidInput(format!(
                "interaction ({}, {}) refers to a factor outside 0..{}",
                a, b, q
            )));
        }
        if a == b {
            return Err(AscaError::InvalidInput(format!(
                "interaction ({}, {}) must combine two different factors",
                a, b
            )));
        }
    }
    Ok(())
}
