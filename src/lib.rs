//! # single_asca
//!
//! ANOVA-simultaneous component analysis (ASCA) for designed experiments with
//! multivariate responses.
//!
//! - [`anova`]: effect / interaction / residual decomposition
//! - [`sca`]: component analysis of one effect matrix
//! - [`svd`]: pluggable SVD backends and the sign-stable SVD
//! - [`asca`]: builder, model and the immutable fit result

pub mod anova;
pub mod asca;
pub mod error;
pub mod sca;
pub mod svd;
mod utils;

#[cfg(test)]
mod test_fixtures;

pub use anova::{Decomposition, EffectDecomposer, LevelPooling, PercentageEffects};
pub use asca::{Asca, AscaBuilder, AscaResult, EffectTarget, SignOverride, REFERENCE_SIGN_OVERRIDE};
pub use error::AscaError;
pub use sca::{ComponentAnalyzer, ComponentResult};
pub use svd::{Factorization, NalgebraSvd, SignStableSvd, SvdBackend};
pub use utils::sum_of_squares;
pub use utils::LevelLabel;
