use thiserror::Error;

/// Everything that can go wrong while decomposing a designed experiment.
///
/// All variants are raised before any result is produced; a failed `fit`
/// never hands back a partially populated result set.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AscaError {
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Singular value decomposition failed: {0}")]
    NumericalFailure(String),
}

impl AscaError {
    pub(crate) fn numerical(err: anyhow::Error) -> Self {
        AscaError::NumericalFailure(format!("{:#}", err))
    }
}

pub type Result<T> = std::result::Result<T, AscaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numerical_keeps_context_chain() {
        let err = anyhow::anyhow!("no convergence after 3 sweeps").context("nalgebra backend");
        let converted = AscaError::numerical(err);

        assert_eq!(
            converted,
            AscaError::NumericalFailure("nalgebra backend: no convergence after 3 sweeps".to_string())
        );
        assert!(converted.to_string().starts_with("Singular value decomposition failed"));
    }
}
