use std::fmt::Debug;

use ndarray::{Array1, Array2, ArrayBase, ArrayView2, Axis, Data, Dimension};
use num_traits::Float;

use crate::error::{AscaError, Result};

/// Trait for types that can be used as factor levels in a design matrix
pub trait LevelLabel: Clone + Ord + Debug {}

// Implement LevelLabel for common types
impl LevelLabel for String {}
impl LevelLabel for &str {}
impl LevelLabel for char {}
impl LevelLabel for bool {}
impl LevelLabel for u8 {}
impl LevelLabel for i32 {}
impl LevelLabel for i64 {}
impl LevelLabel for u32 {}
impl LevelLabel for u64 {}
impl LevelLabel for usize {}

/// Sum of squared entries.
pub fn sum_of_squares<T, S, D>(matrix: &ArrayBase<S, D>) -> T
where
    T: Float,
    S: Data<Elem = T>,
    D: Dimension,
{
    matrix.fold(T::zero(), |acc, &v| acc + v * v)
}

/// Sign with `sign(0) == +1`. Negative zero also maps to `+1`.
pub(crate) fn sign<T: Float>(value: T) -> T {
    if value < T::zero() {
        -T::one()
    } else {
        T::one()
    }
}

/// Subtracts the per-column mean, returning `(mean, centered)`.
pub(crate) fn column_center(x: ArrayView2<f64>) -> Result<(Array1<f64>, Array2<f64>)> {
    let mean = x
        .mean_axis(Axis(0))
        .ok_or_else(|| AscaError::InvalidInput("cannot center a matrix without rows".to_string()))?;
    let centered = &x - &mean;
    Ok((mean, centered))
}

pub(crate) fn ensure_finite(x: ArrayView2<f64>, what: &str) -> Result<()> {
    if let Some(((row, col), value)) = x.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(AscaError::InvalidInput(format!(
            "{} contains a non-finite value ({}) at [{}, {}]",
            what, value, row, col
        )));
    }
    Ok(())
}
