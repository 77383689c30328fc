//! # Singular Value Decomposition
//!
//! Backends compute an ordinary thin factorization `X = U·diag(s)·Vᵗ`; the
//! [`signstable`] module turns any of them into a decomposition whose signs
//! depend only on the input matrix.
//!
//! ## Available backends
//! - **nalgebra** ([`NalgebraSvd`]): default, bounded Golub-Kahan iterations
//! - **faer** (`FaerSvd`, feature `faer`)

use ndarray::{Array1, Array2, ArrayView2, Axis};

#[cfg(feature = "faer")]
pub mod faer;
pub mod nalgebra;
pub mod signstable;

pub use self::nalgebra::NalgebraSvd;
pub use signstable::SignStableSvd;

#[cfg(feature = "faer")]
pub use self::faer::FaerSvd;

/// Thin SVD as returned by a backend: `u` is m×k, `s` has length k and `vt`
/// is k×n, with k = min(m, n).
#[derive(Debug, Clone)]
pub struct Factorization {
    pub u: Array2<f64>,
    pub s: Array1<f64>,
    pub vt: Array2<f64>,
}

impl Factorization {
    pub fn rank(&self) -> usize {
        self.s.len()
    }

    /// Reorders the triplets so that singular values are non-increasing.
    ///
    /// Equal values keep their backend order.
    pub fn into_descending(self) -> Self {
        let mut order: Vec<usize> = (0..self.s.len()).collect();
        order.sort_by(|&a, &b| self.s[b].total_cmp(&self.s[a]));
        if order.iter().enumerate().all(|(i, &idx)| i == idx) {
            return self;
        }

        Factorization {
            u: self.u.select(Axis(1), &order),
            s: self.s.select(Axis(0), &order),
            vt: self.vt.select(Axis(0), &order),
        }
    }
}

// Trait for SVD implementations
pub trait SvdBackend: Send + Sync {
    fn compute(&self, matrix: ArrayView2<f64>) -> anyhow::Result<Factorization>;
}

impl<S: SvdBackend + ?Sized> SvdBackend for &S {
    fn compute(&self, matrix: ArrayView2<f64>) -> anyhow::Result<Factorization> {
        (**self).compute(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_into_descending_reorders_triplets() {
        let f = Factorization {
            u: array![[1.0, 0.0], [0.0, 1.0]],
            s: array![1.0, 3.0],
            vt: array![[0.0, 1.0], [1.0, 0.0]],
        };
        let sorted = f.into_descending();

        assert_eq!(sorted.s, array![3.0, 1.0]);
        assert_eq!(sorted.u, array![[0.0, 1.0], [1.0, 0.0]]);
        assert_eq!(sorted.vt, array![[1.0, 0.0], [0.0, 1.0]]);
        assert_eq!(sorted.rank(), 2);
    }
}
