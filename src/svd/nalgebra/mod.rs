use anyhow::anyhow;
use ndarray::{Array1, ArrayView2};
use nshare::{IntoNalgebra, IntoNdarray2};

use super::{Factorization, SvdBackend};

pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

/// SVD through `nalgebra`'s bidiagonalization + implicit-shift QR.
///
/// `max_iterations == 0` lets the iteration run until convergence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NalgebraSvd {
    epsilon: f64,
    max_iterations: usize,
}

impl NalgebraSvd {
    /// Machine epsilon and [`DEFAULT_MAX_ITERATIONS`].
    pub const DEFAULT: NalgebraSvd = NalgebraSvd::new(f64::EPSILON, DEFAULT_MAX_ITERATIONS);

    pub const fn new(epsilon: f64, max_iterations: usize) -> Self {
        NalgebraSvd {
            epsilon,
            max_iterations,
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }
}

impl Default for NalgebraSvd {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl SvdBackend for NalgebraSvd {
    fn compute(&self, x: ArrayView2<f64>) -> anyhow::Result<Factorization> {
        let (m, n) = x.dim();
        let matrix = x.to_owned().into_nalgebra();

        let svd = matrix
            .try_svd(true, true, self.epsilon, self.max_iterations)
            .ok_or_else(|| {
                anyhow!(
                    "nalgebra SVD of a {}x{} matrix did not converge within {} iterations",
                    m,
                    n,
                    self.max_iterations
                )
            })?;

        let u = svd
            .u
            .ok_or_else(|| anyhow!("nalgebra SVD returned no left singular vectors"))?;
        let vt = svd
            .v_t
            .ok_or_else(|| anyhow!("nalgebra SVD returned no right singular vectors"))?;

        Ok(Factorization {
            u: u.into_ndarray2(),
            s: Array1::from(svd.singular_values.as_slice().to_vec()),
            vt: vt.into_ndarray2(),
        })
    }
}
