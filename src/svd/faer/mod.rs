use faer_ext::*;
use ndarray::{Array1, ArrayView2};

use super::{Factorization, SvdBackend};

/// Thin SVD computed by `faer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaerSvd;

impl SvdBackend for FaerSvd {
    fn compute(&self, array: ArrayView2<f64>) -> anyhow::Result<Factorization> {
        let faer_mat = array.into_faer();
        let svd = faer_mat.thin_svd();
        let s_diagonal = svd.s_diagonal();

        let u = svd.u().into_ndarray().to_owned();
        let s: Array1<f64> = Array1::from_iter((0..s_diagonal.nrows()).map(|i| s_diagonal.read(i)));
        let vt = svd.v().into_ndarray().t().to_owned();

        Ok(Factorization { u, s, vt })
    }
}
