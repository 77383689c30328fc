//! # Sign-Stable SVD
//!
//! Removes the sign ambiguity of the singular value decomposition following
//! Bro, Acar & Kolda (2008), *Resolving the sign ambiguity in the singular
//! value decomposition*, J. Chemometrics 22(2), 135-140.
//!
//! Every component `k` is compared against the part of the matrix it has to
//! explain (the leave-`k`-out residual `Y`). Each column of `Y` votes for the
//! sign of `u_k` with weight equal to its squared projection, each row of `Y`
//! votes for `v_k` the same way. Opposing votes are reconciled by giving in
//! on the weaker side, so `U·diag(s)·Vᵗ` is unchanged.
//!
//! Exactly repeated singular values leave a rotational degree of freedom that
//! sign flips cannot resolve; such components are stabilised only up to the
//! basis the backend happened to return.

use log::trace;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use super::{Factorization, NalgebraSvd, SvdBackend};
use crate::error::{AscaError, Result};
use crate::utils::{ensure_finite, sign};

/// Singular value decomposition `X = U·diag(s)·Vᵗ` with deterministic signs.
///
/// `u` is m×k, `s` has length k (non-increasing), `v` is n×k, k = min(m, n).
#[derive(Debug, Clone, PartialEq)]
pub struct SignStableSvd {
    u: Array2<f64>,
    s: Array1<f64>,
    v: Array2<f64>,
}

impl SignStableSvd {
    /// Decomposes `x` with the default nalgebra backend.
    pub fn new(x: ArrayView2<f64>) -> Result<Self> {
        Self::with_backend(x, &NalgebraSvd::default())
    }

    pub fn with_backend<S: SvdBackend + ?Sized>(x: ArrayView2<f64>, backend: &S) -> Result<Self> {
        ensure_finite(x, "matrix passed to the SVD")?;
        let (m, n) = x.dim();

        let factorization = backend
            .compute(x)
            .map_err(AscaError::numerical)?
            .into_descending();
        check_shapes(&factorization, m, n)?;

        let Factorization { mut u, s, vt } = factorization;
        let mut v = vt.reversed_axes();

        let (s_left, s_right) = sign_scores(x, &u, &s, &v);

        for k in 0..s.len() {
            let (left, right) = reconcile(s_left[k], s_right[k]);
            trace!(
                "component {}: s_left = {:.3e}, s_right = {:.3e} -> ({}, {})",
                k,
                s_left[k],
                s_right[k],
                left,
                right
            );
            if left < 0.0 {
                u.column_mut(k).mapv_inplace(|e| -e);
            }
            if right < 0.0 {
                v.column_mut(k).mapv_inplace(|e| -e);
            }
        }

        Ok(SignStableSvd { u, s, v })
    }

    pub fn u(&self) -> &Array2<f64> {
        &self.u
    }

    pub fn s(&self) -> &Array1<f64> {
        &self.s
    }

    pub fn v(&self) -> &Array2<f64> {
        &self.v
    }

    pub fn rank(&self) -> usize {
        self.s.len()
    }

    pub fn into_parts(self) -> (Array2<f64>, Array1<f64>, Array2<f64>) {
        (self.u, self.s, self.v)
    }

    // Reconstruct the original matrix
    pub fn reconstruct(&self) -> Array2<f64> {
        (&self.u * &self.s).dot(&self.v.t())
    }
}

fn check_shapes(f: &Factorization, m: usize, n: usize) -> Result<()> {
    let k = m.min(n);
    if f.u.dim() != (m, k) || f.s.len() != k || f.vt.dim() != (k, n) {
        return Err(AscaError::NumericalFailure(format!(
            "backend returned U {:?}, s [{}], Vt {:?} for a {}x{} matrix; expected a thin factorization of rank {}",
            f.u.dim(),
            f.s.len(),
            f.vt.dim(),
            m,
            n,
            k
        )));
    }
    Ok(())
}

/// Signed sums of squared projections of the leave-one-out residuals.
fn sign_scores(
    x: ArrayView2<f64>,
    u: &Array2<f64>,
    s: &Array1<f64>,
    v: &Array2<f64>,
) -> (Array1<f64>, Array1<f64>) {
    let k_total = s.len();
    let mut s_left = Array1::zeros(k_total);
    let mut s_right = Array1::zeros(k_total);

    for k in 0..k_total {
        let others: Vec<usize> = (0..k_total).filter(|&i| i != k).collect();
        let u_rest = u.select(Axis(1), &others);
        let s_rest = s.select(Axis(0), &others);
        let v_rest = v.select(Axis(1), &others);
        let y = &x - &(&u_rest * &s_rest).dot(&v_rest.t());

        // columns of Y against u_k, rows of Y against v_k
        s_left[k] = signed_square_sum(y.t().dot(&u.column(k)).view());
        s_right[k] = signed_square_sum(y.dot(&v.column(k)).view());
    }

    (s_left, s_right)
}

fn signed_square_sum(projections: ArrayView1<f64>) -> f64 {
    projections.iter().map(|&p| sign(p) * p * p).sum()
}

/// Makes opposing scores agree: the one with smaller magnitude adopts the
/// other's sign. Equal magnitudes give way on the right-hand side.
fn reconcile(left: f64, right: f64) -> (f64, f64) {
    let (sign_left, sign_right) = (sign(left), sign(right));
    if sign_left == sign_right {
        (sign_left, sign_right)
    } else if left.abs() < right.abs() {
        (sign_right, sign_right)
    } else {
        (sign_left, sign_left)
    }
}
