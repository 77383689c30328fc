//! Shared datasets for unit tests.

use ndarray::{array, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Balanced 2×3 design with two replicates per cell and two responses.
///
/// Factor 1 has levels {1, 2}, factor 2 has levels {1, 2, 3}; rows are
/// ordered by factor 1, then factor 2.
pub(crate) fn balanced_dataset() -> (Array2<f64>, Array2<i32>) {
    let x = array![
        [1.0, 2.0],
        [1.5, 2.5],
        [2.0, 3.0],
        [2.5, 3.5],
        [3.0, 4.0],
        [3.5, 4.5],
        [3.0, 4.5],
        [3.5, 5.0],
        [4.0, 5.0],
        [4.5, 5.5],
        [5.0, 5.5],
        [6.0, 6.0],
    ];
    let design = array![
        [1, 1],
        [1, 1],
        [1, 2],
        [1, 2],
        [1, 3],
        [1, 3],
        [2, 1],
        [2, 1],
        [2, 2],
        [2, 2],
        [2, 3],
        [2, 3],
    ];
    (x, design)
}

/// The published two-factor example: same 2×3 balanced design as
/// [`balanced_dataset`], with the response the reference sign override was
/// tuned on.
pub(crate) fn published_dataset() -> (Array2<f64>, Array2<i32>) {
    let x = array![
        [1.0, 0.6],
        [3.0, 0.4],
        [2.0, 0.7],
        [1.0, 0.8],
        [2.0, 0.01],
        [2.0, 0.8],
        [4.0, 1.0],
        [6.0, 2.0],
        [5.0, 0.9],
        [5.0, 1.0],
        [6.0, 2.0],
        [5.0, 0.7],
    ];
    let (_, design) = balanced_dataset();
    (x, design)
}

/// Random unbalanced two-factor experiment with `p` responses.
pub(crate) fn random_experiment(n: usize, p: usize, seed: u64) -> (Array2<f64>, Array2<u8>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let design = Array2::from_shape_fn((n, 2), |(_, j)| {
        if j == 0 {
            rng.random_range(0..3u8)
        } else {
            rng.random_range(0..2u8)
        }
    });
    let x = Array2::from_shape_fn((n, p), |(i, j)| {
        let shift = design[[i, 0]] as f64 * (j as f64 + 1.0) - design[[i, 1]] as f64;
        shift + rng.random_range(-1.0..1.0)
    });
    (x, design)
}

/// Same rows in a different order.
pub(crate) fn permutation(n: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n).rev().collect();
    order.rotate_left(n / 3);
    order
}

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
