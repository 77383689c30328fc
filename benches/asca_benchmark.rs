use criterion::measurement::Measurement;
use criterion::{criterion_group, criterion_main, BenchmarkGroup, BenchmarkId, Criterion};
use ndarray::Array2;
use rand::distr::{Distribution, Uniform};
use rand::{rngs::StdRng, SeedableRng};
use single_asca::{AscaBuilder, SignStableSvd};
use std::time::Duration;

#[derive(Clone)]
pub struct ExperimentConfig {
    seed: u64,
    // (samples, variables)
    matrix_sizes: Vec<(usize, usize)>,
    // levels of the two factors
    levels: (usize, usize),
    measurement_time: u64,
    sample_size: usize,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            matrix_sizes: vec![(24, 4), (120, 20), (600, 50), (1200, 60)],
            levels: (4, 3),
            measurement_time: 10,
            sample_size: 10,
        }
    }
}

fn create_experiment(
    rows: usize,
    cols: usize,
    levels: (usize, usize),
    seed: u64,
) -> (Array2<f64>, Array2<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let value_dist = Uniform::try_from(0.0..1.0).unwrap();

    let design = Array2::from_shape_fn((rows, 2), |(i, j)| {
        if j == 0 {
            i % levels.0
        } else {
            (i / levels.0) % levels.1
        }
    });
    let x = Array2::from_shape_fn((rows, cols), |(i, j)| {
        let effect = design[[i, 0]] as f64 * 0.5 + design[[i, 1]] as f64 * (j % 3) as f64;
        effect + value_dist.sample(&mut rng)
    });
    (x, design)
}

fn configure_group<'a, M: Measurement>(
    c: &'a mut Criterion<M>,
    name: &str,
    config: &ExperimentConfig,
) -> BenchmarkGroup<'a, M> {
    let mut group = c.benchmark_group(name);
    group.measurement_time(Duration::from_secs(config.measurement_time));
    group.sample_size(config.sample_size);
    group
}

pub fn bench_sign_stable_svd(c: &mut Criterion) {
    let config = ExperimentConfig::default();
    let mut group = configure_group(c, "Sign_Stable_SVD", &config);

    for &(rows, cols) in config.matrix_sizes.iter() {
        let seed = config.seed + (rows * cols) as u64;
        let (x, _) = create_experiment(rows, cols, config.levels, seed);

        group.bench_with_input(
            BenchmarkId::new("svd_signstable", format!("{}x{}", rows, cols)),
            &(rows, cols),
            |b, _| {
                b.iter(|| SignStableSvd::new(x.view()).unwrap());
            },
        );
    }
    group.finish();
}

pub fn bench_asca_fit(c: &mut Criterion) {
    let config = ExperimentConfig::default();
    let mut group = configure_group(c, "ASCA_Fit", &config);

    for &(rows, cols) in config.matrix_sizes.iter() {
        let seed = config.seed + (rows * cols) as u64;
        let (x, design) = create_experiment(rows, cols, config.levels, seed);

        for parallel in [false, true] {
            let model = AscaBuilder::default().parallel(parallel).build();
            let label = if parallel { "fit_parallel" } else { "fit_sequential" };

            group.bench_with_input(
                BenchmarkId::new(label, format!("{}x{}", rows, cols)),
                &(rows, cols),
                |b, _| {
                    b.iter(|| model.fit(x.view(), design.view(), &[(0, 1)]).unwrap());
                },
            );
        }
    }
    group.finish();
}

criterion_group!(asca_benches, bench_sign_stable_svd, bench_asca_fit);
criterion_main!(asca_benches);
