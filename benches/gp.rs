use criterion::black_box;
use criterion::BatchSize;
use criterion::Criterion;
use criterion::{criterion_group, criterion_main};
use gpreg::prelude::*;
use nalgebra::DMatrix;

fn sine_gp(n: usize) -> GaussianProcess {
    let xs: Vec<f64> = (0..n).map(|i| i as f64 / (n - 1) as f64).collect();
    let ys: Vec<f64> = xs
        .iter()
        .map(|x| (2.0 * std::f64::consts::PI * x).sin())
        .collect();
    let opts = GaussianProcessOptions::default().with_noise_init(0.2);
    GaussianProcess::from_slices(&xs, &ys, opts).unwrap()
}

fn bench_ln_m_with_gradient(c: &mut Criterion) {
    let mut group = c.benchmark_group("GP ln_m with gradient");
    for n in [10, 50, 100, 200] {
        let gp = sine_gp(n);
        let h = *gp.hyperparameters();
        group.bench_function(format!("{} points", n), |b| {
            b.iter(|| black_box(gp.ln_m_with_parameters(&h)))
        });
    }
}

fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("GP fit, 50 iterations");
    group.sample_size(10);
    for n in [50, 100] {
        let gp = sine_gp(n);
        group.bench_with_input(format!("{} points", n), &gp, |b, gp| {
            b.iter_batched_ref(
                || gp.clone(),
                |gp| black_box(gp.fit()),
                BatchSize::SmallInput,
            )
        });
    }
}

fn bench_predict(c: &mut Criterion) {
    let mut gp = sine_gp(100);
    gp.fit().unwrap();
    let mut group = c.benchmark_group("GP predict, 100 training points");
    for m in [1, 10, 100] {
        let test_x = DMatrix::from_fn(m, 1, |i, _| i as f64 / m as f64);
        group.bench_function(format!("{} points, full cov", m), |b| {
            b.iter(|| black_box(gp.predict(&test_x)))
        });
        group.bench_function(format!("{} points, variance", m), |b| {
            b.iter(|| black_box(gp.predict_mean_and_variance(&test_x)))
        });
    }
}

criterion_group!(
    gp_benches,
    bench_ln_m_with_gradient,
    bench_fit,
    bench_predict
);
criterion_main!(gp_benches);
