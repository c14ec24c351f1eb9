use std::f64::consts::PI;
use std::ops::ControlFlow;

use gpreg::prelude::*;
use nalgebra::DMatrix;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rand_xoshiro::Xoshiro256Plus;

fn noisy_sine(seed: u64) -> (Vec<f64>, Vec<f64>) {
    let mut rng = Xoshiro256Plus::seed_from_u64(seed);
    let noise = Normal::new(0.0, 0.2).unwrap();
    let xs: Vec<f64> = (0..100).map(|i| i as f64 / 99.0).collect();
    let ys = xs
        .iter()
        .map(|x| (2.0 * PI * x).sin() + noise.sample(&mut rng))
        .collect();
    (xs, ys)
}

fn fitted(seed: u64) -> (GaussianProcess, FitSummary) {
    let (xs, ys) = noisy_sine(seed);
    let mut gp = GaussianProcess::from_slices(
        &xs,
        &ys,
        GaussianProcessOptions::default(),
    )
    .unwrap();
    let summary = gp.fit().unwrap();
    (gp, summary)
}

#[test]
fn training_trajectory_on_noisy_sine() {
    for seed in [1, 2, 3] {
        let (gp, summary) = fitted(seed);

        assert_eq!(summary.history.len(), 50);
        assert!(!summary.stopped_early);

        let first = summary.first_loss().unwrap();
        let last = summary.last_loss().unwrap();
        assert!(1.0 < first && first < 1.12, "first loss {first}");
        assert!(last < 0.2, "last loss {last}");

        let h = gp.hyperparameters();
        assert!(
            -1.6 < h.log_lengthscale && h.log_lengthscale < -1.05,
            "log lengthscale {}",
            h.log_lengthscale
        );
        // noise std close to the 0.2 used to generate the data
        assert!(0.1 < h.noise_std() && h.noise_std() < 0.35);
    }
}

#[test]
fn posterior_tracks_the_sine() {
    let (gp, _) = fitted(0xABCD);
    let n_test = 51;
    let test_x = DMatrix::from_fn(n_test, 1, |i, _| i as f64 / 50.0);
    let pred = gp.predict(&test_x).unwrap();

    assert_eq!(pred.len(), n_test);
    assert_eq!(pred.cov().shape(), (n_test, n_test));

    let sq_err: f64 = (0..n_test)
        .map(|i| (pred.mean()[i] - (2.0 * PI * test_x[(i, 0)]).sin()).powi(2))
        .sum();
    let rmse = (sq_err / n_test as f64).sqrt();
    assert!(rmse < 0.15, "rmse {rmse}");

    // symmetric, and never more uncertain than the prior
    let cov = pred.cov();
    for i in 0..n_test {
        for j in 0..n_test {
            assert_eq!(cov[(i, j)], cov[(j, i)]);
        }
        assert!(pred.variance()[i] <= 1.0);
    }

    let (lower, upper) = pred.confidence_region_default();
    for i in 0..n_test {
        assert!(lower[i] <= pred.mean()[i] && pred.mean()[i] <= upper[i]);
    }
}

#[test]
fn observation_band_covers_training_targets() {
    let (gp, _) = fitted(7);
    let pred = gp.predict(gp.x_train()).unwrap();
    let half_width = pred.observation_variance().map(|v| 2.0 * v.sqrt());

    let covered = gp
        .y_train()
        .iter()
        .enumerate()
        .filter(|(i, y)| (*y - pred.mean()[*i]).abs() <= half_width[*i])
        .count();
    assert!(covered >= 85, "{covered} of 100 covered");
}

#[test]
fn predictions_are_reproducible() {
    let (gp_a, summary_a) = fitted(11);
    let (gp_b, summary_b) = fitted(11);
    assert_eq!(summary_a, summary_b);

    let test_x = DMatrix::from_column_slice(3, 1, &[0.1, 0.5, 0.9]);
    assert_eq!(gp_a.predict(&test_x).unwrap(), gp_b.predict(&test_x).unwrap());
}

#[test]
fn early_stop_on_loss_threshold() {
    let (xs, ys) = noisy_sine(3);
    let mut gp = GaussianProcess::from_slices(
        &xs,
        &ys,
        GaussianProcessOptions::default().with_n_iterations(200),
    )
    .unwrap();

    let summary = gp
        .fit_with(|p| {
            if p.loss < 0.5 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .unwrap();

    assert!(summary.stopped_early);
    assert!(summary.history.len() < 200);
    assert!(summary.last_loss().unwrap() < 0.5);
    assert!(summary.history[..summary.history.len() - 1]
        .iter()
        .all(|p| p.loss >= 0.5));
    assert!(gp.is_fitted());
}
