use std::ops::ControlFlow;

use gpreg::prelude::*;
use gpreg::process::gaussian::ConfigurationError;
use nalgebra::{DMatrix, DVector};

#[test]
fn predict_before_fit_is_not_trained() {
    let gp = GaussianProcess::from_slices(
        &[0.0, 1.0],
        &[0.0, 1.0],
        GaussianProcessOptions::default(),
    )
    .unwrap();
    // untrained wins over any shape problem
    for (rows, cols) in [(0, 0), (0, 1), (1, 1), (5, 1), (3, 2)] {
        let xs = DMatrix::zeros(rows, cols);
        assert_eq!(
            gp.predict(&xs).unwrap_err(),
            GaussianProcessError::NotTrained
        );
        assert_eq!(
            gp.predict_mean_and_variance(&xs).unwrap_err(),
            GaussianProcessError::NotTrained
        );
    }
    // the prior needs no training
    assert!(gp.prior(&DMatrix::zeros(1, 1)).is_ok());
}

#[test]
fn identical_noise_free_points_are_unstable() {
    let mut gp = GaussianProcess::from_slices(
        &[0.5, 0.5, 0.5],
        &[1.0, 1.0, 1.0],
        GaussianProcessOptions::default().with_noise_init(0.0),
    )
    .unwrap();

    let err = gp.fit().unwrap_err();
    match err {
        GaussianProcessError::NumericalInstability {
            iteration,
            hyperparameters,
        } => {
            assert_eq!(iteration, Some(1));
            assert_eq!(hyperparameters, Hyperparameters::from_natural(1.0, 0.0, 0.0));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(!gp.is_fitted());
    assert!(gp.ln_m().is_err());
}

#[test]
fn duplicate_points_with_noise_are_fine() {
    let mut gp = GaussianProcess::from_slices(
        &[0.5, 0.5, 0.5, 1.0],
        &[1.0, 1.1, 0.9, 0.0],
        GaussianProcessOptions::default().with_n_iterations(10),
    )
    .unwrap();
    assert!(gp.fit().is_ok());
}

#[test]
fn failed_fit_keeps_last_good_hyperparameters() {
    // the first update removes the noise, so the second iteration cannot
    // factorize the identical inputs
    let mut gp = GaussianProcess::from_slices(
        &[0.0, 0.0],
        &[1.0, -1.0],
        GaussianProcessOptions::default(),
    )
    .unwrap();

    let mut steps = 0;
    let mut opt = CollapseNoise;
    let err = gp
        .fit_with_optimizer(5, &mut opt, |_| {
            steps += 1;
            ControlFlow::Continue(())
        })
        .unwrap_err();

    assert_eq!(steps, 1);
    assert!(matches!(
        err,
        GaussianProcessError::NumericalInstability {
            iteration: Some(2),
            ..
        }
    ));
    assert_eq!(*gp.hyperparameters(), Hyperparameters::default());
    assert!(!gp.is_fitted());
}

/// Drives the noise to zero in one step
struct CollapseNoise;

impl Optimizer for CollapseNoise {
    fn step(&mut self, params: &mut [f64], _grad: &[f64]) {
        params[1] = f64::NEG_INFINITY;
    }
}

#[test]
fn multidimensional_inputs() {
    let x = DMatrix::from_row_slice(
        4,
        2,
        &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0],
    );
    let y = DVector::from_column_slice(&[0.0, 1.0, 1.0, 2.0]);
    let mut gp = GaussianProcess::new(
        x,
        y,
        GaussianProcessOptions::default().with_n_iterations(5),
    )
    .unwrap();
    gp.fit().unwrap();

    let pred = gp.predict(&DMatrix::from_row_slice(1, 2, &[0.5, 0.5])).unwrap();
    assert_eq!(pred.len(), 1);

    assert_eq!(
        gp.predict(&DMatrix::zeros(1, 3)).unwrap_err(),
        GaussianProcessError::Configuration(ConfigurationError::DimensionMismatch {
            expected: 2,
            given: 3
        })
    );
}
