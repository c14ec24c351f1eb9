use std::f64::consts::PI;
use std::ops::ControlFlow;

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use gpreg::prelude::*;

// Fit a noisy sine wave and print the training trajectory and the 2σ band.
//
// Run with `RUST_LOG=debug` to see the per-iteration log records as well.
pub fn main() {
    env_logger::builder().init();

    let mut rng = StdRng::seed_from_u64(0x1234);
    let noise = Normal::new(0.0, 0.2).expect("valid noise distribution");

    // Data
    let n_train = 100;
    let xs: Vec<f64> = (0..n_train)
        .map(|i| i as f64 / (n_train - 1) as f64)
        .collect();
    let ys: Vec<f64> = xs
        .iter()
        .map(|x| (2.0 * PI * x).sin() + noise.sample(&mut rng))
        .collect();

    let mut gp = GaussianProcess::from_slices(
        &xs,
        &ys,
        GaussianProcessOptions::default(),
    )
    .expect("Data is valid so this should succeed");

    let n_iterations = gp.options().n_iterations;
    let summary = gp
        .fit_with(|p| {
            println!(
                "Iter {:>2}/{} - Loss: {:.3}   lengthscale: {:.3}   noise: {:.3}",
                p.iteration,
                n_iterations,
                p.loss,
                p.log_lengthscale.exp(),
                p.log_noise.exp()
            );
            ControlFlow::Continue(())
        })
        .expect("Training should succeed");

    println!(
        "loss {:.3} -> {:.3}",
        summary.first_loss().unwrap_or(f64::NAN),
        summary.last_loss().unwrap_or(f64::NAN)
    );
    println!("Fitted hyperparameters = {:#?}", gp.hyperparameters());

    // Prediction
    let n_test = 51;
    let test_x = DMatrix::from_fn(n_test, 1, |i, _| i as f64 / (n_test - 1) as f64);
    let pred = gp.predict(&test_x).expect("The model was just fit");
    let (lower, upper) = pred.confidence_region_default();

    println!("{:>6} {:>8} {:>8} {:>8} {:>8}", "x", "truth", "lower", "mean", "upper");
    for i in (0..n_test).step_by(5) {
        let x = test_x[(i, 0)];
        println!(
            "{:>6.2} {:>8.3} {:>8.3} {:>8.3} {:>8.3}",
            x,
            (2.0 * PI * x).sin(),
            lower[i],
            pred.mean()[i],
            upper[i]
        );
    }
}
