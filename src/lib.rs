//! Exact Gaussian process regression.
//!
//! A [`GaussianProcess`](process::gaussian::GaussianProcess) with a
//! radial-basis-function kernel, a constant prior mean and Gaussian
//! observation noise. Hyperparameters are trained by gradient ascent on the
//! log marginal likelihood; predictions give the posterior mean, covariance
//! and confidence regions at new points.
//!
//! # Example
//!
//! ```
//! use gpreg::prelude::*;
//! use nalgebra::DMatrix;
//!
//! let xs: Vec<f64> = (0..25).map(|i| i as f64 / 24.0).collect();
//! let ys: Vec<f64> = xs.iter().map(|x| (4.0 * x).cos()).collect();
//!
//! let mut gp =
//!     GaussianProcess::from_slices(&xs, &ys, GaussianProcessOptions::default())
//!         .unwrap();
//! let summary = gp.fit().unwrap();
//! assert!(summary.last_loss() < summary.first_loss());
//!
//! let test_x = DMatrix::from_column_slice(2, 1, &[0.25, 0.75]);
//! let pred = gp.predict(&test_x).unwrap();
//! assert_eq!(pred.len(), 2);
//! ```
//!
//! # Features
//!
//! * `serde1` - Serialize hyperparameters, options, progress records and
//!   errors.
//! * `lbfgs` - [`GaussianProcess::optimize_lbfgs`](process::gaussian::GaussianProcess::optimize_lbfgs),
//!   training through argmin's L-BFGS.

pub mod consts;
pub mod optim;
pub mod prelude;
pub mod process;
