//! Gaussian Processes
//!
//! Exact GP regression with an [`RBFKernel`](kernel::RBFKernel), a constant
//! prior mean and i.i.d. Gaussian observation noise. Hyperparameters are
//! trained by maximizing the log marginal likelihood with closed-form
//! gradients.
//!
//! # Example
//!
//! ```
//! use gpreg::process::gaussian::{GaussianProcess, GaussianProcessOptions};
//! use nalgebra::DMatrix;
//!
//! let xs: Vec<f64> = (0..20).map(|i| i as f64 / 19.0).collect();
//! let ys: Vec<f64> = xs.iter().map(|x| (6.0 * x).sin()).collect();
//!
//! let opts = GaussianProcessOptions::default().with_n_iterations(30);
//! let mut gp = GaussianProcess::from_slices(&xs, &ys, opts).unwrap();
//! let summary = gp.fit().unwrap();
//! assert_eq!(summary.history.len(), 30);
//!
//! let test_x = DMatrix::from_column_slice(3, 1, &[0.1, 0.5, 0.9]);
//! let pred = gp.predict(&test_x).unwrap();
//! let (lower, upper) = pred.confidence_region_default();
//! assert!((0..3).all(|i| lower[i] <= pred.mean()[i] && pred.mean()[i] <= upper[i]));
//! ```

use std::ops::ControlFlow;

use log::{debug, info, warn};
use nalgebra::linalg::Cholesky;
use nalgebra::{DMatrix, DVector, Dyn};

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::consts::HALF_LN_2PI;
use crate::optim::{Adam, Optimizer};

pub mod kernel;
use kernel::RBFKernel;

mod error;
pub use error::*;

mod hyperparameters;
pub use hyperparameters::Hyperparameters;

mod options;
pub use options::GaussianProcessOptions;

mod prediction;
pub use prediction::Prediction;

#[cfg(feature = "lbfgs")]
mod mle;

/// Record emitted once per training iteration.
///
/// `loss` is the negative log marginal likelihood divided by the number of
/// training points, evaluated at the hyperparameters reported alongside it,
/// i.e. before that iteration's update.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct FitProgress {
    /// 1-based iteration number
    pub iteration: usize,
    pub loss: f64,
    pub log_lengthscale: f64,
    pub log_noise: f64,
    pub mean_constant: f64,
}

/// Outcome of a training run
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct FitSummary {
    /// One record per completed iteration, in order
    pub history: Vec<FitProgress>,
    /// Whether the observer cut training short
    pub stopped_early: bool,
}

impl FitSummary {
    /// Loss of the first iteration
    #[must_use]
    pub fn first_loss(&self) -> Option<f64> {
        self.history.first().map(|p| p.loss)
    }

    /// Loss of the last iteration
    #[must_use]
    pub fn last_loss(&self) -> Option<f64> {
        self.history.last().map(|p| p.loss)
    }
}

/// Factorization of the training covariance for a fixed set of
/// hyperparameters.
#[derive(Clone, Debug)]
struct Fitted {
    /// Cholesky Decomposition of K + σ²I
    chol: Cholesky<f64, Dyn>,
    /// Dual coefficients of training data in kernel space.
    alpha: DVector<f64>,
}

/// Likelihood, gradient and factorization at one set of hyperparameters
struct Evaluation {
    ln_m: f64,
    grad: [f64; 3],
    fitted: Fitted,
}

/// Exact Gaussian process regressor.
///
/// Owns the training data and the [`Hyperparameters`]. [`fit`](Self::fit)
/// trains the hyperparameters and caches the factorization used by
/// [`predict`](Self::predict).
#[derive(Clone, Debug)]
pub struct GaussianProcess {
    /// x values used in training, one row per point
    x_train: DMatrix<f64>,
    /// y values used in training
    y_train: DVector<f64>,
    hyperparameters: Hyperparameters,
    options: GaussianProcessOptions,
    /// Present after a successful fit, cleared whenever the hyperparameters
    /// change outside of `fit`
    fitted: Option<Fitted>,
}

impl GaussianProcess {
    /// Create an untrained Gaussian Process on the given data points
    ///
    /// # Arguments
    /// * `x_train` - Inputs, one row per point
    /// * `y_train` - Known values for `f(x)`
    /// * `options` - Initial hyperparameters and training settings. Can just
    ///   use `GaussianProcessOptions::default()`.
    pub fn new(
        x_train: DMatrix<f64>,
        y_train: DVector<f64>,
        options: GaussianProcessOptions,
    ) -> Result<Self, GaussianProcessError> {
        options.validate()?;
        RBFKernel::new(options.lengthscale_init)
            .map_err(ConfigurationError::from)?;

        if x_train.nrows() != y_train.len() {
            return Err(ConfigurationError::LengthMismatch {
                n_x: x_train.nrows(),
                n_y: y_train.len(),
            }
            .into());
        }
        if y_train.is_empty() {
            return Err(ConfigurationError::EmptyDataset.into());
        }
        if x_train.ncols() == 0 {
            return Err(ConfigurationError::ZeroDimensional.into());
        }
        if let Some(index) = x_train.row_iter().position(|row| {
            row.iter().any(|v| !v.is_finite())
        }) {
            return Err(non_finite("x", index).into());
        }
        if let Some(index) = y_train.iter().position(|v| !v.is_finite()) {
            return Err(non_finite("y", index).into());
        }

        Ok(Self {
            hyperparameters: options.initial_hyperparameters(),
            x_train,
            y_train,
            options,
            fitted: None,
        })
    }

    /// Create an untrained Gaussian Process on one-dimensional inputs
    pub fn from_slices(
        xs: &[f64],
        ys: &[f64],
        options: GaussianProcessOptions,
    ) -> Result<Self, GaussianProcessError> {
        Self::new(
            DMatrix::from_column_slice(xs.len(), 1, xs),
            DVector::from_column_slice(ys),
            options,
        )
    }

    /// x values used in training
    #[must_use]
    pub fn x_train(&self) -> &DMatrix<f64> {
        &self.x_train
    }

    /// y values used in training
    #[must_use]
    pub fn y_train(&self) -> &DVector<f64> {
        &self.y_train
    }

    /// Number of training points
    #[must_use]
    pub fn n_train(&self) -> usize {
        self.y_train.len()
    }

    #[must_use]
    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyperparameters
    }

    #[must_use]
    pub fn options(&self) -> &GaussianProcessOptions {
        &self.options
    }

    /// Whether `predict` can be called
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Replace the hyperparameters. Any fitted state is discarded.
    pub fn set_hyperparameters(&mut self, hyperparameters: Hyperparameters) {
        self.hyperparameters = hyperparameters;
        self.fitted = None;
    }

    /// Return the log marginal likelihood at the current hyperparameters
    pub fn ln_m(&self) -> Result<f64, GaussianProcessError> {
        self.evaluate(&self.hyperparameters, None).map(|e| e.ln_m)
    }

    /// Training loss at the current hyperparameters: `-ln_m / n`
    pub fn loss(&self) -> Result<f64, GaussianProcessError> {
        Ok(-self.ln_m()? / self.n_train() as f64)
    }

    /// Log marginal likelihood and its gradient at the given hyperparameters.
    ///
    /// The gradient is ordered `[∂/∂ln ℓ, ∂/∂ln σ, ∂/∂mean_constant]`. The
    /// model itself is left untouched.
    pub fn ln_m_with_parameters(
        &self,
        hyperparameters: &Hyperparameters,
    ) -> Result<(f64, [f64; 3]), GaussianProcessError> {
        self.evaluate(hyperparameters, None).map(|e| (e.ln_m, e.grad))
    }

    /// Train for `options.n_iterations` iterations of Adam at
    /// `options.learning_rate`.
    pub fn fit(&mut self) -> Result<FitSummary, GaussianProcessError> {
        self.fit_with(|_| ControlFlow::Continue(()))
    }

    /// Like [`fit`](Self::fit), handing every progress record to `observer`.
    ///
    /// Returning `ControlFlow::Break(())` from the observer ends training
    /// before that iteration's update.
    pub fn fit_with<F>(
        &mut self,
        observer: F,
    ) -> Result<FitSummary, GaussianProcessError>
    where
        F: FnMut(&FitProgress) -> ControlFlow<()>,
    {
        let mut adam = Adam::new(self.options.learning_rate);
        self.fit_with_optimizer(self.options.n_iterations, &mut adam, observer)
    }

    /// Train for `n_iterations` iterations with a caller-supplied optimizer.
    ///
    /// Each iteration recomputes the covariance, its factorization, the loss
    /// and the loss gradient, reports the progress, and then updates all
    /// hyperparameters at once. On error the hyperparameters are restored to
    /// the last ones that evaluated successfully and the model is left
    /// unfitted.
    pub fn fit_with_optimizer<O, F>(
        &mut self,
        n_iterations: usize,
        optimizer: &mut O,
        mut observer: F,
    ) -> Result<FitSummary, GaussianProcessError>
    where
        O: Optimizer + ?Sized,
        F: FnMut(&FitProgress) -> ControlFlow<()>,
    {
        self.fitted = None;
        let n = self.n_train() as f64;
        let mut history = Vec::with_capacity(n_iterations);

        info!(
            "fitting GP on {} points for {} iterations",
            self.n_train(),
            n_iterations
        );

        // hyperparameters of the most recent successful evaluation
        let mut last_good = self.hyperparameters;

        for iteration in 1..=n_iterations {
            let eval = match self.evaluate(&self.hyperparameters, Some(iteration)) {
                Ok(eval) => eval,
                Err(err) => return Err(self.roll_back(last_good, err)),
            };

            let h = self.hyperparameters;
            last_good = h;
            let progress = FitProgress {
                iteration,
                loss: -eval.ln_m / n,
                log_lengthscale: h.log_lengthscale,
                log_noise: h.log_noise,
                mean_constant: h.mean_constant,
            };
            debug!(
                "Iter {}/{} - Loss: {:.3} lengthscale: {:.3} noise: {:.3}",
                iteration,
                n_iterations,
                progress.loss,
                h.lengthscale(),
                h.noise_std()
            );
            history.push(progress);

            if observer(&progress).is_break() {
                info!("training stopped by observer at iteration {iteration}");
                self.fitted = Some(eval.fitted);
                return Ok(FitSummary {
                    history,
                    stopped_early: true,
                });
            }

            // minimize the loss, -ln_m / n
            let grad = eval.grad.map(|g| -g / n);
            let mut params = h.to_array();
            optimizer.step(&mut params, &grad);
            self.hyperparameters = Hyperparameters::from(params);
        }

        let eval = match self.evaluate(&self.hyperparameters, None) {
            Ok(eval) => eval,
            Err(err) => return Err(self.roll_back(last_good, err)),
        };
        self.fitted = Some(eval.fitted);

        info!(
            "fit done: ln_m = {:.4}, lengthscale = {:.4}, noise = {:.4}",
            eval.ln_m,
            self.hyperparameters.lengthscale(),
            self.hyperparameters.noise_std()
        );

        Ok(FitSummary {
            history,
            stopped_early: false,
        })
    }

    fn roll_back(
        &mut self,
        last_good: Hyperparameters,
        err: GaussianProcessError,
    ) -> GaussianProcessError {
        warn!("{err}");
        self.hyperparameters = last_good;
        err
    }

    /// Prior distribution of the function at `xs`
    pub fn prior(
        &self,
        xs: &DMatrix<f64>,
    ) -> Result<Prediction, GaussianProcessError> {
        self.check_dimension(xs)?;
        let kernel = self.kernel(&self.hyperparameters)?;
        let mean = DVector::from_element(
            xs.nrows(),
            self.hyperparameters.mean_constant,
        );
        Ok(Prediction::new(
            mean,
            kernel.covariance(xs, xs),
            self.hyperparameters,
            self.options.confidence_z,
        ))
    }

    /// Posterior distribution of the function at `xs`
    ///
    /// ```text
    /// mean = c + K*ᵗ α
    /// v    = L⁻¹ K*
    /// cov  = K** − vᵗ v
    /// ```
    pub fn predict(
        &self,
        xs: &DMatrix<f64>,
    ) -> Result<Prediction, GaussianProcessError> {
        let fitted = self.fitted()?;
        self.check_dimension(xs)?;

        let kernel = self.kernel(&self.hyperparameters)?;
        let k_star = kernel.covariance(&self.x_train, xs);
        let mean = self.posterior_mean(&k_star, fitted);
        let v = self.whiten(&k_star, fitted)?;

        let mut cov = kernel.covariance(xs, xs) - v.tr_mul(&v);
        cov.fill_upper_triangle_with_lower_triangle();

        Ok(Prediction::new(
            mean,
            cov,
            self.hyperparameters,
            self.options.confidence_z,
        ))
    }

    /// Posterior mean and marginal variance at `xs`, without forming the
    /// joint covariance.
    pub fn predict_mean_and_variance(
        &self,
        xs: &DMatrix<f64>,
    ) -> Result<(DVector<f64>, DVector<f64>), GaussianProcessError> {
        let fitted = self.fitted()?;
        self.check_dimension(xs)?;

        let kernel = self.kernel(&self.hyperparameters)?;
        let k_star = kernel.covariance(&self.x_train, xs);
        let mean = self.posterior_mean(&k_star, fitted);
        let v = self.whiten(&k_star, fitted)?;

        let variance = DVector::from_iterator(
            xs.nrows(),
            kernel
                .diag(xs)
                .iter()
                .zip(v.column_iter())
                .map(|(k, col)| (k - col.norm_squared()).max(0.0)),
        );
        Ok((mean, variance))
    }

    fn fitted(&self) -> Result<&Fitted, GaussianProcessError> {
        self.fitted.as_ref().ok_or(GaussianProcessError::NotTrained)
    }

    fn posterior_mean(&self, k_star: &DMatrix<f64>, fitted: &Fitted) -> DVector<f64> {
        k_star
            .tr_mul(&fitted.alpha)
            .add_scalar(self.hyperparameters.mean_constant)
    }

    /// `L⁻¹ K*`
    fn whiten(
        &self,
        k_star: &DMatrix<f64>,
        fitted: &Fitted,
    ) -> Result<DMatrix<f64>, GaussianProcessError> {
        fitted
            .chol
            .l()
            .solve_lower_triangular(k_star)
            .ok_or_else(|| self.unstable(&self.hyperparameters, None))
    }

    fn check_dimension(
        &self,
        xs: &DMatrix<f64>,
    ) -> Result<(), GaussianProcessError> {
        if xs.ncols() == self.x_train.ncols() {
            Ok(())
        } else {
            Err(ConfigurationError::DimensionMismatch {
                expected: self.x_train.ncols(),
                given: xs.ncols(),
            }
            .into())
        }
    }

    fn kernel(
        &self,
        hyperparameters: &Hyperparameters,
    ) -> Result<RBFKernel, GaussianProcessError> {
        hyperparameters
            .kernel()
            .map_err(|_| self.unstable(hyperparameters, None))
    }

    fn unstable(
        &self,
        hyperparameters: &Hyperparameters,
        iteration: Option<usize>,
    ) -> GaussianProcessError {
        GaussianProcessError::NumericalInstability {
            iteration,
            hyperparameters: *hyperparameters,
        }
    }

    /// Log marginal likelihood, its gradient and the factorization behind
    /// them.
    fn evaluate(
        &self,
        hyperparameters: &Hyperparameters,
        iteration: Option<usize>,
    ) -> Result<Evaluation, GaussianProcessError> {
        let unstable = || self.unstable(hyperparameters, iteration);
        let kernel = hyperparameters
            .kernel()
            .map_err(|_| unstable())?;

        let n = self.n_train();
        let noise_variance = hyperparameters.noise_variance();
        let (k, k_grad) = kernel.covariance_with_gradient(&self.x_train);
        let a = k + DMatrix::from_diagonal_element(n, n, noise_variance);
        let chol = factorize(a).ok_or_else(unstable)?;

        let residual = self.y_train.add_scalar(-hyperparameters.mean_constant);
        let alpha = chol.solve(&residual);

        // GPML Equation 2.30
        let half_ln_det: f64 =
            chol.l_dirty().diagonal().iter().map(|d| d.ln()).sum();
        let ln_m = -0.5 * residual.dot(&alpha)
            - half_ln_det
            - n as f64 * HALF_LN_2PI;

        // GPML Equation 5.9: ½ tr((ααᵗ − A⁻¹) ∂A/∂θ). A⁻¹ ∂A/∂θ is solved
        // column by column through the factorization.
        let trace_term = |da: &DMatrix<f64>| {
            let data_fit = alpha.dot(&(da * &alpha));
            let complexity = chol.solve(da).trace();
            0.5 * (data_fit - complexity)
        };
        let d_lengthscale = trace_term(&k_grad);
        let d_noise = trace_term(&DMatrix::from_diagonal_element(
            n,
            n,
            2.0 * noise_variance,
        ));
        let grad = [d_lengthscale, d_noise, alpha.sum()];

        if !ln_m.is_finite() || grad.iter().any(|g| !g.is_finite()) {
            return Err(unstable());
        }

        Ok(Evaluation {
            ln_m,
            grad,
            fitted: Fitted { chol, alpha },
        })
    }
}

/// Cholesky factorization that also rejects zero or non-finite pivots
fn factorize(a: DMatrix<f64>) -> Option<Cholesky<f64, Dyn>> {
    let chol = Cholesky::new(a)?;
    chol.l_dirty()
        .diagonal()
        .iter()
        .all(|d| d.is_finite() && *d > 0.0)
        .then_some(chol)
}

fn non_finite(name: &str, index: usize) -> ConfigurationError {
    ConfigurationError::NonFiniteValue {
        name: name.to_string(),
        index,
    }
}
