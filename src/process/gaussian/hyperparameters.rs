#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use super::kernel::{KernelError, RBFKernel};

/// Trainable state of a [`GaussianProcess`](super::GaussianProcess).
///
/// Lengthscale and noise are kept in log space so that any real value maps
/// to a positive lengthscale and a non-negative noise variance. The parameter
/// order used by optimizers and gradients is
/// `[log_lengthscale, log_noise, mean_constant]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct Hyperparameters {
    /// ln ℓ
    pub log_lengthscale: f64,
    /// ln σ, where σ is the observation noise standard deviation
    pub log_noise: f64,
    /// Constant prior mean
    pub mean_constant: f64,
}

impl Hyperparameters {
    /// Number of scalar hyperparameters
    pub const N_PARAMETERS: usize = 3;

    #[must_use]
    pub fn new(log_lengthscale: f64, log_noise: f64, mean_constant: f64) -> Self {
        Self {
            log_lengthscale,
            log_noise,
            mean_constant,
        }
    }

    /// From a lengthscale, a noise standard deviation and a mean.
    ///
    /// A zero `noise_std` gives `log_noise = -∞`, i.e. noise-free.
    #[must_use]
    pub fn from_natural(lengthscale: f64, noise_std: f64, mean: f64) -> Self {
        Self::new(lengthscale.ln(), noise_std.ln(), mean)
    }

    #[must_use]
    pub fn lengthscale(&self) -> f64 {
        self.log_lengthscale.exp()
    }

    #[must_use]
    pub fn noise_std(&self) -> f64 {
        self.log_noise.exp()
    }

    /// σ² = exp(2 ln σ)
    #[must_use]
    pub fn noise_variance(&self) -> f64 {
        (2.0 * self.log_noise).exp()
    }

    /// The RBF kernel for the current lengthscale
    pub fn kernel(&self) -> Result<RBFKernel, KernelError> {
        RBFKernel::default().reparameterize(&[self.log_lengthscale])
    }

    #[must_use]
    pub fn to_array(&self) -> [f64; 3] {
        [self.log_lengthscale, self.log_noise, self.mean_constant]
    }
}

impl From<[f64; 3]> for Hyperparameters {
    fn from([log_lengthscale, log_noise, mean_constant]: [f64; 3]) -> Self {
        Self::new(log_lengthscale, log_noise, mean_constant)
    }
}

impl From<Hyperparameters> for [f64; 3] {
    fn from(h: Hyperparameters) -> Self {
        h.to_array()
    }
}
