#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use super::{ConfigurationError, Hyperparameters};

/// Options for building and training a
/// [`GaussianProcess`](super::GaussianProcess).
///
/// The initial values are given in natural space; they are converted to log
/// space when the model is built.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case", default))]
pub struct GaussianProcessOptions {
    /// Initial kernel lengthscale, > 0
    pub lengthscale_init: f64,
    /// Initial noise standard deviation, ≥ 0
    pub noise_init: f64,
    /// Initial constant mean
    pub mean_init: f64,
    /// Number of training iterations run by `fit`
    pub n_iterations: usize,
    /// Adam step size used by `fit`, > 0
    pub learning_rate: f64,
    /// Number of standard deviations spanned by confidence regions
    pub confidence_z: f64,
}

impl Default for GaussianProcessOptions {
    fn default() -> Self {
        Self {
            lengthscale_init: 1.0,
            noise_init: 1.0,
            mean_init: 0.0,
            n_iterations: 50,
            learning_rate: 0.1,
            confidence_z: 2.0,
        }
    }
}

impl GaussianProcessOptions {
    #[must_use]
    pub fn with_lengthscale_init(self, lengthscale_init: f64) -> Self {
        Self {
            lengthscale_init,
            ..self
        }
    }

    #[must_use]
    pub fn with_noise_init(self, noise_init: f64) -> Self {
        Self { noise_init, ..self }
    }

    #[must_use]
    pub fn with_mean_init(self, mean_init: f64) -> Self {
        Self { mean_init, ..self }
    }

    #[must_use]
    pub fn with_n_iterations(self, n_iterations: usize) -> Self {
        Self {
            n_iterations,
            ..self
        }
    }

    #[must_use]
    pub fn with_learning_rate(self, learning_rate: f64) -> Self {
        Self {
            learning_rate,
            ..self
        }
    }

    #[must_use]
    pub fn with_confidence_z(self, confidence_z: f64) -> Self {
        Self {
            confidence_z,
            ..self
        }
    }

    /// Check every option except the lengthscale, which the kernel checks.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        check("noise_init", self.noise_init, 0.0, true)?;
        check("learning_rate", self.learning_rate, 0.0, false)?;
        check("confidence_z", self.confidence_z, 0.0, true)?;
        if !self.mean_init.is_finite() {
            return Err(ConfigurationError::OptionOutOfBounds {
                name: "mean_init".to_string(),
                given: self.mean_init,
                bounds: (f64::NEG_INFINITY, f64::INFINITY),
            });
        }
        Ok(())
    }

    /// Starting hyperparameters in log space
    #[must_use]
    pub fn initial_hyperparameters(&self) -> Hyperparameters {
        Hyperparameters::from_natural(
            self.lengthscale_init,
            self.noise_init,
            self.mean_init,
        )
    }
}

fn check(
    name: &str,
    value: f64,
    lower: f64,
    inclusive: bool,
) -> Result<(), ConfigurationError> {
    let above = if inclusive {
        value >= lower
    } else {
        value > lower
    };
    if above && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigurationError::OptionOutOfBounds {
            name: name.to_string(),
            given: value,
            bounds: (lower, f64::INFINITY),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_log_space_zero() {
        let opts = GaussianProcessOptions::default();
        assert!(opts.validate().is_ok());
        assert_eq!(opts.n_iterations, 50);
        assert_eq!(opts.learning_rate, 0.1);
        assert_eq!(opts.confidence_z, 2.0);
        assert_eq!(opts.initial_hyperparameters(), Hyperparameters::default());
    }

    #[test]
    fn builders_set_fields() {
        let opts = GaussianProcessOptions::default()
            .with_lengthscale_init(0.3)
            .with_noise_init(0.0)
            .with_mean_init(1.5)
            .with_n_iterations(10)
            .with_learning_rate(0.01)
            .with_confidence_z(1.96);
        assert!(opts.validate().is_ok());
        assert_eq!(opts.n_iterations, 10);
        assert_eq!(opts.initial_hyperparameters().mean_constant, 1.5);
    }

    #[test]
    fn validate_rejects_out_of_range() {
        let bad = [
            GaussianProcessOptions::default().with_noise_init(-0.1),
            GaussianProcessOptions::default().with_learning_rate(0.0),
            GaussianProcessOptions::default().with_confidence_z(f64::NAN),
            GaussianProcessOptions::default().with_mean_init(f64::INFINITY),
        ];
        for opts in bad.iter() {
            assert!(matches!(
                opts.validate(),
                Err(ConfigurationError::OptionOutOfBounds { .. })
            ));
        }
    }
}
