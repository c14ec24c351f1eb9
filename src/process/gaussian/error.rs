use std::fmt;

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use super::kernel::KernelError;
use super::Hyperparameters;

/// Problems with the training data or options, found at construction
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub enum ConfigurationError {
    /// No training points were given
    EmptyDataset,
    /// The number of inputs and targets differ
    LengthMismatch {
        /// Number of input rows
        n_x: usize,
        /// Number of targets
        n_y: usize,
    },
    /// Inputs have no columns
    ZeroDimensional,
    /// Points do not have the dimension of the training inputs
    DimensionMismatch {
        /// Dimension of the training inputs
        expected: usize,
        /// Dimension given
        given: usize,
    },
    /// An input or target is NaN or infinite
    NonFiniteValue {
        /// `"x"` or `"y"`
        name: String,
        /// Row of the offending value
        index: usize,
    },
    /// An option is outside of its admissible range
    OptionOutOfBounds {
        /// Name of the option
        name: String,
        /// Value given
        given: f64,
        /// Lower and upper bounds on value
        bounds: (f64, f64),
    },
    /// The initial kernel could not be built
    Kernel(KernelError),
}

impl std::error::Error for ConfigurationError {}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDataset => write!(f, "the training set is empty"),
            Self::LengthMismatch { n_x, n_y } => write!(
                f,
                "{n_x} training inputs were given but {n_y} targets"
            ),
            Self::ZeroDimensional => {
                write!(f, "training inputs must have at least one column")
            }
            Self::DimensionMismatch { expected, given } => write!(
                f,
                "points must have dimension {expected}, given: {given}"
            ),
            Self::NonFiniteValue { name, index } => {
                write!(f, "{name}[{index}] is not finite")
            }
            Self::OptionOutOfBounds {
                name,
                given,
                bounds,
            } => write!(
                f,
                "option {} is out of bounds [{}, {}], given: {}",
                name, bounds.0, bounds.1, given
            ),
            Self::Kernel(e) => write!(f, "invalid initial kernel: {e}"),
        }
    }
}

impl From<KernelError> for ConfigurationError {
    fn from(e: KernelError) -> Self {
        Self::Kernel(e)
    }
}

/// Errors from fitting or predicting with a
/// [`GaussianProcess`](super::GaussianProcess)
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub enum GaussianProcessError {
    /// Malformed training data or options
    Configuration(ConfigurationError),
    /// A prediction was requested before a successful fit
    NotTrained,
    /// The covariance could not be factorized, or the likelihood or its
    /// gradient was not finite
    NumericalInstability {
        /// Training iteration (1-based), `None` outside of the training loop
        iteration: Option<usize>,
        /// Hyperparameters at which the failure happened
        hyperparameters: Hyperparameters,
    },
    /// The L-BFGS driver failed
    #[cfg(feature = "lbfgs")]
    Optimization(String),
}

impl std::error::Error for GaussianProcessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Configuration(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for GaussianProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(e) => write!(f, "configuration error: {e}"),
            Self::NotTrained => {
                write!(f, "the model must be fit before it can predict")
            }
            Self::NumericalInstability {
                iteration,
                hyperparameters: h,
            } => {
                write!(f, "covariance is not positive definite")?;
                if let Some(i) = iteration {
                    write!(f, " at iteration {i}")?;
                }
                write!(
                    f,
                    " (log_lengthscale: {}, log_noise: {}, mean_constant: {}). \
                     Try a larger noise floor or remove duplicate inputs.",
                    h.log_lengthscale, h.log_noise, h.mean_constant
                )
            }
            #[cfg(feature = "lbfgs")]
            Self::Optimization(msg) => write!(f, "optimization failed: {msg}"),
        }
    }
}

impl From<ConfigurationError> for GaussianProcessError {
    fn from(e: ConfigurationError) -> Self {
        Self::Configuration(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instability_message_carries_context() {
        let err = GaussianProcessError::NumericalInstability {
            iteration: Some(7),
            hyperparameters: Hyperparameters::new(-1.25, 0.5, 0.0),
        };
        let msg = err.to_string();
        assert!(msg.contains("iteration 7"));
        assert!(msg.contains("log_lengthscale: -1.25"));
    }

    #[test]
    fn configuration_errors_convert_and_chain() {
        use std::error::Error;

        let err: GaussianProcessError =
            ConfigurationError::LengthMismatch { n_x: 3, n_y: 2 }.into();
        assert!(err.source().is_some());
        assert_eq!(
            err.to_string(),
            "configuration error: 3 training inputs were given but 2 targets"
        );
    }
}
