//! Re-imports for convenience
#[doc(no_inline)]
pub use crate::optim::{Adam, GradientDescent, Optimizer};
#[doc(no_inline)]
pub use crate::process::gaussian::kernel::RBFKernel;
#[doc(no_inline)]
pub use crate::process::gaussian::{
    FitProgress, FitSummary, GaussianProcess, GaussianProcessError,
    GaussianProcessOptions, Hyperparameters, Prediction,
};
