use nalgebra::linalg::Cholesky;
use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::StandardNormal;

use super::{GaussianProcessError, Hyperparameters};

/// Jitter added to the diagonal before factorizing a posterior covariance
/// for sampling; grown tenfold on each failed attempt.
const SAMPLE_JITTER: f64 = 1E-10;
const SAMPLE_JITTER_ATTEMPTS: usize = 6;

/// Distribution over function values at a set of test points.
///
/// Produced by [`GaussianProcess::predict`](super::GaussianProcess::predict)
/// (posterior) and [`GaussianProcess::prior`](super::GaussianProcess::prior).
#[derive(Clone, Debug, PartialEq)]
pub struct Prediction {
    /// Mean at each test point
    mean: DVector<f64>,
    /// Joint covariance of the test points
    cov: DMatrix<f64>,
    /// Hyperparameters the distribution was computed with
    hyperparameters: Hyperparameters,
    /// Default width of confidence regions
    confidence_z: f64,
}

impl Prediction {
    pub(super) fn new(
        mean: DVector<f64>,
        cov: DMatrix<f64>,
        hyperparameters: Hyperparameters,
        confidence_z: f64,
    ) -> Self {
        Self {
            mean,
            cov,
            hyperparameters,
            confidence_z,
        }
    }

    /// Number of test points
    #[must_use]
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// Return the mean of the posterior
    #[must_use]
    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    /// Return the covariance of the posterior
    #[must_use]
    pub fn cov(&self) -> &DMatrix<f64> {
        &self.cov
    }

    /// Marginal variance of the latent function at each test point.
    ///
    /// Round-off can leave tiny negative values on the diagonal, those are
    /// clamped to zero.
    #[must_use]
    pub fn variance(&self) -> DVector<f64> {
        self.cov.diagonal().map(|v| v.max(0.0))
    }

    /// Return the standard deviation of the posterior
    #[must_use]
    pub fn std(&self) -> DVector<f64> {
        self.variance().map(f64::sqrt)
    }

    /// Marginal variance of a new noisy observation at each test point
    #[must_use]
    pub fn observation_variance(&self) -> DVector<f64> {
        self.variance()
            .add_scalar(self.hyperparameters.noise_variance())
    }

    /// `(mean - z·std, mean + z·std)` at each test point
    #[must_use]
    pub fn confidence_region(&self, z: f64) -> (DVector<f64>, DVector<f64>) {
        let half_width = self.std() * z;
        (&self.mean - &half_width, &self.mean + &half_width)
    }

    /// [`confidence_region`](Self::confidence_region) at the configured
    /// number of standard deviations
    #[must_use]
    pub fn confidence_region_default(&self) -> (DVector<f64>, DVector<f64>) {
        self.confidence_region(self.confidence_z)
    }

    /// Hyperparameters the prediction was made with
    #[must_use]
    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyperparameters
    }

    /// Draw a single function sample at the test points
    pub fn draw<R: Rng>(
        &self,
        rng: &mut R,
    ) -> Result<DVector<f64>, GaussianProcessError> {
        let l = self.sampling_factor()?;
        Ok(self.draw_with(&l, rng))
    }

    /// Draw `size` function samples at the test points
    pub fn sample<R: Rng>(
        &self,
        size: usize,
        rng: &mut R,
    ) -> Result<Vec<DVector<f64>>, GaussianProcessError> {
        let l = self.sampling_factor()?;
        Ok((0..size).map(|_| self.draw_with(&l, rng)).collect())
    }

    fn draw_with<R: Rng>(&self, l: &DMatrix<f64>, rng: &mut R) -> DVector<f64> {
        let z: DVector<f64> =
            DVector::from_fn(self.len(), |_, _| rng.sample(StandardNormal));
        &self.mean + l * z
    }

    fn sampling_factor(&self) -> Result<DMatrix<f64>, GaussianProcessError> {
        let m = self.len();
        let mut jitter = SAMPLE_JITTER;
        for _ in 0..SAMPLE_JITTER_ATTEMPTS {
            let jittered = &self.cov + DMatrix::from_diagonal_element(m, m, jitter);
            if let Some(chol) = Cholesky::new(jittered) {
                return Ok(chol.unpack());
            }
            jitter *= 10.0;
        }
        Err(GaussianProcessError::NumericalInstability {
            iteration: None,
            hyperparameters: self.hyperparameters,
        })
    }
}
