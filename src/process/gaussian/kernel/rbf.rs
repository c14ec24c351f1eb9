use super::{e2_norm, KernelError};
use nalgebra::base::constraint::{SameNumberOfColumns, ShapeConstraint};
use nalgebra::base::storage::Storage;
use nalgebra::{DMatrix, DVector, Dim, Matrix};
use std::f64;

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

/// Radial-basis function (RBF) kernel, a.k.a. squared-exponential.
/// The distance metric here is L2 (Euclidean).
///
/// ```math
///     K(\mathbf{x}, \mathbf{x'}) = \exp\left(-\frac{\|\mathbf{x} - \mathbf{x'}\|^2}{2\ell^2}\right)
/// ```
///
/// # Parameters
/// * `length_scale` - Length scale, ℓ.
///
/// # Example
///
/// ```
/// use gpreg::process::gaussian::kernel::RBFKernel;
/// use nalgebra::DMatrix;
///
/// let kernel = RBFKernel::new(0.5).unwrap();
/// let xs = DMatrix::from_column_slice(3, 1, &[0.0, 0.5, 1.0]);
/// let cov = kernel.covariance(&xs, &xs);
///
/// assert_eq!(cov.shape(), (3, 3));
/// assert_eq!(cov[(1, 1)], 1.0);
/// assert!((cov[(0, 1)] - (-0.5_f64).exp()).abs() < 1E-12);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct RBFKernel {
    length_scale: f64,
}

impl RBFKernel {
    /// Create a new rbf kernel with the given length scale
    pub fn new(length_scale: f64) -> Result<Self, KernelError> {
        if length_scale <= 0.0 || !length_scale.is_finite() {
            Err(KernelError::ParameterOutOfBounds {
                name: "length_scale".to_string(),
                given: length_scale,
                bounds: (0.0, f64::INFINITY),
            })
        } else {
            Ok(Self { length_scale })
        }
    }

    /// The length scale, ℓ
    #[must_use]
    pub fn length_scale(&self) -> f64 {
        self.length_scale
    }

    /// Build a kernel from log-scale parameters
    pub fn reparameterize(&self, params: &[f64]) -> Result<Self, KernelError> {
        match params {
            [] => Err(KernelError::MissingParameters(1)),
            [value] => Self::new(value.exp()),
            _ => Err(KernelError::ExtraneousParameters(params.len() - 1)),
        }
    }

    /// Covariance between the rows of `x1` and the rows of `x2`
    pub fn covariance<R1, R2, C1, C2, S1, S2>(
        &self,
        x1: &Matrix<f64, R1, C1, S1>,
        x2: &Matrix<f64, R2, C2, S2>,
    ) -> DMatrix<f64>
    where
        R1: Dim,
        R2: Dim,
        C1: Dim,
        C2: Dim,
        S1: Storage<f64, R1, C1>,
        S2: Storage<f64, R2, C2>,
        ShapeConstraint: SameNumberOfColumns<C1, C2>,
    {
        DMatrix::from_fn(x1.nrows(), x2.nrows(), |i, j| {
            let d2 = e2_norm(&x1.row(i), &x2.row(j), self.length_scale);
            (-0.5 * d2).exp()
        })
    }

    /// Diagonal of `covariance(x, x)`
    pub fn diag<R, C, S>(&self, x: &Matrix<f64, R, C, S>) -> DVector<f64>
    where
        R: Dim,
        C: Dim,
        S: Storage<f64, R, C>,
    {
        DVector::repeat(x.nrows(), 1.0)
    }

    /// Covariance of `x` with itself along with its elementwise gradient with
    /// respect to `ln ℓ`.
    ///
    /// `∂K_ij/∂(ln ℓ) = K_ij · ‖x_i − x_j‖² / ℓ²`
    pub fn covariance_with_gradient<R, C, S>(
        &self,
        x: &Matrix<f64, R, C, S>,
    ) -> (DMatrix<f64>, DMatrix<f64>)
    where
        R: Dim,
        C: Dim,
        S: Storage<f64, R, C>,
    {
        let n = x.nrows();

        let mut dm = DMatrix::zeros(n, n);
        let mut grad = DMatrix::zeros(n, n);

        for i in 0..n {
            for j in 0..i {
                let d2 = e2_norm(&x.row(i), &x.row(j), self.length_scale);
                let cov_ij = (-0.5 * d2).exp();

                dm[(i, j)] = cov_ij;
                dm[(j, i)] = cov_ij;

                let dc_dl = d2 * cov_ij;
                grad[(i, j)] = dc_dl;
                grad[(j, i)] = dc_dl;
            }
            dm[(i, i)] = 1.0;
        }

        (dm, grad)
    }
}

impl Default for RBFKernel {
    fn default() -> Self {
        Self { length_scale: 1.0 }
    }
}
