use nalgebra::base::constraint::{
    SameNumberOfColumns, SameNumberOfRows, ShapeConstraint,
};
use nalgebra::base::storage::Storage;
use nalgebra::{Dim, Matrix};

/// Squared Euclidean distance between `m1` and `m2` after dividing both by
/// `scale`.
#[inline]
pub fn e2_norm<R1, C1, S1, R2, C2, S2>(
    m1: &Matrix<f64, R1, C1, S1>,
    m2: &Matrix<f64, R2, C2, S2>,
    scale: f64,
) -> f64
where
    R1: Dim,
    C1: Dim,
    S1: Storage<f64, R1, C1>,
    R2: Dim,
    C2: Dim,
    S2: Storage<f64, R2, C2>,
    ShapeConstraint: SameNumberOfRows<R1, R2> + SameNumberOfColumns<C1, C2>,
{
    m1.zip_fold(m2, 0.0, |acc, a, b| {
        let diff = (a - b) / scale;
        acc + diff * diff
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::RowDVector;

    #[test]
    fn scaled_squared_distance() {
        let a = RowDVector::from_row_slice(&[1.0, 2.0]);
        let b = RowDVector::from_row_slice(&[3.0, 5.0]);
        assert::close(e2_norm(&a, &b, 1.0), 13.0, 1E-12);
        assert::close(e2_norm(&a, &b, 2.0), 13.0 / 4.0, 1E-12);
        assert::close(e2_norm(&a, &a, 0.5), 0.0, 1E-12);
    }
}
