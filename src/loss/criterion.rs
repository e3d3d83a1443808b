use crate::error::Result;
use crate::math::matrix::Matrix;

/// A scalar training objective over one batch.
///
/// `outputs` holds one row of network outputs per example, `targets` the
/// matching class indices.
pub trait Criterion {
    fn loss(&self, outputs: &Matrix, targets: &[usize]) -> Result<f64>;

    /// ∂loss/∂outputs with the same shape as `outputs`.
    fn gradient(&self, outputs: &Matrix, targets: &[usize]) -> Result<Matrix>;
}
