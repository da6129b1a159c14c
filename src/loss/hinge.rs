use crate::math::matrix::Matrix;
use super::{check_shapes, LossFunction};

/// Hinge loss for labels in {-1, +1}.
#[derive(Debug, Clone, Copy, Default)]
pub struct HingeLoss;

impl LossFunction for HingeLoss {
    /// mean(max(0, 1 - y·p))
    fn loss(&self, predicted: &Matrix, expected: &Matrix) -> f64 {
        check_shapes(predicted, expected);
        predicted.zip_map(expected, |p, y| (1.0 - y * p).max(0.0)).mean()
    }

    /// -y / outputs where the margin is violated, else 0.
    fn gradient(&self, predicted: &Matrix, expected: &Matrix) -> Matrix {
        check_shapes(predicted, expected);
        let n = predicted.rows as f64;
        predicted.zip_map(expected, |p, y| if 1.0 - y * p > 0.0 { -y / n } else { 0.0 })
    }
}
