use crate::math::matrix::Matrix;
use super::{check_shapes, LossFunction};

#[derive(Debug, Clone, Copy, Default)]
pub struct MseLoss;

impl LossFunction for MseLoss {
    /// mean((predicted - expected)²) over every entry.
    fn loss(&self, predicted: &Matrix, expected: &Matrix) -> f64 {
        check_shapes(predicted, expected);
        predicted.zip_map(expected, |a, b| (a - b).powi(2)).mean()
    }

    /// 2·(predicted - expected) / outputs
    fn gradient(&self, predicted: &Matrix, expected: &Matrix) -> Matrix {
        check_shapes(predicted, expected);
        let n = predicted.rows as f64;
        predicted.zip_map(expected, |a, b| 2.0 * (a - b) / n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loss::testing::assert_gradient_matches;
    use approx::assert_relative_eq;

    #[test]
    fn loss_is_mean_squared_difference() {
        let p = Matrix::from_data(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        let y = Matrix::from_data(vec![vec![0.0, 2.0], vec![1.0, 4.0]]);
        assert_relative_eq!(MseLoss.loss(&p, &y), 5.0 / 4.0);
        assert_eq!(MseLoss.loss(&y, &y), 0.0);
    }

    #[test]
    fn gradient_is_derivative_of_loss() {
        let p = Matrix::from_data(vec![vec![0.3, -1.2, 0.8], vec![2.0, 0.1, -0.4]]);
        let y = Matrix::from_data(vec![vec![0.0, 1.0, 1.0], vec![1.5, 0.0, 0.0]]);
        assert_gradient_matches(&MseLoss, &p, &y);
    }
}
