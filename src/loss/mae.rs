use crate::math::matrix::Matrix;
use super::{check_shapes, LossFunction};

#[derive(Debug, Clone, Copy, Default)]
pub struct MaeLoss;

impl LossFunction for MaeLoss {
    /// mean(|predicted - expected|)
    fn loss(&self, predicted: &Matrix, expected: &Matrix) -> f64 {
        check_shapes(predicted, expected);
        predicted.zip_map(expected, |p, y| (p - y).abs()).mean()
    }

    /// Subgradient sign(p - y) / outputs, 0 when equal.
    fn gradient(&self, predicted: &Matrix, expected: &Matrix) -> Matrix {
        check_shapes(predicted, expected);
        let n = predicted.rows as f64;
        predicted.zip_map(expected, |p, y| {
            let diff = p - y;
            if diff > 0.0 { 1.0 / n } else if diff < 0.0 { -1.0 / n } else { 0.0 }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loss::testing::assert_gradient_matches;

    #[test]
    fn gradient_is_derivative_of_loss() {
        let p = Matrix::from_data(vec![vec![0.3, -1.2, 0.8], vec![2.0, 0.1, -0.4]]);
        let y = Matrix::from_data(vec![vec![0.0, 1.0, 1.0], vec![1.5, 0.0, 0.0]]);
        assert_gradient_matches(&MaeLoss, &p, &y);
    }

    #[test]
    fn gradient_is_zero_on_exact_match() {
        let y = Matrix::column(&[1.0, 2.0]);
        assert_eq!(MaeLoss.gradient(&y, &y), Matrix::zeros(2, 1));
    }
}
