use std::f64::consts::LN_2;

use crate::math::matrix::Matrix;
use super::{check_shapes, LossFunction};

#[derive(Debug, Clone, Copy, Default)]
pub struct LogCoshLoss;

/// log(cosh(x)) without overflowing cosh for large |x|.
fn log_cosh(x: f64) -> f64 {
    let a = x.abs();
    a + (-2.0 * a).exp().ln_1p() - LN_2
}

impl LossFunction for LogCoshLoss {
    /// mean(log(cosh(predicted - expected)))
    fn loss(&self, predicted: &Matrix, expected: &Matrix) -> f64 {
        check_shapes(predicted, expected);
        predicted.zip_map(expected, |p, y| log_cosh(p - y)).mean()
    }

    /// tanh(predicted - expected) / outputs
    fn gradient(&self, predicted: &Matrix, expected: &Matrix) -> Matrix {
        check_shapes(predicted, expected);
        let n = predicted.rows as f64;
        predicted.zip_map(expected, |p, y| (p - y).tanh() / n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loss::testing::assert_gradient_matches;
    use approx::assert_relative_eq;

    #[test]
    fn stable_form_matches_definition() {
        for &x in &[-3.0_f64, -0.5, 0.0, 0.25, 4.0] {
            assert_relative_eq!(log_cosh(x), x.cosh().ln(), epsilon = 1e-12);
        }
        assert!(log_cosh(1000.0).is_finite());
    }

    #[test]
    fn gradient_is_derivative_of_loss() {
        let p = Matrix::from_data(vec![vec![0.3, -1.2, 0.8], vec![2.0, 0.1, -0.4]]);
        let y = Matrix::from_data(vec![vec![0.0, 1.0, 1.0], vec![1.5, 0.0, 0.0]]);
        assert_gradient_matches(&LogCoshLoss, &p, &y);
    }
}
