use crate::math::matrix::Matrix;
use super::{check_shapes, LossFunction};

#[derive(Debug, Clone, Copy)]
pub struct HuberLoss {
    pub delta: f64,
}

impl HuberLoss {
    pub fn new(delta: f64) -> HuberLoss {
        HuberLoss { delta }
    }
}

impl Default for HuberLoss {
    fn default() -> Self {
        HuberLoss { delta: 1.0 }
    }
}

impl LossFunction for HuberLoss {
    /// Scalar Huber: mean(h(predicted − expected))
    /// where h(x) = 0.5·x²  if |x| ≤ δ
    ///              δ·(|x| − 0.5·δ)  otherwise
    fn loss(&self, predicted: &Matrix, expected: &Matrix) -> f64 {
        check_shapes(predicted, expected);
        let delta = self.delta;
        predicted
            .zip_map(expected, |p, y| {
                let x = p - y;
                if x.abs() <= delta {
                    0.5 * x * x
                } else {
                    delta * (x.abs() - 0.5 * delta)
                }
            })
            .mean()
    }

    /// x / outputs if |x| ≤ δ, else δ·sign(x) / outputs
    fn gradient(&self, predicted: &Matrix, expected: &Matrix) -> Matrix {
        check_shapes(predicted, expected);
        let delta = self.delta;
        let n = predicted.rows as f64;
        predicted.zip_map(expected, |p, y| {
            let x = p - y;
            if x.abs() <= delta { x / n } else { delta * x.signum() / n }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loss::testing::assert_gradient_matches;
    use approx::assert_relative_eq;

    #[test]
    fn quadratic_inside_linear_outside() {
        let y = Matrix::row(&[0.0]);
        let huber = HuberLoss::new(1.0);
        assert_relative_eq!(huber.loss(&Matrix::row(&[0.5]), &y), 0.125);
        assert_relative_eq!(huber.loss(&Matrix::row(&[3.0]), &y), 2.5);
    }

    #[test]
    fn gradient_is_derivative_of_loss() {
        let p = Matrix::from_data(vec![vec![0.3, -2.2, 0.8], vec![2.0, 0.1, -0.4]]);
        let y = Matrix::from_data(vec![vec![0.0, 1.0, 1.0], vec![0.5, 0.0, 0.0]]);
        assert_gradient_matches(&HuberLoss::new(0.7), &p, &y);
    }
}
