use crate::activation::activation::ActivationFunction;
use crate::math::matrix::Matrix;
use super::{check_shapes, LossFunction};

/// Predictions are clamped to [EPS, 1 - EPS] before taking logs.
const EPS: f64 = 1e-7;

/// Binary cross-entropy over a Sigmoid output.
#[derive(Debug, Clone, Copy, Default)]
pub struct BceLoss;

impl LossFunction for BceLoss {
    /// -mean(y·log(p) + (1-y)·log(1-p)) with p clamped
    fn loss(&self, predicted: &Matrix, expected: &Matrix) -> f64 {
        WeightedBceLoss::new(1.0, 1.0).loss(predicted, expected)
    }

    /// (p - y) / outputs, taken at the sigmoid's logits.
    fn gradient(&self, predicted: &Matrix, expected: &Matrix) -> Matrix {
        WeightedBceLoss::new(1.0, 1.0).gradient(predicted, expected)
    }

    fn fused_activation(&self) -> Option<ActivationFunction> {
        Some(ActivationFunction::Sigmoid)
    }
}

/// Binary cross-entropy with separate weights for positive and negative
/// labels, for imbalanced classes.
#[derive(Debug, Clone, Copy)]
pub struct WeightedBceLoss {
    pub positive_weight: f64,
    pub negative_weight: f64,
}

impl WeightedBceLoss {
    pub fn new(positive_weight: f64, negative_weight: f64) -> WeightedBceLoss {
        WeightedBceLoss { positive_weight, negative_weight }
    }
}

impl LossFunction for WeightedBceLoss {
    fn loss(&self, predicted: &Matrix, expected: &Matrix) -> f64 {
        check_shapes(predicted, expected);
        let (wp, wn) = (self.positive_weight, self.negative_weight);
        predicted
            .zip_map(expected, |p, y| {
                let p = p.clamp(EPS, 1.0 - EPS);
                -(wp * y * p.ln() + wn * (1.0 - y) * (1.0 - p).ln())
            })
            .mean()
    }

    /// ∂L/∂z = wn·(1-y)·p - wp·y·(1-p), per output, where p = σ(z).
    ///
    /// Taken at the logits so the step stays proportional to the error
    /// even when the sigmoid saturates.
    fn gradient(&self, predicted: &Matrix, expected: &Matrix) -> Matrix {
        check_shapes(predicted, expected);
        let (wp, wn) = (self.positive_weight, self.negative_weight);
        let n = predicted.rows as f64;
        predicted.zip_map(expected, |p, y| (wn * (1.0 - y) * p - wp * y * (1.0 - p)) / n)
    }

    fn fused_activation(&self) -> Option<ActivationFunction> {
        Some(ActivationFunction::Sigmoid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn logits() -> (Matrix, Matrix) {
        let z = Matrix::from_data(vec![vec![-1.5, 0.3, 2.2, -0.1], vec![0.8, -2.0, 0.05, 1.4]]);
        let y = Matrix::from_data(vec![vec![0.0, 1.0, 0.0, 1.0], vec![1.0, 1.0, 0.0, 0.0]]);
        (z, y)
    }

    /// Compares against a finite difference of the loss through a sigmoid,
    /// scaled by the batch size.
    fn assert_logit_gradient(loss: &dyn LossFunction) {
        let (z, y) = logits();
        let sigmoid = ActivationFunction::Sigmoid;
        let analytic = loss.gradient(&sigmoid.apply(&z), &y);
        let h = 1e-6;
        for r in 0..z.rows {
            for c in 0..z.cols {
                let bump = |d: f64| z.map_indexed(|i, j, v| if i == r && j == c { v + d } else { v });
                let numeric = (loss.loss(&sigmoid.apply(&bump(h)), &y)
                    - loss.loss(&sigmoid.apply(&bump(-h)), &y)) / (2.0 * h);
                assert_abs_diff_eq!(analytic.value_at(r, c) / z.cols as f64, numeric, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn gradient_is_derivative_at_the_logits() {
        assert_logit_gradient(&BceLoss);
        assert_logit_gradient(&WeightedBceLoss::new(3.0, 0.5));
    }

    #[test]
    fn unweighted_gradient_is_prediction_minus_label() {
        let p = Matrix::row(&[0.2, 0.7, 0.9]);
        let y = Matrix::row(&[0.0, 1.0, 1.0]);
        assert!(BceLoss.gradient(&p, &y).approx_eq(&(&p - &y), 1e-15));
        assert_eq!(BceLoss.fused_activation(), Some(ActivationFunction::Sigmoid));
    }

    #[test]
    fn saturated_predictions_keep_a_full_gradient() {
        let p = Matrix::row(&[0.0, 1.0]);
        let y = Matrix::row(&[1.0, 0.0]);
        assert!(BceLoss.loss(&p, &y).is_finite());
        assert_eq!(BceLoss.gradient(&p, &y), Matrix::row(&[-1.0, 1.0]));
    }

    #[test]
    fn unit_weights_match_plain_bce() {
        let p = Matrix::from_data(vec![vec![0.2, 0.7, 0.9, 0.45]]);
        let y = Matrix::from_data(vec![vec![0.0, 1.0, 0.0, 1.0]]);
        assert_abs_diff_eq!(
            WeightedBceLoss::new(1.0, 1.0).loss(&p, &y),
            BceLoss.loss(&p, &y),
            epsilon = 1e-15
        );
        assert!(WeightedBceLoss::new(2.0, 1.0).loss(&p, &y) > BceLoss.loss(&p, &y));
    }
}
