use crate::activation::activation::ActivationFunction;
use crate::math::matrix::Matrix;
use super::{check_shapes, LossFunction};

/// Small epsilon clamp inside log() to prevent log(0) = -inf.
const EPS: f64 = 1e-12;

/// Categorical cross-entropy for use with a Softmax output layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossEntropyLoss;

impl LossFunction for CrossEntropyLoss {
    /// Per column -sum(expected · log(predicted)), averaged over columns.
    ///
    /// `predicted` holds softmax probabilities and `expected` one-hot (or
    /// soft) targets, one sample per column.
    fn loss(&self, predicted: &Matrix, expected: &Matrix) -> f64 {
        check_shapes(predicted, expected);
        let total: f64 = predicted
            .zip_map(expected, |p, e| -e * p.clamp(EPS, 1.0 - EPS).ln())
            .sum();
        total / predicted.cols as f64
    }

    /// Gradient of the combined Softmax + cross-entropy with respect to the
    /// pre-softmax logits:
    ///   ∂L/∂z_i = predicted[i] - expected[i]
    ///
    /// The Softmax derivative is identity (1.0) so the combined gradient
    /// is not double-applied.
    fn gradient(&self, predicted: &Matrix, expected: &Matrix) -> Matrix {
        check_shapes(predicted, expected);
        predicted - expected
    }

    fn fused_activation(&self) -> Option<ActivationFunction> {
        Some(ActivationFunction::Softmax)
    }
}
