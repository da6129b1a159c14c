pub mod mse;
pub mod mae;
pub mod bce;
pub mod cross_entropy;
pub mod huber;
pub mod hinge;
pub mod log_cosh;
pub mod loss_type;

pub use mse::MseLoss;
pub use mae::MaeLoss;
pub use bce::{BceLoss, WeightedBceLoss};
pub use cross_entropy::CrossEntropyLoss;
pub use huber::HuberLoss;
pub use hinge::HingeLoss;
pub use log_cosh::LogCoshLoss;
pub use loss_type::LossType;

use crate::activation::activation::ActivationFunction;
use crate::math::matrix::Matrix;

/// A differentiable loss over a batch of predictions.
///
/// Both matrices are `outputs x samples`. `loss` is the mean over the batch;
/// `gradient` is the derivative of one sample's loss with respect to its
/// predictions (or its logits, see `fused_activation`), column by column.
/// The dense layer divides by the batch size, so the pair together is the
/// exact derivative of `loss`.
pub trait LossFunction: Send + Sync {
    fn loss(&self, predicted: &Matrix, expected: &Matrix) -> f64;

    fn gradient(&self, predicted: &Matrix, expected: &Matrix) -> Matrix;

    /// Output activation whose derivative `gradient` already includes.
    /// When set, `gradient` is taken at that layer's pre-activations and the
    /// output layer must pass it through untouched.
    fn fused_activation(&self) -> Option<ActivationFunction> {
        None
    }
}

/// Guards the element-wise losses against mismatched label shapes.
pub(crate) fn check_shapes(predicted: &Matrix, expected: &Matrix) {
    assert_eq!(
        predicted.shape(),
        expected.shape(),
        "predictions and labels must share a shape"
    );
}
