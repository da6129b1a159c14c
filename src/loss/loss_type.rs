use serde::{Serialize, Deserialize};

use super::{
    BceLoss, CrossEntropyLoss, HingeLoss, HuberLoss, LogCoshLoss, LossFunction, MaeLoss,
    MseLoss, WeightedBceLoss,
};

/// Selects which loss function the training loop uses.
///
/// - `Mse`: Mean-squared error; pair with Identity or Sigmoid output.
/// - `CrossEntropy`: Categorical cross-entropy; pair with Softmax output.
///   The gradient is the combined Softmax+CE gradient (predicted - expected).
/// - `BinaryCrossEntropy`: Binary cross-entropy; pair with Sigmoid output.
/// - `WeightedBinaryCrossEntropy`: as above with per-class weights.
/// - `Mae`: Mean absolute error; pair with Identity output.
/// - `Huber`: Huber loss with threshold `delta`.
/// - `Hinge`: Hinge loss on {-1, +1} labels; pair with Identity or Tanh.
/// - `LogCosh`: log(cosh(error)); smooth, robust regression loss.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossType {
    Mse,
    CrossEntropy,
    BinaryCrossEntropy,
    WeightedBinaryCrossEntropy { positive_weight: f64, negative_weight: f64 },
    Mae,
    Huber { delta: f64 },
    Hinge,
    LogCosh,
}

impl LossType {
    pub fn build(&self) -> Box<dyn LossFunction> {
        match *self {
            LossType::Mse => Box::new(MseLoss),
            LossType::CrossEntropy => Box::new(CrossEntropyLoss),
            LossType::BinaryCrossEntropy => Box::new(BceLoss),
            LossType::WeightedBinaryCrossEntropy { positive_weight, negative_weight } => {
                Box::new(WeightedBceLoss::new(positive_weight, negative_weight))
            }
            LossType::Mae => Box::new(MaeLoss),
            LossType::Huber { delta } => Box::new(HuberLoss::new(delta)),
            LossType::Hinge => Box::new(HingeLoss),
            LossType::LogCosh => Box::new(LogCoshLoss),
        }
    }
}

impl Default for LossType {
    fn default() -> Self {
        LossType::Mse
    }
}
