use serde::{Serialize, Deserialize};

/// What one epoch of training produced.
///
/// Every configured `EpochListener` receives one of these at the end of
/// each completed epoch, and scoring functions rank epochs by it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochOutcome {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Mean training loss over the epoch's batches.
    pub training_loss: f64,
    /// Loss on the validation set, NaN when none is configured.
    pub validation_loss: f64,
    /// Sum of every layer's regularization penalty after the update.
    pub regularization_penalty: f64,
    /// `training_loss + regularization_penalty`.
    pub total_loss: f64,
}

impl EpochOutcome {
    pub fn new(
        epoch: usize,
        training_loss: f64,
        validation_loss: f64,
        regularization_penalty: f64,
    ) -> EpochOutcome {
        EpochOutcome {
            epoch,
            training_loss,
            validation_loss,
            regularization_penalty,
            total_loss: training_loss + regularization_penalty,
        }
    }

    pub fn has_validation(&self) -> bool {
        !self.validation_loss.is_nan()
    }
}
