use serde::{Serialize, Deserialize};

use crate::train::epoch_outcome::EpochOutcome;

/// Ranks epochs; higher is better.
pub trait ScoringFunction: Send {
    fn score(&self, outcome: &EpochOutcome) -> f64;
}

impl<F> ScoringFunction for F
where
    F: Fn(&EpochOutcome) -> f64 + Send,
{
    fn score(&self, outcome: &EpochOutcome) -> f64 {
        self(outcome)
    }
}

/// Built-in scoring rules, all negated losses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Scoring {
    /// Validation loss when there is one, otherwise total loss.
    #[default]
    Auto,
    NegValidationLoss,
    NegTrainingLoss,
    NegTotalLoss,
}

impl ScoringFunction for Scoring {
    fn score(&self, outcome: &EpochOutcome) -> f64 {
        match self {
            Scoring::Auto if outcome.validation_loss.is_finite() => -outcome.validation_loss,
            Scoring::Auto => -outcome.total_loss,
            Scoring::NegValidationLoss => -outcome.validation_loss,
            Scoring::NegTrainingLoss => -outcome.training_loss,
            Scoring::NegTotalLoss => -outcome.total_loss,
        }
    }
}
