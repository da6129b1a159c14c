use std::sync::mpsc;

use log::info;

use crate::train::epoch_outcome::EpochOutcome;

/// Observes finished epochs. Listeners cannot influence training.
pub trait EpochListener: Send {
    fn on_epoch(&mut self, outcome: &EpochOutcome);
}

impl<F> EpochListener for F
where
    F: FnMut(&EpochOutcome) + Send,
{
    fn on_epoch(&mut self, outcome: &EpochOutcome) {
        self(outcome)
    }
}

/// Forwards outcomes over a channel. A dropped receiver is ignored; it
/// does not end the run.
impl EpochListener for mpsc::Sender<EpochOutcome> {
    fn on_epoch(&mut self, outcome: &EpochOutcome) {
        let _ = self.send(*outcome);
    }
}

/// Logs each outcome at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingListener;

impl EpochListener for LoggingListener {
    fn on_epoch(&mut self, outcome: &EpochOutcome) {
        if outcome.has_validation() {
            info!(
                "epoch {:>5}  loss {:.6}  val {:.6}  penalty {:.6}",
                outcome.epoch, outcome.training_loss, outcome.validation_loss,
                outcome.regularization_penalty
            );
        } else {
            info!(
                "epoch {:>5}  loss {:.6}  penalty {:.6}",
                outcome.epoch, outcome.training_loss, outcome.regularization_penalty
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_ignores_a_dropped_receiver() {
        let (mut tx, rx) = mpsc::channel();
        let outcome = EpochOutcome::new(1, 0.5, f64::NAN, 0.0);
        tx.on_epoch(&outcome);
        assert_eq!(rx.recv().unwrap().epoch, 1);
        drop(rx);
        tx.on_epoch(&outcome);
    }

    #[test]
    fn closures_listen() {
        let mut seen = Vec::new();
        {
            let mut record = |o: &EpochOutcome| seen.push(o.epoch);
            record.on_epoch(&EpochOutcome::new(2, 0.0, f64::NAN, 0.0));
        }
        assert_eq!(seen, vec![2]);
    }
}
