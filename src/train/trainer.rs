use log::{debug, info, warn};
use rand_chacha::ChaCha8Rng;

use crate::data::dataset::Dataset;
use crate::error::{NnError, Result};
use crate::layers::trainer::{Backward, LayerTrainer};
use crate::loss::LossFunction;
use crate::math::matrix::Matrix;
use crate::network::network::Network;
use crate::train::epoch_outcome::EpochOutcome;
use crate::train::executor::{BatchExecutor, FullBatch, TrainingResult};
use crate::train::listener::EpochListener;
use crate::train::scoring::{Scoring, ScoringFunction};
use crate::train::stopping::{MaxEpoch, StoppingAdvisor};

/// The network kept at the best-scoring epoch, plus the run's history.
#[derive(Debug, Clone)]
pub struct TrainedNetwork {
    pub network: Network,
    /// Epoch whose parameters `network` holds.
    pub best_epoch: usize,
    pub best_score: f64,
    /// Every epoch's outcome, in order.
    pub history: Vec<EpochOutcome>,
}

/// Drives layer trainers through epochs until a stopping advisor fires.
///
/// Each epoch runs the executor's forward/backward passes against a fixed
/// set of parameters, applies the aggregated updates once, then scores the
/// result. The inference network of the best-scoring epoch is what `train`
/// returns.
pub struct NetworkTrainer {
    layers: Vec<Box<dyn LayerTrainer>>,
    loss: Box<dyn LossFunction>,
    executor: Box<dyn BatchExecutor>,
    stopping: Box<dyn StoppingAdvisor>,
    scoring: Box<dyn ScoringFunction>,
    listeners: Vec<Box<dyn EpochListener>>,
    validation: Option<Dataset>,
    /// Epochs completed over every `train` call.
    epochs_run: usize,
}

pub struct NetworkTrainerBuilder {
    layers: Vec<Box<dyn LayerTrainer>>,
    loss: Box<dyn LossFunction>,
    executor: Box<dyn BatchExecutor>,
    stopping: Box<dyn StoppingAdvisor>,
    scoring: Box<dyn ScoringFunction>,
    listeners: Vec<Box<dyn EpochListener>>,
    validation: Option<Dataset>,
}

impl NetworkTrainerBuilder {
    /// Defaults to a full batch seeded with 0.
    pub fn executor(mut self, executor: impl BatchExecutor + 'static) -> Self {
        self.executor = Box::new(executor);
        self
    }

    /// Defaults to 100 epochs.
    pub fn stopping(mut self, stopping: impl StoppingAdvisor + 'static) -> Self {
        self.stopping = Box::new(stopping);
        self
    }

    /// Defaults to `Scoring::Auto`.
    pub fn scoring(mut self, scoring: impl ScoringFunction + 'static) -> Self {
        self.scoring = Box::new(scoring);
        self
    }

    pub fn listener(mut self, listener: impl EpochListener + 'static) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }

    pub fn validation(mut self, validation: Dataset) -> Self {
        self.validation = Some(validation);
        self
    }

    pub fn build(mut self) -> Result<NetworkTrainer> {
        if self.layers.is_empty() {
            return Err(NnError::InvalidConfig("a trainer needs at least one layer".to_string()));
        }
        if !self.layers.iter().any(|l| l.is_inference()) {
            return Err(NnError::InvalidConfig(
                "no layer survives into the inference network".to_string(),
            ));
        }
        for (i, pair) in self.layers.windows(2).enumerate() {
            if pair[0].output_size() != pair[1].input_size() {
                return Err(NnError::DimensionMismatch(format!(
                    "layer {} outputs {} values but layer {} expects {}",
                    i,
                    pair[0].output_size(),
                    i + 1,
                    pair[1].input_size()
                )));
            }
        }

        if let Some(activation) = self.loss.fused_activation() {
            let fused = self
                .layers
                .last_mut()
                .map_or(false, |layer| layer.fuse_output_gradient(&activation));
            if !fused {
                return Err(NnError::InvalidConfig(format!(
                    "the loss must directly follow a dense {activation:?} output layer"
                )));
            }
        }

        Ok(NetworkTrainer {
            layers: self.layers,
            loss: self.loss,
            executor: self.executor,
            stopping: self.stopping,
            scoring: self.scoring,
            listeners: self.listeners,
            validation: self.validation,
            epochs_run: 0,
        })
    }
}

impl NetworkTrainer {
    pub fn builder(
        layers: Vec<Box<dyn LayerTrainer>>,
        loss: Box<dyn LossFunction>,
    ) -> NetworkTrainerBuilder {
        NetworkTrainerBuilder {
            layers,
            loss,
            executor: Box::new(FullBatch::new(0)),
            stopping: Box::new(MaxEpoch::new(100)),
            scoring: Box::new(Scoring::Auto),
            listeners: Vec::new(),
            validation: None,
        }
    }

    pub fn input_size(&self) -> usize {
        self.layers[0].input_size()
    }

    pub fn output_size(&self) -> usize {
        self.layers[self.layers.len() - 1].output_size()
    }

    pub fn layers(&self) -> &[Box<dyn LayerTrainer>] {
        &self.layers
    }

    /// Epochs completed so far, across every call to `train`.
    pub fn epochs_run(&self) -> usize {
        self.epochs_run
    }

    /// One forward/backward pass over `batch` with the current parameters.
    /// Nothing is mutated; the returned updates still have to be applied.
    pub fn perform_step(&self, batch: &Dataset, rng: &mut ChaCha8Rng) -> TrainingResult {
        perform_step(&self.layers, self.loss.as_ref(), batch, rng)
    }

    /// Inference-mode pass through every layer; dropout is the identity.
    pub fn infer(&self, input: &Matrix) -> Matrix {
        self.layers
            .iter()
            .fold(input.clone(), |activation, layer| layer.infer(&activation))
    }

    /// Copies the current parameters of the inference layers.
    pub fn snapshot(&self) -> Result<Network> {
        let layers = self
            .layers
            .iter()
            .filter(|l| l.is_inference())
            .map(|l| l.create_layer())
            .collect::<Result<Vec<_>>>()?;
        Network::new(layers)
    }

    /// Trains until the stopping advisor fires and returns the network of
    /// the best-scoring epoch.
    ///
    /// Advisors and optimizers keep their state between calls, so a second
    /// call continues the same run rather than starting a fresh one: epoch
    /// numbers carry on from the previous call and every call runs at
    /// least one epoch.
    pub fn train(&mut self, training: &Dataset) -> Result<TrainedNetwork> {
        self.check_dataset(training, "training")?;
        if training.is_empty() {
            return Err(NnError::InvalidData("training dataset is empty".to_string()));
        }
        if let Some(validation) = &self.validation {
            self.check_dataset(validation, "validation")?;
        }
        info!(
            "training {} layers on {} samples{}",
            self.layers.len(),
            training.len(),
            match &self.validation {
                Some(v) => format!(", validating on {}", v.len()),
                None => String::new(),
            }
        );

        let mut best: Option<(Network, usize, f64)> = None;
        let mut history = Vec::new();
        let last_score = loop {
            let epoch = self.epochs_run + 1;

            let layers = &self.layers;
            let loss = self.loss.as_ref();
            let step = |batch: &Dataset, rng: &mut ChaCha8Rng| perform_step(layers, loss, batch, rng);
            let result = self.executor.execute(training, &step)?;

            for (layer, update) in self.layers.iter_mut().zip(&result.updates) {
                layer.apply_updates(update)?;
            }
            self.epochs_run = epoch;

            let penalty: f64 = self.layers.iter().map(|l| l.regularization_penalty()).sum();
            let validation_loss = self.validation_loss();
            let outcome = EpochOutcome::new(epoch, result.loss, validation_loss, penalty);
            if !outcome.total_loss.is_finite() {
                warn!("epoch {epoch}: training loss is {}", outcome.total_loss);
            }
            debug!(
                "epoch {epoch}: loss {:.6}, validation {:.6}, penalty {:.6}",
                outcome.training_loss, outcome.validation_loss, outcome.regularization_penalty
            );

            let score = self.scoring.score(&outcome);
            let best_score = best.as_ref().map_or(f64::NEG_INFINITY, |b| b.2);
            if score > best_score {
                info!("epoch {epoch}: new best score {score:.6}");
                best = Some((self.snapshot()?, epoch, score));
            }

            for listener in self.listeners.iter_mut() {
                listener.on_epoch(&outcome);
            }
            history.push(outcome);

            if self.stopping.should_stop(epoch, score) {
                break score;
            }
        };

        let (network, best_epoch, best_score) = match best {
            Some(best) => best,
            None => {
                warn!("no epoch produced a comparable score; keeping the final parameters");
                (self.snapshot()?, self.epochs_run, last_score)
            }
        };
        info!(
            "finished at epoch {}; best epoch {best_epoch} scored {best_score:.6}",
            self.epochs_run
        );

        Ok(TrainedNetwork { network, best_epoch, best_score, history })
    }

    fn validation_loss(&self) -> f64 {
        match &self.validation {
            Some(validation) if !validation.is_empty() => {
                let predicted = self.infer(validation.features());
                self.loss.loss(&predicted, validation.labels())
            }
            _ => f64::NAN,
        }
    }

    fn check_dataset(&self, dataset: &Dataset, role: &str) -> Result<()> {
        if dataset.feature_count() != self.input_size() {
            return Err(NnError::DimensionMismatch(format!(
                "first layer expects {} inputs, {role} features have {} rows",
                self.input_size(),
                dataset.feature_count()
            )));
        }
        if dataset.label_count() != self.output_size() {
            return Err(NnError::DimensionMismatch(format!(
                "last layer produces {} outputs, {role} labels have {} rows",
                self.output_size(),
                dataset.label_count()
            )));
        }
        Ok(())
    }
}

/// Forward through every layer, stacking backward closures, then unwind
/// the stack from the loss gradient.
fn perform_step(
    layers: &[Box<dyn LayerTrainer>],
    loss: &dyn LossFunction,
    batch: &Dataset,
    rng: &mut ChaCha8Rng,
) -> TrainingResult {
    let mut activation = batch.features().clone();
    let mut stack = Vec::with_capacity(layers.len());
    for layer in layers {
        let pass = layer.forward(&activation, rng);
        stack.push(pass.backward);
        activation = pass.output;
    }

    let loss_value = loss.loss(&activation, batch.labels());
    let mut gradient = loss.gradient(&activation, batch.labels());

    let mut updates = Vec::with_capacity(layers.len());
    while let Some(backward) = stack.pop() {
        let Backward { input_gradient, update } = backward(&gradient);
        updates.push(update);
        gradient = input_gradient;
    }
    updates.reverse();

    TrainingResult { loss: loss_value, updates }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::layers::dense::DenseTrainer;
    use crate::layers::dropout::DropoutTrainer;
    use crate::layers::update::{BIASES, WEIGHTS};
    use crate::loss::{BceLoss, MseLoss};
    use crate::optim::OptimizerConfig;
    use crate::regularization::NoRegularization;
    use crate::train::stopping::{Composite, Patience};
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use std::sync::{Arc, Mutex};

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn dense(weights: &[f64], activation: ActivationFunction, lr: f64) -> Box<dyn LayerTrainer> {
        Box::new(
            DenseTrainer::with_parameters(
                Matrix::row(weights),
                Matrix::zeros(1, 1),
                activation,
                Arc::new(NoRegularization),
                &OptimizerConfig::Sgd { learning_rate: lr },
            )
            .unwrap(),
        )
    }

    fn linear(lr: f64) -> Box<dyn LayerTrainer> {
        dense(&[0.0, 0.0], ActivationFunction::Identity, lr)
    }

    /// y = 2·x1 + 3·x2 on a small grid.
    fn plane() -> Dataset {
        let features = Matrix::from_fn(2, 9, |r, c| {
            if r == 0 { (c % 3) as f64 - 1.0 } else { (c / 3) as f64 - 1.0 }
        });
        let labels = Matrix::from_fn(1, 9, |_, c| {
            2.0 * features.value_at(0, c) + 3.0 * features.value_at(1, c)
        });
        Dataset::new(features, labels).unwrap()
    }

    #[test]
    fn step_returns_one_update_per_layer_in_order() {
        let trainer = NetworkTrainer::builder(
            vec![
                Box::new(DropoutTrainer::new(2, 0.0).unwrap()),
                linear(0.1),
            ],
            Box::new(MseLoss),
        )
        .build()
        .unwrap();
        let result = trainer.perform_step(&plane(), &mut ChaCha8Rng::seed_from_u64(0));
        assert_eq!(result.updates.len(), 2);
        assert!(result.updates[0].is_empty());
        assert_eq!(result.updates[1].get(WEIGHTS).unwrap().shape(), (1, 2));
        assert_eq!(result.updates[1].get(BIASES).unwrap().shape(), (1, 1));
        // Zero weights predict 0 everywhere.
        let expected = plane().labels().map(|y| y * y).mean();
        assert_abs_diff_eq!(result.loss, expected, epsilon = 1e-12);
    }

    #[test]
    fn learns_a_plane() {
        init_logging();
        let mut trainer = NetworkTrainer::builder(vec![linear(0.2)], Box::new(MseLoss))
            .stopping(MaxEpoch::new(400))
            .build()
            .unwrap();
        let trained = trainer.train(&plane()).unwrap();
        let w = trained.network.layers()[0].weights();
        assert_abs_diff_eq!(w.value_at(0, 0), 2.0, epsilon = 1e-3);
        assert_abs_diff_eq!(w.value_at(0, 1), 3.0, epsilon = 1e-3);
        assert_eq!(trained.history.len(), 400);
        assert_eq!(trained.history[0].epoch, 1);
    }

    #[test]
    fn keeps_the_best_epoch_not_the_last() {
        // Scores epochs 1..=3 as 1, 3, 2: the second epoch should be returned.
        let scores = [1.0, 3.0, 2.0];
        let mut trainer = NetworkTrainer::builder(vec![linear(0.2)], Box::new(MseLoss))
            .stopping(MaxEpoch::new(3))
            .scoring(move |o: &EpochOutcome| scores[o.epoch - 1])
            .build()
            .unwrap();

        let data = plane();
        let trained = trainer.train(&data).unwrap();
        assert_eq!(trained.best_epoch, 2);
        assert_eq!(trained.best_score, 3.0);

        // The returned parameters are those after two updates.
        let mut replay = NetworkTrainer::builder(vec![linear(0.2)], Box::new(MseLoss))
            .stopping(MaxEpoch::new(2))
            .build()
            .unwrap();
        let two = replay.train(&data).unwrap();
        assert_eq!(trained.network, two.network);
        assert_ne!(trained.network, trainer.snapshot().unwrap());
    }

    #[test]
    fn nan_scores_fall_back_to_final_network() {
        let mut trainer = NetworkTrainer::builder(vec![linear(0.2)], Box::new(MseLoss))
            .stopping(MaxEpoch::new(2))
            .scoring(|_: &EpochOutcome| f64::NAN)
            .build()
            .unwrap();
        let trained = trainer.train(&plane()).unwrap();
        assert_eq!(trained.best_epoch, 2);
        assert_eq!(trained.network, trainer.snapshot().unwrap());
    }

    #[test]
    fn listeners_see_every_epoch_and_validation_is_reported() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut trainer = NetworkTrainer::builder(vec![linear(0.1)], Box::new(MseLoss))
            .stopping(MaxEpoch::new(5))
            .validation(plane())
            .listener(move |o: &EpochOutcome| sink.lock().unwrap().push(*o))
            .build()
            .unwrap();
        trainer.train(&plane()).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.iter().map(|o| o.epoch).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
        assert!(seen.iter().all(|o| o.has_validation()));
        // Validation on the training set after the update is below the
        // training loss measured before it.
        assert!(seen.iter().all(|o| o.validation_loss < o.training_loss));
    }

    #[test]
    fn patience_stops_a_plateau() {
        let mut trainer = NetworkTrainer::builder(vec![linear(0.1)], Box::new(MseLoss))
            .stopping(Patience::new(3, 1e-9))
            .scoring(|_: &EpochOutcome| 0.0)
            .build()
            .unwrap();
        let trained = trainer.train(&plane()).unwrap();
        assert_eq!(trained.history.len(), 4);
        assert_eq!(trained.best_epoch, 1);
    }

    #[test]
    fn second_call_continues_the_run() {
        let mut trainer = NetworkTrainer::builder(vec![linear(0.1)], Box::new(MseLoss))
            .stopping(Composite::default().with(MaxEpoch::new(20)).with(Patience::new(3, 0.0)))
            .scoring(|o: &EpochOutcome| if o.epoch <= 5 { o.epoch as f64 } else { 0.0 })
            .build()
            .unwrap();

        let first = trainer.train(&plane()).unwrap();
        assert_eq!(first.history.len(), 8);
        assert_eq!(first.best_epoch, 5);
        let after_first = trainer.snapshot().unwrap();

        // Patience is already exhausted, so one more epoch runs and stops.
        let second = trainer.train(&plane()).unwrap();
        assert_eq!(second.history.iter().map(|o| o.epoch).collect::<Vec<_>>(), vec![9]);
        assert_eq!(second.best_epoch, 9);
        assert_eq!(trainer.epochs_run(), 9);
        assert_ne!(second.network, after_first);
    }

    #[test]
    fn validation_runs_in_inference_mode() {
        let validation = plane();
        let mut trainer = NetworkTrainer::builder(
            vec![
                Box::new(DropoutTrainer::new(2, 0.5).unwrap()),
                dense(&[1.0, -2.0], ActivationFunction::Identity, 0.05),
            ],
            Box::new(MseLoss),
        )
        .stopping(MaxEpoch::new(3))
        .validation(validation.clone())
        .build()
        .unwrap();
        let trained = trainer.train(&plane()).unwrap();

        let reported = trained.history[2].validation_loss;
        let network = trainer.snapshot().unwrap();
        let deterministic = MseLoss.loss(&network.predict(validation.features()).unwrap(), validation.labels());
        assert_eq!(reported, deterministic);
        assert_eq!(reported, MseLoss.loss(&trainer.infer(validation.features()), validation.labels()));

        // A training-mode pass over the same parameters drops inputs.
        let noisy = trainer.perform_step(&validation, &mut ChaCha8Rng::seed_from_u64(1)).loss;
        assert_ne!(noisy, reported);
    }

    #[test]
    fn builder_fuses_the_output_layer_with_logit_losses() {
        let sigmoid = || dense(&[0.5, -0.5], ActivationFunction::Sigmoid, 0.1);
        assert!(NetworkTrainer::builder(vec![sigmoid()], Box::new(BceLoss)).build().is_ok());

        let wrong_activation = NetworkTrainer::builder(vec![linear(0.1)], Box::new(BceLoss)).build();
        assert!(matches!(wrong_activation, Err(NnError::InvalidConfig(_))));

        let trailing_dropout = NetworkTrainer::builder(
            vec![sigmoid(), Box::new(DropoutTrainer::new(1, 0.2).unwrap())],
            Box::new(BceLoss),
        )
        .build();
        assert!(matches!(trailing_dropout, Err(NnError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_mismatched_datasets_before_training() {
        let mut trainer = NetworkTrainer::builder(vec![linear(0.1)], Box::new(MseLoss))
            .build()
            .unwrap();
        let wrong_inputs = Dataset::new(Matrix::zeros(3, 4), Matrix::zeros(1, 4)).unwrap();
        assert!(matches!(trainer.train(&wrong_inputs), Err(NnError::DimensionMismatch(_))));
        let wrong_labels = Dataset::new(Matrix::zeros(2, 4), Matrix::zeros(2, 4)).unwrap();
        assert!(matches!(trainer.train(&wrong_labels), Err(NnError::DimensionMismatch(_))));
        let empty = Dataset::new(Matrix::zeros(2, 0), Matrix::zeros(1, 0)).unwrap();
        assert!(matches!(trainer.train(&empty), Err(NnError::InvalidData(_))));
        // Nothing moved.
        assert_eq!(trainer.snapshot().unwrap().layers()[0].weights(), &Matrix::zeros(1, 2));
    }

    #[test]
    fn builder_checks_the_layer_chain() {
        let dropout_only = NetworkTrainer::builder(
            vec![Box::new(DropoutTrainer::new(2, 0.5).unwrap())],
            Box::new(MseLoss),
        )
        .build();
        assert!(dropout_only.is_err());

        let broken = NetworkTrainer::builder(
            vec![linear(0.1), linear(0.1)],
            Box::new(MseLoss),
        )
        .build();
        assert!(matches!(broken, Err(NnError::DimensionMismatch(_))));
        assert!(NetworkTrainer::builder(vec![], Box::new(MseLoss)).build().is_err());
    }
}
