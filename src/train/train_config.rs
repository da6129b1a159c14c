use std::sync::Arc;

use log::debug;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Serialize, Deserialize};

use crate::error::{NnError, Result};
use crate::network::spec::NetworkSpec;
use crate::optim::OptimizerConfig;
use crate::train::executor::{FullBatch, MiniBatch};
use crate::train::scoring::Scoring;
use crate::train::stopping::{Composite, MaxEpoch, Patience, ScoreThreshold};
use crate::train::trainer::{NetworkTrainer, NetworkTrainerBuilder};

/// Hyperparameters for a training run.
///
/// # Fields
/// - `optimizer`: update rule; each trainable tensor gets its own instance
/// - `batch_size`: `None` trains on the full dataset each epoch
/// - `max_epochs`: hard upper bound on the number of epochs
/// - `patience`: `(epochs, min_delta)`: stop after that many epochs
///   without a score improving by more than `min_delta`
/// - `score_threshold`: stop once the score reaches this value
/// - `scoring`: how epochs are ranked for checkpoint selection
/// - `seed`: seeds weight initialization, shuffling and dropout
/// - `threads`: dedicated worker count for mini-batches; `None`
///   shares rayon's global pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub optimizer: OptimizerConfig,
    pub batch_size: Option<usize>,
    pub max_epochs: usize,
    pub patience: Option<(usize, f64)>,
    pub score_threshold: Option<f64>,
    pub scoring: Scoring,
    pub seed: u64,
    pub threads: Option<usize>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            optimizer: OptimizerConfig::default(),
            batch_size: None,
            max_epochs: 100,
            patience: None,
            score_threshold: None,
            scoring: Scoring::Auto,
            seed: 42,
            threads: None,
        }
    }
}

impl TrainConfig {
    pub fn new(optimizer: OptimizerConfig, max_epochs: usize) -> Self {
        TrainConfig { optimizer, max_epochs, ..TrainConfig::default() }
    }

    pub fn validate(&self) -> Result<()> {
        self.optimizer.validate()?;
        if self.max_epochs == 0 {
            return Err(NnError::InvalidConfig("max_epochs must be at least 1".to_string()));
        }
        if self.batch_size == Some(0) {
            return Err(NnError::InvalidConfig("batch_size must be at least 1".to_string()));
        }
        if self.threads == Some(0) {
            return Err(NnError::InvalidConfig("threads must be at least 1".to_string()));
        }
        if let Some((epochs, min_delta)) = self.patience {
            if epochs == 0 || !(min_delta.is_finite() && min_delta >= 0.0) {
                return Err(NnError::InvalidConfig(format!(
                    "patience needs at least one epoch and a finite min_delta >= 0, got ({epochs}, {min_delta})"
                )));
            }
        }
        Ok(())
    }

    /// Builds the layers of `spec` and wires them to an executor, stopping
    /// rule and scoring function from this config. Listeners and a
    /// validation set can still be added to the returned builder.
    pub fn trainer_builder(&self, spec: &NetworkSpec) -> Result<NetworkTrainerBuilder> {
        self.validate()?;

        // One generator for the whole run: parameters first, then the
        // executor's seed, so a given seed always reproduces both.
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let layers = spec.build_layers(&self.optimizer, &mut rng)?;
        let executor_seed = rng.next_u64();
        debug!(
            "building trainer for `{}` with {} layers, seed {}",
            spec.name,
            layers.len(),
            self.seed
        );

        let mut stopping = Composite::default().with(MaxEpoch::new(self.max_epochs));
        if let Some((epochs, min_delta)) = self.patience {
            stopping = stopping.with(Patience::new(epochs, min_delta));
        }
        if let Some(threshold) = self.score_threshold {
            stopping = stopping.with(ScoreThreshold::new(threshold));
        }

        let builder = NetworkTrainer::builder(layers, spec.loss.build())
            .stopping(stopping)
            .scoring(self.scoring);

        Ok(match self.batch_size {
            None => builder.executor(FullBatch::new(executor_seed)),
            Some(size) => {
                let mut executor = MiniBatch::new(size, executor_seed)?;
                if let Some(threads) = self.threads {
                    let pool = rayon::ThreadPoolBuilder::new()
                        .num_threads(threads)
                        .build()
                        .map_err(|e| NnError::InvalidConfig(e.to_string()))?;
                    executor = executor.with_pool(Arc::new(pool));
                }
                builder.executor(executor)
            }
        })
    }

    pub fn build_trainer(&self, spec: &NetworkSpec) -> Result<NetworkTrainer> {
        self.trainer_builder(spec)?.build()
    }

    /// Serializes the config to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    /// Deserializes a `TrainConfig` from a JSON file; absent fields take
    /// their defaults.
    pub fn load_json(path: &str) -> std::io::Result<TrainConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::data::dataset::Dataset;
    use crate::math::matrix::Matrix;

    fn spec() -> NetworkSpec {
        NetworkSpec::new("small", 3)
            .dense(4, ActivationFunction::Tanh)
            .dropout(0.25)
            .dense(1, ActivationFunction::Identity)
    }

    fn data() -> Dataset {
        let features = Matrix::from_fn(3, 24, |r, c| ((r * 7 + c * 3) % 11) as f64 / 10.0 - 0.5);
        let labels = Matrix::from_fn(1, 24, |_, c| features.value_at(0, c) - features.value_at(2, c));
        Dataset::new(features, labels).unwrap()
    }

    #[test]
    fn validation_rejects_nonsense() {
        assert!(TrainConfig::default().validate().is_ok());
        let bad = [
            TrainConfig { max_epochs: 0, ..TrainConfig::default() },
            TrainConfig { batch_size: Some(0), ..TrainConfig::default() },
            TrainConfig { threads: Some(0), ..TrainConfig::default() },
            TrainConfig { patience: Some((0, 0.0)), ..TrainConfig::default() },
            TrainConfig { patience: Some((3, -1.0)), ..TrainConfig::default() },
            TrainConfig::new(OptimizerConfig::Sgd { learning_rate: 0.0 }, 10),
        ];
        for config in bad.iter() {
            assert!(config.validate().is_err(), "{config:?}");
        }
    }

    #[test]
    fn same_seed_same_history() {
        let config = TrainConfig {
            batch_size: Some(5),
            threads: Some(2),
            ..TrainConfig::new(OptimizerConfig::adam(0.01), 15)
        };
        // No validation set, so compare the finite columns of the history.
        let losses = |config: &TrainConfig| -> Vec<(f64, f64)> {
            let trained = config.build_trainer(&spec()).unwrap().train(&data()).unwrap();
            trained.history.iter().map(|o| (o.training_loss, o.total_loss)).collect()
        };
        assert_eq!(losses(&config), losses(&config));

        let other = TrainConfig { seed: 7, ..config.clone() };
        assert_ne!(losses(&config), losses(&other));
    }

    #[test]
    fn max_epochs_bounds_the_run() {
        let trained = TrainConfig::new(OptimizerConfig::default(), 6)
            .build_trainer(&spec())
            .unwrap()
            .train(&data())
            .unwrap();
        assert_eq!(trained.history.len(), 6);
    }

    #[test]
    fn partial_json_takes_defaults() {
        let json = r#"{ "max_epochs": 12, "optimizer": { "type": "momentum", "learning_rate": 0.05, "momentum": 0.9 } }"#;
        let config: TrainConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_epochs, 12);
        assert_eq!(config.optimizer, OptimizerConfig::Momentum { learning_rate: 0.05, momentum: 0.9 });
        assert_eq!(config.seed, TrainConfig::default().seed);
        assert_eq!(config.batch_size, None);
    }
}
