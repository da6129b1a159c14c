pub mod epoch_outcome;
pub mod executor;
pub mod listener;
pub mod scoring;
pub mod stopping;
pub mod train_config;
pub mod trainer;

pub use epoch_outcome::EpochOutcome;
pub use executor::{BatchExecutor, FullBatch, MiniBatch, StepFn, TrainingResult};
pub use listener::{EpochListener, LoggingListener};
pub use scoring::{Scoring, ScoringFunction};
pub use stopping::{Composite, MaxEpoch, Patience, ScoreThreshold, StoppingAdvisor};
pub use train_config::TrainConfig;
pub use trainer::{NetworkTrainer, NetworkTrainerBuilder, TrainedNetwork};
