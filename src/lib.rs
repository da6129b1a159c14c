pub mod error;
pub mod math;
pub mod activation;
pub mod loss;
pub mod regularization;
pub mod optim;
pub mod layers;
pub mod data;
pub mod network;
pub mod train;
pub mod models;

// Convenience re-exports
pub use error::{NnError, Result};
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use data::dataset::Dataset;
pub use layers::{DenseTrainer, DropoutTrainer, Initializer, Layer, LayerTrainer, LayerUpdate};
pub use loss::{LossFunction, LossType};
pub use regularization::{RegularizationType, Regularizer};
pub use optim::{Optimizer, OptimizerConfig, OptimizerFactory};
pub use network::{LayerSpec, Network, NetworkSpec};
pub use train::{EpochOutcome, NetworkTrainer, TrainConfig, TrainedNetwork};
pub use models::{Autoencoder, BinaryClassifier, MultiClassClassifier, Regressor};
