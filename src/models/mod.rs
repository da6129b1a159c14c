//! Thin task-specific wrappers. Each one shapes its labels into a
//! `Dataset`, picks a sensible output layer and loss, and hands the rest to
//! `NetworkTrainer`.

pub mod autoencoder;
pub mod classifier;
pub mod regressor;

pub use autoencoder::Autoencoder;
pub use classifier::{BinaryClassifier, MultiClassClassifier};
pub use regressor::Regressor;

use crate::activation::activation::ActivationFunction;
use crate::data::dataset::Dataset;
use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;
use crate::network::network::Network;
use crate::network::spec::NetworkSpec;
use crate::train::train_config::TrainConfig;
use crate::train::trainer::TrainedNetwork;

/// `input_size`, then one ReLU layer per hidden width.
pub(crate) fn hidden_spec(name: &str, input_size: usize, hidden: &[usize]) -> NetworkSpec {
    hidden
        .iter()
        .fold(NetworkSpec::new(name, input_size), |spec, &units| {
            spec.dense(units, ActivationFunction::ReLU)
        })
}

pub(crate) fn check_label_count(features: &Matrix, labels: usize) -> Result<()> {
    if features.cols != labels {
        return Err(NnError::InvalidData(format!(
            "{} labels for {} samples",
            labels, features.cols
        )));
    }
    Ok(())
}

pub(crate) fn fit(
    spec: &NetworkSpec,
    config: &TrainConfig,
    features: &Matrix,
    labels: Matrix,
) -> Result<TrainedNetwork> {
    let dataset = Dataset::new(features.clone(), labels)?;
    config.build_trainer(spec)?.train(&dataset)
}

pub(crate) fn fitted(trained: &Option<TrainedNetwork>) -> Result<&Network> {
    trained
        .as_ref()
        .map(|t| &t.network)
        .ok_or_else(|| NnError::Unsupported("the model has not been fitted".to_string()))
}
