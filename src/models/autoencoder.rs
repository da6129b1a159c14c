use crate::activation::activation::ActivationFunction;
use crate::error::{NnError, Result};
use crate::loss::loss_type::LossType;
use crate::loss::{LossFunction, MseLoss};
use crate::math::matrix::Matrix;
use crate::network::network::Network;
use crate::network::spec::{LayerSpec, NetworkSpec};
use crate::train::train_config::TrainConfig;
use crate::train::trainer::TrainedNetwork;

use super::{fit, fitted};

/// Learns to reproduce its input through narrower hidden layers.
pub struct Autoencoder {
    spec: NetworkSpec,
    config: TrainConfig,
    trained: Option<TrainedNetwork>,
}

impl Autoencoder {
    /// `sizes` lists every layer width including the input, e.g. `[5, 2, 5]`.
    /// Hidden layers use tanh and the output a sigmoid, so inputs are
    /// expected in `[0, 1]`.
    pub fn new(sizes: &[usize], config: TrainConfig) -> Result<Autoencoder> {
        if sizes.len() < 3 {
            return Err(NnError::InvalidConfig(format!(
                "an autoencoder needs at least 3 layers, got {}",
                sizes.len()
            )));
        }
        let last = sizes.len() - 1;
        let spec = sizes[1..last]
            .iter()
            .fold(NetworkSpec::new("autoencoder", sizes[0]), |spec, &units| {
                spec.dense(units, ActivationFunction::Tanh)
            })
            .dense(sizes[last], ActivationFunction::Sigmoid)
            .loss(LossType::Mse);
        Autoencoder::from_spec(spec, config)
    }

    /// Any architecture whose output is as wide as its input and which has
    /// at least one hidden layer.
    pub fn from_spec(spec: NetworkSpec, config: TrainConfig) -> Result<Autoencoder> {
        let dense = spec
            .layers
            .iter()
            .filter(|l| matches!(l, LayerSpec::Dense { .. }))
            .count();
        if dense + 1 < 3 {
            return Err(NnError::InvalidConfig(format!(
                "an autoencoder needs at least 3 layers, `{}` has {}",
                spec.name,
                dense + 1
            )));
        }
        if spec.output_size() != spec.input_size {
            return Err(NnError::DimensionMismatch(format!(
                "autoencoder input has {} values but output has {}",
                spec.input_size,
                spec.output_size()
            )));
        }
        spec.validate()?;
        Ok(Autoencoder { spec, config, trained: None })
    }

    /// Trains on `(features, features)`.
    pub fn fit(&mut self, features: &Matrix) -> Result<&TrainedNetwork> {
        let trained = fit(&self.spec, &self.config, features, features.clone())?;
        Ok(self.trained.insert(trained))
    }

    pub fn reconstruct(&self, features: &Matrix) -> Result<Matrix> {
        self.network()?.predict(features)
    }

    /// Mean squared difference between `features` and their reconstruction.
    pub fn reconstruction_error(&self, features: &Matrix) -> Result<f64> {
        Ok(MseLoss.loss(&self.reconstruct(features)?, features))
    }

    pub fn network(&self) -> Result<&Network> {
        fitted(&self.trained)
    }
}
