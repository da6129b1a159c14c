use rand::RngCore;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{NnError, Result};
use crate::layers::dense::DenseTrainer;
use crate::layers::dropout::DropoutTrainer;
use crate::layers::initializer::Initializer;
use crate::layers::trainer::LayerTrainer;
use crate::loss::loss_type::LossType;
use crate::loss::LossFunction;
use crate::optim::OptimizerFactory;
use crate::regularization::RegularizationType;

/// One layer of a network specification. Input sizes are implied by the
/// previous layer (or the network's `input_size` for the first one).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerSpec {
    Dense { units: usize, activation: ActivationFunction },
    Dropout { rate: f64 },
}

/// A serializable description of a network architecture and how to train
/// it: loss, weight regularization and weight initialization.
///
/// Saved and loaded independently of any trained parameters, so an
/// architecture can be written down before training starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub name: String,
    pub input_size: usize,
    /// Ordered input to output.
    pub layers: Vec<LayerSpec>,
    #[serde(default)]
    pub loss: LossType,
    #[serde(default)]
    pub regularization: RegularizationType,
    /// `None` picks per layer from its activation.
    #[serde(default)]
    pub initializer: Option<Initializer>,
}

impl NetworkSpec {
    pub fn new(name: impl Into<String>, input_size: usize) -> NetworkSpec {
        NetworkSpec {
            name: name.into(),
            input_size,
            layers: Vec::new(),
            loss: LossType::default(),
            regularization: RegularizationType::default(),
            initializer: None,
        }
    }

    pub fn dense(mut self, units: usize, activation: ActivationFunction) -> NetworkSpec {
        self.layers.push(LayerSpec::Dense { units, activation });
        self
    }

    pub fn dropout(mut self, rate: f64) -> NetworkSpec {
        self.layers.push(LayerSpec::Dropout { rate });
        self
    }

    pub fn loss(mut self, loss: LossType) -> NetworkSpec {
        self.loss = loss;
        self
    }

    pub fn regularization(mut self, regularization: RegularizationType) -> NetworkSpec {
        self.regularization = regularization;
        self
    }

    pub fn initializer(mut self, initializer: Initializer) -> NetworkSpec {
        self.initializer = Some(initializer);
        self
    }

    /// Width of the last layer.
    pub fn output_size(&self) -> usize {
        self.layers.iter().fold(self.input_size, |size, layer| match layer {
            LayerSpec::Dense { units, .. } => *units,
            LayerSpec::Dropout { .. } => size,
        })
    }

    /// The dense layers' activations, input to output.
    pub fn dense_activations(&self) -> Vec<&ActivationFunction> {
        self.layers
            .iter()
            .filter_map(|layer| match layer {
                LayerSpec::Dense { activation, .. } => Some(activation),
                LayerSpec::Dropout { .. } => None,
            })
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_size == 0 {
            return Err(NnError::InvalidConfig("input size must be at least 1".to_string()));
        }
        let activations = self.dense_activations();
        if activations.is_empty() {
            return Err(NnError::InvalidConfig(format!(
                "network `{}` has no dense layers",
                self.name
            )));
        }
        for (i, layer) in self.layers.iter().enumerate() {
            match layer {
                LayerSpec::Dense { units: 0, .. } => {
                    return Err(NnError::InvalidConfig(format!("layer {i} has zero units")));
                }
                LayerSpec::Dropout { rate } if !(0.0..1.0).contains(rate) => {
                    return Err(NnError::InvalidConfig(format!(
                        "layer {i} has dropout rate {rate}, expected [0, 1)"
                    )));
                }
                _ => {}
            }
        }

        // Softmax only has a usable derivative next to cross-entropy.
        let last = activations.len() - 1;
        for (i, activation) in activations.iter().enumerate() {
            if **activation != ActivationFunction::Softmax {
                continue;
            }
            if i != last || self.loss != LossType::CrossEntropy {
                return Err(NnError::InvalidConfig(
                    "softmax must be the output activation and paired with cross-entropy"
                        .to_string(),
                ));
            }
        }

        // Losses taken at the logits need their activation as the very last layer.
        if let Some(fused) = self.loss.build().fused_activation() {
            match self.layers.last() {
                Some(LayerSpec::Dense { activation, .. }) if *activation == fused => {}
                _ => {
                    return Err(NnError::InvalidConfig(format!(
                        "{:?} needs a final dense layer with {fused:?} activation",
                        self.loss
                    )));
                }
            }
        }
        Ok(())
    }

    /// Instantiates one trainer per layer. Every dense layer gets its own
    /// pair of optimizers from `optimizers`.
    pub fn build_layers(
        &self,
        optimizers: &dyn OptimizerFactory,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Box<dyn LayerTrainer>>> {
        self.validate()?;
        let regularizer = self.regularization.build();

        let mut size = self.input_size;
        let mut trainers: Vec<Box<dyn LayerTrainer>> = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            match layer {
                LayerSpec::Dense { units, activation } => {
                    let initializer = self
                        .initializer
                        .unwrap_or_else(|| Initializer::for_activation(activation));
                    trainers.push(Box::new(DenseTrainer::new(
                        *units,
                        size,
                        activation.clone(),
                        initializer,
                        regularizer.clone(),
                        optimizers,
                        rng,
                    )));
                    size = *units;
                }
                LayerSpec::Dropout { rate } => {
                    trainers.push(Box::new(DropoutTrainer::new(size, *rate)?));
                }
            }
        }
        Ok(trainers)
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    /// Deserializes a `NetworkSpec` from a JSON file.
    pub fn load_json(path: &str) -> std::io::Result<NetworkSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optim::OptimizerConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn classifier() -> NetworkSpec {
        NetworkSpec::new("digits", 4)
            .dense(8, ActivationFunction::ReLU)
            .dropout(0.2)
            .dense(3, ActivationFunction::Softmax)
            .loss(LossType::CrossEntropy)
            .regularization(RegularizationType::L2 { lambda: 1e-4 })
    }

    #[test]
    fn builds_one_trainer_per_layer() {
        let spec = classifier();
        assert_eq!(spec.output_size(), 3);
        let layers = spec
            .build_layers(&OptimizerConfig::default(), &mut ChaCha8Rng::seed_from_u64(0))
            .unwrap();
        let shapes: Vec<(usize, usize, bool)> = layers
            .iter()
            .map(|l| (l.input_size(), l.output_size(), l.is_inference()))
            .collect();
        assert_eq!(shapes, vec![(4, 8, true), (8, 8, false), (8, 3, true)]);
    }

    #[test]
    fn validation_catches_bad_layers() {
        assert!(NetworkSpec::new("empty", 3).validate().is_err());
        assert!(NetworkSpec::new("zero", 3).dense(0, ActivationFunction::ReLU).validate().is_err());
        assert!(NetworkSpec::new("drop", 3)
            .dense(2, ActivationFunction::ReLU)
            .dropout(1.0)
            .validate()
            .is_err());
        // Softmax with the default MSE loss.
        assert!(NetworkSpec::new("soft", 3)
            .dense(2, ActivationFunction::Softmax)
            .validate()
            .is_err());
        assert!(classifier().validate().is_ok());
    }

    #[test]
    fn logit_losses_need_their_output_activation_last() {
        let binary = || NetworkSpec::new("binary", 2).loss(LossType::BinaryCrossEntropy);
        assert!(binary().dense(1, ActivationFunction::Sigmoid).validate().is_ok());
        assert!(binary().dense(1, ActivationFunction::Identity).validate().is_err());
        assert!(binary()
            .dense(1, ActivationFunction::Sigmoid)
            .dropout(0.1)
            .validate()
            .is_err());
        assert!(classifier().dropout(0.1).validate().is_err());
    }

    #[test]
    fn json_roundtrip_through_a_file() {
        let path = std::env::temp_dir().join(format!("gradnet-spec-{}.json", std::process::id()));
        let path = path.to_str().unwrap();
        let spec = classifier().initializer(Initializer::He);
        spec.save_json(path).unwrap();
        let loaded = NetworkSpec::load_json(path).unwrap();
        std::fs::remove_file(path).unwrap();
        assert_eq!(loaded, spec);
    }

    #[test]
    fn missing_optional_fields_take_defaults() {
        let json = r#"{
            "name": "tiny",
            "input_size": 2,
            "layers": [{ "type": "dense", "units": 1, "activation": "Identity" }]
        }"#;
        let spec: NetworkSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.loss, LossType::Mse);
        assert_eq!(spec.regularization, RegularizationType::None);
        assert_eq!(spec.initializer, None);
        assert_eq!(spec.output_size(), 1);
    }
}
