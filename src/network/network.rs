use crate::error::{NnError, Result};
use crate::layers::dense::Layer;
use crate::math::matrix::Matrix;

/// A trained, immutable stack of dense layers.
///
/// Holds its own copies of every parameter; the trainer that produced it can
/// keep training without affecting it.
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    layers: Vec<Layer>,
}

impl Network {
    pub fn new(layers: Vec<Layer>) -> Result<Network> {
        if layers.is_empty() {
            return Err(NnError::InvalidConfig("a network needs at least one layer".to_string()));
        }
        for (i, pair) in layers.windows(2).enumerate() {
            if pair[0].size() != pair[1].input_size() {
                return Err(NnError::DimensionMismatch(format!(
                    "layer {} outputs {} values but layer {} expects {}",
                    i,
                    pair[0].size(),
                    i + 1,
                    pair[1].input_size()
                )));
            }
        }
        Ok(Network { layers })
    }

    /// Runs `input_size x samples` through every layer.
    pub fn predict(&self, input: &Matrix) -> Result<Matrix> {
        if input.rows != self.input_size() {
            return Err(NnError::DimensionMismatch(format!(
                "network expects {} input rows, got {}",
                self.input_size(),
                input.rows
            )));
        }
        Ok(self
            .layers
            .iter()
            .fold(input.clone(), |activation, layer| layer.forward(&activation)))
    }

    pub fn predict_sample(&self, input: &[f64]) -> Result<Vec<f64>> {
        Ok(self.predict(&Matrix::column(input))?.column_values(0))
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn input_size(&self) -> usize {
        self.layers[0].input_size()
    }

    pub fn output_size(&self) -> usize {
        self.layers[self.layers.len() - 1].size()
    }
}
