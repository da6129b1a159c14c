use rand::RngCore;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::math::matrix::Matrix;

/// How dense weights are drawn when a network is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Initializer {
    /// N(0, sqrt(2 / fan_in)).
    He,
    /// N(0, sqrt(1 / fan_in)).
    Xavier,
    /// U(-1, 1).
    Uniform,
    Zeros,
}

impl Initializer {
    /// He before the ReLU family, Xavier everywhere else.
    pub fn for_activation(activation: &ActivationFunction) -> Initializer {
        match activation {
            ActivationFunction::ReLU
            | ActivationFunction::LeakyReLU { .. }
            | ActivationFunction::Elu { .. }
            | ActivationFunction::Gelu
            | ActivationFunction::Swish => Initializer::He,
            _ => Initializer::Xavier,
        }
    }

    pub fn weights(&self, units: usize, input_size: usize, rng: &mut dyn RngCore) -> Matrix {
        match self {
            Initializer::He => Matrix::he(units, input_size, rng),
            Initializer::Xavier => Matrix::xavier(units, input_size, rng),
            Initializer::Uniform => Matrix::random(units, input_size, rng),
            Initializer::Zeros => Matrix::zeros(units, input_size),
        }
    }
}
