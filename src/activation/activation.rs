use serde::{Serialize, Deserialize};

use crate::math::matrix::Matrix;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActivationFunction {
    Sigmoid,
    ReLU,
    Identity,
    /// Softmax is a vector-valued activation; it is applied per column by
    /// `apply()`.  The element-wise `function()` is not defined for it.
    Softmax,
    Tanh,
    LeakyReLU { alpha: f64 },
    Elu { alpha: f64 },
    Gelu,
    Swish,
}

impl ActivationFunction {
    /// Activates a whole pre-activation matrix (`units x samples`).
    pub fn apply(&self, z: &Matrix) -> Matrix {
        match self {
            ActivationFunction::Softmax => z.softmax_columns(),
            _ => z.map(|x| self.function(x)),
        }
    }

    /// Element-wise derivative evaluated at every entry of `z`.
    pub fn derivative_matrix(&self, z: &Matrix) -> Matrix {
        z.map(|x| self.derivative(x))
    }

    /// Scalar form of every activation except `Softmax`, which only exists
    /// per column; use `apply` for that one.
    pub fn function(&self, x: f64) -> f64 {
        use ActivationFunction::*;
        match *self {
            Sigmoid => sigmoid(x),
            ReLU => x.max(0.0),
            Identity => x,
            Softmax => panic!(
                "ActivationFunction::Softmax::function() must not be called directly; \
                 use apply(), which normalises whole columns"
            ),
            Tanh => x.tanh(),
            LeakyReLU { alpha } => if x > 0.0 { x } else { alpha * x },
            Elu { alpha } => if x > 0.0 { x } else { alpha * x.exp_m1() },
            Gelu => 0.5 * x * (1.0 + gelu_inner(x).tanh()),
            Swish => x * sigmoid(x),
        }
    }

    /// σ'(x). `Softmax` reports 1: its only valid pairing is with
    /// cross-entropy, whose gradient is already taken at the logits.
    pub fn derivative(&self, x: f64) -> f64 {
        use ActivationFunction::*;
        match *self {
            Sigmoid => {
                let s = sigmoid(x);
                s * (1.0 - s)
            }
            ReLU => if x > 0.0 { 1.0 } else { 0.0 },
            Identity | Softmax => 1.0,
            Tanh => 1.0 - x.tanh().powi(2),
            LeakyReLU { alpha } => if x > 0.0 { 1.0 } else { alpha },
            Elu { alpha } => if x > 0.0 { 1.0 } else { alpha * x.exp() },
            Gelu => {
                let t = gelu_inner(x).tanh();
                let d_inner = GELU_SCALE * (1.0 + 3.0 * GELU_CUBIC * x * x);
                0.5 * (1.0 + t) + 0.5 * x * (1.0 - t * t) * d_inner
            }
            Swish => {
                let s = sigmoid(x);
                s * (1.0 + x * (1.0 - s))
            }
        }
    }
}

/// sqrt(2/π), the tanh approximation's scale.
const GELU_SCALE: f64 = 0.797_884_560_802_865_4;
const GELU_CUBIC: f64 = 0.044715;

fn gelu_inner(x: f64) -> f64 {
    GELU_SCALE * (x + GELU_CUBIC * x.powi(3))
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
