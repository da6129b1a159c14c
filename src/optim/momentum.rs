use crate::math::matrix::Matrix;
use super::{bound_state, check_parameter, Optimizer};

/// Gradient descent with a velocity term:
///   v ← μ·v + η·g
///   θ ← θ - v
#[derive(Debug, Clone)]
pub struct Momentum {
    pub learning_rate: f64,
    pub momentum: f64,
    velocity: Option<Matrix>,
}

impl Momentum {
    pub fn new(learning_rate: f64, momentum: f64) -> Momentum {
        Momentum { learning_rate, momentum, velocity: None }
    }
}

impl Optimizer for Momentum {
    fn optimize(&mut self, parameter: &Matrix, gradient: &Matrix) -> Matrix {
        check_parameter(parameter, gradient);
        let (lr, mu) = (self.learning_rate, self.momentum);
        let v = bound_state(&mut self.velocity, gradient);
        *v = v.zip_map(gradient, |v, g| mu * v + lr * g);
        parameter - &*v
    }
}
