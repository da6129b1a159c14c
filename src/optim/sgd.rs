use crate::math::matrix::Matrix;
use super::{check_parameter, Optimizer};

/// Plain gradient descent: θ ← θ - η·g
#[derive(Debug, Clone)]
pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }
}

impl Optimizer for Sgd {
    fn optimize(&mut self, parameter: &Matrix, gradient: &Matrix) -> Matrix {
        check_parameter(parameter, gradient);
        parameter - &gradient.scale(self.learning_rate)
    }
}
