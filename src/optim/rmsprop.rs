use crate::math::matrix::Matrix;
use super::{bound_state, check_parameter, Optimizer};

/// Divides each step by a running RMS of recent gradients:
///   v ← β·v + (1-β)·g²
///   θ ← θ - η·g / (√v + ε)
#[derive(Debug, Clone)]
pub struct RmsProp {
    pub learning_rate: f64,
    pub beta: f64,
    pub epsilon: f64,
    squared_average: Option<Matrix>,
}

impl RmsProp {
    pub fn new(learning_rate: f64, beta: f64, epsilon: f64) -> RmsProp {
        RmsProp { learning_rate, beta, epsilon, squared_average: None }
    }
}

impl Optimizer for RmsProp {
    fn optimize(&mut self, parameter: &Matrix, gradient: &Matrix) -> Matrix {
        check_parameter(parameter, gradient);
        let (lr, beta, eps) = (self.learning_rate, self.beta, self.epsilon);
        let v = bound_state(&mut self.squared_average, gradient);
        *v = v.zip_map(gradient, |v, g| beta * v + (1.0 - beta) * g * g);
        let step = gradient.zip_map(v, |g, v| lr * g / (v.sqrt() + eps));
        parameter - &step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optim::testing::{assert_moves_against_gradient, trajectory};
    use crate::optim::Sgd;

    #[test]
    fn accelerates_past_sgd() {
        let sgd = trajectory(&mut Sgd::new(0.01), 0.1, 20);
        let rms = trajectory(&mut RmsProp::new(0.01, 0.9, 1e-8), 0.1, 20);
        assert_moves_against_gradient(&rms, 0.1);
        assert!(rms[19].abs() > sgd[19].abs());
    }

    #[test]
    fn negative_gradients_increase_the_parameter() {
        let path = trajectory(&mut RmsProp::new(0.01, 0.9, 1e-8), -0.3, 10);
        assert_moves_against_gradient(&path, -0.3);
    }
}
