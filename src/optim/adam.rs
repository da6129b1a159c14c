use crate::math::matrix::Matrix;
use super::{bound_state, check_parameter, Optimizer};

/// Adam (bias-corrected):
///   t += 1
///   m ← β1·m + (1-β1)·g
///   v ← β2·v + (1-β2)·g²
///   θ ← θ - η·m̂ / (√v̂ + ε),  m̂ = m/(1-β1ᵗ), v̂ = v/(1-β2ᵗ)
#[derive(Debug, Clone)]
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    step: u64,
    first_moment: Option<Matrix>,
    second_moment: Option<Matrix>,
}

impl Adam {
    pub fn new(learning_rate: f64, beta1: f64, beta2: f64, epsilon: f64) -> Adam {
        Adam {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            step: 0,
            first_moment: None,
            second_moment: None,
        }
    }

    /// Number of updates applied so far.
    pub fn steps(&self) -> u64 {
        self.step
    }
}

impl Optimizer for Adam {
    fn optimize(&mut self, parameter: &Matrix, gradient: &Matrix) -> Matrix {
        check_parameter(parameter, gradient);
        let (b1, b2) = (self.beta1, self.beta2);
        self.step += 1;
        let t = self.step as f64;

        let m = bound_state(&mut self.first_moment, gradient);
        *m = m.zip_map(gradient, |m, g| b1 * m + (1.0 - b1) * g);
        let m_hat = m.scale(1.0 / (1.0 - b1.powf(t)));

        let v = bound_state(&mut self.second_moment, gradient);
        *v = v.zip_map(gradient, |v, g| b2 * v + (1.0 - b2) * g * g);
        let v_hat = v.scale(1.0 / (1.0 - b2.powf(t)));

        let (lr, eps) = (self.learning_rate, self.epsilon);
        let step = m_hat.zip_map(&v_hat, |m, v| lr * m / (v.sqrt() + eps));
        parameter - &step
    }
}
