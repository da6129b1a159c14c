pub mod sgd;
pub mod momentum;
pub mod rmsprop;
pub mod adam;
pub mod config;

pub use sgd::Sgd;
pub use momentum::Momentum;
pub use rmsprop::RmsProp;
pub use adam::Adam;
pub use config::{OptimizerConfig, OptimizerFactory};

use crate::math::matrix::Matrix;

/// A stateful update rule for one parameter tensor.
///
/// Accumulators are created lazily with the shape of the first gradient
/// and live as long as the optimizer. An instance must never be shared
/// between tensors.
pub trait Optimizer: Send + Sync {
    /// Returns the updated parameter. Neither argument is modified.
    fn optimize(&mut self, parameter: &Matrix, gradient: &Matrix) -> Matrix;
}

/// Returns the accumulator bound to `gradient`'s shape, creating it on the
/// first call. A later gradient of another shape means the optimizer is
/// being shared between tensors, which is a bug in the caller.
pub(crate) fn bound_state<'a>(state: &'a mut Option<Matrix>, gradient: &Matrix) -> &'a mut Matrix {
    let slot = state.get_or_insert_with(|| Matrix::zeros(gradient.rows, gradient.cols));
    assert_eq!(
        slot.shape(),
        gradient.shape(),
        "optimizer state is bound to another tensor shape"
    );
    slot
}

pub(crate) fn check_parameter(parameter: &Matrix, gradient: &Matrix) {
    assert_eq!(
        parameter.shape(),
        gradient.shape(),
        "parameter and gradient must share a shape"
    );
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Optimizer;
    use crate::math::matrix::Matrix;

    /// Applies a constant gradient `steps` times and records the parameter.
    pub fn trajectory(optimizer: &mut dyn Optimizer, gradient: f64, steps: usize) -> Vec<f64> {
        let g = Matrix::filled(1, 1, gradient);
        let mut theta = Matrix::zeros(1, 1);
        let mut path = Vec::with_capacity(steps);
        for _ in 0..steps {
            theta = optimizer.optimize(&theta, &g);
            path.push(theta.value_at(0, 0));
        }
        path
    }

    pub fn assert_moves_against_gradient(path: &[f64], gradient: f64) {
        let mut previous = 0.0;
        for &p in path {
            if gradient > 0.0 {
                assert!(p < previous, "expected a decrease, got {previous} -> {p}");
            } else {
                assert!(p > previous, "expected an increase, got {previous} -> {p}");
            }
            previous = p;
        }
    }
}
