use crate::activation::activation::ActivationFunction;
use crate::error::{NnError, Result};
use crate::loss::loss_type::LossType;
use crate::math::matrix::Matrix;
use crate::network::network::Network;
use crate::network::spec::NetworkSpec;
use crate::train::train_config::TrainConfig;
use crate::train::trainer::TrainedNetwork;

use super::{check_label_count, fit, fitted, hidden_spec};

/// Single-output regression with a linear output unit and MSE loss.
pub struct Regressor {
    spec: NetworkSpec,
    config: TrainConfig,
    trained: Option<TrainedNetwork>,
}

impl Regressor {
    /// ReLU hidden layers of the given widths; no hidden layers gives plain
    /// linear regression.
    pub fn new(input_size: usize, hidden: &[usize], config: TrainConfig) -> Regressor {
        let spec = hidden_spec("regressor", input_size, hidden)
            .dense(1, ActivationFunction::Identity)
            .loss(LossType::Mse);
        Regressor { spec, config, trained: None }
    }

    /// Any architecture with a single output.
    pub fn from_spec(spec: NetworkSpec, config: TrainConfig) -> Result<Regressor> {
        spec.validate()?;
        if spec.output_size() != 1 {
            return Err(NnError::InvalidConfig(format!(
                "a regressor has one output, `{}` has {}",
                spec.name,
                spec.output_size()
            )));
        }
        Ok(Regressor { spec, config, trained: None })
    }

    /// `features` is `inputs x samples`, one target per sample.
    pub fn fit(&mut self, features: &Matrix, targets: &[f64]) -> Result<&TrainedNetwork> {
        check_label_count(features, targets.len())?;
        let trained = fit(&self.spec, &self.config, features, Matrix::row(targets))?;
        Ok(self.trained.insert(trained))
    }

    pub fn predict(&self, features: &Matrix) -> Result<Vec<f64>> {
        Ok(self.network()?.predict(features)?.data.swap_remove(0))
    }

    pub fn network(&self) -> Result<&Network> {
        fitted(&self.trained)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optim::OptimizerConfig;

    #[test]
    fn label_count_must_match_samples() {
        let mut model = Regressor::new(2, &[], TrainConfig::default());
        let err = model.fit(&Matrix::zeros(2, 5), &[1.0; 4]).unwrap_err();
        assert!(matches!(err, NnError::InvalidData(_)));
    }

    #[test]
    fn predicting_before_fitting_fails() {
        let model = Regressor::new(2, &[3], TrainConfig::default());
        assert!(model.predict(&Matrix::zeros(2, 1)).is_err());
    }

    #[test]
    fn fits_an_offset_line() {
        let xs: Vec<f64> = (0..20).map(|i| i as f64 / 10.0 - 1.0).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 0.5 * x - 2.0).collect();
        let config = TrainConfig::new(OptimizerConfig::Sgd { learning_rate: 0.3 }, 500);
        let mut model = Regressor::new(1, &[], config);
        model.fit(&Matrix::row(&xs), &ys).unwrap();

        let predicted = model.predict(&Matrix::row(&[0.0, 1.0])).unwrap();
        approx::assert_abs_diff_eq!(predicted[0], -2.0, epsilon = 1e-3);
        approx::assert_abs_diff_eq!(predicted[1], -1.5, epsilon = 1e-3);
    }

    #[test]
    fn spec_must_have_one_output() {
        let spec = NetworkSpec::new("wide", 2).dense(3, ActivationFunction::Identity);
        assert!(Regressor::from_spec(spec, TrainConfig::default()).is_err());
    }
}
