use serde::{Serialize, Deserialize};

use crate::error::{NnError, Result};
use super::{Adam, Momentum, Optimizer, RmsProp, Sgd};

/// Produces a fresh, independently stateful optimizer per trainable tensor.
pub trait OptimizerFactory: Send + Sync {
    fn create(&self) -> Box<dyn Optimizer>;
}

impl<F> OptimizerFactory for F
where
    F: Fn() -> Box<dyn Optimizer> + Send + Sync,
{
    fn create(&self) -> Box<dyn Optimizer> {
        self()
    }
}

/// Serializable optimizer choice; doubles as the factory for trainers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OptimizerConfig {
    Sgd { learning_rate: f64 },
    Momentum { learning_rate: f64, momentum: f64 },
    RmsProp { learning_rate: f64, beta: f64, epsilon: f64 },
    Adam { learning_rate: f64, beta1: f64, beta2: f64, epsilon: f64 },
}

impl OptimizerConfig {
    pub fn adam(learning_rate: f64) -> OptimizerConfig {
        OptimizerConfig::Adam { learning_rate, beta1: 0.9, beta2: 0.999, epsilon: 1e-8 }
    }

    pub fn learning_rate(&self) -> f64 {
        match *self {
            OptimizerConfig::Sgd { learning_rate }
            | OptimizerConfig::Momentum { learning_rate, .. }
            | OptimizerConfig::RmsProp { learning_rate, .. }
            | OptimizerConfig::Adam { learning_rate, .. } => learning_rate,
        }
    }

    /// Validate optimizer hyperparameters.
    pub fn validate(&self) -> Result<()> {
        let lr = self.learning_rate();
        if !(lr.is_finite() && lr > 0.0) {
            return Err(NnError::InvalidConfig(format!(
                "learning rate must be finite and > 0, got {lr}"
            )));
        }
        let unit = |name: &str, value: f64| -> Result<()> {
            if value.is_finite() && (0.0..1.0).contains(&value) {
                Ok(())
            } else {
                Err(NnError::InvalidConfig(format!(
                    "{name} must be finite and in [0,1), got {value}"
                )))
            }
        };
        let positive = |name: &str, value: f64| -> Result<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(NnError::InvalidConfig(format!(
                    "{name} must be finite and > 0, got {value}"
                )))
            }
        };
        match *self {
            OptimizerConfig::Sgd { .. } => Ok(()),
            OptimizerConfig::Momentum { momentum, .. } => unit("momentum", momentum),
            OptimizerConfig::RmsProp { beta, epsilon, .. } => {
                unit("rmsprop beta", beta)?;
                positive("rmsprop epsilon", epsilon)
            }
            OptimizerConfig::Adam { beta1, beta2, epsilon, .. } => {
                unit("adam beta1", beta1)?;
                unit("adam beta2", beta2)?;
                positive("adam epsilon", epsilon)
            }
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig::Sgd { learning_rate: 0.01 }
    }
}

impl OptimizerFactory for OptimizerConfig {
    fn create(&self) -> Box<dyn Optimizer> {
        match *self {
            OptimizerConfig::Sgd { learning_rate } => Box::new(Sgd::new(learning_rate)),
            OptimizerConfig::Momentum { learning_rate, momentum } => {
                Box::new(Momentum::new(learning_rate, momentum))
            }
            OptimizerConfig::RmsProp { learning_rate, beta, epsilon } => {
                Box::new(RmsProp::new(learning_rate, beta, epsilon))
            }
            OptimizerConfig::Adam { learning_rate, beta1, beta2, epsilon } => {
                Box::new(Adam::new(learning_rate, beta1, beta2, epsilon))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::matrix::Matrix;

    #[test]
    fn factory_instances_do_not_share_state() {
        let config = OptimizerConfig::Momentum { learning_rate: 1.0, momentum: 0.5 };
        let mut weights_opt = config.create();
        let mut bias_opt = config.create();
        let g = Matrix::row(&[1.0]);
        weights_opt.optimize(&Matrix::row(&[0.0]), &g);
        // A fresh instance has no velocity yet.
        assert_eq!(bias_opt.optimize(&Matrix::row(&[0.0]), &g), Matrix::row(&[-1.0]));
    }

    #[test]
    fn closures_are_factories() {
        let factory = || -> Box<dyn Optimizer> { Box::new(Sgd::new(0.5)) };
        let mut opt = OptimizerFactory::create(&factory);
        assert_eq!(opt.optimize(&Matrix::row(&[1.0]), &Matrix::row(&[1.0])), Matrix::row(&[0.5]));
    }

    #[test]
    fn validation_rejects_bad_hyperparameters() {
        assert!(OptimizerConfig::adam(0.001).validate().is_ok());
        assert!(matches!(
            OptimizerConfig::Sgd { learning_rate: 0.0 }.validate(),
            Err(NnError::InvalidConfig(_))
        ));
        assert!(OptimizerConfig::Momentum { learning_rate: 0.1, momentum: 1.0 }.validate().is_err());
        assert!(OptimizerConfig::RmsProp { learning_rate: 0.1, beta: 0.9, epsilon: 0.0 }.validate().is_err());
    }

    #[test]
    fn parses_from_json() {
        let config: OptimizerConfig =
            serde_json::from_str(r#"{"type":"momentum","learning_rate":0.05,"momentum":0.9}"#).unwrap();
        assert_eq!(config, OptimizerConfig::Momentum { learning_rate: 0.05, momentum: 0.9 });
    }
}
