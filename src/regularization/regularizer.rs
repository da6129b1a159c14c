use std::sync::Arc;

use serde::{Serialize, Deserialize};

use crate::math::matrix::Matrix;

/// Weight regularization.
///
/// `penalty` is only added to the reported loss, while `gradient` is folded
/// straight into `dW` during the backward pass. A custom regularizer must
/// keep the two consistent.
pub trait Regularizer: Send + Sync {
    fn penalty(&self, weights: &Matrix) -> f64;

    fn gradient(&self, weights: &Matrix) -> Matrix;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoRegularization;

impl Regularizer for NoRegularization {
    fn penalty(&self, _weights: &Matrix) -> f64 {
        0.0
    }

    fn gradient(&self, weights: &Matrix) -> Matrix {
        Matrix::zeros(weights.rows, weights.cols)
    }
}

/// λ·Σ|w|
#[derive(Debug, Clone, Copy)]
pub struct L1 {
    pub lambda: f64,
}

impl Regularizer for L1 {
    fn penalty(&self, weights: &Matrix) -> f64 {
        self.lambda * weights.map(f64::abs).sum()
    }

    fn gradient(&self, weights: &Matrix) -> Matrix {
        let lambda = self.lambda;
        weights.map(|w| if w > 0.0 { lambda } else if w < 0.0 { -lambda } else { 0.0 })
    }
}

/// λ·Σw²
#[derive(Debug, Clone, Copy)]
pub struct L2 {
    pub lambda: f64,
}

impl Regularizer for L2 {
    fn penalty(&self, weights: &Matrix) -> f64 {
        self.lambda * weights.map(|w| w * w).sum()
    }

    fn gradient(&self, weights: &Matrix) -> Matrix {
        weights.scale(2.0 * self.lambda)
    }
}

/// Sum of an L1 and an L2 term.
#[derive(Debug, Clone, Copy)]
pub struct ElasticNet {
    pub l1: f64,
    pub l2: f64,
}

impl Regularizer for ElasticNet {
    fn penalty(&self, weights: &Matrix) -> f64 {
        L1 { lambda: self.l1 }.penalty(weights) + L2 { lambda: self.l2 }.penalty(weights)
    }

    fn gradient(&self, weights: &Matrix) -> Matrix {
        &L1 { lambda: self.l1 }.gradient(weights) + &L2 { lambda: self.l2 }.gradient(weights)
    }
}

/// Serializable choice of regularizer for a network spec.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegularizationType {
    None,
    L1 { lambda: f64 },
    L2 { lambda: f64 },
    ElasticNet { l1: f64, l2: f64 },
}

impl RegularizationType {
    pub fn build(&self) -> Arc<dyn Regularizer> {
        match *self {
            RegularizationType::None => Arc::new(NoRegularization),
            RegularizationType::L1 { lambda } => Arc::new(L1 { lambda }),
            RegularizationType::L2 { lambda } => Arc::new(L2 { lambda }),
            RegularizationType::ElasticNet { l1, l2 } => Arc::new(ElasticNet { l1, l2 }),
        }
    }
}

impl Default for RegularizationType {
    fn default() -> Self {
        RegularizationType::None
    }
}
