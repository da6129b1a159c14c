use std::collections::BTreeMap;

use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;

/// Gradient name for a dense layer's weights.
pub const WEIGHTS: &str = "dW";
/// Gradient name for a dense layer's biases.
pub const BIASES: &str = "db";

/// Named gradients produced by one layer's backward pass.
///
/// Carries gradients from the backward pass to `LayerTrainer::apply_updates`,
/// and is what gets summed and averaged across parallel mini-batches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerUpdate {
    gradients: BTreeMap<String, Matrix>,
}

impl LayerUpdate {
    pub fn new() -> LayerUpdate {
        LayerUpdate::default()
    }

    pub fn with(mut self, name: &str, gradient: Matrix) -> LayerUpdate {
        self.insert(name, gradient);
        self
    }

    pub fn insert(&mut self, name: &str, gradient: Matrix) {
        self.gradients.insert(name.to_string(), gradient);
    }

    pub fn get(&self, name: &str) -> Result<&Matrix> {
        self.gradients
            .get(name)
            .ok_or_else(|| NnError::MissingGradient(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.gradients.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.gradients.is_empty()
    }

    /// Element-wise sum of both updates. A name present in only one side
    /// is carried over unchanged.
    pub fn merge(&self, other: &LayerUpdate) -> LayerUpdate {
        let mut gradients = self.gradients.clone();
        for (name, gradient) in &other.gradients {
            let summed = match gradients.get(name) {
                Some(existing) => existing + gradient,
                None => gradient.clone(),
            };
            gradients.insert(name.clone(), summed);
        }
        LayerUpdate { gradients }
    }

    pub fn scale(&self, factor: f64) -> LayerUpdate {
        LayerUpdate {
            gradients: self
                .gradients
                .iter()
                .map(|(name, g)| (name.clone(), g.scale(factor)))
                .collect(),
        }
    }

    /// Mean of the given updates, name by name.
    pub fn aggregate(updates: &[LayerUpdate]) -> Result<LayerUpdate> {
        let (first, rest) = updates.split_first().ok_or(NnError::EmptyAggregation)?;
        let total = rest.iter().fold(first.clone(), |acc, u| acc.merge(u));
        Ok(total.scale(1.0 / updates.len() as f64))
    }
}
