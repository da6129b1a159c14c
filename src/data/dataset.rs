use rand::seq::SliceRandom;
use rand::RngCore;

use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;

/// Paired features and labels, one sample per column.
///
/// Splitting, shuffling and batching all return new datasets; the source
/// is never modified.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    features: Matrix,
    labels: Matrix,
}

impl Dataset {
    pub fn new(features: Matrix, labels: Matrix) -> Result<Dataset> {
        if features.cols != labels.cols {
            return Err(NnError::DimensionMismatch(format!(
                "features have {} samples but labels have {}",
                features.cols, labels.cols
            )));
        }
        Ok(Dataset { features, labels })
    }

    /// Builds a dataset from per-sample vectors.
    pub fn from_samples(inputs: &[Vec<f64>], targets: &[Vec<f64>]) -> Result<Dataset> {
        if inputs.len() != targets.len() {
            return Err(NnError::InvalidData(format!(
                "{} inputs but {} targets",
                inputs.len(),
                targets.len()
            )));
        }
        let same_len = |rows: &[Vec<f64>]| rows.windows(2).all(|w| w[0].len() == w[1].len());
        if !same_len(inputs) || !same_len(targets) {
            return Err(NnError::InvalidData("samples have differing lengths".to_string()));
        }
        Dataset::new(Matrix::from_columns(inputs), Matrix::from_columns(targets))
    }

    pub fn features(&self) -> &Matrix {
        &self.features
    }

    pub fn labels(&self) -> &Matrix {
        &self.labels
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.features.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn feature_count(&self) -> usize {
        self.features.rows
    }

    pub fn label_count(&self) -> usize {
        self.labels.rows
    }

    /// The samples at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> Dataset {
        Dataset {
            features: self.features.select_columns(indices),
            labels: self.labels.select_columns(indices),
        }
    }

    pub fn shuffle(&self, rng: &mut dyn RngCore) -> Dataset {
        let mut indices: Vec<usize> = (0..self.len()).collect();
        indices.shuffle(rng);
        self.select(&indices)
    }

    /// Consecutive batches of `size` samples; the last may be smaller.
    pub fn batches(&self, size: usize) -> Result<Vec<Dataset>> {
        Ok(batch_indices(self.len(), size)?
            .iter()
            .map(|indices| self.select(indices))
            .collect())
    }

    /// Randomly partitions the samples. Returns one dataset per ratio plus a
    /// final one holding the remainder.
    pub fn split(&self, ratios: &[f64], rng: &mut dyn RngCore) -> Result<Vec<Dataset>> {
        Ok(split_indices(self.len(), ratios, rng)?
            .iter()
            .map(|indices| self.select(indices))
            .collect())
    }
}

/// Shuffles `0..n` and cuts it into `ratios.len() + 1` disjoint parts whose
/// union is every index.
///
/// Each ratio must lie strictly within (0, 1) and their sum must be below 1.
pub fn split_indices(n: usize, ratios: &[f64], rng: &mut dyn RngCore) -> Result<Vec<Vec<usize>>> {
    if let Some(bad) = ratios.iter().find(|r| !(**r > 0.0 && **r < 1.0)) {
        return Err(NnError::InvalidConfig(format!(
            "split ratios must be within (0, 1), got {bad}"
        )));
    }
    let total: f64 = ratios.iter().sum();
    if total >= 1.0 {
        return Err(NnError::InvalidConfig(format!(
            "split ratios must sum to less than 1, got {total}"
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);

    let mut parts = Vec::with_capacity(ratios.len() + 1);
    let mut start = 0;
    for ratio in ratios {
        let end = (start + (ratio * n as f64).round() as usize).min(n);
        parts.push(indices[start..end].to_vec());
        start = end;
    }
    parts.push(indices[start..].to_vec());
    Ok(parts)
}

/// Cuts `0..n` into consecutive chunks of `size`.
pub fn batch_indices(n: usize, size: usize) -> Result<Vec<Vec<usize>>> {
    if size == 0 {
        return Err(NnError::InvalidConfig("batch size must be at least 1".to_string()));
    }
    let indices: Vec<usize> = (0..n).collect();
    Ok(indices.chunks(size).map(|c| c.to_vec()).collect())
}
