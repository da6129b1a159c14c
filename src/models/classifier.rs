use crate::activation::activation::ActivationFunction;
use crate::error::{NnError, Result};
use crate::loss::loss_type::LossType;
use crate::math::matrix::Matrix;
use crate::network::network::Network;
use crate::network::spec::NetworkSpec;
use crate::train::train_config::TrainConfig;
use crate::train::trainer::TrainedNetwork;

use super::{check_label_count, fit, fitted, hidden_spec};

fn fraction_equal<T: PartialEq>(predicted: &[T], expected: &[T]) -> f64 {
    if expected.is_empty() {
        return 0.0;
    }
    let hits = predicted.iter().zip(expected).filter(|(p, e)| p == e).count();
    hits as f64 / expected.len() as f64
}

/// Two-class classifier: one sigmoid output trained with binary
/// cross-entropy.
pub struct BinaryClassifier {
    spec: NetworkSpec,
    config: TrainConfig,
    trained: Option<TrainedNetwork>,
}

impl BinaryClassifier {
    pub fn new(input_size: usize, hidden: &[usize], config: TrainConfig) -> BinaryClassifier {
        let spec = hidden_spec("binary-classifier", input_size, hidden)
            .dense(1, ActivationFunction::Sigmoid)
            .loss(LossType::BinaryCrossEntropy);
        BinaryClassifier { spec, config, trained: None }
    }

    pub fn fit(&mut self, features: &Matrix, labels: &[bool]) -> Result<&TrainedNetwork> {
        check_label_count(features, labels.len())?;
        let targets: Vec<f64> = labels.iter().map(|&l| if l { 1.0 } else { 0.0 }).collect();
        let trained = fit(&self.spec, &self.config, features, Matrix::row(&targets))?;
        Ok(self.trained.insert(trained))
    }

    /// Probability of the positive class per sample.
    pub fn predict_proba(&self, features: &Matrix) -> Result<Vec<f64>> {
        Ok(self.network()?.predict(features)?.data.swap_remove(0))
    }

    pub fn predict(&self, features: &Matrix) -> Result<Vec<bool>> {
        Ok(self.predict_proba(features)?.into_iter().map(|p| p >= 0.5).collect())
    }

    pub fn accuracy(&self, features: &Matrix, labels: &[bool]) -> Result<f64> {
        check_label_count(features, labels.len())?;
        Ok(fraction_equal(&self.predict(features)?, labels))
    }

    pub fn network(&self) -> Result<&Network> {
        fitted(&self.trained)
    }
}

/// One softmax output per class, trained with categorical cross-entropy on
/// one-hot labels.
pub struct MultiClassClassifier {
    classes: usize,
    spec: NetworkSpec,
    config: TrainConfig,
    trained: Option<TrainedNetwork>,
}

impl MultiClassClassifier {
    pub fn new(
        input_size: usize,
        hidden: &[usize],
        classes: usize,
        config: TrainConfig,
    ) -> Result<MultiClassClassifier> {
        if classes < 2 {
            return Err(NnError::InvalidConfig(format!(
                "a classifier needs at least two classes, got {classes}"
            )));
        }
        let spec = hidden_spec("multi-class-classifier", input_size, hidden)
            .dense(classes, ActivationFunction::Softmax)
            .loss(LossType::CrossEntropy);
        Ok(MultiClassClassifier { classes, spec, config, trained: None })
    }

    pub fn classes(&self) -> usize {
        self.classes
    }

    /// `classes x labels.len()` matrix with a single 1 per column.
    pub fn one_hot(&self, labels: &[usize]) -> Result<Matrix> {
        if let Some(&bad) = labels.iter().find(|&&l| l >= self.classes) {
            return Err(NnError::InvalidData(format!(
                "label {bad} is out of range for {} classes",
                self.classes
            )));
        }
        Ok(Matrix::from_fn(self.classes, labels.len(), |r, c| {
            if labels[c] == r { 1.0 } else { 0.0 }
        }))
    }

    pub fn fit(&mut self, features: &Matrix, labels: &[usize]) -> Result<&TrainedNetwork> {
        check_label_count(features, labels.len())?;
        let targets = self.one_hot(labels)?;
        let trained = fit(&self.spec, &self.config, features, targets)?;
        Ok(self.trained.insert(trained))
    }

    /// Class probabilities, one column per sample.
    pub fn predict_proba(&self, features: &Matrix) -> Result<Matrix> {
        self.network()?.predict(features)
    }

    pub fn predict(&self, features: &Matrix) -> Result<Vec<usize>> {
        Ok(self.predict_proba(features)?.column_argmax())
    }

    pub fn accuracy(&self, features: &Matrix, labels: &[usize]) -> Result<f64> {
        check_label_count(features, labels.len())?;
        Ok(fraction_equal(&self.predict(features)?, labels))
    }

    pub fn network(&self) -> Result<&Network> {
        fitted(&self.trained)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optim::OptimizerConfig;

    /// Three well separated clusters around (0,2), (-2,-1) and (2,-1).
    fn clusters() -> (Matrix, Vec<usize>) {
        let centres = [(0.0, 2.0), (-2.0, -1.0), (2.0, -1.0)];
        let offsets = [(0.0, 0.0), (0.3, 0.1), (-0.2, 0.3), (0.1, -0.3), (-0.3, -0.2)];
        let mut columns = Vec::new();
        let mut labels = Vec::new();
        for (class, &(cx, cy)) in centres.iter().enumerate() {
            for &(dx, dy) in offsets.iter() {
                columns.push(vec![cx + dx, cy + dy]);
                labels.push(class);
            }
        }
        (Matrix::from_columns(&columns), labels)
    }

    #[test]
    fn one_hot_encodes_and_rejects_out_of_range() {
        let model = MultiClassClassifier::new(2, &[], 3, TrainConfig::default()).unwrap();
        let encoded = model.one_hot(&[2, 0]).unwrap();
        assert_eq!(encoded, Matrix::from_data(vec![vec![0.0, 1.0], vec![0.0, 0.0], vec![1.0, 0.0]]));
        assert!(matches!(model.one_hot(&[3]), Err(NnError::InvalidData(_))));
    }

    #[test]
    fn separates_three_clusters() {
        let (features, labels) = clusters();
        let config = TrainConfig::new(OptimizerConfig::adam(0.05), 300);
        let mut model = MultiClassClassifier::new(2, &[], 3, config).unwrap();
        model.fit(&features, &labels).unwrap();
        assert_eq!(model.accuracy(&features, &labels).unwrap(), 1.0);

        let probabilities = model.predict_proba(&features).unwrap();
        for sum in probabilities.column_sum().data[0].iter() {
            approx::assert_abs_diff_eq!(*sum, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn binary_labels_must_match_samples() {
        let mut model = BinaryClassifier::new(2, &[], TrainConfig::default());
        assert!(matches!(
            model.fit(&Matrix::zeros(2, 3), &[true, false]),
            Err(NnError::InvalidData(_))
        ));
        assert!(model.predict(&Matrix::zeros(2, 1)).is_err());
    }

    #[test]
    fn needs_two_classes() {
        assert!(MultiClassClassifier::new(2, &[], 1, TrainConfig::default()).is_err());
    }
}
