use std::sync::Arc;

use rand::RngCore;

use crate::activation::activation::ActivationFunction;
use crate::error::{NnError, Result};
use crate::layers::initializer::Initializer;
use crate::layers::trainer::{Backward, BackwardFn, ForwardPass, LayerTrainer};
use crate::layers::update::{LayerUpdate, BIASES, WEIGHTS};
use crate::math::matrix::Matrix;
use crate::optim::{Optimizer, OptimizerFactory};
use crate::regularization::Regularizer;

/// Immutable fully connected layer of a trained network.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    weights: Matrix,
    biases: Matrix,
    activator: ActivationFunction,
}

impl Layer {
    /// `weights` is `units x input_size`, `biases` is `units x 1`.
    pub fn new(weights: Matrix, biases: Matrix, activation: ActivationFunction) -> Result<Layer> {
        if biases.cols != 1 || biases.rows != weights.rows {
            return Err(NnError::DimensionMismatch(format!(
                "biases must be {}x1 for {} units, got {}x{}",
                weights.rows, weights.rows, biases.rows, biases.cols
            )));
        }
        Ok(Layer { weights, biases, activator: activation })
    }

    pub fn size(&self) -> usize {
        self.weights.rows
    }

    pub fn input_size(&self) -> usize {
        self.weights.cols
    }

    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    pub fn biases(&self) -> &Matrix {
        &self.biases
    }

    pub fn activation(&self) -> &ActivationFunction {
        &self.activator
    }

    /// a = activation(W·x + b), one sample per column.
    pub fn forward(&self, input: &Matrix) -> Matrix {
        let z = (&self.weights * input).add_column_vector(&self.biases);
        self.activator.apply(&z)
    }
}

/// Trainable dense layer: owns its parameters and one optimizer per tensor.
pub struct DenseTrainer {
    layer: Layer,
    regularizer: Arc<dyn Regularizer>,
    weight_optimizer: Box<dyn Optimizer>,
    bias_optimizer: Box<dyn Optimizer>,
    /// Incoming gradients are already at the pre-activations.
    fused_output: bool,
}

impl DenseTrainer {
    /// Draws weights with `initializer`; biases start at zero.
    pub fn new(
        units: usize,
        input_size: usize,
        activation: ActivationFunction,
        initializer: Initializer,
        regularizer: Arc<dyn Regularizer>,
        optimizers: &dyn OptimizerFactory,
        rng: &mut dyn RngCore,
    ) -> DenseTrainer {
        let weights = initializer.weights(units, input_size, rng);
        DenseTrainer {
            layer: Layer { weights, biases: Matrix::zeros(units, 1), activator: activation },
            regularizer,
            weight_optimizer: optimizers.create(),
            bias_optimizer: optimizers.create(),
            fused_output: false,
        }
    }

    /// Starts from explicit parameters.
    pub fn with_parameters(
        weights: Matrix,
        biases: Matrix,
        activation: ActivationFunction,
        regularizer: Arc<dyn Regularizer>,
        optimizers: &dyn OptimizerFactory,
    ) -> Result<DenseTrainer> {
        Ok(DenseTrainer {
            layer: Layer::new(weights, biases, activation)?,
            regularizer,
            weight_optimizer: optimizers.create(),
            bias_optimizer: optimizers.create(),
            fused_output: false,
        })
    }

    pub fn weights(&self) -> &Matrix {
        self.layer.weights()
    }

    pub fn biases(&self) -> &Matrix {
        self.layer.biases()
    }
}

impl LayerTrainer for DenseTrainer {
    fn input_size(&self) -> usize {
        self.layer.input_size()
    }

    fn output_size(&self) -> usize {
        self.layer.size()
    }

    fn forward(&self, input: &Matrix, _rng: &mut dyn RngCore) -> ForwardPass {
        let z = (self.weights() * input).add_column_vector(self.biases());
        let output = self.layer.activator.apply(&z);

        // The closure keeps its own copy of W so a later update cannot leak
        // into this pass's input gradient.
        let weights = self.weights().clone();
        let input = input.clone();
        let activation = self.layer.activator.clone();
        let regularizer = Arc::clone(&self.regularizer);
        let fused = self.fused_output;

        let backward: BackwardFn = Box::new(move |output_gradient: &Matrix| {
            // δ = ∂L/∂a ⊙ σ'(z), unless the loss already produced δ.
            let dz = if fused {
                output_gradient.clone()
            } else {
                output_gradient.hadamard(&activation.derivative_matrix(&z))
            };
            let m = output_gradient.cols as f64;

            let dw = &(&dz * &input.transpose()).scale(1.0 / m) + &regularizer.gradient(&weights);
            let db = dz.row_sum().scale(1.0 / m);
            let input_gradient = &weights.transpose() * &dz;

            Backward {
                input_gradient,
                update: LayerUpdate::new().with(WEIGHTS, dw).with(BIASES, db),
            }
        });

        ForwardPass { output, backward }
    }

    fn infer(&self, input: &Matrix) -> Matrix {
        self.layer.forward(input)
    }

    fn apply_updates(&mut self, update: &LayerUpdate) -> Result<()> {
        let dw = update.get(WEIGHTS)?;
        let db = update.get(BIASES)?;
        let weights = self.weight_optimizer.optimize(&self.layer.weights, dw);
        let biases = self.bias_optimizer.optimize(&self.layer.biases, db);
        self.layer.weights = weights;
        self.layer.biases = biases;
        Ok(())
    }

    fn regularization_penalty(&self) -> f64 {
        self.regularizer.penalty(self.weights())
    }

    fn fuse_output_gradient(&mut self, activation: &ActivationFunction) -> bool {
        self.fused_output = self.layer.activator == *activation;
        self.fused_output
    }

    fn is_inference(&self) -> bool {
        true
    }

    fn create_layer(&self) -> Result<Layer> {
        Ok(self.layer.clone())
    }
}
