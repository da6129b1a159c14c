use rand::RngCore;

use crate::activation::activation::ActivationFunction;
use crate::error::Result;
use crate::layers::dense::Layer;
use crate::layers::update::LayerUpdate;
use crate::math::matrix::Matrix;

/// Result of running a backward closure.
#[derive(Debug, Clone)]
pub struct Backward {
    /// ∂L/∂input, handed to the previous layer.
    pub input_gradient: Matrix,
    pub update: LayerUpdate,
}

/// Consumes ∂L/∂output and produces the layer's gradients.
pub type BackwardFn = Box<dyn FnOnce(&Matrix) -> Backward + Send>;

/// Output of a training-mode forward pass together with the closure that
/// differentiates it. The closure owns everything it needs, so parameters
/// can change afterwards without affecting the gradients it computes.
pub struct ForwardPass {
    pub output: Matrix,
    pub backward: BackwardFn,
}

/// A layer as seen by the training loop.
///
/// `forward` and `infer` only read parameters; `apply_updates` is the one
/// place a trainer mutates itself. That split is what lets mini-batches run
/// their forward/backward passes in parallel against the same parameters.
pub trait LayerTrainer: Send + Sync {
    fn input_size(&self) -> usize;

    fn output_size(&self) -> usize;

    /// Training-mode forward pass over `input_size x samples`.
    fn forward(&self, input: &Matrix, rng: &mut dyn RngCore) -> ForwardPass;

    /// Inference-mode forward pass; no backward closure, no randomness.
    fn infer(&self, input: &Matrix) -> Matrix;

    fn apply_updates(&mut self, update: &LayerUpdate) -> Result<()>;

    /// Penalty reported alongside the loss; 0 for parameter-free layers.
    fn regularization_penalty(&self) -> f64 {
        0.0
    }

    /// Asks an output layer to take incoming gradients as already being at
    /// the pre-activations of `activation`. Returns false when the layer
    /// does not end in that activation.
    fn fuse_output_gradient(&mut self, _activation: &ActivationFunction) -> bool {
        false
    }

    /// Whether the layer survives into the inference network.
    fn is_inference(&self) -> bool;

    /// Snapshot of the current parameters as an inference layer.
    fn create_layer(&self) -> Result<Layer>;
}
