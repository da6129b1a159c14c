pub mod dense;
pub mod dropout;
pub mod initializer;
pub mod trainer;
pub mod update;

pub use dense::{DenseTrainer, Layer};
pub use dropout::DropoutTrainer;
pub use initializer::Initializer;
pub use trainer::{Backward, BackwardFn, ForwardPass, LayerTrainer};
pub use update::{LayerUpdate, BIASES, WEIGHTS};
