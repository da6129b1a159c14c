pub mod dataset;

pub use dataset::{batch_indices, split_indices, Dataset};
