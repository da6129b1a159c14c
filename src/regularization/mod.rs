pub mod regularizer;

pub use regularizer::{
    ElasticNet, L1, L2, NoRegularization, RegularizationType, Regularizer,
};
