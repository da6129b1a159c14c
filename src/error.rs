/// Errors raised by validation in the training engine.
///
/// All checks run synchronously before anything is mutated, so an `Err`
/// always leaves the caller's networks and datasets untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NnError {
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("layer update has no gradient named `{0}`")]
    MissingGradient(String),

    #[error("cannot aggregate an empty set of training results")]
    EmptyAggregation,
}

pub type Result<T> = std::result::Result<T, NnError>;
