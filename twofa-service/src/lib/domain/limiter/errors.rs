use thiserror::Error;

/// Error for the leaky-bucket limiter
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LimiterError {
    #[error("Leak task is already running for this bucket")]
    AlreadyLeaking,

    #[error("Invalid bucket configuration: {0}")]
    InvalidConfig(String),
}
