use thiserror::Error;

/// Error for 2FA code validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodeError {
    #[error("Code must be exactly {expected} characters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Code contains invalid characters (only A-Z and 0-9 allowed)")]
    InvalidCharacters,
}
