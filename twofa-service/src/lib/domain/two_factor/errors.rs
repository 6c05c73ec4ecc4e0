use auth::CodeError;
use auth::HashError;
use thiserror::Error;

/// Top-level error for all 2FA operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TwoFactorError {
    // Client-caused conditions
    #[error("Invalid 2FA code: {0}")]
    InvalidFormat(#[from] CodeError),

    #[error("2FA code does not match")]
    VerifyMismatch,

    #[error("2FA code has already been generated")]
    AlreadyActive,

    #[error("2FA has not been initialized")]
    NotInitialized,

    #[error("Too many requests")]
    RateLimited,

    #[error("Operation cancelled")]
    Cancelled,

    // Infrastructure errors
    #[error("Hashing failure: {0}")]
    HashFailure(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TwoFactorError {
    /// Whether the condition was caused by the caller rather than the service.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            TwoFactorError::HashFailure(_) | TwoFactorError::Internal(_)
        )
    }
}

impl From<HashError> for TwoFactorError {
    fn from(err: HashError) -> Self {
        TwoFactorError::HashFailure(err.to_string())
    }
}
