use async_trait::async_trait;
use auth::HashError;
use tokio_util::sync::CancellationToken;

use crate::domain::two_factor::errors::TwoFactorError;
use crate::domain::two_factor::models::TwoFactorCode;

/// Port for 2FA domain service operations.
///
/// Every operation is gated by admission control and may be cancelled before
/// it starts.
#[async_trait]
pub trait TwoFactorServicePort: Send + Sync + 'static {
    /// Issue a new 2FA code.
    ///
    /// # Arguments
    /// * `cancel` - Cancellation signal checked before any work starts
    ///
    /// # Returns
    /// Plaintext code, handed out exactly once
    ///
    /// # Errors
    /// * `Cancelled` - Signal was already cancelled
    /// * `RateLimited` - Request was not admitted
    /// * `AlreadyActive` - A code is already outstanding
    /// * `HashFailure` - Hashing the code failed
    async fn generate(&self, cancel: &CancellationToken) -> Result<TwoFactorCode, TwoFactorError>;

    /// Verify a candidate code, consuming the challenge on success.
    ///
    /// # Arguments
    /// * `cancel` - Cancellation signal checked before any work starts
    /// * `code` - Candidate code as sent by the caller
    ///
    /// # Returns
    /// `true` when the code matched
    ///
    /// # Errors
    /// * `Cancelled` - Signal was already cancelled
    /// * `RateLimited` - Request was not admitted
    /// * `InvalidFormat` - Code does not match the alphabet or length
    /// * `NotInitialized` - No code is outstanding
    /// * `VerifyMismatch` - Code did not match
    async fn verify(&self, cancel: &CancellationToken, code: &str)
        -> Result<bool, TwoFactorError>;

    /// Drop the outstanding challenge.
    ///
    /// # Errors
    /// * `Cancelled` - Signal was already cancelled
    /// * `RateLimited` - Request was not admitted
    /// * `NotInitialized` - No code is outstanding
    async fn expire(&self, cancel: &CancellationToken) -> Result<(), TwoFactorError>;
}

/// Single-slot storage of the outstanding challenge.
///
/// Implementations must make each operation one indivisible transition.
/// Operations may block on CPU-bound hashing.
pub trait TokenStore: Send + Sync + 'static {
    /// Issue a code and publish its hash (Idle -> Pending).
    ///
    /// `abandoned` is cancelled once nobody is waiting for the plaintext; it
    /// is checked right before publishing.
    ///
    /// # Errors
    /// * `AlreadyActive` - A code is already outstanding, nothing changed
    /// * `HashFailure` - Hashing failed, state stays Idle
    /// * `Cancelled` - Caller went away before publishing, state stays Idle
    fn generate(&self, abandoned: &CancellationToken) -> Result<TwoFactorCode, TwoFactorError>;

    /// Compare a candidate against the stored hash (Pending -> Idle on match).
    ///
    /// # Errors
    /// * `InvalidFormat` - Candidate rejected before touching the hash
    /// * `NotInitialized` - State is Idle
    /// * `VerifyMismatch` - Candidate did not match, state unchanged
    /// * `HashFailure` - Stored hash could not be checked
    fn verify(&self, code: &str) -> Result<bool, TwoFactorError>;

    /// Clear the outstanding challenge (Pending -> Idle).
    ///
    /// # Errors
    /// * `NotInitialized` - State is Idle, nothing changed
    fn expire(&self) -> Result<(), TwoFactorError>;

    /// Whether a challenge is outstanding.
    fn is_pending(&self) -> bool;
}

/// One-way hashing of codes.
pub trait CodeHasher: Send + Sync + 'static {
    /// Hash a plaintext code.
    fn hash(&self, code: &str) -> Result<String, HashError>;

    /// Constant-time check of a plaintext code against a stored hash.
    fn verify(&self, code: &str, hash: &str) -> Result<bool, HashError>;
}

/// Admission control in front of the token store.
pub trait AdmissionControl: Send + Sync + 'static {
    /// Try to take a slot; `false` means the request must be rejected.
    fn admit(&self) -> bool;
}
