use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use auth::HashError;
use auth::SecretHasher;
use tokio_util::sync::CancellationToken;

use crate::domain::two_factor::errors::TwoFactorError;
use crate::domain::two_factor::models::TokenState;
use crate::domain::two_factor::models::TwoFactorCode;
use crate::domain::two_factor::ports::CodeHasher;
use crate::domain::two_factor::ports::TokenStore;

impl CodeHasher for SecretHasher {
    fn hash(&self, code: &str) -> Result<String, HashError> {
        SecretHasher::hash(self, code)
    }

    fn verify(&self, code: &str, hash: &str) -> Result<bool, HashError> {
        SecretHasher::verify(self, code, hash)
    }
}

/// In-memory single-slot token store.
///
/// The whole of generate, verify and expire runs under one mutex, hashing
/// included, so at most one hash computation is in flight per store.
pub struct InMemoryTokenStore<H = SecretHasher>
where
    H: CodeHasher,
{
    state: Mutex<TokenState>,
    hasher: H,
}

impl<H> InMemoryTokenStore<H>
where
    H: CodeHasher,
{
    /// Create an idle store.
    ///
    /// # Arguments
    /// * `hasher` - Hash implementation used for codes
    pub fn new(hasher: H) -> Self {
        Self {
            state: Mutex::new(TokenState::Idle),
            hasher,
        }
    }

    // The state is only ever replaced wholesale after every fallible step
    // succeeded, so a poisoned lock still guards a consistent value.
    fn lock(&self) -> MutexGuard<'_, TokenState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<H> TokenStore for InMemoryTokenStore<H>
where
    H: CodeHasher,
{
    fn generate(&self, abandoned: &CancellationToken) -> Result<TwoFactorCode, TwoFactorError> {
        let mut state = self.lock();

        if state.is_pending() {
            return Err(TwoFactorError::AlreadyActive);
        }

        let code = auth::code::generate_code();
        let hash = self.hasher.hash(&code)?;

        // A challenge whose plaintext reaches nobody would hold the slot.
        if abandoned.is_cancelled() {
            tracing::debug!("2FA caller went away, challenge discarded");
            return Err(TwoFactorError::Cancelled);
        }

        *state = TokenState::Pending { hash };
        tracing::debug!("2FA challenge published");

        Ok(TwoFactorCode::new(code))
    }

    fn verify(&self, code: &str) -> Result<bool, TwoFactorError> {
        let code = auth::code::sanitize(code)?;

        let mut state = self.lock();

        let hash = match &*state {
            TokenState::Idle => return Err(TwoFactorError::NotInitialized),
            TokenState::Pending { hash } => hash,
        };

        if !self.hasher.verify(&code, hash)? {
            return Err(TwoFactorError::VerifyMismatch);
        }

        *state = TokenState::Idle;
        tracing::debug!("2FA challenge consumed");

        Ok(true)
    }

    fn expire(&self) -> Result<(), TwoFactorError> {
        let mut state = self.lock();

        if !state.is_pending() {
            return Err(TwoFactorError::NotInitialized);
        }

        *state = TokenState::Idle;
        tracing::debug!("2FA challenge expired");

        Ok(())
    }

    fn is_pending(&self) -> bool {
        self.lock().is_pending()
    }
}
