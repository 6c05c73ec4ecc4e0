use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::two_factor::errors::TwoFactorError;
use crate::domain::two_factor::models::TwoFactorAction;
use crate::domain::two_factor::models::TwoFactorCode;
use crate::domain::two_factor::ports::AdmissionControl;
use crate::domain::two_factor::ports::TokenStore;
use crate::domain::two_factor::ports::TwoFactorServicePort;

/// Domain service implementation for 2FA operations.
///
/// Concrete implementation of TwoFactorServicePort with dependency injection:
/// every call passes the admission gate before it reaches the token store.
pub struct TwoFactorService<S, L>
where
    S: TokenStore,
    L: AdmissionControl,
{
    store: Arc<S>,
    limiter: Arc<L>,
}

impl<S, L> TwoFactorService<S, L>
where
    S: TokenStore,
    L: AdmissionControl,
{
    /// Create a new 2FA service with injected dependencies.
    ///
    /// # Arguments
    /// * `store` - Single-slot token store
    /// * `limiter` - Admission control guarding the store
    ///
    /// # Returns
    /// Configured 2FA service instance
    pub fn new(store: Arc<S>, limiter: Arc<L>) -> Self {
        Self { store, limiter }
    }

    fn admit(
        &self,
        cancel: &CancellationToken,
        action: TwoFactorAction,
    ) -> Result<(), TwoFactorError> {
        if cancel.is_cancelled() {
            return Err(TwoFactorError::Cancelled);
        }

        if !self.limiter.admit() {
            tracing::warn!(action = %action, "Request rejected by rate limiter");
            return Err(TwoFactorError::RateLimited);
        }

        Ok(())
    }

    /// Run a store operation on the blocking pool.
    ///
    /// Hashing is CPU-bound; once started the operation runs to completion.
    async fn run_store<T, F>(&self, operation: F) -> Result<T, TwoFactorError>
    where
        T: Send + 'static,
        F: FnOnce(&S) -> Result<T, TwoFactorError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);

        tokio::task::spawn_blocking(move || operation(store.as_ref()))
            .await
            .map_err(|e| TwoFactorError::Internal(format!("Token store task failed: {}", e)))?
    }
}

#[async_trait]
impl<S, L> TwoFactorServicePort for TwoFactorService<S, L>
where
    S: TokenStore,
    L: AdmissionControl,
{
    async fn generate(&self, cancel: &CancellationToken) -> Result<TwoFactorCode, TwoFactorError> {
        self.admit(cancel, TwoFactorAction::Generate)?;

        let started = std::time::Instant::now();

        // Cancelled if this future is dropped while the store is still working.
        let abandoned = CancellationToken::new();
        let _waiting = abandoned.clone().drop_guard();

        let result = self
            .run_store(move |store| store.generate(&abandoned))
            .await;

        match &result {
            Ok(_) => tracing::info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Authentication key generated"
            ),
            Err(e) => tracing::debug!(error = %e, "Unable to generate authentication key"),
        }

        result
    }

    async fn verify(
        &self,
        cancel: &CancellationToken,
        code: &str,
    ) -> Result<bool, TwoFactorError> {
        self.admit(cancel, TwoFactorAction::Verify)?;

        let code = code.to_string();
        let result = self.run_store(move |store| store.verify(&code)).await;

        match &result {
            Ok(_) => tracing::info!("Verified key"),
            Err(e) => tracing::debug!(error = %e, "Unable to verify key"),
        }

        result
    }

    async fn expire(&self, cancel: &CancellationToken) -> Result<(), TwoFactorError> {
        self.admit(cancel, TwoFactorAction::Expire)?;

        let result = self.run_store(|store| store.expire()).await;

        match &result {
            Ok(()) => tracing::info!("Successfully expired 2FA key"),
            Err(e) => tracing::debug!(error = %e, "Failed to expire 2FA key"),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::sync::Mutex;

    use auth::HashError;
    use mockall::mock;
    use mockall::Sequence;
    use tokio::sync::oneshot;

    use super::*;
    use crate::domain::two_factor::ports::CodeHasher;
    use crate::domain::two_factor::store::InMemoryTokenStore;

    mock! {
        pub TestTokenStore {}

        impl TokenStore for TestTokenStore {
            fn generate(&self, abandoned: &CancellationToken) -> Result<TwoFactorCode, TwoFactorError>;
            fn verify(&self, code: &str) -> Result<bool, TwoFactorError>;
            fn expire(&self) -> Result<(), TwoFactorError>;
            fn is_pending(&self) -> bool;
        }
    }

    mock! {
        pub TestAdmission {}

        impl AdmissionControl for TestAdmission {
            fn admit(&self) -> bool;
        }
    }

    fn admitting() -> MockTestAdmission {
        let mut limiter = MockTestAdmission::new();
        limiter.expect_admit().returning(|| true);
        limiter
    }

    fn rejecting() -> MockTestAdmission {
        let mut limiter = MockTestAdmission::new();
        limiter.expect_admit().returning(|| false);
        limiter
    }

    fn service(
        store: MockTestTokenStore,
        limiter: MockTestAdmission,
    ) -> TwoFactorService<MockTestTokenStore, MockTestAdmission> {
        TwoFactorService::new(Arc::new(store), Arc::new(limiter))
    }

    #[tokio::test]
    async fn test_generate_success() {
        let mut store = MockTestTokenStore::new();
        store
            .expect_generate()
            .withf(|abandoned| !abandoned.is_cancelled())
            .times(1)
            .returning(|_| Ok(TwoFactorCode::new("AB12Z".to_string())));

        let service = service(store, admitting());

        let code = service.generate(&CancellationToken::new()).await.unwrap();
        assert_eq!(code.as_str(), "AB12Z");
    }

    #[tokio::test]
    async fn test_generate_rate_limited_skips_store() {
        let mut store = MockTestTokenStore::new();
        store.expect_generate().times(0);

        let service = service(store, rejecting());

        let result = service.generate(&CancellationToken::new()).await;
        assert_eq!(result, Err(TwoFactorError::RateLimited));
    }

    #[tokio::test]
    async fn test_generate_propagates_store_error() {
        let mut store = MockTestTokenStore::new();
        store
            .expect_generate()
            .times(1)
            .returning(|_| Err(TwoFactorError::AlreadyActive));

        let service = service(store, admitting());

        let result = service.generate(&CancellationToken::new()).await;
        assert_eq!(result, Err(TwoFactorError::AlreadyActive));
    }

    #[tokio::test]
    async fn test_cancelled_before_admission() {
        let mut store = MockTestTokenStore::new();
        store.expect_generate().times(0);
        store.expect_verify().times(0);
        store.expect_expire().times(0);

        let mut limiter = MockTestAdmission::new();
        limiter.expect_admit().times(0);

        let service = service(store, limiter);
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(
            service.generate(&cancel).await,
            Err(TwoFactorError::Cancelled)
        );
        assert_eq!(
            service.verify(&cancel, "ABCDE").await,
            Err(TwoFactorError::Cancelled)
        );
        assert_eq!(service.expire(&cancel).await, Err(TwoFactorError::Cancelled));
    }

    #[tokio::test]
    async fn test_verify_passes_code_through() {
        let mut store = MockTestTokenStore::new();
        store
            .expect_verify()
            .withf(|code| code == "K7Q2Z")
            .times(1)
            .returning(|_| Ok(true));

        let service = service(store, admitting());

        let result = service.verify(&CancellationToken::new(), "K7Q2Z").await;
        assert_eq!(result, Ok(true));
    }

    #[tokio::test]
    async fn test_verify_mismatch() {
        let mut store = MockTestTokenStore::new();
        store
            .expect_verify()
            .times(1)
            .returning(|_| Err(TwoFactorError::VerifyMismatch));

        let service = service(store, admitting());

        let result = service.verify(&CancellationToken::new(), "AAAAA").await;
        assert_eq!(result, Err(TwoFactorError::VerifyMismatch));
    }

    #[tokio::test]
    async fn test_verify_rate_limited_skips_store() {
        let mut store = MockTestTokenStore::new();
        store.expect_verify().times(0);

        let service = service(store, rejecting());

        let result = service.verify(&CancellationToken::new(), "AAAAA").await;
        assert_eq!(result, Err(TwoFactorError::RateLimited));
    }

    #[tokio::test]
    async fn test_expire_not_initialized() {
        let mut store = MockTestTokenStore::new();
        store
            .expect_expire()
            .times(1)
            .returning(|| Err(TwoFactorError::NotInitialized));

        let service = service(store, admitting());

        let result = service.expire(&CancellationToken::new()).await;
        assert_eq!(result, Err(TwoFactorError::NotInitialized));
    }

    #[tokio::test]
    async fn test_every_operation_consumes_admission() {
        let mut seq = Sequence::new();
        let mut limiter = MockTestAdmission::new();
        limiter
            .expect_admit()
            .times(3)
            .in_sequence(&mut seq)
            .returning(|| true);
        limiter
            .expect_admit()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| false);

        let mut store = MockTestTokenStore::new();
        store
            .expect_generate()
            .returning(|_| Ok(TwoFactorCode::new("ZZZZZ".to_string())));
        store.expect_verify().returning(|_| Ok(true));
        store.expect_expire().returning(|| Ok(()));

        let service = service(store, limiter);
        let cancel = CancellationToken::new();

        assert!(service.generate(&cancel).await.is_ok());
        assert!(service.verify(&cancel, "ZZZZZ").await.is_ok());
        assert!(service.expire(&cancel).await.is_ok());
        assert_eq!(
            service.generate(&cancel).await,
            Err(TwoFactorError::RateLimited)
        );
    }

    struct PanickingStore;

    impl TokenStore for PanickingStore {
        fn generate(&self, _abandoned: &CancellationToken) -> Result<TwoFactorCode, TwoFactorError> {
            panic!("store exploded")
        }

        fn verify(&self, _code: &str) -> Result<bool, TwoFactorError> {
            panic!("store exploded")
        }

        fn expire(&self) -> Result<(), TwoFactorError> {
            panic!("store exploded")
        }

        fn is_pending(&self) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn test_panicking_store_is_internal_error() {
        let service = TwoFactorService::new(Arc::new(PanickingStore), Arc::new(admitting()));

        let result = service.expire(&CancellationToken::new()).await;
        assert!(matches!(result, Err(TwoFactorError::Internal(_))));
    }

    /// Hasher that reports when hashing starts and then blocks until released.
    struct GatedHasher {
        started: Mutex<Option<oneshot::Sender<()>>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl CodeHasher for GatedHasher {
        fn hash(&self, _code: &str) -> Result<String, HashError> {
            if let Some(started) = self.started.lock().unwrap().take() {
                let _ = started.send(());
            }
            let _ = self.release.lock().unwrap().recv();
            Ok("$argon2id$stub".to_string())
        }

        fn verify(&self, _code: &str, _hash: &str) -> Result<bool, HashError> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_dropped_generate_does_not_publish() {
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let store = Arc::new(InMemoryTokenStore::new(GatedHasher {
            started: Mutex::new(Some(started_tx)),
            release: Mutex::new(release_rx),
        }));
        let service = Arc::new(TwoFactorService::new(
            Arc::clone(&store),
            Arc::new(admitting()),
        ));

        let task = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.generate(&CancellationToken::new()).await }
        });

        // Hashing is under way and the store lock is held
        started_rx.await.unwrap();
        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        drop(release_tx);

        let pending = tokio::task::spawn_blocking({
            let store = Arc::clone(&store);
            move || store.is_pending()
        })
        .await
        .unwrap();
        assert!(!pending);

        // Nothing was left behind to block the next caller
        assert!(service.generate(&CancellationToken::new()).await.is_ok());
        assert!(store.is_pending());
    }
}
