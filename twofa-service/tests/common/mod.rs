use std::sync::Arc;
use std::time::Duration;

use auth::HashCost;
use auth::SecretHasher;
use tokio_util::sync::CancellationToken;
use twofa_service::domain::limiter::BucketConfig;
use twofa_service::domain::limiter::LeakyBucket;
use twofa_service::domain::two_factor::service::TwoFactorService;
use twofa_service::domain::two_factor::store::InMemoryTokenStore;
use twofa_service::inbound::http::router::create_router;
use uuid::Uuid;

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub bucket: Arc<LeakyBucket>,
    pub token_store: Arc<InMemoryTokenStore>,
    pub shutdown: CancellationToken,
}

impl TestApp {
    /// Spawn the application with a bucket large enough to never reject
    pub async fn spawn() -> Self {
        Self::spawn_with_bucket(
            BucketConfig::new(1_000, 1, Duration::from_secs(60))
                .expect("Invalid bucket configuration"),
        )
        .await
    }

    /// Spawn the application with the given bucket.
    ///
    /// No leak task is started, so admitted requests are never released.
    pub async fn spawn_with_bucket(bucket_config: BucketConfig) -> Self {
        Self::spawn_with(bucket_config, HashCost::minimal(), Duration::from_secs(10)).await
    }

    /// Spawn the application in a background task
    pub async fn spawn_with(
        bucket_config: BucketConfig,
        hash_cost: HashCost,
        request_timeout: Duration,
    ) -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let hasher = SecretHasher::with_cost(hash_cost).expect("Failed to create hasher");
        let token_store = Arc::new(InMemoryTokenStore::new(hasher));
        let bucket = Arc::new(LeakyBucket::new(bucket_config));
        let shutdown = CancellationToken::new();

        let two_factor_service = Arc::new(TwoFactorService::new(
            Arc::clone(&token_store),
            Arc::clone(&bucket),
        ));

        let router = create_router(
            two_factor_service,
            shutdown.clone(),
            Uuid::new_v4(),
            request_timeout,
        );

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            api_client: reqwest::Client::new(),
            bucket,
            token_store,
            shutdown,
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to call the 2FA endpoint with an action and optional key
    pub fn two_factor(&self, action: &str, key: Option<&str>) -> reqwest::RequestBuilder {
        let mut query = vec![("action", action)];
        if let Some(key) = key {
            query.push(("key", key));
        }
        self.get("/alice/2fa").query(&query)
    }

    /// Generate a code and return it
    pub async fn generate(&self) -> String {
        let response = self
            .two_factor("generate", None)
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        response.json().await.expect("Failed to parse response")
    }
}
