use std::sync::Arc;

use auth::HashCost;
use auth::SecretHasher;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use twofa_service::config::Config;
use twofa_service::domain::limiter::LeakyBucket;
use twofa_service::domain::two_factor::service::TwoFactorService;
use twofa_service::domain::two_factor::store::InMemoryTokenStore;
use twofa_service::inbound::http::router::create_router;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "twofa_service=debug,auth=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let deployment_id = Uuid::new_v4();

    tracing::info!(
        service = "twofa-service",
        version = env!("CARGO_PKG_VERSION"),
        deployment = %deployment_id,
        "Service starting"
    );

    let config = Config::load()?;
    let bucket_config = config.limiter.bucket()?;
    let hash_cost = HashCost::from(&config.hasher);

    tracing::info!(
        http_port = config.server.http_port,
        request_timeout_secs = config.server.request_timeout_secs,
        capacity = bucket_config.capacity,
        leak_amount = bucket_config.leak_amount,
        leak_interval_ms = bucket_config.leak_interval.as_millis() as u64,
        memory_kib = hash_cost.memory_kib,
        iterations = hash_cost.iterations,
        parallelism = hash_cost.parallelism,
        "Configuration loaded"
    );

    let hasher = SecretHasher::with_cost(hash_cost)?;
    let token_store = Arc::new(InMemoryTokenStore::new(hasher));
    let bucket = Arc::new(LeakyBucket::new(bucket_config));

    let shutdown = CancellationToken::new();
    let leak_handle = bucket.start_leaking(&shutdown)?;

    let two_factor_service = Arc::new(TwoFactorService::new(token_store, Arc::clone(&bucket)));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(
        two_factor_service,
        shutdown.clone(),
        deployment_id,
        config.server.request_timeout(),
    );

    let signal = shutdown.clone();
    let served = axum::serve(http_listener, http_application)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received");
            signal.cancel();
        })
        .await;

    shutdown.cancel();
    leak_handle.stop().await;

    match served {
        Ok(()) => tracing::info!("Server exited successfully"),
        Err(e) => {
            tracing::error!(error = %e, "Server error");
            return Err(e.into());
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
