use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::http::StatusCode;
use axum::middleware::map_response;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;
use uuid::Uuid;

use super::handlers::two_factor::two_factor;
use super::handlers::ApiError;
use crate::domain::limiter::LeakyBucket;
use crate::domain::two_factor::service::TwoFactorService;
use crate::domain::two_factor::store::InMemoryTokenStore;

pub type DefaultTwoFactorService = TwoFactorService<InMemoryTokenStore, LeakyBucket>;

#[derive(Clone)]
pub struct AppState {
    pub two_factor_service: Arc<DefaultTwoFactorService>,
    /// Cancelled on process shutdown; requests not yet started are refused.
    pub shutdown: CancellationToken,
}

pub fn create_router(
    two_factor_service: Arc<DefaultTwoFactorService>,
    shutdown: CancellationToken,
    deployment_id: Uuid,
    request_timeout: Duration,
) -> Router {
    let state = AppState {
        two_factor_service,
        shutdown,
    };

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(move |request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                deployment = %deployment_id,
                method = %request.method(),
                path = %request.uri().path(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                path = %request.uri().path(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .route("/:subject/2fa", get(two_factor))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(map_response(timeout_envelope))
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// `TimeoutLayer` answers with a bare 408; give it the usual error body.
async fn timeout_envelope(response: Response<Body>) -> Response<Body> {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        tracing::warn!("Request timed out");
        return ApiError::RequestTimeout("Request timed out".to_string()).into_response();
    }
    response
}
