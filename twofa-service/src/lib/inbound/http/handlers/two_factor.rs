use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::two_factor::errors::TwoFactorError;
use crate::domain::two_factor::models::TwoFactorAction;
use crate::domain::two_factor::ports::TwoFactorServicePort;
use crate::inbound::http::router::AppState;

/// `GET /:subject/2fa?action=<generate|verify|expire>[&key=<code>]`
pub async fn two_factor(
    State(state): State<AppState>,
    Path(subject): Path<String>,
    Query(query): Query<TwoFactorQuery>,
) -> Result<Response, ApiError> {
    let action = match query.action() {
        Some(action) => action,
        None => {
            tracing::debug!(subject = %subject, action = ?query.action, "Unknown 2FA action");
            return Ok(StatusCode::NOT_FOUND.into_response());
        }
    };

    tracing::debug!(subject = %subject, action = %action, "2FA request");

    match action {
        TwoFactorAction::Generate => generate(&state).await.map(IntoResponse::into_response),
        TwoFactorAction::Verify => verify(&state, query.key.as_deref().unwrap_or_default())
            .await
            .map(IntoResponse::into_response),
        TwoFactorAction::Expire => expire(&state).await.map(IntoResponse::into_response),
    }
}

async fn generate(state: &AppState) -> Result<ApiSuccess<String>, ApiError> {
    state
        .two_factor_service
        .generate(&state.shutdown)
        .await
        .map_err(ApiError::from)
        .map(|code| ApiSuccess::new(StatusCode::OK, code.into_inner()))
}

async fn verify(state: &AppState, key: &str) -> Result<ApiSuccess<bool>, ApiError> {
    match state
        .two_factor_service
        .verify(&state.shutdown, key.trim())
        .await
    {
        Ok(verified) => Ok(ApiSuccess::new(StatusCode::OK, verified)),
        Err(TwoFactorError::VerifyMismatch) => {
            tracing::warn!("Invalid key");
            Ok(ApiSuccess::new(StatusCode::OK, false))
        }
        Err(e) => Err(ApiError::from(e)),
    }
}

async fn expire(state: &AppState) -> Result<StatusCode, ApiError> {
    match state.two_factor_service.expire(&state.shutdown).await {
        Ok(()) => Ok(StatusCode::OK),
        Err(e @ TwoFactorError::NotInitialized) => {
            tracing::warn!(error = %e, "Nothing to expire");
            Err(ApiError::NotFound(e.to_string()))
        }
        Err(e) => Err(ApiError::from(e)),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TwoFactorQuery {
    action: Option<String>,
    key: Option<String>,
}

impl TwoFactorQuery {
    fn action(&self) -> Option<TwoFactorAction> {
        self.action.as_deref().and_then(|a| a.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(action: Option<&str>) -> TwoFactorQuery {
        TwoFactorQuery {
            action: action.map(str::to_string),
            key: None,
        }
    }

    #[test]
    fn test_query_action_parsing() {
        assert_eq!(
            query(Some("generate")).action(),
            Some(TwoFactorAction::Generate)
        );
        assert_eq!(
            query(Some(" verify ")).action(),
            Some(TwoFactorAction::Verify)
        );
        assert_eq!(query(Some("expire")).action(), Some(TwoFactorAction::Expire));
        assert_eq!(query(Some("delete")).action(), None);
        assert_eq!(query(None).action(), None);
    }
}
