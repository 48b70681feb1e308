use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::errors::AppError;
use crate::models::Identity;
use crate::services::identity::verify_token;
use crate::state::AppState;

/// Every booking route takes an `Identity`; requests without a valid bearer
/// token are rejected with 401 before any handler runs.
#[async_trait]
impl FromRequestParts<Arc<AppState>> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthorized)?;

        verify_token(&state.config.token_secret, token.trim()).map_err(|e| {
            tracing::warn!(error = %e, "rejected bearer token");
            AppError::Unauthorized
        })
    }
}
