use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::TokenPairData;
use crate::domain::auth::errors::AuthError;
use crate::domain::auth::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

/// Exchange a refresh token for a new pair.
///
/// Every rejection of the presented token is a 403 on this route.
pub async fn refresh<S: AuthServicePort>(
    State(state): State<AppState<S>>,
    Json(body): Json<RefreshRequestBody>,
) -> Result<ApiSuccess<TokenPairData>, ApiError> {
    state
        .auth_service
        .refresh_tokens(&body.refresh_token)
        .await
        .map_err(|e| match e {
            AuthError::Store(_) | AuthError::Internal(_) => ApiError::from(e),
            rejected => ApiError::Forbidden(rejected.to_string()),
        })
        .map(|pair| ApiSuccess::new(StatusCode::OK, pair.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RefreshRequestBody {
    refresh_token: String,
}
