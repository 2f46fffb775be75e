use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::auth::models::UserProfile;
use crate::domain::auth::ports::AuthServicePort;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

pub async fn profile<S: AuthServicePort>(
    State(state): State<AppState<S>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<ApiSuccess<UserProfile>, ApiError> {
    state
        .auth_service
        .profile(&user.user_id)
        .await
        .map_err(ApiError::from)
        .map(|profile| ApiSuccess::new(StatusCode::OK, profile))
}
