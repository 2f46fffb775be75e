use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::login::login;
use super::handlers::logout::logout;
use super::handlers::profile::profile;
use super::handlers::refresh::refresh;
use super::handlers::register::register;
use super::middleware::authenticate as auth_middleware;
use crate::domain::auth::ports::AuthServicePort;

pub struct AppState<S: AuthServicePort> {
    pub auth_service: Arc<S>,
}

impl<S: AuthServicePort> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            auth_service: Arc::clone(&self.auth_service),
        }
    }
}

pub fn create_router<S: AuthServicePort>(auth_service: Arc<S>) -> Router {
    let state = AppState { auth_service };

    let public_routes = Router::new()
        .route("/auth/register", post(register::<S>))
        .route("/auth/login", post(login::<S>))
        .route("/auth/logout", post(logout::<S>))
        .route("/auth/refresh", post(refresh::<S>));

    let protected_routes = Router::new()
        .route("/auth/profile", get(profile::<S>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::<S>,
        ));

    // Headers are left out of the span: they carry bearer tokens.
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
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
        .merge(public_routes)
        .merge(protected_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::http::header;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use super::*;
    use crate::domain::auth::service::AuthService;
    use crate::outbound::repositories::InMemoryCredentialStore;

    fn app() -> Router {
        let signer = auth::TokenSigner::new(
            b"router-access-secret-at-least-32-bytes",
            b"router-refresh-secret-at-least-32-bytes",
        );
        let service = AuthService::new(
            Arc::new(InMemoryCredentialStore::new()),
            auth::PasswordHasher::new(),
            Arc::new(signer),
        );
        create_router(Arc::new(service))
    }

    async fn status_for(request: Request<Body>) -> StatusCode {
        app()
            .oneshot(request)
            .await
            .expect("Request failed")
            .status()
    }

    #[tokio::test]
    async fn test_profile_requires_authorization_header() {
        let request = Request::builder()
            .uri("/auth/profile")
            .body(Body::empty())
            .unwrap();

        assert_eq!(status_for(request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_profile_rejects_non_bearer_scheme() {
        let request = Request::builder()
            .uri("/auth/profile")
            .header(header::AUTHORIZATION, "Basic YWxpY2U6c2VjcmV0")
            .body(Body::empty())
            .unwrap();

        assert_eq!(status_for(request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_profile_rejects_garbage_token() {
        let request = Request::builder()
            .uri("/auth/profile")
            .header(header::AUTHORIZATION, "Bearer not.a.token")
            .body(Body::empty())
            .unwrap();

        assert_eq!(status_for(request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_rejects_short_password() {
        let request = Request::builder()
            .method("POST")
            .uri("/auth/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"username":"alice","email":"a@x.com","password":"123"}"#,
            ))
            .unwrap();

        assert_eq!(status_for(request).await, StatusCode::BAD_REQUEST);
    }
}
