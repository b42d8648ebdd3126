//! Error responses and response rewriting.
//!
//! # Responsibilities
//! - Map application errors to their fixed JSON bodies
//! - Collapse forbidden, not-found, method-not-allowed and server errors
//!   into one indistinguishable 403 body
//! - Build plain 302 redirects
//!
//! # Design Decisions
//! - Masking runs as an outer layer, so it also covers responses produced
//!   by axum itself (fallback, 405) and by the static file service
//! - Panics are caught inside the mask and surface as the same 403

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::security::rate_limit::Scope;

pub const INVALID_REQUEST_MESSAGE: &str = "invalid request";
pub const RATE_LIMITED_MESSAGE: &str = "rate limit exceeded, wait 2 minutes";
pub const DENIED_MESSAGE: &str = "access denied or error occurred";

/// Errors surfaced to clients.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("query is empty after sanitization")]
    InvalidRequest,

    #[error("rate limit exceeded for {scope} scope")]
    RateLimited { scope: Scope, retry_after: Duration },

    #[error("session store failure: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::InvalidRequest => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": INVALID_REQUEST_MESSAGE })),
            )
                .into_response(),
            AppError::RateLimited { retry_after, .. } => {
                let mut response = (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({ "error": RATE_LIMITED_MESSAGE })),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs(retry_after)));
                response
            }
            AppError::Session(e) => {
                tracing::error!(error = %e, "Session store failure");
                denied()
            }
        }
    }
}

/// Whole seconds a client should wait, never less than one.
fn retry_after_secs(retry_after: Duration) -> u64 {
    let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
    secs.max(1)
}

/// The uniform 403 response.
pub fn denied() -> Response {
    (StatusCode::FORBIDDEN, Json(json!({ "error": DENIED_MESSAGE }))).into_response()
}

/// A 302 Found redirect to `location`.
pub fn found(location: &'static str) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, HeaderValue::from_static(location))],
    )
        .into_response()
}

fn is_masked(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::FORBIDDEN | StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED
    ) || status.is_server_error()
}

/// Replace any forbidden, not-found, method-not-allowed or server-error
/// response with the uniform 403 body.
pub async fn mask_errors_middleware(request: Request<Body>, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let response = next.run(request).await;
    let status = response.status();

    if !is_masked(status) {
        return response;
    }

    if status.is_server_error() {
        tracing::error!(%status, %path, "Internal error masked");
    } else {
        tracing::debug!(%status, %path, "Error response masked");
    }
    denied()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn invalid_request_is_400() {
        let response = AppError::InvalidRequest.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({ "error": "invalid request" }));
    }

    #[tokio::test]
    async fn rate_limited_is_429_with_retry_after() {
        let response = AppError::RateLimited {
            scope: Scope::Global,
            retry_after: Duration::from_millis(12_500),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "13");
        assert_eq!(
            body_json(response).await,
            json!({ "error": "rate limit exceeded, wait 2 minutes" })
        );
    }

    #[tokio::test]
    async fn denied_is_uniform_403() {
        let response = denied();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "access denied or error occurred" })
        );
    }

    #[test]
    fn masked_statuses() {
        assert!(is_masked(StatusCode::NOT_FOUND));
        assert!(is_masked(StatusCode::METHOD_NOT_ALLOWED));
        assert!(is_masked(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_masked(StatusCode::BAD_GATEWAY));
        assert!(!is_masked(StatusCode::BAD_REQUEST));
        assert!(!is_masked(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_masked(StatusCode::FOUND));
        assert!(!is_masked(StatusCode::OK));
    }

    #[tokio::test]
    async fn panics_and_missing_routes_are_masked() {
        use axum::{body::Body, http::Request, middleware, routing::get, Router};
        use tower::ServiceExt;
        use tower_http::catch_panic::CatchPanicLayer;

        async fn boom() -> &'static str {
            panic!("boom")
        }

        let app = Router::new()
            .route("/boom", get(boom))
            .route("/gone", get(|| async { StatusCode::NOT_FOUND }))
            .route("/bad", get(|| async { AppError::InvalidRequest }))
            .layer(CatchPanicLayer::new())
            .layer(middleware::from_fn(mask_errors_middleware));

        for path in ["/boom", "/gone"] {
            let request = Request::get(path).body(Body::empty()).unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "{path}");
            assert_eq!(
                body_json(response).await,
                json!({ "error": "access denied or error occurred" })
            );
        }

        let request = Request::get("/bad").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn redirect_is_302() {
        let response = found("/robot");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/robot");
    }

    #[test]
    fn retry_after_rounds_up() {
        assert_eq!(retry_after_secs(Duration::ZERO), 1);
        assert_eq!(retry_after_secs(Duration::from_secs(60)), 60);
        assert_eq!(retry_after_secs(Duration::from_millis(59_001)), 60);
    }
}
