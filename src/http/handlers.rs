//! Route handlers.

use axum::{
    extract::Query,
    http::StatusCode,
    response::{Html, Response},
    Json,
};
use serde::Serialize;
use tower_sessions::Session;

use crate::http::pages::{self, Page};
use crate::http::response::{found, AppError};
use crate::routing::Endpoint;
use crate::security::sanitize::{sanitize, MAX_INPUT_LEN};
use crate::session::Verified;

#[derive(Debug, Serialize)]
pub struct ApiDataResponse {
    pub status: &'static str,
    pub query: String,
}

/// `GET /robot`
pub async fn robot() -> Html<&'static str> {
    pages::render(Page::Robot)
}

/// `POST /verify_robot`
///
/// Marks the session verified. The only proof asked of the client is that
/// it submitted this request.
pub async fn verify_robot(session: Session) -> Result<Response, AppError> {
    session.cycle_id().await?;
    Verified::insert(&session).await?;

    tracing::info!("Session verified");
    Ok(found(Endpoint::Index.path()))
}

/// `GET /`
pub async fn index() -> Html<&'static str> {
    pages::render(Page::Index)
}

/// `GET|POST /api/data?q=...`
///
/// Reads only the query string, never the body. With a repeated `q` the
/// first value wins. Values longer than [`MAX_INPUT_LEN`] are rejected
/// unsanitized.
pub async fn api_data(
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<ApiDataResponse>, AppError> {
    let raw = params
        .into_iter()
        .find(|(key, _)| key == "q")
        .map(|(_, value)| value)
        .unwrap_or_default();

    if raw.len() > MAX_INPUT_LEN {
        tracing::debug!(raw_len = raw.len(), "Query rejected as too long");
        return Err(AppError::InvalidRequest);
    }

    let query = sanitize(&raw);
    if query.is_empty() {
        tracing::debug!(raw_len = raw.len(), "Query rejected after sanitization");
        return Err(AppError::InvalidRequest);
    }

    Ok(Json(ApiDataResponse { status: "ok", query }))
}

/// Fallback for unknown paths. Masked to the uniform 403 further out.
pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
