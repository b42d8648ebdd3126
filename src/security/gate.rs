//! Session gate.
//! Sends unverified clients to the verification page.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use crate::http::response::{found, AppError};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::routing::{Endpoint, ResolvedEndpoint};
use crate::session::Verified;

/// What the gate does with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Pass,
    Redirect(Endpoint),
}

/// Allow-list of endpoints reachable before verification, plus where
/// everything else is sent.
#[derive(Debug, Clone)]
pub struct SessionGate {
    allow: Vec<Endpoint>,
    redirect_to: Endpoint,
}

impl SessionGate {
    pub fn new(allow: impl IntoIterator<Item = Endpoint>, redirect_to: Endpoint) -> Self {
        Self {
            allow: allow.into_iter().collect(),
            redirect_to,
        }
    }

    /// Verification page, verification action and static assets stay open.
    pub fn standard() -> Self {
        Self::new(
            [Endpoint::Robot, Endpoint::VerifyRobot, Endpoint::Static],
            Endpoint::Robot,
        )
    }

    /// Requests that resolved to no endpoint are never allow-listed.
    pub fn is_allowed(&self, endpoint: Option<Endpoint>) -> bool {
        endpoint.is_some_and(|e| self.allow.contains(&e))
    }

    pub fn decide(&self, endpoint: Option<Endpoint>, verified: bool) -> GateDecision {
        if verified || self.is_allowed(endpoint) {
            GateDecision::Pass
        } else {
            GateDecision::Redirect(self.redirect_to)
        }
    }
}

impl Default for SessionGate {
    fn default() -> Self {
        Self::standard()
    }
}

pub async fn gate_middleware(
    State(state): State<AppState>,
    session: Session,
    request: Request<Body>,
    next: Next,
) -> Response {
    let endpoint = ResolvedEndpoint::of(&request);

    // Allow-listed requests never touch the session store.
    if state.gate.is_allowed(endpoint) {
        return next.run(request).await;
    }

    let verified = match Verified::get(&session).await {
        Ok(verified) => verified,
        Err(e) => return AppError::from(e).into_response(),
    };

    match state.gate.decide(endpoint, verified) {
        GateDecision::Pass => next.run(request).await,
        GateDecision::Redirect(target) => {
            tracing::debug!(
                path = %request.uri().path(),
                endpoint = ?endpoint,
                "Unverified session redirected"
            );
            metrics::record_gate_redirect();
            found(target.path())
        }
    }
}
