//! Per-client fixed-window rate limiting.
//!
//! Every request from a client counts against the global quota. Requests to
//! an endpoint with its own quota count against that one too, and the
//! request is admitted only if both have room.

use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;

use crate::config::schema::{Quota, RateLimitConfig};
use crate::http::response::AppError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::routing::router::ResolvedEndpoint;
use crate::routing::Endpoint;
use crate::security::headers::request_client_ip;

/// The counter a quota applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    Route(Endpoint),
}

impl Scope {
    /// Label used in logs and metrics.
    pub const fn label(self) -> &'static str {
        match self {
            Scope::Global => "global",
            Scope::Route(endpoint) => endpoint.name(),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited {
        /// The quota that rejected the request.
        scope: Scope,
        /// Time until that quota's window resets.
        retry_after: Duration,
    },
}

#[derive(Debug)]
struct FixedWindow {
    started: Instant,
    length: Duration,
    count: u32,
}

impl FixedWindow {
    fn new(now: Instant, length: Duration) -> Self {
        Self {
            started: now,
            length,
            count: 0,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.started) >= self.length
    }

    fn roll(&mut self, now: Instant) {
        if self.is_expired(now) {
            self.started = now;
            self.count = 0;
        }
    }

    fn resets_in(&self, now: Instant) -> Duration {
        self.length.saturating_sub(now.duration_since(self.started))
    }
}

/// All windows of one client. Guarded as a unit by the map's entry lock.
#[derive(Debug, Default)]
struct ClientWindows {
    windows: HashMap<Scope, FixedWindow>,
}

/// Shared counter table keyed by client IP.
pub struct RateLimiter {
    clients: DashMap<IpAddr, ClientWindows>,
    enabled: bool,
    default: Quota,
    routes: HashMap<Endpoint, Quota>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            clients: DashMap::new(),
            enabled: config.enabled,
            default: config.default,
            routes: config.routes.iter().map(|(e, q)| (*e, *q)).collect(),
        }
    }

    fn quotas(&self, endpoint: Option<Endpoint>) -> Vec<(Scope, Quota)> {
        let mut quotas = vec![(Scope::Global, self.default)];
        if let Some((endpoint, quota)) = endpoint.and_then(|e| self.routes.get(&e).map(|q| (e, *q))) {
            quotas.push((Scope::Route(endpoint), quota));
        }
        quotas
    }

    /// Count a request from `ip` to `endpoint`, or reject it.
    pub fn check(&self, ip: IpAddr, endpoint: Option<Endpoint>) -> RateLimitDecision {
        self.check_at(ip, endpoint, Instant::now())
    }

    fn check_at(&self, ip: IpAddr, endpoint: Option<Endpoint>, now: Instant) -> RateLimitDecision {
        if !self.enabled {
            return RateLimitDecision::Allowed;
        }

        let quotas = self.quotas(endpoint);
        let mut client = self.clients.entry(ip).or_default();

        // Check every scope before touching any counter so a rejected
        // request is not charged.
        let mut limited: Option<(Scope, Duration)> = None;
        for (scope, quota) in &quotas {
            let window = client
                .windows
                .entry(*scope)
                .or_insert_with(|| FixedWindow::new(now, quota.window));
            window.roll(now);

            if window.count >= quota.limit {
                let resets_in = window.resets_in(now);
                if limited.map_or(true, |(_, longest)| resets_in > longest) {
                    limited = Some((*scope, resets_in));
                }
            }
        }

        if let Some((scope, retry_after)) = limited {
            return RateLimitDecision::Limited { scope, retry_after };
        }

        for (scope, _) in &quotas {
            if let Some(window) = client.windows.get_mut(scope) {
                window.count += 1;
            }
        }
        RateLimitDecision::Allowed
    }

    /// Drop clients whose windows have all expired. Returns how many were
    /// removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    fn purge_expired_at(&self, now: Instant) -> usize {
        let before = self.clients.len();
        self.clients
            .retain(|_, client| client.windows.values().any(|w| !w.is_expired(now)));
        before.saturating_sub(self.clients.len())
    }

    /// Number of clients with live counters.
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }
}

/// Middleware enforcing the limiter before the gate and the handlers run.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let ip = request_client_ip(&request, state.trusted_hops);
    let endpoint = ResolvedEndpoint::of(&request);

    match state.limiter.check(ip, endpoint) {
        RateLimitDecision::Allowed => next.run(request).await,
        RateLimitDecision::Limited { scope, retry_after } => {
            tracing::warn!(client = %ip, %scope, ?retry_after, "Rate limit exceeded");
            metrics::record_rate_limited(scope.label());
            AppError::RateLimited { scope, retry_after }.into_response()
        }
    }
}
