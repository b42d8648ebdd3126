//! Endpoint lookup.
//!
//! # Responsibilities
//! - Store compiled route conditions
//! - Resolve a request to its logical endpoint
//! - Return an explicit no-match for unknown paths and disallowed methods
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan (five routes)

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, Request};
use axum::middleware::Next;
use axum::response::Response;

use super::endpoint::Endpoint;
use super::matcher::{AndMatcher, ExactPathMatcher, Matcher, MethodMatcher, PathPrefixMatcher};

/// Resolves requests to logical endpoints.
#[derive(Debug)]
pub struct RouteTable {
    routes: Vec<(Endpoint, AndMatcher)>,
}

impl RouteTable {
    /// The service's route table. Mirrors the handlers mounted by the HTTP
    /// server.
    pub fn standard() -> Self {
        let routes = Endpoint::ALL
            .into_iter()
            .map(|endpoint| (endpoint, Self::compile(endpoint)))
            .collect();
        Self { routes }
    }

    fn compile(endpoint: Endpoint) -> AndMatcher {
        let methods: &[Method] = match endpoint {
            Endpoint::VerifyRobot => &[Method::POST],
            Endpoint::ApiData => &[Method::GET, Method::POST],
            Endpoint::Robot | Endpoint::Index | Endpoint::Static => &[Method::GET],
        };

        let path: Box<dyn Matcher> = match endpoint {
            Endpoint::Static => Box::new(PathPrefixMatcher::new(format!("{}/", endpoint.path()))),
            _ => Box::new(ExactPathMatcher::new(endpoint.path())),
        };

        AndMatcher::new(vec![Box::new(MethodMatcher::new(methods.iter().cloned())), path])
    }

    /// Find the endpoint that would handle this request, if any.
    pub fn resolve(&self, req: &Request<Body>) -> Option<Endpoint> {
        self.routes
            .iter()
            .find(|(_, matcher)| matcher.matches(req))
            .map(|(endpoint, _)| *endpoint)
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Request extension carrying the endpoint a request resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedEndpoint(pub Option<Endpoint>);

impl ResolvedEndpoint {
    /// The resolved endpoint, or `None` if the request matched no route or
    /// was never resolved.
    pub fn of(req: &Request<Body>) -> Option<Endpoint> {
        req.extensions()
            .get::<ResolvedEndpoint>()
            .and_then(|resolved| resolved.0)
    }
}

/// Resolve the request once and attach the result for inner middleware.
pub async fn resolve_endpoint_middleware(
    State(table): State<Arc<RouteTable>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let endpoint = table.resolve(&request);
    request.extensions_mut().insert(ResolvedEndpoint(endpoint));
    next.run(request).await
}
