//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (route lookup)
//!     → matcher.rs (evaluate match conditions)
//!     → Return: Some(Endpoint) or None
//! ```
//!
//! # Design Decisions
//! - Middleware runs before axum's own dispatch, so it resolves endpoints
//!   through this table rather than `MatchedPath`
//! - Deterministic: same input always matches same endpoint

pub mod endpoint;
pub mod matcher;
pub mod router;

pub use endpoint::Endpoint;
pub use router::{resolve_endpoint_middleware, ResolvedEndpoint, RouteTable};
