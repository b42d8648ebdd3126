//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (derive client IP from peer + trusted X-Forwarded-For)
//!     → rate_limit.rs (check per-IP global and per-route quotas)
//!     → gate.rs (redirect unverified sessions)
//!     → Pass to handlers
//!         → sanitize.rs (filter the api_data query)
//! ```
//!
//! # Design Decisions
//! - The limiter runs before the gate, so redirects are rate limited too
//! - Fail closed: session store errors deny the request

pub mod gate;
pub mod headers;
pub mod rate_limit;
pub mod sanitize;

pub use gate::SessionGate;
pub use rate_limit::RateLimiter;
pub use sanitize::sanitize;
