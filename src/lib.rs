//! Robot-verification gate library.
//!
//! A small web front-end that keeps unverified sessions on a click-through
//! verification page, rate limits clients per IP, and filters the one
//! query parameter its JSON endpoint accepts.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;
pub mod session;

pub use config::schema::GateConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
