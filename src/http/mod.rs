//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID)
//!     → handlers.rs (pages, verification, api_data)
//!     → pages.rs (HTML bodies)
//!     → response.rs (JSON errors, 403 masking, redirects)
//!     → Send to client
//! ```

pub mod handlers;
pub mod pages;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestUuid, X_REQUEST_ID};
pub use response::AppError;
pub use server::{AppState, HttpServer, ServerError};
