//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, error masking, sessions,
//!   rate limiting, session gate)
//! - Serve on a listener until shutdown
//! - Run the limiter's purge and the session store's cleanup in the
//!   background
//!
//! # Middleware order (outermost first)
//! ```text
//! request id → trace → resolve endpoint → metrics → mask errors
//!     → catch panic → sessions → rate limit → gate → handlers
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_sessions::ExpiredDeletion;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::GateConfig;
use crate::http::handlers;
use crate::http::request::{request_id, RequestUuid};
use crate::http::response::mask_errors_middleware;
use crate::lifecycle::{shutdown, signals};
use crate::observability::metrics;
use crate::routing::{resolve_endpoint_middleware, Endpoint, RouteTable};
use crate::security::gate::gate_middleware;
use crate::security::rate_limit::rate_limit_middleware;
use crate::security::{RateLimiter, SessionGate};
use crate::session::{self, GateSessionStore, SessionSetupError};

/// Application state injected into middleware.
#[derive(Clone)]
pub struct AppState {
    pub limiter: Arc<RateLimiter>,
    pub gate: Arc<SessionGate>,
    pub routes: Arc<RouteTable>,
    pub trusted_hops: usize,
}

/// Error type for server setup and serving.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("session setup failed: {0}")]
    Session(#[from] SessionSetupError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP server for the gate.
pub struct HttpServer {
    router: Router,
    config: GateConfig,
    limiter: Arc<RateLimiter>,
    sessions: GateSessionStore,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GateConfig) -> Result<Self, ServerError> {
        let limiter = Arc::new(RateLimiter::new(&config.rate_limit));

        let state = AppState {
            limiter: limiter.clone(),
            gate: Arc::new(SessionGate::standard()),
            routes: Arc::new(RouteTable::standard()),
            trusted_hops: config.proxy.trusted_hops,
        };

        let sessions = session::session_store(&config.session);
        let router = Self::build_router(&config, state, sessions.clone())?;
        Ok(Self {
            router,
            config,
            limiter,
            sessions,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(
        config: &GateConfig,
        state: AppState,
        sessions: GateSessionStore,
    ) -> Result<Router, ServerError> {
        let app = Router::new()
            .route(Endpoint::Robot.path(), get(handlers::robot))
            .route(Endpoint::VerifyRobot.path(), post(handlers::verify_robot))
            .route(Endpoint::Index.path(), get(handlers::index))
            .route(
                Endpoint::ApiData.path(),
                get(handlers::api_data).post(handlers::api_data),
            )
            .nest_service(
                Endpoint::Static.path(),
                ServeDir::new(&config.assets.static_dir),
            )
            .fallback(handlers::not_found)
            .layer(middleware::from_fn_with_state(state.clone(), gate_middleware))
            .layer(middleware::from_fn_with_state(state.clone(), rate_limit_middleware))
            .with_state(state.clone());

        let app = session::with_sessions(app, &config.session, sessions)?;

        Ok(app
            .layer(CatchPanicLayer::new())
            .layer(middleware::from_fn(mask_errors_middleware))
            .layer(middleware::from_fn(metrics::track_requests))
            .layer(middleware::from_fn_with_state(
                state.routes.clone(),
                resolve_endpoint_middleware,
            ))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(
                TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        method = %req.method(),
                        path = %req.uri().path(),
                        request_id = %request_id(req),
                    )
                }),
            )
            .layer(SetRequestIdLayer::x_request_id(RequestUuid)))
    }

    /// Run the server, accepting connections on the given listener until
    /// an OS signal arrives or `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let purge = tokio::spawn(purge_loop(
            self.limiter.clone(),
            Duration::from_secs(self.config.rate_limit.purge_interval_secs),
            shutdown_rx.resubscribe(),
        ));
        let cleanup = tokio::spawn(session_cleanup_loop(
            self.sessions.clone(),
            Duration::from_secs(self.config.session.cleanup_interval_secs),
            shutdown_rx.resubscribe(),
        ));

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = signals::wait_for_signal() => {},
                    _ = shutdown::triggered(&mut shutdown_rx) => {},
                }
                tracing::info!("Shutdown signal received");
            })
            .await?;

        purge.abort();
        cleanup.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn purge_loop(
    limiter: Arc<RateLimiter>,
    every: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut interval = tokio::time::interval(every);
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let purged = limiter.purge_expired();
                if purged > 0 {
                    tracing::debug!(
                        purged,
                        remaining = limiter.tracked_clients(),
                        "Purged idle rate limit counters"
                    );
                }
            }
            _ = shutdown::triggered(&mut shutdown_rx) => break,
        }
    }
}

async fn session_cleanup_loop(
    store: GateSessionStore,
    every: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut interval = tokio::time::interval(every);
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = store.delete_expired().await {
                    tracing::warn!(error = %e, "Session cleanup failed");
                }
            }
            _ = shutdown::triggered(&mut shutdown_rx) => break,
        }
    }
}
