//! Session management.
//!
//! Sessions live in [`GateSessionStore`] behind a signed cookie. The only
//! state kept per client is the `verified` flag set by the verification
//! action.

pub mod store;

use axum::Router;
use time::Duration;
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::{Expiry, Session, SessionManagerLayer};

use crate::config::schema::SessionConfig;

pub use store::GateSessionStore;

/// Minimum secret length accepted for cookie signing.
pub const MIN_SECRET_LEN: usize = 64;

pub const VERIFIED_KEY: &str = "verified";

/// Error raised when the session layer cannot be built.
#[derive(Debug, thiserror::Error)]
pub enum SessionSetupError {
    #[error("session secret must be at least {MIN_SECRET_LEN} bytes, got {0}")]
    ShortSecret(usize),
}

/// The per-session verification flag.
pub struct Verified;

impl Verified {
    /// True only if the flag is present and set.
    pub async fn get(session: &Session) -> Result<bool, tower_sessions::session::Error> {
        let verified: Option<bool> = session.get(VERIFIED_KEY).await?;

        Ok(verified == Some(true))
    }

    pub async fn insert(session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.insert(VERIFIED_KEY, true).await?;

        Ok(())
    }
}

/// Build the signing key from the configured secret.
pub fn signing_key(secret: &str) -> Result<Key, SessionSetupError> {
    let bytes = secret.as_bytes();
    if bytes.len() < MIN_SECRET_LEN {
        return Err(SessionSetupError::ShortSecret(bytes.len()));
    }
    Key::try_from(bytes).map_err(|_| SessionSetupError::ShortSecret(bytes.len()))
}

/// The record store for `config`.
pub fn session_store(config: &SessionConfig) -> GateSessionStore {
    GateSessionStore::new(seconds(config.max_lifetime_secs))
}

fn seconds(secs: u64) -> Duration {
    Duration::seconds(secs.min(i64::MAX as u64) as i64)
}

/// Wrap `router` in the session manager described by `config`, keeping
/// records in `store`.
pub fn with_sessions(
    router: Router,
    config: &SessionConfig,
    store: GateSessionStore,
) -> Result<Router, SessionSetupError> {
    let key = signing_key(&config.secret_key)?;

    let expiry = match config.inactivity_secs {
        0 => Expiry::OnSessionEnd,
        secs => Expiry::OnInactivity(seconds(secs)),
    };

    let layer = SessionManagerLayer::new(store)
        .with_name(config.cookie_name.clone())
        .with_secure(config.secure_cookie)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_expiry(expiry)
        .with_signed(key);

    Ok(router.layer(layer))
}
