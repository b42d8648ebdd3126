//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::routing::Endpoint;

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Session cookie settings.
    pub session: SessionConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Reverse-proxy trust settings.
    pub proxy: ProxyTrustConfig,

    /// Static asset settings.
    pub assets: AssetsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:5000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
        }
    }
}

/// Session cookie configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cookie signing secret. At least 64 bytes.
    /// Usually supplied through `ROBOT_GATE_SECRET_KEY` instead of the file.
    pub secret_key: String,

    /// Name of the session cookie.
    pub cookie_name: String,

    /// Only send the cookie over HTTPS.
    pub secure_cookie: bool,

    /// Expire sessions after this many idle seconds. 0 keeps the cookie
    /// for the browser session only.
    pub inactivity_secs: u64,

    /// Longest time the server keeps a session record after its last save,
    /// whatever the cookie's own lifetime.
    pub max_lifetime_secs: u64,

    /// How often expired session records are deleted, in seconds.
    pub cleanup_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            cookie_name: "session".to_string(),
            secure_cookie: false,
            inactivity_secs: 0,
            max_lifetime_secs: 86_400,
            cleanup_interval_secs: 60,
        }
    }
}

// The secret must never end up in logs.
impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret_key", &"<redacted>")
            .field("cookie_name", &self.cookie_name)
            .field("secure_cookie", &self.secure_cookie)
            .field("inactivity_secs", &self.inactivity_secs)
            .field("max_lifetime_secs", &self.max_lifetime_secs)
            .field("cleanup_interval_secs", &self.cleanup_interval_secs)
            .finish()
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Quota applied to every request from a client, across all routes.
    pub default: Quota,

    /// Additional per-route quotas, keyed by endpoint name.
    pub routes: BTreeMap<Endpoint, Quota>,

    /// How often stale counters are dropped, in seconds.
    pub purge_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        let mut routes = BTreeMap::new();
        routes.insert(Endpoint::Index, Quota::per_minute(20));
        routes.insert(Endpoint::ApiData, Quota::per_minute(10));

        Self {
            enabled: true,
            default: Quota::per_minute(50),
            routes,
            purge_interval_secs: 60,
        }
    }
}

/// Trust settings for forwarding headers set by reverse proxies.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyTrustConfig {
    /// Number of proxies in front of the service whose `X-Forwarded-For`
    /// entries are trusted. 0 ignores the header entirely.
    pub trusted_hops: usize,
}

impl Default for ProxyTrustConfig {
    fn default() -> Self {
        Self { trusted_hops: 1 }
    }
}

/// Static asset configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Directory served under `/static`.
    pub static_dir: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            static_dir: "static".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// A request quota: at most `limit` requests per `window`.
///
/// Written in config files as `"50 per minute"`, `"10/minute"` or
/// `"5 per 30 seconds"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct Quota {
    pub limit: u32,
    pub window: Duration,
}

impl Quota {
    pub const fn new(limit: u32, window: Duration) -> Self {
        Self { limit, window }
    }

    pub const fn per_minute(limit: u32) -> Self {
        Self::new(limit, Duration::from_secs(60))
    }
}

/// Error returned when a quota string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid quota `{input}`: {reason}")]
pub struct QuotaParseError {
    input: String,
    reason: &'static str,
}

impl FromStr for Quota {
    type Err = QuotaParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fail = |reason| QuotaParseError {
            input: s.to_string(),
            reason,
        };

        let normalized = s.trim().to_ascii_lowercase();
        let (count, period) = normalized
            .split_once(" per ")
            .or_else(|| normalized.split_once('/'))
            .ok_or_else(|| fail("expected `<count> per <period>`"))?;

        let limit: u32 = count
            .trim()
            .parse()
            .map_err(|_| fail("count is not a number"))?;

        let mut parts = period.split_whitespace();
        let (multiplier, unit) = match (parts.next(), parts.next(), parts.next()) {
            (Some(unit), None, None) => (1, unit),
            (Some(n), Some(unit), None) => {
                let n: u64 = n.parse().map_err(|_| fail("period multiplier is not a number"))?;
                (n, unit)
            }
            _ => return Err(fail("expected a period such as `minute` or `30 seconds`")),
        };

        let unit_secs = match unit.trim_end_matches('s') {
            "second" | "sec" => 1,
            "minute" | "min" => 60,
            "hour" => 3_600,
            "day" => 86_400,
            _ => return Err(fail("unknown period unit")),
        };

        let secs = multiplier
            .checked_mul(unit_secs)
            .ok_or_else(|| fail("period too long"))?;

        Ok(Quota::new(limit, Duration::from_secs(secs)))
    }
}

impl TryFrom<String> for Quota {
    type Error = QuotaParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Quota> for String {
    fn from(quota: Quota) -> Self {
        quota.to_string()
    }
}

impl fmt::Display for Quota {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.window.as_secs() {
            1 => write!(f, "{} per second", self.limit),
            60 => write!(f, "{} per minute", self.limit),
            3_600 => write!(f, "{} per hour", self.limit),
            86_400 => write!(f, "{} per day", self.limit),
            secs => write!(f, "{} per {} seconds", self.limit, secs),
        }
    }
}
