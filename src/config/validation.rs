//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, quotas and the session secret
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GateConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::{GateConfig, Quota};
use crate::session::MIN_SECRET_LEN;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    BindAddress(String),

    #[error("session.secret_key must be at least {MIN_SECRET_LEN} bytes (got {0}); set ROBOT_GATE_SECRET_KEY")]
    SecretTooShort(usize),

    #[error("session.cookie_name must not be empty")]
    EmptyCookieName,

    #[error("rate_limit.{scope} quota `{quota}` must allow at least one request per non-empty window")]
    EmptyQuota { scope: String, quota: Quota },

    #[error("rate_limit.purge_interval_secs must be greater than zero")]
    PurgeInterval,

    #[error("session.{0} must be greater than zero")]
    SessionInterval(&'static str),

    #[error("observability.metrics_address `{0}` is not a socket address")]
    MetricsAddress(String),
}

fn check_quota(scope: &str, quota: Quota, errors: &mut Vec<ValidationError>) {
    if quota.limit == 0 || quota.window.is_zero() {
        errors.push(ValidationError::EmptyQuota {
            scope: scope.to_string(),
            quota,
        });
    }
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let secret_len = config.session.secret_key.len();
    if secret_len < MIN_SECRET_LEN {
        errors.push(ValidationError::SecretTooShort(secret_len));
    }

    if config.session.cookie_name.is_empty() {
        errors.push(ValidationError::EmptyCookieName);
    }

    if config.session.max_lifetime_secs == 0 {
        errors.push(ValidationError::SessionInterval("max_lifetime_secs"));
    }
    if config.session.cleanup_interval_secs == 0 {
        errors.push(ValidationError::SessionInterval("cleanup_interval_secs"));
    }

    check_quota("default", config.rate_limit.default, &mut errors);
    for (endpoint, quota) in &config.rate_limit.routes {
        check_quota(&format!("routes.{}", endpoint), *quota, &mut errors);
    }

    if config.rate_limit.purge_interval_secs == 0 {
        errors.push(ValidationError::PurgeInterval);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::Endpoint;
    use std::time::Duration;

    fn valid() -> GateConfig {
        let mut config = GateConfig::default();
        config.session.secret_key = "s".repeat(MIN_SECRET_LEN);
        config
    }

    #[test]
    fn defaults_with_secret_are_valid() {
        assert_eq!(validate_config(&valid()), Ok(()));
    }

    #[test]
    fn missing_secret_is_rejected() {
        let errors = validate_config(&GateConfig::default()).unwrap_err();
        assert_eq!(errors, vec![ValidationError::SecretTooShort(0)]);
    }

    #[test]
    fn reports_every_problem() {
        let mut config = valid();
        config.listener.bind_address = "nowhere".into();
        config.session.cookie_name.clear();
        config.rate_limit.default = Quota::per_minute(0);
        config
            .rate_limit
            .routes
            .insert(Endpoint::ApiData, Quota::new(5, Duration::ZERO));
        config.rate_limit.purge_interval_secs = 0;
        config.session.cleanup_interval_secs = 0;
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "bad".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 7, "{:?}", errors);
        assert!(errors.contains(&ValidationError::BindAddress("nowhere".into())));
        assert!(errors.contains(&ValidationError::EmptyCookieName));
        assert!(errors.contains(&ValidationError::PurgeInterval));
        assert!(errors.contains(&ValidationError::SessionInterval("cleanup_interval_secs")));
        assert!(errors.contains(&ValidationError::MetricsAddress("bad".into())));
        assert!(errors.iter().any(
            |e| matches!(e, ValidationError::EmptyQuota { scope, .. } if scope == "routes.api_data")
        ));
    }

    #[test]
    fn metrics_address_ignored_when_disabled() {
        let mut config = valid();
        config.observability.metrics_address = "bad".into();
        assert_eq!(validate_config(&config), Ok(()));
    }
}
