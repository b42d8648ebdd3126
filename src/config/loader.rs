//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use crate::config::schema::GateConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable holding the session signing secret.
pub const SECRET_KEY_ENV: &str = "ROBOT_GATE_SECRET_KEY";
/// Environment variable overriding the bind address.
pub const BIND_ADDRESS_ENV: &str = "ROBOT_GATE_BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML file without validating it.
pub fn read_config(path: &Path) -> Result<GateConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GateConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: &mut GateConfig) {
    apply_overrides_from(config, |name| std::env::var(name).ok());
}

/// Apply overrides from an arbitrary variable source.
pub fn apply_overrides_from(config: &mut GateConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(secret) = lookup(SECRET_KEY_ENV).filter(|s| !s.is_empty()) {
        config.session.secret_key = secret;
    }
    if let Some(bind) = lookup(BIND_ADDRESS_ENV).filter(|s| !s.is_empty()) {
        config.listener.bind_address = bind;
    }
}

/// Load configuration: the file if given (defaults otherwise), then the
/// environment, then a command-line bind address, then validation.
pub fn load_config(
    path: Option<&Path>,
    bind_override: Option<String>,
) -> Result<GateConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => GateConfig::default(),
    };
    apply_env_overrides(&mut config);
    if let Some(bind) = bind_override {
        config.listener.bind_address = bind;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MIN_SECRET_LEN;
    use std::collections::HashMap;

    #[test]
    fn overrides_replace_file_values() {
        let mut config = GateConfig::default();
        config.session.secret_key = "from-file".into();

        let env: HashMap<&str, String> = HashMap::from([
            (SECRET_KEY_ENV, "e".repeat(MIN_SECRET_LEN)),
            (BIND_ADDRESS_ENV, "127.0.0.1:8000".to_string()),
        ]);
        apply_overrides_from(&mut config, |name| env.get(name).cloned());

        assert_eq!(config.session.secret_key, "e".repeat(MIN_SECRET_LEN));
        assert_eq!(config.listener.bind_address, "127.0.0.1:8000");
    }

    #[test]
    fn empty_overrides_are_ignored() {
        let mut config = GateConfig::default();
        config.session.secret_key = "from-file".into();

        apply_overrides_from(&mut config, |_| Some(String::new()));

        assert_eq!(config.session.secret_key, "from-file");
        assert_eq!(config.listener.bind_address, "0.0.0.0:5000");
    }

    #[test]
    fn reads_toml_file() {
        let path = std::env::temp_dir().join(format!("robot-gate-{}.toml", std::process::id()));
        fs::write(
            &path,
            r#"
            [listener]
            bind_address = "127.0.0.1:6000"

            [proxy]
            trusted_hops = 0
            "#,
        )
        .unwrap();

        let config = read_config(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:6000");
        assert_eq!(config.proxy.trusted_hops, 0);
    }

    #[test]
    fn reports_parse_errors() {
        let path = std::env::temp_dir().join(format!("robot-gate-bad-{}.toml", std::process::id()));
        fs::write(&path, "[rate_limit]\ndefault = \"lots per minute\"\n").unwrap();

        let result = read_config(&path);
        fs::remove_file(&path).unwrap();

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = read_config(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
