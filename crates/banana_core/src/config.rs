//! Runtime configuration loaded from environment variables.
//!
//! # Responsibility
//! - Resolve database path, logging setup and key namespace for binaries.
//!
//! # Invariants
//! - Missing variables fall back to defaults; present-but-invalid values are
//!   rejected instead of silently replaced.

use crate::env::EnvSource;
use crate::logging::{default_log_level, normalize_level};
use crate::provider_keys::DEFAULT_KEY_NAMESPACE;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_VAR: &str = "BANANA_DB_PATH";
pub const LOG_DIR_VAR: &str = "BANANA_LOG_DIR";
pub const LOG_LEVEL_VAR: &str = "BANANA_LOG_LEVEL";
pub const KEY_NAMESPACE_VAR: &str = "BANANA_KEY_NAMESPACE";

const DEFAULT_DB_FILE_NAME: &str = "banana.sqlite3";

static NAMESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").expect("valid namespace regex"));

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidLogLevel(String),
    InvalidKeyNamespace(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel(message) => write!(f, "{LOG_LEVEL_VAR}: {message}"),
            Self::InvalidKeyNamespace(value) => write!(
                f,
                "{KEY_NAMESPACE_VAR}: `{value}` must be upper-case letters, digits or `_`"
            ),
        }
    }
}

impl Error for ConfigError {}

/// Resolved core configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    /// File logging is only enabled when a directory is configured.
    pub log_dir: Option<PathBuf>,
    pub log_level: &'static str,
    pub key_namespace: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_dir: None,
            log_level: default_log_level(),
            key_namespace: DEFAULT_KEY_NAMESPACE.to_string(),
        }
    }
}

impl CoreConfig {
    /// Loads configuration from `BANANA_*` variables on top of defaults.
    pub fn from_env(env: &impl EnvSource) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = non_empty(env.var(DB_PATH_VAR)) {
            config.db_path = PathBuf::from(path);
        }
        config.log_dir = non_empty(env.var(LOG_DIR_VAR)).map(PathBuf::from);
        if let Some(level) = non_empty(env.var(LOG_LEVEL_VAR)) {
            config.log_level = normalize_level(&level).map_err(ConfigError::InvalidLogLevel)?;
        }
        if let Some(namespace) = non_empty(env.var(KEY_NAMESPACE_VAR)) {
            if !NAMESPACE_RE.is_match(&namespace) {
                return Err(ConfigError::InvalidKeyNamespace(namespace));
            }
            config.key_namespace = namespace;
        }

        Ok(config)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig};
    use crate::env::MapEnv;
    use std::path::PathBuf;

    #[test]
    fn defaults_apply_when_env_is_empty() {
        let config = CoreConfig::from_env(&MapEnv::new()).unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.key_namespace, "BANANA");
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn env_values_override_defaults() {
        let env = MapEnv::new()
            .with("BANANA_DB_PATH", "/data/banana.db")
            .with("BANANA_LOG_DIR", "/var/log/banana")
            .with("BANANA_LOG_LEVEL", " WARNING ")
            .with("BANANA_KEY_NAMESPACE", "SLIDES_2");
        let config = CoreConfig::from_env(&env).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/data/banana.db"));
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/banana")));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.key_namespace, "SLIDES_2");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let env = MapEnv::new().with("BANANA_LOG_LEVEL", "loud");
        assert!(matches!(
            CoreConfig::from_env(&env),
            Err(ConfigError::InvalidLogLevel(_))
        ));

        let env = MapEnv::new().with("BANANA_KEY_NAMESPACE", "banana");
        assert_eq!(
            CoreConfig::from_env(&env),
            Err(ConfigError::InvalidKeyNamespace("banana".to_string()))
        );
    }
}
