//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use axum::http::HeaderValue;
use chrono::Duration;
use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// When absent the API keeps everything in memory.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub log_level: Level,
    pub allowed_origin: HeaderValue,
    pub session_age: Duration,
    pub session_purge_interval: std::time::Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server ---
        let bind_address_str = lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let allowed_origin_str =
            lookup("ALLOWED_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());
        let allowed_origin = allowed_origin_str.parse::<HeaderValue>().map_err(|e| {
            ConfigError::InvalidValue("ALLOWED_ORIGIN".to_string(), e.to_string())
        })?;

        // --- Database ---
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let database_max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw.parse::<u32>().map_err(|e| {
                ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS".to_string(), e.to_string())
            })?,
            None => 5,
        };

        // --- Logging ---
        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Sessions ---
        let session_age_days = match lookup("SESSION_AGE_DAYS") {
            Some(raw) => raw.parse::<i64>().ok().filter(|d| *d > 0).ok_or_else(|| {
                ConfigError::InvalidValue(
                    "SESSION_AGE_DAYS".to_string(),
                    format!("'{}' is not a positive number of days", raw),
                )
            })?,
            None => 14,
        };

        let session_purge_secs = match lookup("SESSION_PURGE_SECONDS") {
            Some(raw) => raw.parse::<u64>().ok().filter(|s| *s > 0).ok_or_else(|| {
                ConfigError::InvalidValue(
                    "SESSION_PURGE_SECONDS".to_string(),
                    format!("'{}' is not a positive number of seconds", raw),
                )
            })?,
            None => 3600,
        };

        Ok(Self {
            bind_address,
            database_url,
            database_max_connections,
            log_level,
            allowed_origin,
            session_age: Duration::days(session_age_days),
            session_purge_interval: std::time::Duration::from_secs(session_purge_secs),
        })
    }

    /// The database URL, for commands that cannot run without one.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:3000".parse().unwrap());
        assert!(config.database_url.is_none());
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.allowed_origin, "http://localhost:3000");
        assert_eq!(config.session_age, Duration::days(14));
        assert_eq!(config.session_purge_interval.as_secs(), 3600);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = load(&[
            ("BIND_ADDRESS", "127.0.0.1:8000"),
            ("DATABASE_URL", "postgres://rango@localhost/rango"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
            ("RUST_LOG", "debug"),
            ("SESSION_AGE_DAYS", "1"),
            ("SESSION_PURGE_SECONDS", "60"),
        ])
        .unwrap();
        assert_eq!(config.bind_address.port(), 8000);
        assert_eq!(
            config.require_database_url().unwrap(),
            "postgres://rango@localhost/rango"
        );
        assert_eq!(config.database_max_connections, 12);
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.session_age, Duration::days(1));
        assert_eq!(config.session_purge_interval.as_secs(), 60);
    }

    #[test]
    fn missing_database_url_is_reported_on_demand() {
        let config = load(&[("DATABASE_URL", "  ")]).unwrap();
        assert!(matches!(
            config.require_database_url(),
            Err(ConfigError::MissingVar(var)) if var == "DATABASE_URL"
        ));
    }

    #[rstest]
    #[case("BIND_ADDRESS", "not-an-address")]
    #[case("ALLOWED_ORIGIN", "http://bad\norigin")]
    #[case("RUST_LOG", "chatty")]
    #[case("SESSION_AGE_DAYS", "0")]
    #[case("SESSION_PURGE_SECONDS", "soon")]
    #[case("DATABASE_MAX_CONNECTIONS", "-1")]
    fn invalid_values_name_the_variable(#[case] key: &str, #[case] value: &str) {
        match load(&[(key, value)]) {
            Err(ConfigError::InvalidValue(var, _)) => assert_eq!(var, key),
            other => panic!("expected invalid {}, got {:?}", key, other),
        }
    }
}
