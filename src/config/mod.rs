//! Configuration management for authgate
//!
//! This module handles loading, parsing, and validating configuration from
//! YAML files and environment variables. The legacy hash secret is typically
//! injected via `${VAR}` expansion rather than written into the file.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::manager::LoginStrategy;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthSettings,

    /// Legacy keyed-hash configuration
    #[serde(default)]
    pub legacy_hash: LegacyHashSettings,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileRead(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        // Expand environment variables before parsing
        let expanded = expand_env_vars(yaml);
        serde_yaml::from_str(&expanded)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse YAML: {}", e)))
    }

    /// Load configuration from environment variables with prefix AUTHGATE_
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Ok(session_key) = std::env::var("AUTHGATE_SESSION_KEY") {
            config.auth.session_key = session_key;
        }
        if let Ok(strategy) = std::env::var("AUTHGATE_LOGIN_STRATEGY") {
            config.auth.strategy = strategy
                .parse()
                .map_err(|e: String| ConfigError::Parse(e))?;
        }

        if let Ok(method) = std::env::var("AUTHGATE_LEGACY_HASH_METHOD") {
            config.legacy_hash.method = method;
        }
        if let Ok(secret) = std::env::var("AUTHGATE_LEGACY_HASH_SECRET") {
            config.legacy_hash.secret = secret;
        }

        if let Ok(path) = std::env::var("AUTHGATE_DATABASE_PATH") {
            config.database.path = path;
        }

        if let Ok(level) = std::env::var("AUTHGATE_LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(config)
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthSettings {
    /// Session key under which the authenticated user id is stored
    #[serde(default = "default_session_key")]
    pub session_key: String,

    /// Credential-matching strategy used by `login`
    #[serde(default)]
    pub strategy: LoginStrategy,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            session_key: default_session_key(),
            strategy: LoginStrategy::default(),
        }
    }
}

fn default_session_key() -> String {
    "auth_user_id".to_string()
}

/// Legacy keyed-hash configuration
///
/// Only consulted when verifying version-1 hashes; new hashes never use
/// these values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LegacyHashSettings {
    /// Digest algorithm (sha256 or sha512)
    #[serde(default = "default_legacy_method")]
    pub method: String,

    /// Static secret key
    #[serde(default)]
    pub secret: String,
}

impl Default for LegacyHashSettings {
    fn default() -> Self {
        Self {
            method: default_legacy_method(),
            secret: String::new(),
        }
    }
}

fn default_legacy_method() -> String {
    "sha256".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseSettings {
    /// Path to the SQLite database file
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "authgate.db".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    /// Log level filter
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Configuration file error: {0}")]
    FileRead(String),

    /// Failed to parse the configuration
    #[error("Configuration parse error: {0}")]
    Parse(String),
}

static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

/// Replace `${VAR}` references with the named environment variable's value
///
/// Unset variables expand to the empty string.
fn expand_env_vars(input: &str) -> String {
    ENV_VAR_PATTERN
        .replace_all(input, |caps: &regex::Captures<'_>| {
            std::env::var(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}
