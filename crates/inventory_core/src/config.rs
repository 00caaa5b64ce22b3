//! Store endpoint configuration.
//!
//! # Responsibility
//! - Describe the database target a connection provider binds to.
//! - Load that description from a JSON document supplied by the host process.
//!
//! # Invariants
//! - Only `host`, `port`, `service`, `user` and `password` are recognized.
//! - `service` (the catalog) is never empty after validation.
//! - The password never appears in `Debug` output or log lines.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::path::Path;

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Hosts that resolve to the local machine.
const LOCAL_HOSTS: &[&str] = &["", "localhost", "127.0.0.1", "::1"];

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read store config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse store config: {err}"),
            Self::Invalid(message) => write!(f, "invalid store config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Resolved database endpoint.
///
/// For the SQLite backend `service` is the path of the database file.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    pub service: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl StoreConfig {
    /// Local target with no credentials.
    pub fn local(service: impl Into<String>) -> Self {
        Self {
            host: "localhost".to_string(),
            port: None,
            service: service.into(),
            user: None,
            password: None,
        }
    }

    /// Parses and validates a JSON config document.
    ///
    /// # Errors
    /// - `Parse` for malformed JSON, unknown keys or a missing `service`.
    /// - `Invalid` when `service` is blank.
    pub fn from_json_str(input: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON config document from disk.
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.service.trim().is_empty() {
            return Err(ConfigError::Invalid("service cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Whether `host` names the local machine.
    pub fn is_local_host(&self) -> bool {
        let host = self.host.trim().to_ascii_lowercase();
        LOCAL_HOSTS.contains(&host.as_str())
    }

    /// Log-safe summary: `host:port/service user=...`.
    pub fn describe(&self) -> String {
        let host = if self.host.is_empty() {
            "localhost"
        } else {
            self.host.as_str()
        };
        let port = self
            .port
            .map(|port| format!(":{port}"))
            .unwrap_or_default();
        let user = self.user.as_deref().unwrap_or("-");
        format!("{host}{port}/{} user={user}", self.service)
    }
}

impl Debug for StoreConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("service", &self.service)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
