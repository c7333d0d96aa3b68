//! Config loading, validation, and utility operations.

use super::model::Config;
use crate::claims::KeySpace;
use crate::error::{QueueError, Result};
use crate::expiry::MAX_TTL;
use std::path::Path;
use std::time::Duration;

/// File name looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "dqueue.yaml";

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            QueueError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Load config from `path` if given, else from `dqueue.yaml` if present,
    /// else fall back to defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::load(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| QueueError::UserError(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            QueueError::UserError(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `ttl_seconds`, `connect_timeout_ms` and `io_timeout_ms` must be positive
    /// - `ttl_seconds` must not exceed the maximum claim lifetime
    /// - `namespace` must be a valid key namespace
    /// - `redis_url` must be non-empty
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("ttl_seconds", self.ttl_seconds),
            ("connect_timeout_ms", self.connect_timeout_ms),
            ("io_timeout_ms", self.io_timeout_ms),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(QueueError::UserError(format!(
                    "config validation failed: {} must be greater than 0",
                    name
                )));
            }
        }

        if self.ttl_seconds > MAX_TTL.as_secs() {
            return Err(QueueError::UserError(format!(
                "config validation failed: ttl_seconds must be at most {}",
                MAX_TTL.as_secs()
            )));
        }

        if self.redis_url.trim().is_empty() {
            return Err(QueueError::UserError(
                "config validation failed: redis_url must be non-empty".to_string(),
            ));
        }

        KeySpace::new(self.namespace.clone()).map_err(|e| {
            QueueError::UserError(format!("config validation failed: {}", e))
        })?;

        Ok(())
    }

    /// Claim lifetime.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// Store connect timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Store read/write timeout.
    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }
}
