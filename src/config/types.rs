//! Configuration types and defaults for dqueue.

use serde::{Deserialize, Serialize};

/// What happens to the expiry of a pid its owner locks again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RelockPolicy {
    /// Leave the original expiry untouched (default).
    #[default]
    Keep,
    /// Restart the TTL from the moment of the new lock call.
    Refresh,
}

impl RelockPolicy {
    /// Parse a relock policy from a string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "keep" => Some(Self::Keep),
            "refresh" => Some(Self::Refresh),
            _ => None,
        }
    }
}

// Default value functions for serde
pub(crate) fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/0".to_string()
}
pub(crate) fn default_namespace() -> String {
    "project".to_string()
}
pub(crate) fn default_ttl_seconds() -> u64 {
    600
}
pub(crate) fn default_timeout_ms() -> u64 {
    2000
}
