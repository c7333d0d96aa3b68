//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for a dqueue pool.
///
/// This struct represents the contents of `dqueue.yaml`.
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Store settings
    // =========================================================================
    /// Redis connection URL.
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Key namespace of the pool (default: "project").
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Milliseconds to wait for a connection to the store.
    #[serde(default = "default_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Milliseconds to wait for a single store reply.
    #[serde(default = "default_timeout_ms")]
    pub io_timeout_ms: u64,

    // =========================================================================
    // Lock settings
    // =========================================================================
    /// Seconds a claim stays live after being locked.
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,

    /// Whether re-locking an owned pid refreshes its TTL.
    #[serde(default)]
    pub relock_policy: RelockPolicy,

    // =========================================================================
    // Audit settings
    // =========================================================================
    /// NDJSON file that mutating commands append audit events to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            namespace: default_namespace(),
            connect_timeout_ms: default_timeout_ms(),
            io_timeout_ms: default_timeout_ms(),
            ttl_seconds: default_ttl_seconds(),
            relock_policy: RelockPolicy::default(),
            events_path: None,
        }
    }
}
