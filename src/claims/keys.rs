//! Store key layout.

use super::types::{Pid, UserId};
use crate::error::{QueueError, Result};

/// Infix used for per-user index keys.
const USER_INFIX: &str = "user";

/// Suffix of the global index key.
const GLOBAL_SUFFIX: &str = "locked";

/// Key layout for one logical pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpace {
    namespace: String,
}

impl KeySpace {
    /// Create a key space for the given namespace.
    ///
    /// The namespace must be non-empty, must not contain `:` and must not be
    /// the user infix, otherwise claim keys could collide with index keys.
    pub fn new(namespace: impl Into<String>) -> Result<Self> {
        let namespace = namespace.into();
        if namespace.is_empty() {
            return Err(QueueError::InvalidArgument(
                "namespace must not be empty".to_string(),
            ));
        }
        if namespace.contains(':') {
            return Err(QueueError::InvalidArgument(format!(
                "namespace must not contain ':' (found '{}')",
                namespace
            )));
        }
        if namespace == USER_INFIX {
            return Err(QueueError::InvalidArgument(format!(
                "namespace '{}' is reserved",
                USER_INFIX
            )));
        }
        Ok(Self { namespace })
    }

    /// The namespace this key space was built from.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Prefix shared by every claim key; the pid is appended to it.
    pub fn claim_prefix(&self) -> String {
        format!("{0}:{0}:", self.namespace)
    }

    /// Key holding the owner of `pid`.
    pub fn claim_key(&self, pid: Pid) -> String {
        format!("{}{}", self.claim_prefix(), pid)
    }

    /// Key of the per-user index for `user_id`.
    pub fn user_key(&self, user_id: UserId) -> String {
        format!("{}:{}:{}", self.namespace, USER_INFIX, user_id)
    }

    /// Key of the global index.
    pub fn global_key(&self) -> String {
        format!("{}:{}", self.namespace, GLOBAL_SUFFIX)
    }
}

impl Default for KeySpace {
    fn default() -> Self {
        Self {
            namespace: "project".to_string(),
        }
    }
}
