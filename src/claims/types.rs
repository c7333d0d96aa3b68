//! Claim type definitions.

use crate::error::{QueueError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a poolable work item.
pub type Pid = u64;

/// Identifier of a claimant. Any value is valid; there is no registration.
pub type UserId = u64;

/// A time-bounded exclusive ownership record linking one pid to one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    /// The claimed pid.
    pub pid: Pid,

    /// The user holding the claim.
    pub user_id: UserId,

    /// Instant at which the claim stops being live.
    pub expires_at: DateTime<Utc>,
}

impl Claim {
    /// Whether the claim is still live at `now`.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        crate::expiry::is_live(self.expires_at, now)
    }

    /// Time left before the claim expires, clamped at zero.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        let left = self.expires_at.signed_duration_since(now);
        if left < Duration::zero() {
            Duration::zero()
        } else {
            left
        }
    }

    /// Format the remaining lifetime as a human-readable string.
    pub fn remaining_string(&self, now: DateTime<Utc>) -> String {
        let left = self.remaining(now);
        let seconds = left.num_seconds();
        let minutes = left.num_minutes();
        let hours = left.num_hours();

        if hours > 0 {
            format!("{}h {}m", hours, minutes % 60)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds % 60)
        } else {
            format!("{}s", seconds)
        }
    }
}

impl std::fmt::Display for Claim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "pid {} (owner: {}, expires: {})",
            self.pid,
            self.user_id,
            self.expires_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}

/// Parse a pid or user id read back from the store.
///
/// Anything that is not a plain unsigned integer means the store holds data we
/// did not write, which is a protocol violation rather than a miss.
pub fn parse_id(raw: &str, what: &str) -> Result<u64> {
    raw.trim().parse::<u64>().map_err(|_| {
        QueueError::ProtocolViolation(format!("expected integer {} in store, found '{}'", what, raw))
    })
}
