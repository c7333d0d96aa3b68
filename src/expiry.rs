//! Expiry reconciliation.
//!
//! Liveness is decided in one place: a claim is live while `now < expires_at`.
//!
//! Stores with native per-key expiry (Redis) never need a timestamp
//! comparison; an expired claim is simply absent. Stores that keep the expiry
//! next to the claim (the in-process store) run [`Reconciler::purge_expired`]
//! at the start of every operation, so an expired claim is dropped before any
//! result is computed.

use crate::claims::{Claim, Pid};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// Shortest claim lifetime the stores can represent.
pub const MIN_TTL: std::time::Duration = std::time::Duration::from_millis(1);

/// Longest claim lifetime accepted (ten years).
///
/// Keeps `now + ttl` inside the timestamp range and the millisecond count
/// below the point where Lua prints it in exponent notation.
pub const MAX_TTL: std::time::Duration =
    std::time::Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// Whether a claim expiring at `expires_at` is live at `now`.
pub fn is_live(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now < expires_at
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poison| poison.into_inner());
        *now += by;
    }

    /// Jump the clock to `to`.
    pub fn set(&self, to: DateTime<Utc>) {
        let mut now = self.now.lock().unwrap_or_else(|poison| poison.into_inner());
        *now = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|poison| poison.into_inner())
    }
}

/// Inline expiry pass for stores that keep timestamps.
#[derive(Debug, Default, Clone, Copy)]
pub struct Reconciler;

impl Reconciler {
    /// Drop every claim whose expiry has passed.
    ///
    /// Returns the purged claims. Safe to call repeatedly: a second pass over
    /// the same map finds nothing to purge.
    pub fn purge_expired(claims: &mut HashMap<Pid, Claim>, now: DateTime<Utc>) -> Vec<Claim> {
        let expired: Vec<Claim> = claims
            .values()
            .filter(|claim| !claim.is_live_at(now))
            .copied()
            .collect();

        for claim in &expired {
            claims.remove(&claim.pid);
        }

        if !expired.is_empty() {
            tracing::debug!(purged = expired.len(), "purged expired claims");
        }

        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim(pid: Pid, user_id: u64, expires_at: DateTime<Utc>) -> Claim {
        Claim {
            pid,
            user_id,
            expires_at,
        }
    }

    #[test]
    fn claim_is_dead_at_its_expiry_instant() {
        let now = Utc::now();
        assert!(is_live(now + Duration::seconds(1), now));
        assert!(!is_live(now, now));
        assert!(!is_live(now - Duration::seconds(1), now));
    }

    #[test]
    fn manual_clock_moves_only_when_told() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::seconds(30));
        assert_eq!(clock.now(), start + Duration::seconds(30));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn purge_drops_only_expired_claims() {
        let now = Utc::now();
        let mut claims = HashMap::new();
        claims.insert(1, claim(1, 10, now + Duration::seconds(5)));
        claims.insert(2, claim(2, 10, now - Duration::seconds(5)));
        claims.insert(3, claim(3, 20, now));

        let purged = Reconciler::purge_expired(&mut claims, now);

        let mut purged_pids: Vec<Pid> = purged.iter().map(|c| c.pid).collect();
        purged_pids.sort_unstable();
        assert_eq!(purged_pids, vec![2, 3]);
        assert_eq!(claims.len(), 1);
        assert!(claims.contains_key(&1));
    }

    #[test]
    fn purge_is_idempotent() {
        let now = Utc::now();
        let mut claims = HashMap::new();
        claims.insert(1, claim(1, 10, now - Duration::seconds(1)));

        assert_eq!(Reconciler::purge_expired(&mut claims, now).len(), 1);
        assert!(Reconciler::purge_expired(&mut claims, now).is_empty());
        assert!(claims.is_empty());
    }
}
