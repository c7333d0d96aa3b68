//! In-process claim store using stored expiry timestamps.

use super::ClaimStore;
use crate::claims::{Claim, Pid, UserId};
use crate::config::RelockPolicy;
use crate::error::{QueueError, Result};
use crate::expiry::{Clock, Reconciler, SystemClock};
use chrono::{DateTime, Utc};
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Claim store kept in process memory.
///
/// Each claim carries its own expiry instant. Every operation takes the store
/// mutex, purges expired claims, and only then computes its result, so
/// an expired claim never shows up in any index.
pub struct MemoryStore {
    claims: Mutex<HashMap<Pid, Claim>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    /// Create an empty store on the wall clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store reading time from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            claims: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Number of claims physically held, live or not.
    pub fn stored_len(&self) -> usize {
        self.claims
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .len()
    }

    /// Run `f` over the claim map after expired claims have been purged.
    fn reconciled<T>(&self, f: impl FnOnce(&mut HashMap<Pid, Claim>, DateTime<Utc>) -> T) -> T {
        let mut claims = self
            .claims
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        let now = self.clock.now();
        Reconciler::purge_expired(&mut claims, now);
        f(&mut claims, now)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("stored", &self.stored_len())
            .finish()
    }
}

impl ClaimStore for MemoryStore {
    fn claim(
        &self,
        user_id: UserId,
        pids: &BTreeSet<Pid>,
        ttl: Duration,
        relock: RelockPolicy,
    ) -> Result<BTreeSet<Pid>> {
        let ttl = chrono::Duration::from_std(ttl).map_err(|e| {
            QueueError::InvalidArgument(format!("ttl {:?} is out of range: {}", ttl, e))
        })?;

        self.reconciled(|claims, now| {
            let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
                QueueError::InvalidArgument(format!("ttl {} overflows the expiry time", ttl))
            })?;
            let mut claimed = BTreeSet::new();

            for &pid in pids {
                match claims.entry(pid) {
                    Entry::Vacant(slot) => {
                        slot.insert(Claim {
                            pid,
                            user_id,
                            expires_at,
                        });
                        claimed.insert(pid);
                    }
                    Entry::Occupied(mut held) if held.get().user_id == user_id => {
                        if relock == RelockPolicy::Refresh {
                            held.get_mut().expires_at = expires_at;
                        }
                        claimed.insert(pid);
                    }
                    Entry::Occupied(_) => {}
                }
            }

            Ok(claimed)
        })
    }

    fn release(&self, user_id: UserId, pids: &BTreeSet<Pid>) -> Result<BTreeSet<Pid>> {
        Ok(self.reconciled(|claims, _| {
            let mut released = BTreeSet::new();
            for &pid in pids {
                if claims.get(&pid).is_some_and(|c| c.user_id == user_id) {
                    claims.remove(&pid);
                    released.insert(pid);
                }
            }
            released
        }))
    }

    fn release_all(&self, user_id: UserId) -> Result<BTreeSet<Pid>> {
        Ok(self.reconciled(|claims, _| {
            let owned: BTreeSet<Pid> = claims
                .values()
                .filter(|c| c.user_id == user_id)
                .map(|c| c.pid)
                .collect();
            for pid in &owned {
                claims.remove(pid);
            }
            owned
        }))
    }

    fn user_pids(&self, user_id: UserId) -> Result<BTreeSet<Pid>> {
        Ok(self.reconciled(|claims, _| {
            claims
                .values()
                .filter(|c| c.user_id == user_id)
                .map(|c| c.pid)
                .collect()
        }))
    }

    fn all_pids(&self) -> Result<BTreeSet<Pid>> {
        Ok(self.reconciled(|claims, _| claims.keys().copied().collect()))
    }

    fn claim_of(&self, pid: Pid) -> Result<Option<Claim>> {
        Ok(self.reconciled(|claims, _| claims.get(&pid).copied()))
    }
}
