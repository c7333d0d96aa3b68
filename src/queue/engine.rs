//! Lock, retrieve, and remove operations.

use crate::claims::{Claim, Pid, UserId};
use crate::config::{Config, RelockPolicy};
use crate::error::{QueueError, Result};
use crate::expiry::{MAX_TTL, MIN_TTL};
use crate::store::{ClaimStore, RedisStore};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::debug;

/// Distributed queue of exclusive, expiring pid locks.
#[derive(Debug)]
pub struct DistributedQueue<S> {
    store: S,
    ttl: Duration,
    relock: RelockPolicy,
}

impl DistributedQueue<RedisStore> {
    /// Build a queue over the Redis server named in `config`.
    pub fn connect(config: &Config) -> Result<Self> {
        let store = RedisStore::from_config(config)?;
        Ok(Self::from_config(store, config))
    }
}

impl<S: ClaimStore> DistributedQueue<S> {
    /// Create a queue over `store` with the default TTL (600 seconds) and
    /// relock policy.
    pub fn new(store: S) -> Self {
        Self::from_config(store, &Config::default())
    }

    /// Create a queue over `store` using the TTL and relock policy of `config`.
    pub fn from_config(store: S, config: &Config) -> Self {
        Self {
            store,
            ttl: config.ttl(),
            relock: config.relock_policy,
        }
    }

    /// Use `ttl` for [`lock_default`](Self::lock_default).
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set what happens to the expiry of a pid its owner locks again.
    pub fn with_relock_policy(mut self, relock: RelockPolicy) -> Self {
        self.relock = relock;
        self
    }

    /// The TTL used by [`lock_default`](Self::lock_default).
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The configured relock policy.
    pub fn relock_policy(&self) -> RelockPolicy {
        self.relock
    }

    /// The underlying claim store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Lock `pids` for `user_id` for `ttl`.
    ///
    /// Returns the pids `user_id` now holds as a result of this call: every
    /// pid that was free, plus every pid the user already held. Pids held by
    /// other users are skipped.
    ///
    /// # Errors
    ///
    /// * `QueueError::InvalidArgument` - `ttl` is shorter than one millisecond
    ///   or longer than [`MAX_TTL`]
    /// * `QueueError::StoreUnavailable` / `QueueError::ProtocolViolation` - the
    ///   store failed; nothing of the batch was applied
    pub fn lock<I>(&self, user_id: UserId, pids: I, ttl: Duration) -> Result<BTreeSet<Pid>>
    where
        I: IntoIterator<Item = Pid>,
    {
        if ttl < MIN_TTL {
            return Err(QueueError::InvalidArgument(format!(
                "ttl must be at least 1ms (got {:?})",
                ttl
            )));
        }
        if ttl > MAX_TTL {
            return Err(QueueError::InvalidArgument(format!(
                "ttl must be at most {}s (got {:?})",
                MAX_TTL.as_secs(),
                ttl
            )));
        }

        let requested: BTreeSet<Pid> = pids.into_iter().collect();
        if requested.is_empty() {
            return Ok(BTreeSet::new());
        }

        let locked = self.store.claim(user_id, &requested, ttl, self.relock)?;
        debug!(
            user_id,
            requested = requested.len(),
            locked = locked.len(),
            skipped = requested.len() - locked.len(),
            "lock"
        );
        Ok(locked)
    }

    /// Lock `pids` for `user_id` with the queue's configured TTL.
    pub fn lock_default<I>(&self, user_id: UserId, pids: I) -> Result<BTreeSet<Pid>>
    where
        I: IntoIterator<Item = Pid>,
    {
        self.lock(user_id, pids, self.ttl)
    }

    /// Pids currently locked by `user_id`.
    pub fn retrieve_user(&self, user_id: UserId) -> Result<BTreeSet<Pid>> {
        self.store.user_pids(user_id)
    }

    /// Pids currently locked by anyone.
    pub fn retrieve_all(&self) -> Result<BTreeSet<Pid>> {
        self.store.all_pids()
    }

    /// The live claim on `pid`, if any.
    pub fn owner_of(&self, pid: Pid) -> Result<Option<Claim>> {
        self.store.claim_of(pid)
    }

    /// Remove a single pid from the queue of `user_id`.
    ///
    /// Returns `true` if the pid was locked by `user_id` and is now free.
    pub fn remove_pid(&self, user_id: UserId, pid: Pid) -> Result<bool> {
        Ok(self.remove_pids(user_id, [pid])?.contains(&pid))
    }

    /// Remove `pids` from the queue of `user_id`.
    ///
    /// Only pids live-locked by `user_id` are removed and returned; pids held
    /// by others or not held at all are left alone.
    pub fn remove_pids<I>(&self, user_id: UserId, pids: I) -> Result<BTreeSet<Pid>>
    where
        I: IntoIterator<Item = Pid>,
    {
        let requested: BTreeSet<Pid> = pids.into_iter().collect();
        if requested.is_empty() {
            return Ok(BTreeSet::new());
        }

        let removed = self.store.release(user_id, &requested)?;
        debug!(
            user_id,
            requested = requested.len(),
            removed = removed.len(),
            "remove"
        );
        Ok(removed)
    }

    /// Remove every pid locked by `user_id`.
    ///
    /// The read of the user's pids and their removal happen in one atomic
    /// store step.
    pub fn remove_all(&self, user_id: UserId) -> Result<BTreeSet<Pid>> {
        let removed = self.store.release_all(user_id)?;
        debug!(user_id, removed = removed.len(), "remove_all");
        Ok(removed)
    }
}
