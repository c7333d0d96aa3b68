//! Claim stores.
//!
//! A [`ClaimStore`] is the only place claims live. Every method runs its whole
//! batch as one atomic step against the store, so concurrent callers (threads
//! or separate processes) never observe a pid held by two users, and a failed
//! call leaves nothing of its batch applied.
//!
//! Two implementations are provided:
//! - [`RedisStore`]: claims are Redis keys with native millisecond expiry;
//!   batches run as server-side Lua scripts.
//! - [`MemoryStore`]: claims are kept with their expiry timestamp inside the
//!   process and reconciled on every access; useful for embedding and tests.

mod memory;
mod redis_store;
mod scripts;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use crate::claims::{Claim, Pid, UserId};
use crate::config::RelockPolicy;
use crate::error::Result;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

/// Atomic batch primitives the locking engine is built on.
pub trait ClaimStore: Send + Sync {
    /// Claim every pid in `pids` that has no live claim, for `ttl`.
    ///
    /// Pids already live-owned by `user_id` are reported as claimed; their
    /// expiry is handled according to `relock`. Pids live-owned by anyone else
    /// are left alone and omitted from the result.
    fn claim(
        &self,
        user_id: UserId,
        pids: &BTreeSet<Pid>,
        ttl: Duration,
        relock: RelockPolicy,
    ) -> Result<BTreeSet<Pid>>;

    /// Destroy the live claims in `pids` that are owned by `user_id`.
    ///
    /// Returns the pids whose claims were destroyed.
    fn release(&self, user_id: UserId, pids: &BTreeSet<Pid>) -> Result<BTreeSet<Pid>>;

    /// Destroy every live claim owned by `user_id` in one step.
    fn release_all(&self, user_id: UserId) -> Result<BTreeSet<Pid>>;

    /// Pids live-owned by `user_id`.
    fn user_pids(&self, user_id: UserId) -> Result<BTreeSet<Pid>>;

    /// Pids live-owned by anyone.
    fn all_pids(&self) -> Result<BTreeSet<Pid>>;

    /// The live claim on `pid`, if any.
    fn claim_of(&self, pid: Pid) -> Result<Option<Claim>>;
}

impl<S: ClaimStore + ?Sized> ClaimStore for Arc<S> {
    fn claim(
        &self,
        user_id: UserId,
        pids: &BTreeSet<Pid>,
        ttl: Duration,
        relock: RelockPolicy,
    ) -> Result<BTreeSet<Pid>> {
        (**self).claim(user_id, pids, ttl, relock)
    }

    fn release(&self, user_id: UserId, pids: &BTreeSet<Pid>) -> Result<BTreeSet<Pid>> {
        (**self).release(user_id, pids)
    }

    fn release_all(&self, user_id: UserId) -> Result<BTreeSet<Pid>> {
        (**self).release_all(user_id)
    }

    fn user_pids(&self, user_id: UserId) -> Result<BTreeSet<Pid>> {
        (**self).user_pids(user_id)
    }

    fn all_pids(&self) -> Result<BTreeSet<Pid>> {
        (**self).all_pids()
    }

    fn claim_of(&self, pid: Pid) -> Result<Option<Claim>> {
        (**self).claim_of(pid)
    }
}
