//! Redis-backed claim store with native key expiry.

use super::ClaimStore;
use super::scripts;
use crate::claims::{Claim, KeySpace, Pid, UserId, parse_id};
use crate::config::{Config, RelockPolicy};
use crate::error::{QueueError, Result};
use crate::expiry::MAX_TTL;
use chrono::Utc;
use redis::{Client, Connection};
use std::collections::BTreeSet;
use std::time::Duration;

/// Claim store backed by a single Redis server.
///
/// Each operation opens a connection, runs one atomic script (or MULTI/EXEC
/// pipeline), and drops the connection. Nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct RedisStore {
    client: Client,
    keys: KeySpace,
    connect_timeout: Duration,
    io_timeout: Duration,
}

impl RedisStore {
    /// Create a store for `url` using the given key layout.
    ///
    /// No connection is made until the first operation.
    pub fn open(url: &str, keys: KeySpace) -> Result<Self> {
        let client = Client::open(url).map_err(|e| {
            QueueError::UserError(format!("invalid redis url '{}': {}", url, e))
        })?;

        Ok(Self {
            client,
            keys,
            connect_timeout: Duration::from_secs(2),
            io_timeout: Duration::from_secs(2),
        })
    }

    /// Create a store from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let keys = KeySpace::new(config.namespace.clone())?;
        let store = Self::open(&config.redis_url, keys)?
            .with_timeouts(config.connect_timeout(), config.io_timeout());
        Ok(store)
    }

    /// Override the connect and read/write timeouts.
    pub fn with_timeouts(mut self, connect: Duration, io: Duration) -> Self {
        self.connect_timeout = connect;
        self.io_timeout = io;
        self
    }

    /// The key layout used by this store.
    pub fn keys(&self) -> &KeySpace {
        &self.keys
    }

    fn connection(&self) -> Result<Connection> {
        let con = self.client.get_connection_with_timeout(self.connect_timeout)?;
        con.set_read_timeout(Some(self.io_timeout))?;
        con.set_write_timeout(Some(self.io_timeout))?;
        Ok(con)
    }
}

/// Convert pid strings returned by a script into a set.
fn pid_set(raw: Vec<String>) -> Result<BTreeSet<Pid>> {
    raw.iter().map(|pid| parse_id(pid, "pid")).collect()
}

impl ClaimStore for RedisStore {
    fn claim(
        &self,
        user_id: UserId,
        pids: &BTreeSet<Pid>,
        ttl: Duration,
        relock: RelockPolicy,
    ) -> Result<BTreeSet<Pid>> {
        if ttl > MAX_TTL {
            return Err(QueueError::InvalidArgument(format!(
                "ttl {:?} is out of range",
                ttl
            )));
        }
        let ttl_ms = ttl.as_millis() as u64;

        let mut invocation = scripts::CLAIM.prepare_invoke();
        invocation
            .key(self.keys.user_key(user_id))
            .key(self.keys.global_key())
            .arg(user_id)
            .arg(ttl_ms)
            .arg(if relock == RelockPolicy::Refresh { "1" } else { "0" });
        for &pid in pids {
            invocation.key(self.keys.claim_key(pid)).arg(pid);
        }

        let mut con = self.connection()?;
        let claimed: Vec<String> = invocation.invoke(&mut con)?;
        pid_set(claimed)
    }

    fn release(&self, user_id: UserId, pids: &BTreeSet<Pid>) -> Result<BTreeSet<Pid>> {
        let mut invocation = scripts::RELEASE.prepare_invoke();
        invocation
            .key(self.keys.user_key(user_id))
            .key(self.keys.global_key())
            .arg(user_id);
        for &pid in pids {
            invocation.key(self.keys.claim_key(pid)).arg(pid);
        }

        let mut con = self.connection()?;
        let released: Vec<String> = invocation.invoke(&mut con)?;
        pid_set(released)
    }

    fn release_all(&self, user_id: UserId) -> Result<BTreeSet<Pid>> {
        let mut con = self.connection()?;
        let released: Vec<String> = scripts::RELEASE_ALL
            .key(self.keys.user_key(user_id))
            .key(self.keys.global_key())
            .arg(user_id)
            .arg(self.keys.claim_prefix())
            .invoke(&mut con)?;
        pid_set(released)
    }

    fn user_pids(&self, user_id: UserId) -> Result<BTreeSet<Pid>> {
        let mut con = self.connection()?;
        let live: Vec<String> = scripts::USER_PIDS
            .key(self.keys.user_key(user_id))
            .arg(user_id)
            .arg(self.keys.claim_prefix())
            .invoke(&mut con)?;
        pid_set(live)
    }

    fn all_pids(&self) -> Result<BTreeSet<Pid>> {
        let mut con = self.connection()?;
        let live: Vec<String> = scripts::ALL_PIDS
            .key(self.keys.global_key())
            .arg(self.keys.claim_prefix())
            .invoke(&mut con)?;
        pid_set(live)
    }

    fn claim_of(&self, pid: Pid) -> Result<Option<Claim>> {
        let key = self.keys.claim_key(pid);
        let mut con = self.connection()?;
        let (holder, pttl): (Option<String>, i64) = redis::pipe()
            .atomic()
            .get(&key)
            .pttl(&key)
            .query(&mut con)?;
        let now = Utc::now();

        let Some(holder) = holder else {
            return Ok(None);
        };
        if pttl < 0 {
            return Err(QueueError::ProtocolViolation(format!(
                "claim key '{}' has no expiry (PTTL {})",
                key, pttl
            )));
        }

        Ok(Some(Claim {
            pid,
            user_id: parse_id(&holder, "owner")?,
            expires_at: now + chrono::Duration::milliseconds(pttl),
        }))
    }
}
