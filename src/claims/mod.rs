//! Lock record model for dqueue.
//!
//! A claim links one pid to one user until an expiry instant. At any instant
//! there is at most one live claim per pid.
//!
//! # Store Layout
//!
//! Claims live in the shared store under a namespace (default `project`):
//! - `{ns}:{ns}:{pid}`: claim key holding the owner's user id, with a
//!   millisecond expiry equal to the TTL
//! - `{ns}:user:{user_id}`: per-user index (set of pids)
//! - `{ns}:locked`: global index (set of pids)
//!
//! Index members are hints. A pid is live-owned by a user only while its claim
//! key exists and holds that user; stale members are skipped on read and
//! purged from the index.

mod keys;
mod types;

pub use keys::KeySpace;
pub use types::{Claim, Pid, UserId, parse_id};
