//! dqueue: a distributed queue of exclusive, expiring pid locks.
//!
//! Many users work on one pool of integer-identified items ("pids") at the
//! same time. Each user locks a batch of pids for themselves; nobody else can
//! lock those pids until they are removed or their TTL runs out. All state
//! lives in a shared store (Redis), so any number of processes can coordinate
//! through it without talking to each other.
//!
//! ```no_run
//! use dqueue::config::Config;
//! use dqueue::queue::DistributedQueue;
//!
//! let queue = DistributedQueue::connect(&Config::default())?;
//! let locked = queue.lock_default(1, [1, 2, 3, 4, 5])?;
//! assert_eq!(queue.retrieve_user(1)?, locked);
//! queue.remove_all(1)?;
//! # Ok::<(), dqueue::error::QueueError>(())
//! ```

pub mod claims;
pub mod config;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod expiry;
pub mod queue;
pub mod store;

pub use claims::{Claim, Pid, UserId};
pub use error::{QueueError, Result};
pub use queue::DistributedQueue;
