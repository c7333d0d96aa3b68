//! Locking engine for dqueue.
//!
//! A [`DistributedQueue`] lets many users work on one pool of pids at the same
//! time. Each user locks a batch of pids for themselves; a pid locked by one
//! user cannot be locked by another until it is removed or its TTL runs out.
//!
//! # Partial Success
//!
//! Every operation takes a set of pids and returns the subset it acted on.
//! A pid held by someone else is not an error, it is simply missing from the
//! result. Errors are reserved for the store being unreachable or answering
//! with data in an unexpected shape.
//!
//! # Atomicity
//!
//! Each call hands its whole batch to the [`ClaimStore`](crate::store::ClaimStore)
//! in one atomic step. No local copy of the claims is kept between calls.

mod engine;


pub use engine::DistributedQueue;
