//! mvstore - An in-memory multi-version key/value store
//!
//! Transactions read a consistent snapshot pinned at the revision that was
//! committed when they opened, stage their writes privately, and publish
//! them atomically as a new revision. Versions no open transaction can see
//! are purged when transactions close.
//!
//! - [`mvcc`]: revisions, version chains and versioned tables
//! - [`engine`]: transactions and the commit protocol
//! - [`observability`]: logging and counters
//! - [`cli`]: the `mvstore` command-line driver

pub mod cli;
pub mod engine;
pub mod mvcc;
pub mod observability;
