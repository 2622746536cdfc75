//! MVCC Domain Types
//!
//! This module provides:
//! - `Revision` / `RevisionCounter` - Totally ordered commit time
//! - `Version` - Immutable value or tombstone at a revision
//! - `VersionChain` - Version history of one key
//! - `Visibility` - Snapshot isolation read rule
//! - `VersionedTable` - Per-table multiversion store
//! - `TableCatalog` - Lazily created, append-only table registry
//! - `PurgeTask` / `VisibilityFloor` - Reclamation of unreachable versions

mod catalog;
mod errors;
mod purge;
mod revision;
mod table;
mod version;
mod version_chain;
mod visibility;

pub use catalog::TableCatalog;
pub use errors::{MvccError, MvccResult};
pub use purge::{run_to_completion, IncrementalTask, PurgeTask, VisibilityFloor};
pub use revision::{Revision, RevisionCounter};
pub use table::{PurgeStats, VersionedTable};
pub use version::{Version, VersionPayload};
pub use version_chain::{ChainPurge, VersionChain};
pub use visibility::{Visibility, VisibilityResult};
