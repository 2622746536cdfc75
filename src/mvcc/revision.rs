//! Revision - Totally ordered unit of time
//!
//! - Every commit is identified by exactly one revision
//! - Revisions are strictly increasing
//! - Revision 0 is the empty database before any commit
//!
//! `RevisionCounter` hands out new revisions. It is a plain value type with
//! no interior synchronization: the coordinator keeps it inside the commit
//! lock, so allocating a revision and publishing its writes are linearized
//! by construction.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::{MvccError, MvccResult};

/// A totally ordered, opaque revision number.
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Revision(u64);

impl Revision {
    /// The revision of an empty database.
    pub const ZERO: Revision = Revision(0);

    /// Creates a revision with the given value.
    #[inline]
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying value.
    ///
    /// Exists for logging and diagnostics. Callers should compare revisions
    /// through `Ord`, not through their numeric representation.
    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Returns the revision immediately after this one, or `None` at
    /// `u64::MAX`.
    #[inline]
    pub fn next(&self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Allocator of new revisions.
///
/// `current` never allocates; `advance` returns a revision strictly greater
/// than every revision it returned before. A failed commit does not give its
/// revision back.
#[derive(Debug)]
pub struct RevisionCounter {
    current: Revision,
}

impl RevisionCounter {
    /// Create a counter for a fresh database.
    pub fn new() -> Self {
        Self {
            current: Revision::ZERO,
        }
    }

    /// Create a counter that continues after `revision`.
    pub fn starting_at(revision: Revision) -> Self {
        Self { current: revision }
    }

    /// The latest allocated revision.
    #[inline]
    pub fn current(&self) -> Revision {
        self.current
    }

    /// Allocate and return the next revision.
    ///
    /// Fails without changing the counter once `u64::MAX` was handed out.
    pub fn advance(&mut self) -> MvccResult<Revision> {
        let next = self
            .current
            .next()
            .ok_or(MvccError::RevisionsExhausted { last: self.current })?;
        self.current = next;
        Ok(next)
    }
}

impl Default for RevisionCounter {
    fn default() -> Self {
        Self::new()
    }
}
