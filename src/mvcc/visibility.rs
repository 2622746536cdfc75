//! MVCC Visibility - Snapshot isolation read rule
//!
//! Given a read revision `R` and the version chain of a key, ordered by
//! revision ascending, the visible version is:
//! 1. Consider only versions with `revision ≤ R`
//! 2. From those, select the one with the largest revision
//! 3. If that version is a tombstone, the key is absent
//!
//! Consequences:
//! - Readers observe a stable snapshot
//! - Reads never block commits
//! - No dirty reads, no non-repeatable reads, no phantoms within a snapshot
//! - A commit's writes are all visible at its revision or not at all

use super::{Revision, Version, VersionChain};

/// Result of visibility evaluation for a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisibilityResult<'a> {
    /// A visible value exists
    Visible(&'a Version),
    /// Key is absent (no versions at or below the revision, or a tombstone)
    Invisible,
}

impl<'a> VisibilityResult<'a> {
    /// Returns the visible version if any
    pub fn version(&self) -> Option<&'a Version> {
        match self {
            VisibilityResult::Visible(v) => Some(v),
            VisibilityResult::Invisible => None,
        }
    }

    /// Returns the visible value bytes if any
    pub fn value(&self) -> Option<&'a [u8]> {
        self.version().and_then(|v| v.payload().as_value())
    }

    pub fn is_visible(&self) -> bool {
        matches!(self, VisibilityResult::Visible(_))
    }
}

/// Stateless visibility resolver.
pub struct Visibility;

impl Visibility {
    /// Evaluates visibility of a chain at `revision`.
    pub fn visible_version(chain: &VersionChain, revision: Revision) -> VisibilityResult<'_> {
        match chain.version_at(revision) {
            Some(version) if !version.is_tombstone() => VisibilityResult::Visible(version),
            _ => VisibilityResult::Invisible,
        }
    }
}
