//! VersionChain - Version history of one key
//!
//! Versions are kept in ascending revision order. Appends must carry a
//! revision greater than the newest version; the owning table guarantees
//! this by publishing revisions in order.

use super::{Revision, Version};

/// Result of a purge on a single chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChainPurge {
    /// Versions removed from the chain.
    pub removed: usize,
}

/// The version history of a single key, oldest first.
#[derive(Clone, Debug, Default)]
pub struct VersionChain {
    versions: Vec<Version>,
}

impl VersionChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// All versions, oldest first. No visibility filtering is performed.
    #[inline]
    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    /// Revision of the oldest retained version.
    pub fn oldest_revision(&self) -> Option<Revision> {
        self.versions.first().map(Version::revision)
    }

    /// Revision of the newest version.
    pub fn newest_revision(&self) -> Option<Revision> {
        self.versions.last().map(Version::revision)
    }

    /// Appends a version.
    ///
    /// A version at the same revision as the newest one replaces it, so a
    /// batch that writes one key twice keeps only the last write.
    pub fn push(&mut self, version: Version) {
        match self.versions.last_mut() {
            Some(last) if last.revision() == version.revision() => *last = version,
            _ => {
                debug_assert!(
                    self.newest_revision()
                        .map_or(true, |newest| newest < version.revision()),
                    "versions must be appended in revision order"
                );
                self.versions.push(version);
            }
        }
    }

    /// Index of the newest version with revision ≤ `revision`.
    fn position_at(&self, revision: Revision) -> Option<usize> {
        let after = self.versions.partition_point(|v| v.revision() <= revision);
        after.checked_sub(1)
    }

    /// The newest version with revision ≤ `revision`, tombstones included.
    pub fn version_at(&self, revision: Revision) -> Option<&Version> {
        self.position_at(revision).map(|idx| &self.versions[idx])
    }

    /// Drops every version that no read at `watermark` or later can reach.
    ///
    /// The newest version ≤ watermark is kept because it answers reads at
    /// revisions between it and the next version. If that version is a
    /// tombstone with nothing newer, the whole chain is unreachable and is
    /// emptied.
    pub fn purge_older_than(&mut self, watermark: Revision) -> ChainPurge {
        let Some(keep_from) = self.position_at(watermark) else {
            return ChainPurge::default();
        };

        let mut removed = keep_from;
        self.versions.drain(..keep_from);

        if self.versions.len() == 1 && self.versions[0].is_tombstone() {
            self.versions.clear();
            removed += 1;
        }

        ChainPurge { removed }
    }
}
