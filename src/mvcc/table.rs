//! VersionedTable - Per-table multiversion store
//!
//! Reads go straight to the key's version chain and never take the table's
//! write-ordering lock. `publish` and `purge_older_than` both take that lock,
//! so a purge never drops a version while a batch is being installed next to
//! it, and batches land in strictly increasing revision order.
//!
//! A batch published at revision `R` becomes visible to readers only once
//! they read at `R` or later. The coordinator never hands out a read
//! revision before the whole batch is installed, which is what makes a
//! commit atomic across keys.

use dashmap::DashMap;
use parking_lot::Mutex;

use super::errors::{MvccError, MvccResult};
use super::{Revision, Version, VersionChain, VersionPayload, Visibility};

/// Outcome of one purge pass over a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeStats {
    /// Versions dropped across all keys.
    pub versions_removed: usize,
    /// Keys whose whole history became unreachable and was dropped.
    pub keys_removed: usize,
}

impl PurgeStats {
    pub fn merge(&mut self, other: PurgeStats) {
        self.versions_removed += other.versions_removed;
        self.keys_removed += other.keys_removed;
    }
}

/// A named table holding the version history of every key.
#[derive(Debug)]
pub struct VersionedTable {
    name: String,
    chains: DashMap<Vec<u8>, VersionChain>,
    /// Write ordering: the revision of the last published batch.
    last_published: Mutex<Revision>,
}

impl VersionedTable {
    /// Create an empty table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chains: DashMap::new(),
            last_published: Mutex::new(Revision::ZERO),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of keys with retained history.
    pub fn key_count(&self) -> usize {
        self.chains.len()
    }

    /// Total number of retained versions.
    pub fn version_count(&self) -> usize {
        self.chains.iter().map(|chain| chain.len()).sum()
    }

    /// Read `key` as of `revision`.
    ///
    /// Correct for any revision at or above the last purge watermark.
    pub fn read_at(&self, key: &[u8], revision: Revision) -> Option<Vec<u8>> {
        let chain = self.chains.get(key)?;
        let value = Visibility::visible_version(&chain, revision)
            .value()
            .map(<[u8]>::to_vec);
        value
    }

    /// Install a batch of writes as the versions for `revision`.
    ///
    /// Returns the number of versions installed.
    pub fn publish<I>(&self, revision: Revision, writes: I) -> MvccResult<usize>
    where
        I: IntoIterator<Item = (Vec<u8>, VersionPayload)>,
    {
        let mut last = self.last_published.lock();
        if revision <= *last {
            return Err(MvccError::NonMonotonicPublish {
                table: self.name.clone(),
                attempted: revision,
                last: *last,
            });
        }

        let mut installed = 0;
        for (key, payload) in writes {
            self.chains
                .entry(key)
                .or_default()
                .push(Version::new(revision, payload));
            installed += 1;
        }

        *last = revision;
        Ok(installed)
    }

    /// Drop every version no reader at `watermark` or later can observe.
    pub fn purge_older_than(&self, watermark: Revision) -> PurgeStats {
        let _ordering = self.last_published.lock();
        let mut stats = PurgeStats::default();

        self.chains.retain(|_, chain| {
            let purge = chain.purge_older_than(watermark);
            stats.versions_removed += purge.removed;
            if chain.is_empty() {
                stats.keys_removed += 1;
                false
            } else {
                true
            }
        });

        stats
    }

    /// Revision of the oldest version still retained, if any.
    pub fn oldest_revision(&self) -> Option<Revision> {
        self.chains
            .iter()
            .filter_map(|chain| chain.oldest_revision())
            .min()
    }

    /// Revision of the last published batch.
    pub fn last_published(&self) -> Revision {
        *self.last_published.lock()
    }
}
