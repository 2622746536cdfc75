//! MVCC Purge - Reclaiming superseded versions
//!
//! A version may be dropped only if no open snapshot can read it. The
//! boundary is the visibility floor:
//!
//! ```text
//! floor = min(committed_revision, min(pinned revision of every open snapshot))
//! ```
//!
//! Every table keeps, per key, the newest version at or below the floor and
//! everything above it. Computing the floor scans all open snapshots, so it
//! costs O(open transactions) per close. If many transactions stay open at
//! once, an ordered multiset of pinned revisions would make it O(log n).
//!
//! Reclamation runs as an [`IncrementalTask`]: each step purges one table and
//! hands back the rest, so a driver can interleave purge work with other
//! tasks or run it to completion in one go.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::observability::{Logger, MetricsRegistry};

use super::{PurgeStats, Revision, VersionedTable};

/// Computes the oldest revision still visible to some reader.
pub struct VisibilityFloor;

impl VisibilityFloor {
    /// The purge watermark for the given committed revision and the pinned
    /// revisions of all open snapshots.
    pub fn compute<I>(committed: Revision, pinned: I) -> Revision
    where
        I: IntoIterator<Item = Revision>,
    {
        pinned.into_iter().fold(committed, Revision::min)
    }
}

/// A unit of work that may spawn follow-up work.
pub trait IncrementalTask: Send {
    /// Perform one bounded step, returning the tasks that continue it.
    fn step(self: Box<Self>) -> Vec<Box<dyn IncrementalTask>>;
}

/// Drive `task` and everything it spawns until no work remains.
pub fn run_to_completion(task: Box<dyn IncrementalTask>) {
    let mut queue: VecDeque<Box<dyn IncrementalTask>> = VecDeque::new();
    queue.push_back(task);
    while let Some(next) = queue.pop_front() {
        queue.extend(next.step());
    }
}

/// Purges a list of tables, one table per step.
pub struct PurgeTask {
    tables: Vec<Arc<VersionedTable>>,
    watermark: Revision,
    metrics: Arc<MetricsRegistry>,
}

impl PurgeTask {
    pub fn new(
        tables: Vec<Arc<VersionedTable>>,
        watermark: Revision,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            tables,
            watermark,
            metrics,
        }
    }

    pub fn watermark(&self) -> Revision {
        self.watermark
    }

    /// Tables not yet purged by this task.
    pub fn remaining(&self) -> usize {
        self.tables.len()
    }
}

impl IncrementalTask for PurgeTask {
    fn step(mut self: Box<Self>) -> Vec<Box<dyn IncrementalTask>> {
        let Some(table) = self.tables.pop() else {
            self.metrics.increment_purge_passes();
            return Vec::new();
        };

        let stats: PurgeStats = table.purge_older_than(self.watermark);
        self.metrics.add_versions_purged(stats.versions_removed as u64);
        self.metrics.add_keys_purged(stats.keys_removed as u64);

        if stats.versions_removed > 0 {
            Logger::trace(
                "TABLE_PURGED",
                &[
                    ("keys_removed", stats.keys_removed.to_string().as_str()),
                    ("table", table.name()),
                    ("versions_removed", stats.versions_removed.to_string().as_str()),
                    ("watermark", self.watermark.to_string().as_str()),
                ],
            );
        }

        vec![self as Box<dyn IncrementalTask>]
    }
}
