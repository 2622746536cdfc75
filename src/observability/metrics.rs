//! Metrics registry for mvstore
//!
//! - Counters only
//! - Monotonic increase
//! - Reset only on process start
//! - Relaxed atomics; values are exact once the engine is quiescent

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Metrics registry containing all engine counters
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Transaction snapshots created
    transactions_opened: AtomicU64,
    /// Successful commits
    commits: AtomicU64,
    /// Rollbacks
    rollbacks: AtomicU64,
    /// Prepare calls rejected by validation
    prepare_failures: AtomicU64,
    /// Commits that failed while publishing
    commit_failures: AtomicU64,
    /// Protocol violations reported to callers
    protocol_violations: AtomicU64,
    /// Versions installed by commits
    versions_published: AtomicU64,
    /// Versions dropped by purge
    versions_purged: AtomicU64,
    /// Keys whose whole history was dropped by purge
    keys_purged: AtomicU64,
    /// Completed purge passes
    purge_passes: AtomicU64,
    /// Tables created
    tables_created: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    // Transaction metrics

    pub fn increment_transactions_opened(&self) {
        self.transactions_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_commits(&self) {
        self.commits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rollbacks(&self) {
        self.rollbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_prepare_failures(&self) {
        self.prepare_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_commit_failures(&self) {
        self.commit_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_protocol_violations(&self) {
        self.protocol_violations.fetch_add(1, Ordering::Relaxed);
    }

    // Version metrics

    pub fn add_versions_published(&self, count: u64) {
        self.versions_published.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_versions_purged(&self, count: u64) {
        self.versions_purged.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_keys_purged(&self, count: u64) {
        self.keys_purged.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_purge_passes(&self) {
        self.purge_passes.fetch_add(1, Ordering::Relaxed);
    }

    // Table metrics

    pub fn increment_tables_created(&self) {
        self.tables_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            transactions_opened: self.transactions_opened.load(Ordering::Relaxed),
            commits: self.commits.load(Ordering::Relaxed),
            rollbacks: self.rollbacks.load(Ordering::Relaxed),
            prepare_failures: self.prepare_failures.load(Ordering::Relaxed),
            commit_failures: self.commit_failures.load(Ordering::Relaxed),
            protocol_violations: self.protocol_violations.load(Ordering::Relaxed),
            versions_published: self.versions_published.load(Ordering::Relaxed),
            versions_purged: self.versions_purged.load(Ordering::Relaxed),
            keys_purged: self.keys_purged.load(Ordering::Relaxed),
            purge_passes: self.purge_passes.load(Ordering::Relaxed),
            tables_created: self.tables_created.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub transactions_opened: u64,
    pub commits: u64,
    pub rollbacks: u64,
    pub prepare_failures: u64,
    pub commit_failures: u64,
    pub protocol_violations: u64,
    pub versions_published: u64,
    pub versions_purged: u64,
    pub keys_purged: u64,
    pub purge_passes: u64,
    pub tables_created: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_has_zero_values() {
        let registry = MetricsRegistry::new();
        assert_eq!(registry.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_increment_counters() {
        let registry = MetricsRegistry::new();

        registry.increment_transactions_opened();
        registry.increment_transactions_opened();
        registry.increment_commits();
        registry.increment_rollbacks();
        registry.increment_prepare_failures();
        registry.increment_commit_failures();
        registry.increment_protocol_violations();
        registry.increment_purge_passes();
        registry.increment_tables_created();

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.transactions_opened, 2);
        assert_eq!(snapshot.commits, 1);
        assert_eq!(snapshot.rollbacks, 1);
        assert_eq!(snapshot.prepare_failures, 1);
        assert_eq!(snapshot.commit_failures, 1);
        assert_eq!(snapshot.protocol_violations, 1);
        assert_eq!(snapshot.purge_passes, 1);
        assert_eq!(snapshot.tables_created, 1);
    }

    #[test]
    fn test_add_counts() {
        let registry = MetricsRegistry::new();

        registry.add_versions_published(10);
        registry.add_versions_published(5);
        registry.add_versions_purged(7);
        registry.add_keys_purged(2);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.versions_published, 15);
        assert_eq!(snapshot.versions_purged, 7);
        assert_eq!(snapshot.keys_purged, 2);
    }

    #[test]
    fn test_snapshot_serializes_to_json() {
        let registry = MetricsRegistry::new();
        registry.increment_commits();

        let json = serde_json::to_value(registry.snapshot()).unwrap();
        assert_eq!(json["commits"], 1);
        assert_eq!(json["versions_purged"], 0);
    }
}
