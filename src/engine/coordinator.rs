//! Coordinator - Transaction lifecycle and commit ordering
//!
//! Two tiers of synchronization:
//!
//! - The commit lock guards the revision counter. Prepare, commit, rollback
//!   and close run under it, so revision allocation, publishing and the
//!   advance of the committed revision are one serial step per commit.
//! - Tables and open connections live in sharded concurrent maps. Opening a
//!   connection, reading and staging writes never touch the commit lock.
//!
//! A new snapshot reads the committed revision while holding the shard lock
//! of its own map entry. A close reads the committed revision before it
//! scans the open connections. Together this means a scan either sees the
//! new snapshot or the snapshot pinned a revision no older than the one the
//! scan started from, so the purge watermark never passes a live snapshot.
//!
//! Purge runs after the commit lock is released. Each table serializes it
//! with its own publishes.

use std::collections::{BTreeSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;

use crate::mvcc::{
    run_to_completion, IncrementalTask, PurgeTask, Revision, RevisionCounter, TableCatalog,
    VersionedTable, VisibilityFloor,
};
use crate::observability::{
    log_event, log_event_with_fields, Event, MetricsRegistry, MetricsSnapshot,
};

use super::config::EngineConfig;
use super::errors::{EngineError, EngineResult, ProtocolViolation};
use super::snapshot::{TransactionSnapshot, TransactionState};
use super::staging::StagingArea;
use super::transaction_id::TransactionId;

/// Diagnostic view of one open transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenTransactionInfo {
    pub id: TransactionId,
    pub visible_revision: Revision,
    pub opened_at: DateTime<Utc>,
    pub state: TransactionState,
}

/// The engine: tables, open transactions and the commit protocol.
pub struct Coordinator {
    config: EngineConfig,
    catalog: Arc<TableCatalog>,
    open_connections: DashMap<TransactionId, Arc<TransactionSnapshot>>,
    /// The commit lock. Holding the guard is the only way to allocate a
    /// revision.
    commit_lock: Mutex<RevisionCounter>,
    /// Written only under the commit lock, read without it.
    committed_revision: AtomicU64,
    pending_purges: Mutex<VecDeque<Box<dyn IncrementalTask>>>,
    metrics: Arc<MetricsRegistry>,
}

impl Coordinator {
    /// An engine with the default configuration.
    pub fn new() -> Self {
        Self::build(EngineConfig::default())
    }

    /// An engine with a validated configuration.
    ///
    /// `log_level` is not applied here: the logger is process-wide, so the
    /// embedding program decides which engine's level wins.
    pub fn with_config(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: EngineConfig) -> Self {
        Self::build_from(config, RevisionCounter::new())
    }

    fn build_from(config: EngineConfig, counter: RevisionCounter) -> Self {
        let metrics = Arc::new(MetricsRegistry::new());
        let committed = counter.current();

        log_event_with_fields(
            Event::EngineStart,
            &[("purge_on_close", config.purge_on_close.to_string().as_str())],
        );

        Self {
            catalog: Arc::new(TableCatalog::new(Arc::clone(&metrics))),
            open_connections: DashMap::new(),
            commit_lock: Mutex::new(counter),
            committed_revision: AtomicU64::new(committed.value()),
            pending_purges: Mutex::new(VecDeque::new()),
            metrics,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // Tables

    /// Names of all tables created so far.
    pub fn table_names(&self) -> BTreeSet<String> {
        self.catalog.table_names()
    }

    pub fn open_or_create_table(&self, name: &str) -> Arc<VersionedTable> {
        self.catalog.open_or_create(name)
    }

    // Connections

    /// The snapshot of `tx`, creating it on first use.
    ///
    /// Repeated and concurrent calls for the same handle return the same
    /// instance.
    pub fn open_connection(&self, tx: TransactionId) -> Arc<TransactionSnapshot> {
        if let Some(existing) = self.open_connections.get(&tx) {
            return Arc::clone(existing.value());
        }

        let mut created = false;
        let snapshot = self
            .open_connections
            .entry(tx)
            .or_insert_with(|| {
                created = true;
                Arc::new(TransactionSnapshot::new(
                    tx,
                    self.committed_revision(),
                    Arc::clone(&self.catalog),
                ))
            })
            .clone();

        if created {
            self.metrics.increment_transactions_opened();
            log_event_with_fields(
                Event::ConnectionOpened,
                &[
                    ("tx", tx.to_string().as_str()),
                    ("visible_revision", snapshot.visible_revision().to_string().as_str()),
                ],
            );
        }
        snapshot
    }

    /// The snapshot of `tx` if it is open.
    pub fn connection(&self, tx: &TransactionId) -> Option<Arc<TransactionSnapshot>> {
        self.open_connections
            .get(tx)
            .map(|entry| Arc::clone(entry.value()))
    }

    // Commit protocol

    /// Validate staged updates before commit.
    ///
    /// No revision is allocated. If any area is rejected the transaction
    /// moves to `PrepareFailed` and must be rolled back by the caller.
    pub fn prepare_updates(
        &self,
        updates: &mut [StagingArea],
        tx: &TransactionId,
    ) -> EngineResult<()> {
        let _commit_lock = self.commit_lock.lock();

        let snapshot = self
            .connection(tx)
            .ok_or_else(|| self.violation(ProtocolViolation::NotOpen(*tx)))?;
        snapshot
            .transition("prepare", &[TransactionState::Open], TransactionState::Preparing)
            .map_err(|v| self.violation(v))?;

        for area in updates.iter_mut() {
            if let Err(v) = Self::check_owner(area, tx) {
                snapshot.set_state(TransactionState::PrepareFailed);
                return Err(self.violation(v));
            }

            if let Err(reason) = area.prepare(&self.config) {
                snapshot.set_state(TransactionState::PrepareFailed);
                self.metrics.increment_prepare_failures();
                log_event_with_fields(
                    Event::PrepareFailed,
                    &[
                        ("reason", reason.to_string().as_str()),
                        ("table", area.table_name()),
                        ("tx", tx.to_string().as_str()),
                    ],
                );
                return Err(EngineError::Validation {
                    table: area.table_name().to_string(),
                    reason,
                });
            }
        }

        log_event_with_fields(
            Event::PrepareComplete,
            &[
                ("tables", updates.len().to_string().as_str()),
                ("tx", tx.to_string().as_str()),
            ],
        );
        Ok(())
    }

    /// Publish prepared updates as a new revision and close the transaction.
    ///
    /// The connection is closed on every path, including failures. If
    /// publishing fails the allocated revision is not given back: it still
    /// becomes the committed revision, and the tables published before the
    /// failing one keep their versions at it.
    ///
    /// Updates owned by another transaction are handed back to their owner
    /// and reported as `ForeignUpdates`.
    pub fn commit_updates(
        &self,
        updates: Vec<StagingArea>,
        tx: &TransactionId,
    ) -> EngineResult<Revision> {
        let mut counter = self.commit_lock.lock();

        let snapshot = self
            .connection(tx)
            .ok_or_else(|| self.violation(ProtocolViolation::NotOpen(*tx)))?;

        let result = self
            .claim_updates(updates, tx)
            .and_then(|updates| self.publish_updates(&mut counter, &snapshot, updates, tx));

        // An allocated revision is committed whether or not its publish
        // completed.
        self.committed_revision
            .store(counter.current().value(), Ordering::SeqCst);
        snapshot.set_state(if result.is_ok() {
            TransactionState::Committed
        } else {
            TransactionState::RolledBack
        });

        let closed = self.close_connection_locked(&counter, tx);
        drop(counter);

        let watermark = closed?;
        self.schedule_purge(watermark);
        result
    }

    fn publish_updates(
        &self,
        counter: &mut RevisionCounter,
        snapshot: &TransactionSnapshot,
        updates: Vec<StagingArea>,
        tx: &TransactionId,
    ) -> EngineResult<Revision> {
        snapshot
            .transition("commit", &[TransactionState::Preparing], TransactionState::Preparing)
            .map_err(|v| self.violation(v))?;

        for area in &updates {
            if !self.catalog.is_registered(area.table()) {
                return Err(self.violation(ProtocolViolation::UnknownTable(
                    area.table_name().to_string(),
                )));
            }
            if !area.is_prepared() {
                return Err(self.violation(ProtocolViolation::Unprepared(
                    area.table_name().to_string(),
                )));
            }
        }

        let revision = counter.advance().map_err(|source| {
            self.metrics.increment_commit_failures();
            EngineError::Exhausted(source)
        })?;
        let mut published = 0usize;

        for area in updates.into_iter().filter(|area| !area.is_empty()) {
            let table = area.table_name().to_string();
            match area.publish(revision) {
                Ok(count) => published += count,
                Err(source) => {
                    self.metrics.increment_commit_failures();
                    log_event_with_fields(
                        Event::CommitFailed,
                        &[
                            ("error", source.to_string().as_str()),
                            ("revision", revision.to_string().as_str()),
                            ("table", table.as_str()),
                            ("tx", tx.to_string().as_str()),
                        ],
                    );
                    return Err(EngineError::PartialCommit {
                        revision,
                        table,
                        source,
                    });
                }
            }
        }

        self.metrics.increment_commits();
        self.metrics.add_versions_published(published as u64);
        log_event_with_fields(
            Event::CommitComplete,
            &[
                ("revision", revision.to_string().as_str()),
                ("tx", tx.to_string().as_str()),
                ("versions", published.to_string().as_str()),
            ],
        );
        Ok(revision)
    }

    /// Discard staged updates and close the transaction.
    ///
    /// The connection is closed even if the updates are rejected. Updates
    /// owned by another transaction are handed back to their owner instead
    /// of being discarded.
    pub fn rollback_updates(
        &self,
        updates: Vec<StagingArea>,
        tx: &TransactionId,
    ) -> EngineResult<()> {
        let counter = self.commit_lock.lock();

        let snapshot = self
            .connection(tx)
            .ok_or_else(|| self.violation(ProtocolViolation::NotOpen(*tx)))?;

        let claimed = self.claim_updates(updates, tx).and_then(|updates| {
            snapshot
                .transition(
                    "rollback",
                    &[
                        TransactionState::Open,
                        TransactionState::Preparing,
                        TransactionState::PrepareFailed,
                    ],
                    TransactionState::RolledBack,
                )
                .map_err(|v| self.violation(v))?;
            Ok(updates)
        });
        snapshot.set_state(TransactionState::RolledBack);

        let (checked, discarded) = match claimed {
            Ok(updates) => (Ok(()), updates.into_iter().map(StagingArea::discard).sum()),
            Err(e) => (Err(e), 0usize),
        };
        let closed = self.close_connection_locked(&counter, tx);
        drop(counter);

        let watermark = closed?;
        self.metrics.increment_rollbacks();
        log_event_with_fields(
            Event::RollbackComplete,
            &[
                ("discarded", discarded.to_string().as_str()),
                ("tx", tx.to_string().as_str()),
            ],
        );
        self.schedule_purge(watermark);
        checked
    }

    /// Close a connection without publishing anything.
    ///
    /// Closing an unknown or already closed handle is reported as
    /// `ProtocolViolation::AlreadyClosed`.
    pub fn close_connection(&self, tx: &TransactionId) -> EngineResult<()> {
        let counter = self.commit_lock.lock();
        if let Some(snapshot) = self.connection(tx) {
            if !snapshot.state().is_terminal() {
                snapshot.set_state(TransactionState::RolledBack);
            }
        }
        let closed = self.close_connection_locked(&counter, tx);
        drop(counter);

        self.schedule_purge(closed?);
        Ok(())
    }

    /// Convenience: take the transaction's updates, prepare and commit.
    ///
    /// A validation failure leaves the transaction open in `PrepareFailed`;
    /// call `rollback` afterwards.
    pub fn commit(&self, tx: &TransactionId) -> EngineResult<Revision> {
        let snapshot = self
            .connection(tx)
            .ok_or_else(|| self.violation(ProtocolViolation::NotOpen(*tx)))?;
        let mut updates = snapshot.take_updates()?;
        self.prepare_updates(&mut updates, tx)?;
        self.commit_updates(updates, tx)
    }

    /// Convenience: discard whatever the transaction staged and close it.
    pub fn rollback(&self, tx: &TransactionId) -> EngineResult<()> {
        let snapshot = self
            .connection(tx)
            .ok_or_else(|| self.violation(ProtocolViolation::NotOpen(*tx)))?;
        let updates = snapshot.take_updates().unwrap_or_default();
        self.rollback_updates(updates, tx)
    }

    /// Remove `tx` from the open set and compute the new watermark.
    ///
    /// Takes the counter guard to prove the commit lock is held.
    fn close_connection_locked(
        &self,
        _commit_lock: &RevisionCounter,
        tx: &TransactionId,
    ) -> EngineResult<Revision> {
        if self.open_connections.remove(tx).is_none() {
            return Err(self.violation(ProtocolViolation::AlreadyClosed(*tx)));
        }

        let watermark = self.oldest_visible_revision();
        log_event_with_fields(
            Event::ConnectionClosed,
            &[
                ("tx", tx.to_string().as_str()),
                ("watermark", watermark.to_string().as_str()),
            ],
        );
        Ok(watermark)
    }

    /// Accept `updates` for `tx`, or return every area to its owner's
    /// snapshot if any of them belongs to someone else.
    fn claim_updates(
        &self,
        updates: Vec<StagingArea>,
        tx: &TransactionId,
    ) -> EngineResult<Vec<StagingArea>> {
        let Some(index) = updates.iter().position(|area| area.owner() != *tx) else {
            return Ok(updates);
        };
        let violation = ProtocolViolation::ForeignUpdates {
            table: updates[index].table_name().to_string(),
            owner: updates[index].owner(),
            tx: *tx,
        };

        for area in updates {
            if let Some(owner) = self.connection(&area.owner()) {
                owner.restore_update(area);
            }
        }
        Err(self.violation(violation))
    }

    fn check_owner(area: &StagingArea, tx: &TransactionId) -> Result<(), ProtocolViolation> {
        if area.owner() != *tx {
            return Err(ProtocolViolation::ForeignUpdates {
                table: area.table_name().to_string(),
                owner: area.owner(),
                tx: *tx,
            });
        }
        Ok(())
    }

    fn violation(&self, violation: ProtocolViolation) -> EngineError {
        self.metrics.increment_protocol_violations();
        log_event_with_fields(
            Event::ProtocolViolation,
            &[("reason", violation.to_string().as_str())],
        );
        violation.into()
    }

    // Purge

    /// The oldest revision any open transaction can still read.
    ///
    /// Scans all open connections; cost is linear in their number.
    pub fn oldest_visible_revision(&self) -> Revision {
        let committed = self.committed_revision();
        VisibilityFloor::compute(
            committed,
            self.open_connections
                .iter()
                .map(|entry| entry.value().visible_revision()),
        )
    }

    fn schedule_purge(&self, watermark: Revision) {
        let task = PurgeTask::new(self.catalog.tables(), watermark, Arc::clone(&self.metrics));

        if self.config.purge_on_close {
            run_to_completion(Box::new(task));
            log_event_with_fields(
                Event::PurgeComplete,
                &[("watermark", watermark.to_string().as_str())],
            );
        } else {
            // Watermarks never decrease, so the newest task covers all
            // queued ones.
            let mut pending = self.pending_purges.lock();
            pending.clear();
            pending.push_back(Box::new(task));
            drop(pending);
            log_event_with_fields(
                Event::PurgeDeferred,
                &[("watermark", watermark.to_string().as_str())],
            );
        }
    }

    /// Run one step of queued purge work. Returns false if nothing was
    /// queued.
    pub fn run_pending_purge_step(&self) -> bool {
        let Some(task) = self.pending_purges.lock().pop_front() else {
            return false;
        };

        let follow_ups = task.step();
        let mut pending = self.pending_purges.lock();
        // A task scheduled meanwhile supersedes this one.
        if pending.is_empty() {
            for follow_up in follow_ups.into_iter().rev() {
                pending.push_front(follow_up);
            }
        }
        true
    }

    /// Run all queued purge work. Returns the number of steps taken.
    pub fn run_pending_purges(&self) -> usize {
        let mut steps = 0;
        while self.run_pending_purge_step() {
            steps += 1;
        }
        if steps > 0 {
            log_event(Event::PurgeComplete);
        }
        steps
    }

    pub fn pending_purge_count(&self) -> usize {
        self.pending_purges.lock().len()
    }

    // Diagnostics. Not for correctness decisions.

    pub fn open_connection_count(&self) -> usize {
        self.open_connections.len()
    }

    pub fn committed_revision(&self) -> Revision {
        Revision::new(self.committed_revision.load(Ordering::SeqCst))
    }

    /// Oldest revision retained by any table, or the committed revision if
    /// no table holds any version.
    pub fn oldest_stored_revision(&self) -> Revision {
        let committed = self.committed_revision();
        self.catalog
            .oldest_revision()
            .map_or(committed, |oldest| oldest.min(committed))
    }

    /// Open transactions, oldest pinned revision first.
    pub fn open_transactions(&self) -> Vec<OpenTransactionInfo> {
        let mut open: Vec<_> = self
            .open_connections
            .iter()
            .map(|entry| {
                let snapshot = entry.value();
                OpenTransactionInfo {
                    id: snapshot.id(),
                    visible_revision: snapshot.visible_revision(),
                    opened_at: snapshot.opened_at(),
                    state: snapshot.state(),
                }
            })
            .collect();
        open.sort_by_key(|info| (info.visible_revision, info.opened_at));
        open
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::errors::ValidationFailure;
    use crate::observability::Logger;

    fn committed(engine: &Coordinator, table: &str, key: &str, value: &str) -> Revision {
        let tx = TransactionId::new();
        engine.open_connection(tx).write(table, key, value).unwrap();
        engine.commit(&tx).unwrap()
    }

    #[test]
    fn test_open_connection_is_idempotent() {
        let engine = Coordinator::new();
        let tx = TransactionId::new();

        let first = engine.open_connection(tx);
        let second = engine.open_connection(tx);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(engine.open_connection_count(), 1);
        assert_eq!(engine.metrics().transactions_opened, 1);
    }

    #[test]
    fn test_commit_advances_revision_by_one() {
        let engine = Coordinator::new();

        assert_eq!(committed(&engine, "t", "a", "1"), Revision::new(1));
        assert_eq!(committed(&engine, "t", "b", "2"), Revision::new(2));
        assert_eq!(engine.committed_revision(), Revision::new(2));
        assert_eq!(engine.open_connection_count(), 0);
    }

    #[test]
    fn test_commit_without_prepare_is_rejected_and_closes() {
        let engine = Coordinator::new();
        let tx = TransactionId::new();
        let snapshot = engine.open_connection(tx);
        snapshot.write("t", "k", "v").unwrap();
        let updates = snapshot.take_updates().unwrap();

        let result = engine.commit_updates(updates, &tx);

        assert!(matches!(
            result,
            Err(EngineError::Protocol(ProtocolViolation::InvalidState {
                state: TransactionState::Open,
                ..
            }))
        ));
        assert_eq!(engine.open_connection_count(), 0);
        assert_eq!(engine.committed_revision(), Revision::ZERO);
        assert_eq!(snapshot.state(), TransactionState::RolledBack);
    }

    #[test]
    fn test_unregistered_table_is_rejected() {
        let engine = Coordinator::new();
        let tx = TransactionId::new();
        engine.open_connection(tx);

        let impostor = Arc::new(VersionedTable::new("t"));
        let mut area = StagingArea::new(impostor, tx);
        area.put(b"k".to_vec(), b"v".to_vec());
        let mut updates = vec![area];
        engine.prepare_updates(&mut updates, &tx).unwrap();

        let result = engine.commit_updates(updates, &tx);

        assert!(matches!(
            result,
            Err(EngineError::Protocol(ProtocolViolation::UnknownTable(name))) if name == "t"
        ));
        assert_eq!(engine.open_connection_count(), 0);
    }

    #[test]
    fn test_unprepared_area_is_rejected() {
        let engine = Coordinator::new();
        let tx = TransactionId::new();
        let snapshot = engine.open_connection(tx);
        snapshot.write("t", "k", "v").unwrap();
        let mut updates = snapshot.take_updates().unwrap();
        engine.prepare_updates(&mut [], &tx).unwrap();

        // A stray area the prepare call never saw.
        let mut stray = StagingArea::new(engine.open_or_create_table("t"), tx);
        stray.put(b"x".to_vec(), b"y".to_vec());
        updates.push(stray);

        let result = engine.commit_updates(updates, &tx);

        assert!(matches!(
            result,
            Err(EngineError::Protocol(ProtocolViolation::Unprepared(_)))
        ));
    }

    #[test]
    fn test_validation_failure_requires_rollback() {
        let engine = Coordinator::with_config(EngineConfig {
            max_value_bytes: 2,
            ..EngineConfig::default()
        })
        .unwrap();
        let tx = TransactionId::new();
        engine.open_connection(tx).write("t", "k", "too long").unwrap();

        let result = engine.commit(&tx);

        assert!(matches!(
            result,
            Err(EngineError::Validation {
                reason: ValidationFailure::ValueTooLarge { len: 8, max: 2 },
                ..
            })
        ));
        assert_eq!(engine.open_connection_count(), 1);
        assert_eq!(
            engine.open_transactions()[0].state,
            TransactionState::PrepareFailed
        );

        engine.rollback(&tx).unwrap();
        assert_eq!(engine.open_connection_count(), 0);
        assert_eq!(engine.metrics().prepare_failures, 1);
    }

    #[test]
    fn test_double_close_is_reported() {
        let engine = Coordinator::new();
        let tx = TransactionId::new();
        engine.open_connection(tx);

        engine.close_connection(&tx).unwrap();
        let second = engine.close_connection(&tx);

        assert!(matches!(
            second,
            Err(EngineError::Protocol(ProtocolViolation::AlreadyClosed(id))) if id == tx
        ));
        assert_eq!(engine.metrics().protocol_violations, 1);
    }

    #[test]
    fn test_deferred_purge_runs_on_demand() {
        let engine = Coordinator::with_config(EngineConfig {
            purge_on_close: false,
            ..EngineConfig::default()
        })
        .unwrap();
        for value in ["1", "2", "3"] {
            committed(&engine, "t", "k", value);
        }
        assert_eq!(engine.oldest_stored_revision(), Revision::new(1));
        assert_eq!(engine.pending_purge_count(), 1);

        let steps = engine.run_pending_purges();

        assert_eq!(steps, 2);
        assert_eq!(engine.pending_purge_count(), 0);
        assert_eq!(engine.oldest_stored_revision(), Revision::new(3));
    }

    #[test]
    fn test_deferred_purge_keeps_only_newest_task() {
        let engine = Coordinator::with_config(EngineConfig {
            purge_on_close: false,
            ..EngineConfig::default()
        })
        .unwrap();
        for table in ["a", "b", "c"] {
            committed(&engine, table, "k", "v");
        }

        for _ in 0..1000 {
            let tx = TransactionId::new();
            engine.open_connection(tx);
            engine.close_connection(&tx).unwrap();
        }

        assert_eq!(engine.pending_purge_count(), 1);
        // One step per table, then one to finish.
        assert_eq!(engine.run_pending_purges(), 4);
        assert_eq!(engine.metrics().purge_passes, 1);
    }

    #[test]
    fn test_schedule_during_step_supersedes_follow_ups() {
        let engine = Coordinator::with_config(EngineConfig {
            purge_on_close: false,
            ..EngineConfig::default()
        })
        .unwrap();
        committed(&engine, "a", "k", "1");
        committed(&engine, "b", "k", "1");

        assert!(engine.run_pending_purge_step());
        committed(&engine, "a", "k", "2");

        assert_eq!(engine.pending_purge_count(), 1);
        assert_eq!(engine.run_pending_purges(), 3);
        assert_eq!(engine.open_or_create_table("a").version_count(), 1);
    }

    #[test]
    fn test_with_config_leaves_logger_threshold_alone() {
        let before = Logger::min_severity();

        Coordinator::with_config(EngineConfig {
            log_level: "fatal".to_string(),
            ..EngineConfig::default()
        })
        .unwrap();

        assert_eq!(Logger::min_severity(), before);
    }

    #[test]
    fn test_exhausted_revisions_reject_commit_and_close() {
        let engine = Coordinator::build_from(
            EngineConfig::default(),
            RevisionCounter::starting_at(Revision::new(u64::MAX)),
        );
        let tx = TransactionId::new();
        engine.open_connection(tx).write("t", "k", "v").unwrap();

        let result = engine.commit(&tx);

        assert!(matches!(result, Err(EngineError::Exhausted(_))));
        assert_eq!(engine.open_connection_count(), 0);
        assert_eq!(engine.committed_revision(), Revision::new(u64::MAX));
        assert_eq!(engine.open_or_create_table("t").version_count(), 0);
    }

    #[test]
    fn test_open_transactions_sorted_by_pinned_revision() {
        let engine = Coordinator::new();
        let old = TransactionId::new();
        engine.open_connection(old);
        committed(&engine, "t", "k", "v");
        let new = TransactionId::new();
        engine.open_connection(new);

        let open = engine.open_transactions();

        assert_eq!(open.len(), 2);
        assert_eq!(open[0].id, old);
        assert_eq!(open[0].visible_revision, Revision::ZERO);
        assert_eq!(open[1].id, new);
        assert_eq!(open[1].visible_revision, Revision::new(1));
        assert_eq!(engine.oldest_visible_revision(), Revision::ZERO);
    }
}
