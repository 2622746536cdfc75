//! TransactionSnapshot - Read/write view of one transaction
//!
//! A snapshot is pinned to the committed revision at the moment it was
//! opened and never moves. Reads check the transaction's own staged writes
//! first, then fall through to the shared tables at the pinned revision.
//! Writes only ever touch the staging areas.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use crate::mvcc::{Revision, TableCatalog};

use super::errors::{EngineResult, ProtocolViolation};
use super::staging::StagingArea;
use super::transaction_id::TransactionId;

/// Transaction lifecycle.
///
/// `Open → Preparing → {Committed | RolledBack}`. `PrepareFailed` is a
/// preparing transaction whose updates were rejected; it can only be
/// rolled back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    Open,
    Preparing,
    PrepareFailed,
    Committed,
    RolledBack,
}

impl TransactionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionState::Committed | TransactionState::RolledBack)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionState::Open => "open",
            TransactionState::Preparing => "preparing",
            TransactionState::PrepareFailed => "prepare_failed",
            TransactionState::Committed => "committed",
            TransactionState::RolledBack => "rolled_back",
        }
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The fixed-revision view and write buffer of one transaction.
pub struct TransactionSnapshot {
    id: TransactionId,
    visible_revision: Revision,
    opened_at: DateTime<Utc>,
    catalog: Arc<TableCatalog>,
    /// None once the updates were handed to the coordinator.
    staged: Mutex<Option<BTreeMap<String, StagingArea>>>,
    state: Mutex<TransactionState>,
}

impl TransactionSnapshot {
    pub(crate) fn new(
        id: TransactionId,
        visible_revision: Revision,
        catalog: Arc<TableCatalog>,
    ) -> Self {
        Self {
            id,
            visible_revision,
            opened_at: Utc::now(),
            catalog,
            staged: Mutex::new(Some(BTreeMap::new())),
            state: Mutex::new(TransactionState::Open),
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// The committed revision this snapshot reads at.
    pub fn visible_revision(&self) -> Revision {
        self.visible_revision
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    pub fn state(&self) -> TransactionState {
        *self.state.lock()
    }

    /// Read `key` from `table`, seeing this transaction's own writes.
    pub fn read(&self, table: &str, key: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        self.with_staging_area(table, "read", |area| {
            if let Some(payload) = area.get(key) {
                return payload.as_value().map(<[u8]>::to_vec);
            }
            area.table().read_at(key, self.visible_revision)
        })
    }

    /// Stage `value` for `key` in `table`.
    pub fn write(
        &self,
        table: &str,
        key: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
    ) -> EngineResult<()> {
        let (key, value) = (key.into(), value.into());
        self.with_staging_area(table, "write", move |area| area.put(key, value))
    }

    /// Stage a delete of `key` in `table`.
    pub fn delete(&self, table: &str, key: impl Into<Vec<u8>>) -> EngineResult<()> {
        let key = key.into();
        self.with_staging_area(table, "delete", move |area| area.delete(key))
    }

    /// Names of the tables this transaction has touched.
    pub fn touched_tables(&self) -> Vec<String> {
        self.staged
            .lock()
            .as_ref()
            .map(|areas| areas.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Hand the staging areas over for prepare/commit/rollback.
    ///
    /// Can be called once; afterwards the snapshot accepts no more reads or
    /// writes.
    pub fn take_updates(&self) -> EngineResult<Vec<StagingArea>> {
        let areas = self
            .staged
            .lock()
            .take()
            .ok_or(ProtocolViolation::UpdatesTaken(self.id))?;
        Ok(areas.into_values().collect())
    }

    /// Put back a staging area that was handed off by `take_updates`.
    ///
    /// An area already staged for the same table is kept.
    pub(crate) fn restore_update(&self, area: StagingArea) {
        self.staged
            .lock()
            .get_or_insert_with(BTreeMap::new)
            .entry(area.table_name().to_string())
            .or_insert(area);
    }

    /// Move from one of `allowed` states to `next`.
    pub(crate) fn transition(
        &self,
        operation: &'static str,
        allowed: &[TransactionState],
        next: TransactionState,
    ) -> Result<(), ProtocolViolation> {
        let mut state = self.state.lock();
        if !allowed.contains(&*state) {
            return Err(ProtocolViolation::InvalidState {
                tx: self.id,
                operation,
                state: *state,
            });
        }
        *state = next;
        Ok(())
    }

    pub(crate) fn set_state(&self, next: TransactionState) {
        *self.state.lock() = next;
    }

    fn with_staging_area<R>(
        &self,
        table: &str,
        operation: &'static str,
        f: impl FnOnce(&mut StagingArea) -> R,
    ) -> EngineResult<R> {
        let state = self.state();
        if state != TransactionState::Open {
            return Err(ProtocolViolation::InvalidState {
                tx: self.id,
                operation,
                state,
            }
            .into());
        }

        let mut staged = self.staged.lock();
        let areas = staged
            .as_mut()
            .ok_or(ProtocolViolation::UpdatesTaken(self.id))?;
        let area = areas.entry(table.to_string()).or_insert_with(|| {
            StagingArea::new(self.catalog.open_or_create(table), self.id)
        });
        Ok(f(area))
    }
}

impl fmt::Debug for TransactionSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionSnapshot")
            .field("id", &self.id)
            .field("visible_revision", &self.visible_revision)
            .field("opened_at", &self.opened_at)
            .field("state", &self.state())
            .finish()
    }
}
