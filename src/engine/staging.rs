//! Staging area - Uncommitted writes of one transaction in one table
//!
//! A staging area is owned by exactly one transaction snapshot until the
//! snapshot hands its updates to the coordinator. Nothing in it is visible
//! to other transactions; `publish` is the only path into the shared table.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::mvcc::{MvccResult, Revision, VersionPayload, VersionedTable};

use super::config::EngineConfig;
use super::errors::ValidationFailure;
use super::transaction_id::TransactionId;

/// Lifecycle of a staging area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingState {
    /// Accepting writes
    Open,
    /// Validated and ready to publish
    Prepared,
}

/// Buffered writes of one transaction against one table.
#[derive(Debug)]
pub struct StagingArea {
    table: Arc<VersionedTable>,
    owner: TransactionId,
    writes: BTreeMap<Vec<u8>, VersionPayload>,
    state: StagingState,
}

impl StagingArea {
    pub(crate) fn new(table: Arc<VersionedTable>, owner: TransactionId) -> Self {
        Self {
            table,
            owner,
            writes: BTreeMap::new(),
            state: StagingState::Open,
        }
    }

    pub fn table(&self) -> &Arc<VersionedTable> {
        &self.table
    }

    pub fn table_name(&self) -> &str {
        self.table.name()
    }

    pub fn owner(&self) -> TransactionId {
        self.owner
    }

    pub fn state(&self) -> StagingState {
        self.state
    }

    pub fn is_prepared(&self) -> bool {
        self.state == StagingState::Prepared
    }

    /// Number of distinct keys written.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// The staged payload for `key`. `Some(Tombstone)` means the
    /// transaction deleted the key itself.
    pub fn get(&self, key: &[u8]) -> Option<&VersionPayload> {
        self.writes.get(key)
    }

    pub(crate) fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.writes.insert(key, VersionPayload::Value(value));
    }

    pub(crate) fn delete(&mut self, key: Vec<u8>) {
        self.writes.insert(key, VersionPayload::Tombstone);
    }

    /// Check the staged writes against the configured limits.
    pub(crate) fn prepare(&mut self, config: &EngineConfig) -> Result<(), ValidationFailure> {
        if self.writes.len() > config.max_writes_per_table {
            return Err(ValidationFailure::TooManyWrites {
                count: self.writes.len(),
                max: config.max_writes_per_table,
            });
        }

        for (key, payload) in &self.writes {
            if key.len() > config.max_key_bytes {
                return Err(ValidationFailure::KeyTooLarge {
                    len: key.len(),
                    max: config.max_key_bytes,
                });
            }
            if payload.len() > config.max_value_bytes {
                return Err(ValidationFailure::ValueTooLarge {
                    len: payload.len(),
                    max: config.max_value_bytes,
                });
            }
        }

        self.state = StagingState::Prepared;
        Ok(())
    }

    /// Install the staged writes in the table at `revision`.
    pub(crate) fn publish(self, revision: Revision) -> MvccResult<usize> {
        self.table.publish(revision, self.writes)
    }

    /// Drop the staged writes, returning how many there were.
    pub(crate) fn discard(self) -> usize {
        self.writes.len()
    }
}
