//! # Engine Errors
//!
//! Three failure classes reach callers of the commit protocol:
//!
//! - `Protocol` - the caller used the protocol incorrectly (fatal)
//! - `Validation` - prepare rejected staged writes; the caller rolls back
//! - `PartialCommit` - publishing failed after a revision was allocated
//! - `Exhausted` - the revision counter reached its limit
//!
//! Error codes follow the `MVS_CATEGORY_NAME` format.

use thiserror::Error;

use crate::mvcc::{MvccError, Revision};

use super::transaction_id::TransactionId;
use super::TransactionState;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Incorrect use of the transaction protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    /// The transaction has no open connection
    #[error("transaction {0} is not open")]
    NotOpen(TransactionId),

    /// Close was requested for a connection that is already closed
    #[error("transaction {0} was already closed")]
    AlreadyClosed(TransactionId),

    /// The transaction is not in a state that allows the operation
    #[error("transaction {tx} cannot {operation} while {state}")]
    InvalidState {
        tx: TransactionId,
        operation: &'static str,
        state: TransactionState,
    },

    /// Staged updates were handed to a transaction that does not own them
    #[error("updates for table '{table}' belong to transaction {owner}, not {tx}")]
    ForeignUpdates {
        table: String,
        owner: TransactionId,
        tx: TransactionId,
    },

    /// Staged updates target a table instance the catalog does not know
    #[error("table '{0}' was not opened through this engine")]
    UnknownTable(String),

    /// Commit was given updates that were never prepared
    #[error("updates for table '{0}' were not prepared")]
    Unprepared(String),

    /// The transaction's updates were already taken for commit or rollback
    #[error("updates of transaction {0} were already handed off")]
    UpdatesTaken(TransactionId),
}

/// Reasons prepare rejects a staged write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    #[error("key of {len} bytes exceeds the limit of {max}")]
    KeyTooLarge { len: usize, max: usize },

    #[error("value of {len} bytes exceeds the limit of {max}")]
    ValueTooLarge { len: usize, max: usize },

    #[error("{count} writes exceed the per-table limit of {max}")]
    TooManyWrites { count: usize, max: usize },
}

/// Engine errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("protocol violation: {0}")]
    Protocol(#[from] ProtocolViolation),

    #[error("validation failed for table '{table}': {reason}")]
    Validation {
        table: String,
        reason: ValidationFailure,
    },

    /// The revision counter has advanced and is not rewound. Tables
    /// published before the failing one keep their versions.
    #[error("commit of revision {revision} failed while publishing table '{table}': {source}")]
    PartialCommit {
        revision: Revision,
        table: String,
        #[source]
        source: MvccError,
    },

    #[error("configuration error: {0}")]
    Config(String),

    /// No revision can be allocated any more. Nothing was published.
    #[error("cannot commit: {0}")]
    Exhausted(#[source] MvccError),
}

impl EngineError {
    pub fn config(message: impl Into<String>) -> Self {
        EngineError::Config(message.into())
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Protocol(_) => "MVS_PROTOCOL_VIOLATION",
            EngineError::Validation { .. } => "MVS_VALIDATION_FAILED",
            EngineError::PartialCommit { .. } => "MVS_PARTIAL_COMMIT",
            EngineError::Config(_) => "MVS_CONFIG_ERROR",
            EngineError::Exhausted(_) => "MVS_REVISIONS_EXHAUSTED",
        }
    }

    /// Fatal errors are programming or consistency errors; retrying the
    /// same call cannot succeed.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::Protocol(_)
                | EngineError::PartialCommit { .. }
                | EngineError::Exhausted(_)
        )
    }
}
