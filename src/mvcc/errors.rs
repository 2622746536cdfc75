//! # MVCC Errors
//!
//! Errors raised by versioned tables and the revision counter.

use thiserror::Error;

use super::Revision;

/// Result type for table operations
pub type MvccResult<T> = Result<T, MvccError>;

/// Table-level failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MvccError {
    /// A batch was published at a revision not greater than the previous one
    #[error("table '{table}': publish at revision {attempted} after revision {last}")]
    NonMonotonicPublish {
        table: String,
        attempted: Revision,
        last: Revision,
    },

    /// The revision counter cannot move past `u64::MAX`
    #[error("no revision left after {last}")]
    RevisionsExhausted { last: Revision },
}
