//! Transaction engine
//!
//! Snapshots, staging areas and the coordinator that serializes commits.

mod config;
mod coordinator;
mod errors;
mod snapshot;
mod staging;
mod transaction_id;

pub use config::EngineConfig;
pub use coordinator::{Coordinator, OpenTransactionInfo};
pub use errors::{EngineError, EngineResult, ProtocolViolation, ValidationFailure};
pub use snapshot::{TransactionSnapshot, TransactionState};
pub use staging::{StagingArea, StagingState};
pub use transaction_id::TransactionId;
