//! Observability events for mvstore
//!
//! Events are explicit and typed. Each event carries its own severity so
//! that per-transaction chatter stays at TRACE while failures surface at
//! WARN or ERROR.

use std::fmt;

use super::Severity;

/// Observable events in the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Engine constructed and ready
    EngineStart,
    /// Configuration loaded
    ConfigLoaded,

    // Tables
    /// A table was created on first use
    TableCreated,

    // Connections
    /// A transaction snapshot was pinned
    ConnectionOpened,
    /// A transaction snapshot was released
    ConnectionClosed,

    // Commit protocol
    /// Staged updates validated
    PrepareComplete,
    /// Staged updates rejected by validation
    PrepareFailed,
    /// A new revision became visible
    CommitComplete,
    /// Publishing failed after a revision was allocated
    CommitFailed,
    /// Staged updates discarded
    RollbackComplete,
    /// The commit protocol was used incorrectly
    ProtocolViolation,

    // Reclamation
    /// A purge pass was scheduled for later execution
    PurgeDeferred,
    /// A purge pass finished
    PurgeComplete,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::EngineStart => "ENGINE_START",
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::TableCreated => "TABLE_CREATED",

            Event::ConnectionOpened => "CONNECTION_OPENED",
            Event::ConnectionClosed => "CONNECTION_CLOSED",

            Event::PrepareComplete => "PREPARE_COMPLETE",
            Event::PrepareFailed => "PREPARE_FAILED",
            Event::CommitComplete => "COMMIT_COMPLETE",
            Event::CommitFailed => "COMMIT_FAILED",
            Event::RollbackComplete => "ROLLBACK_COMPLETE",
            Event::ProtocolViolation => "PROTOCOL_VIOLATION",

            Event::PurgeDeferred => "PURGE_DEFERRED",
            Event::PurgeComplete => "PURGE_COMPLETE",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::EngineStart | Event::ConfigLoaded | Event::TableCreated => Severity::Info,
            Event::PrepareFailed => Severity::Warn,
            Event::CommitFailed | Event::ProtocolViolation => Severity::Error,
            _ => Severity::Trace,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
