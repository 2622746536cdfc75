//! Observability subsystem for mvstore
//!
//! This module provides:
//! - Structured logging (JSON lines on stderr)
//! - Exact counters
//! - Typed lifecycle events
//!
//! Nothing here feeds back into engine decisions: counters and log lines
//! are written, never read, by the commit path.
//!
//! # Usage
//!
//! ```ignore
//! use mvstore::observability::{log_event_with_fields, Event, Logger, MetricsRegistry};
//!
//! Logger::info("ENGINE_READY", &[("tables", "3")]);
//! log_event_with_fields(Event::CommitComplete, &[("revision", "42")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_commits();
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Log a lifecycle event at its own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_event_can_be_logged() {
        log_event(Event::PurgeComplete);
        log_event_with_fields(Event::TableCreated, &[("table", "users")]);
        log_event_with_fields(Event::CommitFailed, &[("revision", "7"), ("tx", "t")]);
    }
}
