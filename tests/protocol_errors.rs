//! Commit protocol error tests
//!
//! Every path through commit and rollback closes the connection exactly
//! once, and misuse is reported as an error rather than ignored.

use mvstore::engine::{
    Coordinator, EngineConfig, EngineError, ProtocolViolation, TransactionId, TransactionState,
    ValidationFailure,
};
use mvstore::mvcc::{Revision, VersionPayload};

fn open_with_write(engine: &Coordinator, table: &str, key: &str, value: &str) -> TransactionId {
    let tx = TransactionId::new();
    engine
        .open_connection(tx)
        .write(table, key, value)
        .unwrap();
    tx
}

// =============================================================================
// CLOSE
// =============================================================================

/// Test: Closing twice is a protocol violation, not a silent no-op.
#[test]
fn test_double_close() {
    let engine = Coordinator::new();
    let tx = TransactionId::new();
    engine.open_connection(tx);

    engine.close_connection(&tx).unwrap();
    let err = engine.close_connection(&tx).unwrap_err();

    assert!(matches!(
        err,
        EngineError::Protocol(ProtocolViolation::AlreadyClosed(id)) if id == tx
    ));
    assert!(err.is_fatal());
    assert_eq!(err.code(), "MVS_PROTOCOL_VIOLATION");
}

/// Test: Closing a handle that was never opened is reported the same way.
#[test]
fn test_close_unknown_handle() {
    let engine = Coordinator::new();
    let err = engine.close_connection(&TransactionId::new()).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Protocol(ProtocolViolation::AlreadyClosed(_))
    ));
}

/// Test: Commit after the connection closed is rejected.
#[test]
fn test_commit_after_close() {
    let engine = Coordinator::new();
    let tx = open_with_write(&engine, "T", "k", "v");
    let snapshot = engine.connection(&tx).unwrap();
    let mut updates = snapshot.take_updates().unwrap();
    engine.prepare_updates(&mut updates, &tx).unwrap();
    engine.close_connection(&tx).unwrap();

    let err = engine.commit_updates(updates, &tx).unwrap_err();

    assert!(matches!(
        err,
        EngineError::Protocol(ProtocolViolation::NotOpen(_))
    ));
    assert_eq!(engine.committed_revision(), Revision::ZERO);
}

// =============================================================================
// STATE MACHINE
// =============================================================================

/// Test: Preparing twice is rejected.
#[test]
fn test_prepare_twice() {
    let engine = Coordinator::new();
    let tx = open_with_write(&engine, "T", "k", "v");
    let mut updates = engine.connection(&tx).unwrap().take_updates().unwrap();

    engine.prepare_updates(&mut updates, &tx).unwrap();
    let err = engine.prepare_updates(&mut updates, &tx).unwrap_err();

    assert!(matches!(
        err,
        EngineError::Protocol(ProtocolViolation::InvalidState {
            state: TransactionState::Preparing,
            ..
        })
    ));
    engine.rollback_updates(updates, &tx).unwrap();
    assert_eq!(engine.open_connection_count(), 0);
}

/// Test: Commit without prepare closes the transaction anyway.
#[test]
fn test_commit_without_prepare_closes() {
    let engine = Coordinator::new();
    let tx = open_with_write(&engine, "T", "k", "v");
    let updates = engine.connection(&tx).unwrap().take_updates().unwrap();

    assert!(engine.commit_updates(updates, &tx).is_err());

    assert_eq!(engine.open_connection_count(), 0);
    assert_eq!(engine.committed_revision(), Revision::ZERO);
}

/// Test: Updates staged by one transaction cannot be committed by another.
#[test]
fn test_foreign_updates_rejected() {
    let engine = Coordinator::new();
    let owner = open_with_write(&engine, "T", "k", "v");
    let thief = TransactionId::new();
    engine.open_connection(thief);

    let mut stolen = engine.connection(&owner).unwrap().take_updates().unwrap();
    let err = engine.prepare_updates(&mut stolen, &thief).unwrap_err();

    assert!(matches!(
        err,
        EngineError::Protocol(ProtocolViolation::ForeignUpdates { owner: o, tx: t, .. })
            if o == owner && t == thief
    ));
    assert_eq!(engine.metrics().protocol_violations, 1);

    engine.rollback(&thief).unwrap();
    engine.rollback_updates(stolen, &owner).unwrap();
    assert_eq!(engine.open_connection_count(), 0);
}

/// Test: Committing someone else's updates closes the caller and hands the
/// updates back to their owner, who can still commit them.
#[test]
fn test_foreign_commit_returns_updates_to_owner() {
    let engine = Coordinator::new();
    let owner = open_with_write(&engine, "T", "k", "owned");
    let thief = TransactionId::new();
    engine.open_connection(thief);

    let stolen = engine.connection(&owner).unwrap().take_updates().unwrap();
    let err = engine.commit_updates(stolen, &thief).unwrap_err();

    assert!(matches!(
        err,
        EngineError::Protocol(ProtocolViolation::ForeignUpdates { owner: o, .. }) if o == owner
    ));
    assert!(engine.connection(&thief).is_none());
    assert_eq!(engine.committed_revision(), Revision::ZERO);

    assert_eq!(engine.commit(&owner).unwrap(), Revision::new(1));
    let reader = engine.open_connection(TransactionId::new());
    assert_eq!(reader.read("T", b"k").unwrap(), Some(b"owned".to_vec()));
}

/// Test: Rolling back someone else's updates does not discard them.
#[test]
fn test_foreign_rollback_keeps_owner_writes() {
    let engine = Coordinator::new();
    let owner = open_with_write(&engine, "T", "k", "owned");
    let thief = TransactionId::new();
    engine.open_connection(thief);

    let stolen = engine.connection(&owner).unwrap().take_updates().unwrap();
    let err = engine.rollback_updates(stolen, &thief).unwrap_err();

    assert!(matches!(
        err,
        EngineError::Protocol(ProtocolViolation::ForeignUpdates { .. })
    ));
    assert!(engine.connection(&thief).is_none());
    let snapshot = engine.connection(&owner).unwrap();
    assert_eq!(snapshot.read("T", b"k").unwrap(), Some(b"owned".to_vec()));

    engine.commit(&owner).unwrap();
    assert_eq!(engine.open_connection_count(), 0);
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Test: A validation failure is recoverable and leaves nothing behind.
#[test]
fn test_validation_failure_then_rollback() {
    let engine = Coordinator::with_config(EngineConfig {
        max_writes_per_table: 2,
        ..EngineConfig::default()
    })
    .unwrap();
    let tx = TransactionId::new();
    let snapshot = engine.open_connection(tx);
    for key in ["a", "b", "c"] {
        snapshot.write("T", key, "v").unwrap();
    }

    let err = engine.commit(&tx).unwrap_err();

    assert!(matches!(
        err,
        EngineError::Validation {
            reason: ValidationFailure::TooManyWrites { count: 3, max: 2 },
            ..
        }
    ));
    assert!(!err.is_fatal());
    assert_eq!(snapshot.state(), TransactionState::PrepareFailed);
    assert_eq!(engine.open_connection_count(), 1);

    engine.rollback(&tx).unwrap();

    assert_eq!(engine.open_connection_count(), 0);
    assert_eq!(engine.committed_revision(), Revision::ZERO);
    let reader = engine.open_connection(TransactionId::new());
    assert_eq!(reader.read("T", b"a").unwrap(), None);
}

/// Test: An invalid configuration is refused at construction.
#[test]
fn test_invalid_config_rejected() {
    let result = Coordinator::with_config(EngineConfig {
        log_level: "verbose".to_string(),
        ..EngineConfig::default()
    });
    assert!(matches!(result, Err(EngineError::Config(_))));
}

// =============================================================================
// PARTIAL COMMIT
// =============================================================================

/// Test: A publish failure closes the transaction and still commits the
/// revision it consumed.
#[test]
fn test_partial_commit_failure() {
    let engine = Coordinator::new();
    let tx = open_with_write(&engine, "T", "k", "mine");

    // Something outside the commit protocol already published revision 1.
    engine
        .open_or_create_table("T")
        .publish(
            Revision::new(1),
            vec![(b"k".to_vec(), VersionPayload::Value(b"intruder".to_vec()))],
        )
        .unwrap();

    let err = engine.commit(&tx).unwrap_err();

    assert!(matches!(
        err,
        EngineError::PartialCommit { revision, ref table, .. }
            if revision == Revision::new(1) && table == "T"
    ));
    assert!(err.is_fatal());
    assert_eq!(err.code(), "MVS_PARTIAL_COMMIT");
    assert_eq!(engine.open_connection_count(), 0);
    assert_eq!(engine.committed_revision(), Revision::new(1));
    assert_eq!(engine.metrics().commit_failures, 1);

    // The revision counter is not rewound.
    let next = open_with_write(&engine, "T", "other", "v");
    assert_eq!(engine.commit(&next).unwrap(), Revision::new(2));
}

/// Test: Tables published before the failing one stay visible at the
/// consumed revision; the failing table keeps what was there.
#[test]
fn test_partial_commit_keeps_earlier_tables() {
    let engine = Coordinator::new();
    let tx = TransactionId::new();
    let snapshot = engine.open_connection(tx);
    snapshot.write("A", "a", "mine").unwrap();
    snapshot.write("T", "k", "mine").unwrap();

    engine
        .open_or_create_table("T")
        .publish(
            Revision::new(1),
            vec![(b"k".to_vec(), VersionPayload::Value(b"intruder".to_vec()))],
        )
        .unwrap();

    let err = engine.commit(&tx).unwrap_err();

    assert!(matches!(
        err,
        EngineError::PartialCommit { ref table, .. } if table == "T"
    ));
    assert_eq!(engine.committed_revision(), Revision::new(1));

    let reader = engine.open_connection(TransactionId::new());
    assert_eq!(reader.visible_revision(), Revision::new(1));
    assert_eq!(reader.read("A", b"a").unwrap(), Some(b"mine".to_vec()));
    assert_eq!(reader.read("T", b"k").unwrap(), Some(b"intruder".to_vec()));
    assert_eq!(engine.open_or_create_table("A").version_count(), 1);

    let next = open_with_write(&engine, "A", "a", "later");
    assert_eq!(engine.commit(&next).unwrap(), Revision::new(2));
}
