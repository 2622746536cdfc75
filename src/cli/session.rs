//! Request handling for `exec`
//!
//! A session owns one engine and maps the transaction names used on the
//! wire to engine transaction identities. Names are only valid while the
//! transaction is open.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::engine::{Coordinator, TransactionId, TransactionSnapshot};

use super::errors::{CliError, CliResult};

/// One request line.
///
/// Keys and values travel as UTF-8 strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", deny_unknown_fields)]
pub enum Request {
    Open { tx: String },
    Read { tx: String, table: String, key: String },
    Write { tx: String, table: String, key: String, value: String },
    Delete { tx: String, table: String, key: String },
    Commit { tx: String },
    Rollback { tx: String },
    Tables,
    Stats,
}

pub struct Session {
    engine: Coordinator,
    transactions: HashMap<String, TransactionId>,
}

impl Session {
    pub fn new(engine: Coordinator) -> Self {
        Self {
            engine,
            transactions: HashMap::new(),
        }
    }

    pub fn engine(&self) -> &Coordinator {
        &self.engine
    }

    /// Parse and execute one request, returning the response data.
    pub fn handle(&mut self, request: Value) -> CliResult<Value> {
        let request: Request = serde_json::from_value(request)
            .map_err(|e| CliError::bad_request(format!("invalid request: {}", e)))?;
        self.execute(request)
    }

    pub fn execute(&mut self, request: Request) -> CliResult<Value> {
        match request {
            Request::Open { tx } => {
                let id = *self
                    .transactions
                    .entry(tx.clone())
                    .or_insert_with(TransactionId::new);
                let snapshot = self.engine.open_connection(id);
                Ok(json!({
                    "tx": tx,
                    "id": id,
                    "visible_revision": snapshot.visible_revision(),
                }))
            }
            Request::Read { tx, table, key } => {
                let value = self.snapshot(&tx)?.read(&table, key.as_bytes())?;
                Ok(json!({
                    "value": value.map(|bytes| String::from_utf8_lossy(&bytes).into_owned()),
                }))
            }
            Request::Write {
                tx,
                table,
                key,
                value,
            } => {
                self.snapshot(&tx)?.write(&table, key, value)?;
                Ok(Value::Null)
            }
            Request::Delete { tx, table, key } => {
                self.snapshot(&tx)?.delete(&table, key)?;
                Ok(Value::Null)
            }
            Request::Commit { tx } => {
                let id = self.resolve(&tx)?;
                let result = self.engine.commit(&id);
                self.forget_if_closed(&tx, &id);
                let revision = result?;
                Ok(json!({ "revision": revision }))
            }
            Request::Rollback { tx } => {
                let id = self.resolve(&tx)?;
                let result = self.engine.rollback(&id);
                self.forget_if_closed(&tx, &id);
                result?;
                Ok(Value::Null)
            }
            Request::Tables => Ok(json!(self.engine.table_names())),
            Request::Stats => Ok(json!({
                "committed_revision": self.engine.committed_revision(),
                "oldest_stored_revision": self.engine.oldest_stored_revision(),
                "oldest_visible_revision": self.engine.oldest_visible_revision(),
                "open_connections": self.engine.open_connection_count(),
                "open_transactions": self.engine.open_transactions(),
                "pending_purges": self.engine.pending_purge_count(),
                "metrics": self.engine.metrics(),
            })),
        }
    }

    fn resolve(&self, name: &str) -> CliResult<TransactionId> {
        self.transactions
            .get(name)
            .copied()
            .ok_or_else(|| CliError::unknown_transaction(name))
    }

    fn snapshot(&self, name: &str) -> CliResult<Arc<TransactionSnapshot>> {
        let id = self.resolve(name)?;
        self.engine
            .connection(&id)
            .ok_or_else(|| CliError::unknown_transaction(name))
    }

    fn forget_if_closed(&mut self, name: &str, id: &TransactionId) {
        if self.engine.connection(id).is_none() {
            self.transactions.remove(name);
        }
    }
}
