//! TableCatalog - Name to table registry
//!
//! Tables are created lazily on first use and never removed. Lookups of an
//! existing table only take a shard read lock; creation goes through the
//! map's entry API so two racing callers end up sharing one instance.

use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::DashMap;

use crate::observability::{log_event_with_fields, Event, MetricsRegistry};

use super::{Revision, VersionedTable};

/// Append-only registry of versioned tables.
#[derive(Debug)]
pub struct TableCatalog {
    tables: DashMap<String, Arc<VersionedTable>>,
    metrics: Arc<MetricsRegistry>,
}

impl TableCatalog {
    pub fn new(metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            tables: DashMap::new(),
            metrics,
        }
    }

    /// Return the table called `name`, creating it if it does not exist.
    pub fn open_or_create(&self, name: &str) -> Arc<VersionedTable> {
        if let Some(existing) = self.get(name) {
            return existing;
        }

        let mut created = false;
        let table = self
            .tables
            .entry(name.to_string())
            .or_insert_with(|| {
                created = true;
                Arc::new(VersionedTable::new(name))
            })
            .clone();

        if created {
            self.metrics.increment_tables_created();
            log_event_with_fields(Event::TableCreated, &[("table", name)]);
        }
        table
    }

    /// Return the table called `name` if it exists.
    pub fn get(&self, name: &str) -> Option<Arc<VersionedTable>> {
        self.tables.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// True if `table` is the instance registered under its name.
    pub fn is_registered(&self, table: &Arc<VersionedTable>) -> bool {
        self.get(table.name())
            .map_or(false, |registered| Arc::ptr_eq(&registered, table))
    }

    /// Names of all tables, sorted.
    pub fn table_names(&self) -> BTreeSet<String> {
        self.tables.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Snapshot of all registered tables.
    pub fn tables(&self) -> Vec<Arc<VersionedTable>> {
        self.tables
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Oldest version retained by any table.
    pub fn oldest_revision(&self) -> Option<Revision> {
        self.tables
            .iter()
            .filter_map(|entry| entry.value().oldest_revision())
            .min()
    }
}
