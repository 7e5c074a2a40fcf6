//! Temporary tables for intermediate results.

use std::sync::Arc;

use tracing::trace;

use crate::query::ExecError;
use crate::record::{Layout, Schema, TableScan};
use crate::tx::Transaction;

/// A uniquely named table holding sort runs or hash buckets.
///
/// The backing file is deleted when the `TempTable` is dropped, so whoever
/// owns the value owns the storage. Scans opened on it must not outlive it.
pub struct TempTable {
    tx: Transaction,
    name: String,
    layout: Arc<Layout>,
}

impl TempTable {
    pub fn new(tx: &Transaction, schema: &Schema) -> Self {
        let name = tx.next_temp_name();
        trace!(table = %name, "create temp table");
        Self {
            tx: tx.clone(),
            name,
            layout: Arc::new(Layout::new(schema.clone())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    /// Opens an updatable scan over the table, positioned before the first record.
    pub fn open(&self) -> Result<TableScan, ExecError> {
        TableScan::open(&self.tx, &self.name, Arc::clone(&self.layout))
    }
}

impl Drop for TempTable {
    fn drop(&mut self) {
        if self.tx.storage().delete_file(&self.name) {
            trace!(table = %self.name, "drop temp table");
        }
    }
}

impl std::fmt::Debug for TempTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TempTable").field(&self.name).finish()
    }
}
