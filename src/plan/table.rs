use std::sync::Arc;

use crate::catalog::{Catalog, StatInfo};
use crate::query::ExecError;
use crate::record::{Layout, Schema, TableScan};
use crate::tx::Transaction;

use super::explain_node;

/// Reads every record of a stored table.
#[derive(Debug, Clone)]
pub struct TablePlan {
    table: String,
    layout: Arc<Layout>,
    stats: StatInfo,
}

impl TablePlan {
    /// Looks the table up in `catalog` and gathers its statistics.
    pub fn new(tx: &Transaction, table: &str, catalog: &Catalog) -> Result<Self, ExecError> {
        let layout = catalog.layout(table)?;
        let stats = StatInfo::compute(tx, table, &layout)?;
        Ok(Self {
            table: table.to_string(),
            layout,
            stats,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn open_table(&self, tx: &Transaction) -> Result<TableScan, ExecError> {
        TableScan::open(tx, &self.table, Arc::clone(&self.layout))
    }

    pub fn schema(&self) -> &Schema {
        self.layout.schema()
    }

    pub fn blocks_accessed(&self) -> u64 {
        self.stats.blocks_accessed()
    }

    pub fn records_output(&self) -> u64 {
        self.stats.records_output()
    }

    pub fn distinct_values(&self, field: &str) -> u64 {
        self.stats.distinct_values(field)
    }

    pub(crate) fn explain_at(&self, indent: usize) -> String {
        explain_node(
            indent,
            &format!("TableScan on {}", self.table),
            self.blocks_accessed(),
            self.records_output(),
            &[],
        )
    }
}
