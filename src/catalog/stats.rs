//! Table statistics.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::query::{Constant, ExecError};
use crate::record::{Layout, TableScan};
use crate::tx::Transaction;

/// Block, record and distinct-value counts of one table.
///
/// Statistics are exact: they are gathered by scanning the table at the
/// time they are requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatInfo {
    blocks: u64,
    records: u64,
    distinct: HashMap<String, u64>,
}

impl StatInfo {
    pub fn new(blocks: u64, records: u64, distinct: HashMap<String, u64>) -> Self {
        Self {
            blocks,
            records,
            distinct,
        }
    }

    /// Scans `table` and counts its blocks, records and distinct values.
    pub fn compute(
        tx: &Transaction,
        table: &str,
        layout: &Arc<Layout>,
    ) -> Result<Self, ExecError> {
        let fields = layout.schema().fields();
        let mut seen: Vec<HashSet<Constant>> = vec![HashSet::new(); fields.len()];
        let mut records = 0u64;

        let mut scan = TableScan::open(tx, table, Arc::clone(layout))?;
        while scan.next()? {
            records += 1;
            for (field, values) in fields.iter().zip(seen.iter_mut()) {
                values.insert(scan.get_val(field)?);
            }
        }
        scan.close();

        let distinct = fields
            .iter()
            .zip(seen)
            .map(|(field, values)| (field.clone(), values.len() as u64))
            .collect();
        Ok(Self {
            blocks: tx.storage().block_count(table) as u64,
            records,
            distinct,
        })
    }

    pub fn blocks_accessed(&self) -> u64 {
        self.blocks
    }

    pub fn records_output(&self) -> u64 {
        self.records
    }

    /// Number of distinct values of `field`, never less than 1 so that it
    /// can divide record counts.
    pub fn distinct_values(&self, field: &str) -> u64 {
        self.distinct.get(field).copied().unwrap_or(1).max(1)
    }
}
