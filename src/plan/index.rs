use crate::catalog::IndexInfo;
use crate::query::{Constant, ExecError};
use crate::record::Schema;
use crate::scan::{IndexJoinScan, IndexSelectScan, Scan};
use crate::tx::Transaction;

use super::{explain_node, union_schema, Plan, TablePlan};

/// Finds the records of a table whose indexed field equals a constant.
#[derive(Debug, Clone)]
pub struct IndexSelectPlan {
    table: TablePlan,
    info: IndexInfo,
    key: Constant,
}

impl IndexSelectPlan {
    pub fn new(table: TablePlan, info: IndexInfo, key: Constant) -> Self {
        Self { table, info, key }
    }

    pub fn open(&self, tx: &Transaction) -> Result<Scan, ExecError> {
        let table = self.table.open_table(tx)?;
        let scan = IndexSelectScan::new(table, self.info.open(), self.key.clone());
        Ok(Scan::IndexSelect(scan))
    }

    pub fn schema(&self) -> &Schema {
        self.table.schema()
    }

    /// One index search, then one block per matching record.
    pub fn blocks_accessed(&self) -> u64 {
        self.info
            .blocks_accessed()
            .saturating_add(self.records_output())
    }

    pub fn records_output(&self) -> u64 {
        self.info.records_output()
    }

    pub fn distinct_values(&self, field: &str) -> u64 {
        self.info.distinct_values(field)
    }

    pub(crate) fn explain_at(&self, indent: usize) -> String {
        let label = format!(
            "IndexSelect on {} using {} ({} = {})",
            self.table.table(),
            self.info.name(),
            self.info.field(),
            self.key
        );
        explain_node(
            indent,
            &label,
            self.blocks_accessed(),
            self.records_output(),
            &[],
        )
    }
}

/// Joins an outer plan with a table by searching the table's index with
/// each outer join value.
#[derive(Debug, Clone)]
pub struct IndexJoinPlan {
    outer: Box<Plan>,
    table: TablePlan,
    info: IndexInfo,
    join_field: String,
    schema: Schema,
}

impl IndexJoinPlan {
    /// `join_field` is the outer field matched against the indexed field.
    pub fn new(outer: Plan, table: TablePlan, info: IndexInfo, join_field: String) -> Self {
        let schema = union_schema(outer.schema(), table.schema());
        Self {
            outer: Box::new(outer),
            table,
            info,
            join_field,
            schema,
        }
    }

    pub fn open(&self, tx: &Transaction) -> Result<Scan, ExecError> {
        let outer = self.outer.open(tx)?;
        let table = self.table.open_table(tx)?;
        let scan = IndexJoinScan::new(outer, table, self.info.open(), self.join_field.clone())?;
        Ok(Scan::IndexJoin(scan))
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn blocks_accessed(&self) -> u64 {
        let outer = &self.outer;
        outer
            .blocks_accessed()
            .saturating_add(
                outer
                    .records_output()
                    .saturating_mul(self.info.blocks_accessed()),
            )
            .saturating_add(self.records_output())
    }

    pub fn records_output(&self) -> u64 {
        self.outer
            .records_output()
            .saturating_mul(self.info.records_output())
    }

    pub fn distinct_values(&self, field: &str) -> u64 {
        if self.outer.schema().has_field(field) {
            self.outer.distinct_values(field)
        } else {
            self.info.distinct_values(field)
        }
    }

    pub(crate) fn explain_at(&self, indent: usize) -> String {
        let label = format!(
            "IndexJoin: {} = {}.{} using {}",
            self.join_field,
            self.table.table(),
            self.info.field(),
            self.info.name()
        );
        explain_node(
            indent,
            &label,
            self.blocks_accessed(),
            self.records_output(),
            &[self.outer.explain_at(indent + 1)],
        )
    }
}
