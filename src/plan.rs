//! Physical query plans.
//!
//! A [`Plan`] describes one relational operator over its child plans. It
//! can estimate its own cost before anything runs, and [`Plan::open`] turns
//! it into the [`Scan`] that produces its records.
//!
//! All estimates are in block accesses and records:
//!
//! | Operator       | Blocks                                       | Records              |
//! |----------------|----------------------------------------------|----------------------|
//! | Table          | table blocks                                 | table records        |
//! | Select         | `B(p)`                                       | `R(p) / rf`          |
//! | Project        | `B(p)`                                       | `R(p)`               |
//! | Product        | `B1 + R1 * B2`                               | `R1 * R2`            |
//! | IndexSelect    | index search + matches                       | `R / V(f)`           |
//! | IndexJoin      | `B1 + R1 * search + records`                 | `R1 * R / V(f)`      |
//! | NestedLoopJoin | `B(outer) + R(outer) * B(inner)`             | `R1 * R2`            |
//! | MergeJoin      | `sort(p1) + sort(p2)`                        | `R1 * R2 / max V`    |
//! | HashJoin       | `B1 + B2 + M1 + M2 + k * probe`              | `R1 * R2 / max V`    |
//! | Sort           | sort cost + materialized blocks              | `R(p)`               |
//! | Distinct       | sort                                         | `R(p)`               |
//! | GroupBy        | sort                                         | groups               |

pub mod cost;

mod basic;
mod group_by;
mod index;
mod join;
mod sort;
mod table;

pub use basic::{ProductPlan, ProjectPlan, SelectPlan};
pub use group_by::GroupByPlan;
pub use index::{IndexJoinPlan, IndexSelectPlan};
pub use join::{HashJoinPlan, MergeJoinPlan, NestedLoopJoinPlan};
pub use sort::{DistinctPlan, SortPlan};
pub use table::TablePlan;

use crate::query::ExecError;
use crate::record::Schema;
use crate::scan::Scan;
use crate::tx::Transaction;

/// A physical plan node.
///
/// Uses enum dispatch; the set of operators is small and fixed.
#[derive(Debug, Clone)]
pub enum Plan {
    Table(TablePlan),
    Select(SelectPlan),
    Project(ProjectPlan),
    Product(ProductPlan),
    IndexSelect(IndexSelectPlan),
    IndexJoin(IndexJoinPlan),
    NestedLoopJoin(NestedLoopJoinPlan),
    MergeJoin(MergeJoinPlan),
    HashJoin(HashJoinPlan),
    Sort(SortPlan),
    Distinct(DistinctPlan),
    GroupBy(GroupByPlan),
}

macro_rules! dispatch {
    ($self:expr, $p:ident => $body:expr) => {
        match $self {
            Plan::Table($p) => $body,
            Plan::Select($p) => $body,
            Plan::Project($p) => $body,
            Plan::Product($p) => $body,
            Plan::IndexSelect($p) => $body,
            Plan::IndexJoin($p) => $body,
            Plan::NestedLoopJoin($p) => $body,
            Plan::MergeJoin($p) => $body,
            Plan::HashJoin($p) => $body,
            Plan::Sort($p) => $body,
            Plan::Distinct($p) => $body,
            Plan::GroupBy($p) => $body,
        }
    };
}

impl Plan {
    /// Opens a scan positioned before the first record.
    ///
    /// Sorting and hash partitioning happen here, before the scan is
    /// returned.
    pub fn open(&self, tx: &Transaction) -> Result<Scan, ExecError> {
        match self {
            Plan::Table(p) => Ok(Scan::Table(p.open_table(tx)?)),
            Plan::Select(p) => p.open(tx),
            Plan::Project(p) => p.open(tx),
            Plan::Product(p) => p.open(tx),
            Plan::IndexSelect(p) => p.open(tx),
            Plan::IndexJoin(p) => p.open(tx),
            Plan::NestedLoopJoin(p) => p.open(tx),
            Plan::MergeJoin(p) => p.open(tx),
            Plan::HashJoin(p) => p.open(tx),
            Plan::Sort(p) => Ok(Scan::Sort(p.open_sorted(tx)?)),
            Plan::Distinct(p) => p.open(tx),
            Plan::GroupBy(p) => p.open(tx),
        }
    }

    pub fn schema(&self) -> &Schema {
        dispatch!(self, p => p.schema())
    }

    /// Estimated block accesses needed to produce every record.
    pub fn blocks_accessed(&self) -> u64 {
        dispatch!(self, p => p.blocks_accessed())
    }

    /// Estimated number of output records.
    pub fn records_output(&self) -> u64 {
        dispatch!(self, p => p.records_output())
    }

    /// Estimated number of distinct values of `field` in the output.
    ///
    /// Never more than the output record count, and never less than 1.
    pub fn distinct_values(&self, field: &str) -> u64 {
        let distinct = dispatch!(self, p => p.distinct_values(field));
        distinct.min(self.records_output()).max(1)
    }

    /// Renders the plan tree, one operator per line, children indented.
    ///
    /// ```text
    /// Project: name (blocks=4, rows=2)
    ///   Select: dept = 10 (blocks=4, rows=2)
    ///     TableScan on emp (blocks=4, rows=20)
    /// ```
    pub fn explain(&self) -> String {
        self.explain_at(0)
    }

    pub(crate) fn explain_at(&self, indent: usize) -> String {
        dispatch!(self, p => p.explain_at(indent))
    }
}

/// One line of [`Plan::explain`] output, followed by the child lines.
pub(crate) fn explain_node(
    indent: usize,
    label: &str,
    blocks: u64,
    rows: u64,
    children: &[String],
) -> String {
    let prefix = "  ".repeat(indent);
    let mut out = format!("{prefix}{label} (blocks={blocks}, rows={rows})");
    for child in children {
        out.push('\n');
        out.push_str(child);
    }
    out
}

/// `left` with every field of `right` added.
pub(crate) fn union_schema(left: &Schema, right: &Schema) -> Schema {
    let mut schema = left.clone();
    schema.add_all(right);
    schema
}
