//! Join plans: nested loop, sort-merge and hash.

use tracing::debug;

use crate::query::{ExecError, Predicate, SortField};
use crate::record::Schema;
use crate::scan::{
    copy_record, HashJoinScan, JoinCondition, MergeJoinScan, NestedLoopJoinScan, Scan, TempTable,
};
use crate::tx::Transaction;

use super::cost::{best_factor, ceil_div, materialized_blocks};
use super::{explain_node, union_schema, Plan, SortPlan};

/// Estimated output of an equi-join of `left.f1 = right.f2`.
fn equijoin_records(left: &Plan, right: &Plan, f1: &str, f2: &str) -> u64 {
    let distinct = left.distinct_values(f1).max(right.distinct_values(f2));
    left.records_output()
        .saturating_mul(right.records_output())
        / distinct.max(1)
}

/// Joins by rescanning the inner input once per outer record.
#[derive(Debug, Clone)]
pub struct NestedLoopJoinPlan {
    outer: Box<Plan>,
    inner: Box<Plan>,
    pred: Predicate,
    schema: Schema,
}

impl NestedLoopJoinPlan {
    /// The input with fewer estimated records becomes the outer input.
    pub fn new(left: Plan, right: Plan, pred: Predicate) -> Self {
        let schema = union_schema(left.schema(), right.schema());
        let (outer, inner) = if right.records_output() < left.records_output() {
            (right, left)
        } else {
            (left, right)
        };
        Self {
            outer: Box::new(outer),
            inner: Box::new(inner),
            pred,
            schema,
        }
    }

    pub fn outer(&self) -> &Plan {
        &self.outer
    }

    pub fn open(&self, tx: &Transaction) -> Result<Scan, ExecError> {
        let outer = self.outer.open(tx)?;
        let inner = self.inner.open(tx)?;
        let condition = JoinCondition::Predicate(self.pred.clone());
        Ok(Scan::NestedLoopJoin(NestedLoopJoinScan::new(
            outer, inner, condition,
        )?))
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn blocks_accessed(&self) -> u64 {
        self.outer.blocks_accessed().saturating_add(
            self.outer
                .records_output()
                .saturating_mul(self.inner.blocks_accessed()),
        )
    }

    /// Upper bound: the actual count depends on the join selectivity.
    pub fn records_output(&self) -> u64 {
        self.outer
            .records_output()
            .saturating_mul(self.inner.records_output())
    }

    pub fn distinct_values(&self, field: &str) -> u64 {
        if self.outer.schema().has_field(field) {
            self.outer.distinct_values(field)
        } else {
            self.inner.distinct_values(field)
        }
    }

    pub(crate) fn explain_at(&self, indent: usize) -> String {
        explain_node(
            indent,
            &format!("NestedLoopJoin: {}", self.pred),
            self.blocks_accessed(),
            self.records_output(),
            &[
                self.outer.explain_at(indent + 1),
                self.inner.explain_at(indent + 1),
            ],
        )
    }
}

/// Sorts both inputs on their join fields and merges them.
#[derive(Debug, Clone)]
pub struct MergeJoinPlan {
    left: SortPlan,
    right: SortPlan,
    left_field: String,
    right_field: String,
    schema: Schema,
    records: u64,
}

impl MergeJoinPlan {
    pub fn new(
        tx: &Transaction,
        left: Plan,
        right: Plan,
        left_field: String,
        right_field: String,
    ) -> Self {
        let schema = union_schema(left.schema(), right.schema());
        let records = equijoin_records(&left, &right, &left_field, &right_field);
        let left = SortPlan::new(tx, left, vec![SortField::asc(left_field.as_str())]);
        let right = SortPlan::new(tx, right, vec![SortField::asc(right_field.as_str())]);
        Self {
            left,
            right,
            left_field,
            right_field,
            schema,
            records,
        }
    }

    pub fn open(&self, tx: &Transaction) -> Result<Scan, ExecError> {
        let left = self.left.open_sorted(tx)?;
        let right = self.right.open_sorted(tx)?;
        let scan = MergeJoinScan::new(
            left,
            right,
            self.left_field.clone(),
            self.right_field.clone(),
        )?;
        Ok(Scan::MergeJoin(scan))
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Sorting both inputs, then one pass over each sorted result.
    pub fn blocks_accessed(&self) -> u64 {
        self.left
            .blocks_accessed()
            .saturating_add(self.left.scan_length())
            .saturating_add(self.right.blocks_accessed())
            .saturating_add(self.right.scan_length())
    }

    pub fn records_output(&self) -> u64 {
        self.records
    }

    pub fn distinct_values(&self, field: &str) -> u64 {
        if self.left.schema().has_field(field) {
            self.left.distinct_values(field)
        } else {
            self.right.distinct_values(field)
        }
    }

    pub(crate) fn explain_at(&self, indent: usize) -> String {
        explain_node(
            indent,
            &format!("MergeJoin: {} = {}", self.left_field, self.right_field),
            self.blocks_accessed(),
            self.records_output(),
            &[
                self.left.explain_at(indent + 1),
                self.right.explain_at(indent + 1),
            ],
        )
    }
}

/// Partitions both inputs into buckets by hashing their join fields, then
/// joins matching buckets.
#[derive(Debug, Clone)]
pub struct HashJoinPlan {
    left: Box<Plan>,
    right: Box<Plan>,
    left_field: String,
    right_field: String,
    buckets: usize,
    block_size: usize,
    schema: Schema,
}

impl HashJoinPlan {
    /// The bucket count is the smallest that lets the larger input's
    /// buckets fit in the transaction's buffers.
    pub fn new(
        tx: &Transaction,
        left: Plan,
        right: Plan,
        left_field: String,
        right_field: String,
    ) -> Self {
        let larger = left.blocks_accessed().max(right.blocks_accessed());
        let buckets = best_factor(tx.available_buffs(), larger);
        let schema = union_schema(left.schema(), right.schema());
        Self {
            left: Box::new(left),
            right: Box::new(right),
            left_field,
            right_field,
            buckets,
            block_size: tx.block_size(),
            schema,
        }
    }

    pub fn buckets(&self) -> usize {
        self.buckets
    }

    /// Copies every record of `plan` into the bucket its `field` hashes to.
    fn partition(
        &self,
        tx: &Transaction,
        plan: &Plan,
        field: &str,
    ) -> Result<Vec<TempTable>, ExecError> {
        let schema = plan.schema();
        let fields = schema.fields().to_vec();
        let buckets: Vec<TempTable> = (0..self.buckets)
            .map(|_| TempTable::new(tx, schema))
            .collect();
        let mut dests = buckets
            .iter()
            .map(TempTable::open)
            .collect::<Result<Vec<_>, _>>()?;

        let mut src = plan.open(tx)?;
        let mut records = 0u64;
        while src.next()? {
            let bucket = src.get_val(field)?.bucket(self.buckets);
            copy_record(&src, &mut dests[bucket], &fields)?;
            records += 1;
        }
        src.close();
        for dest in &mut dests {
            dest.close();
        }
        debug!(field, records, buckets = self.buckets, "hash partition");
        Ok(buckets)
    }

    pub fn open(&self, tx: &Transaction) -> Result<Scan, ExecError> {
        let left = self.partition(tx, &self.left, &self.left_field)?;
        let right = self.partition(tx, &self.right, &self.right_field)?;
        let scan = HashJoinScan::new(
            left,
            right,
            self.left_field.clone(),
            self.right_field.clone(),
        )?;
        Ok(Scan::HashJoin(scan))
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Reads both inputs and writes them into buckets, then joins each
    /// bucket pair with a block nested loop, assuming records spread evenly
    /// over the buckets.
    pub fn blocks_accessed(&self) -> u64 {
        let k = self.buckets as u64;
        let (b1, b2) = (self.left.blocks_accessed(), self.right.blocks_accessed());
        let r1 = self.left.records_output();
        let m1 = materialized_blocks(self.left.schema(), r1, self.block_size);
        let m2 = materialized_blocks(
            self.right.schema(),
            self.right.records_output(),
            self.block_size,
        );
        let probe = ceil_div(m1, k).saturating_add(ceil_div(r1, k).saturating_mul(ceil_div(m2, k)));
        b1.saturating_add(b2)
            .saturating_add(m1)
            .saturating_add(m2)
            .saturating_add(k.saturating_mul(probe))
    }

    pub fn records_output(&self) -> u64 {
        equijoin_records(&self.left, &self.right, &self.left_field, &self.right_field)
    }

    pub fn distinct_values(&self, field: &str) -> u64 {
        if self.left.schema().has_field(field) {
            self.left.distinct_values(field)
        } else {
            self.right.distinct_values(field)
        }
    }

    pub(crate) fn explain_at(&self, indent: usize) -> String {
        let label = format!(
            "HashJoin: {} = {} ({} buckets)",
            self.left_field, self.right_field, self.buckets
        );
        explain_node(
            indent,
            &label,
            self.blocks_accessed(),
            self.records_output(),
            &[
                self.left.explain_at(indent + 1),
                self.right.explain_at(indent + 1),
            ],
        )
    }
}
