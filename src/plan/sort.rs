//! External merge sort and duplicate elimination.

use std::cmp::Ordering;

use tracing::debug;

use crate::query::{ExecError, SortField};
use crate::record::{Schema, TableScan};
use crate::scan::{copy_record, DistinctScan, RecordComparator, Scan, SortScan, TempTable};
use crate::tx::Transaction;

use super::cost::{materialized_blocks, sort_cost};
use super::{explain_node, Plan};

/// Sorts its input with an external merge sort.
///
/// `open` splits the input into sorted runs, then merges runs two at a time
/// until one is left.
#[derive(Debug, Clone)]
pub struct SortPlan {
    input: Box<Plan>,
    comparator: RecordComparator,
    block_size: usize,
    sort_buffers: usize,
}

impl SortPlan {
    pub fn new(tx: &Transaction, input: Plan, fields: Vec<SortField>) -> Self {
        Self {
            input: Box::new(input),
            comparator: RecordComparator::new(fields),
            block_size: tx.block_size(),
            sort_buffers: tx.config().sort_buffers,
        }
    }

    pub fn sort_fields(&self) -> &[SortField] {
        self.comparator.fields()
    }

    /// Sorts the input and returns a scan over the result.
    pub fn open_sorted(&self, tx: &Transaction) -> Result<SortScan, ExecError> {
        let mut src = self.input.open(tx)?;
        let runs = self.split_into_runs(tx, &mut src);
        src.close();
        let mut runs = runs?;
        let initial = runs.len();
        while runs.len() > 1 {
            runs = self.merge_pass(tx, runs)?;
        }
        debug!(runs = initial, fields = ?self.comparator.fields(), "sorted input");
        SortScan::new(runs, self.comparator.clone())
    }

    /// Copies `src` into runs, starting a new run whenever a record sorts
    /// before the one written just before it. Always yields at least one
    /// run, which is empty for an empty input.
    fn split_into_runs(
        &self,
        tx: &Transaction,
        src: &mut Scan,
    ) -> Result<Vec<TempTable>, ExecError> {
        let schema = self.input.schema();
        let fields = schema.fields().to_vec();
        let mut runs = vec![TempTable::new(tx, schema)];
        let mut dest: TableScan = runs[0].open()?;
        let mut written = false;
        while src.next()? {
            if written && self.comparator.compare(&*src, &dest)? == Ordering::Less {
                dest.close();
                let run = TempTable::new(tx, schema);
                dest = run.open()?;
                runs.push(run);
            }
            copy_record(&*src, &mut dest, &fields)?;
            written = true;
        }
        dest.close();
        Ok(runs)
    }

    /// Merges runs pairwise; an odd run out is carried over unchanged.
    fn merge_pass(
        &self,
        tx: &Transaction,
        runs: Vec<TempTable>,
    ) -> Result<Vec<TempTable>, ExecError> {
        let mut merged = Vec::with_capacity(runs.len().div_ceil(2));
        let mut runs = runs.into_iter();
        while let Some(first) = runs.next() {
            match runs.next() {
                Some(second) => merged.push(self.merge_two(tx, first, second)?),
                None => merged.push(first),
            }
        }
        Ok(merged)
    }

    fn merge_two(
        &self,
        tx: &Transaction,
        first: TempTable,
        second: TempTable,
    ) -> Result<TempTable, ExecError> {
        let schema = self.input.schema();
        let fields = schema.fields().to_vec();
        let result = TempTable::new(tx, schema);
        let mut dest = result.open()?;
        let mut merge = SortScan::new(vec![first, second], self.comparator.clone())?;
        while merge.next()? {
            copy_record(&merge, &mut dest, &fields)?;
        }
        merge.close();
        dest.close();
        Ok(result)
    }

    pub fn schema(&self) -> &Schema {
        self.input.schema()
    }

    /// Blocks the input occupies once copied into temporary tables.
    pub fn scan_length(&self) -> u64 {
        materialized_blocks(self.schema(), self.records_output(), self.block_size)
    }

    /// The external merge sort over [`SortPlan::scan_length`] blocks.
    pub fn blocks_accessed(&self) -> u64 {
        sort_cost(self.scan_length(), self.sort_buffers)
    }

    pub fn records_output(&self) -> u64 {
        self.input.records_output()
    }

    pub fn distinct_values(&self, field: &str) -> u64 {
        self.input.distinct_values(field)
    }

    pub(crate) fn explain_at(&self, indent: usize) -> String {
        let fields: Vec<String> = self.sort_fields().iter().map(|f| f.to_string()).collect();
        explain_node(
            indent,
            &format!("Sort: {}", fields.join(", ")),
            self.blocks_accessed(),
            self.records_output(),
            &[self.input.explain_at(indent + 1)],
        )
    }
}

/// Removes duplicate records, comparing a list of fields.
///
/// The input is sorted ascending on those fields first, so duplicates
/// arrive next to each other.
#[derive(Debug, Clone)]
pub struct DistinctPlan {
    sort: SortPlan,
    fields: Vec<String>,
}

impl DistinctPlan {
    /// Fails if `input` lacks one of `fields`.
    pub fn new(tx: &Transaction, input: Plan, fields: Vec<String>) -> Result<Self, ExecError> {
        if let Some(missing) = fields.iter().find(|f| !input.schema().has_field(f)) {
            return Err(ExecError::FieldNotFound(missing.clone()));
        }
        let keys = fields.iter().map(|f| SortField::asc(f.as_str())).collect();
        Ok(Self {
            sort: SortPlan::new(tx, input, keys),
            fields,
        })
    }

    pub fn open(&self, tx: &Transaction) -> Result<Scan, ExecError> {
        let sorted = Scan::Sort(self.sort.open_sorted(tx)?);
        Ok(Scan::Distinct(DistinctScan::new(sorted, self.fields.clone())))
    }

    pub fn schema(&self) -> &Schema {
        self.sort.schema()
    }

    pub fn blocks_accessed(&self) -> u64 {
        self.sort.blocks_accessed()
    }

    pub fn records_output(&self) -> u64 {
        self.sort.records_output()
    }

    pub fn distinct_values(&self, field: &str) -> u64 {
        self.sort.distinct_values(field)
    }

    pub(crate) fn explain_at(&self, indent: usize) -> String {
        explain_node(
            indent,
            &format!("Distinct: {}", self.fields.join(", ")),
            self.blocks_accessed(),
            self.records_output(),
            &[self.sort.explain_at(indent + 1)],
        )
    }
}
