//! Partitioned hash join.

use crate::query::{Constant, ExecError};

use super::nested_loop::{JoinCondition, NestedLoopJoinScan};
use super::temp::TempTable;
use super::Scan;

/// Joins two inputs that were partitioned into buckets by hashing their join
/// keys.
///
/// Equal keys always hash to the same bucket index, so only bucket `i` of
/// the left side can match bucket `i` of the right side. The scan joins the
/// bucket pairs one after another with a nested loop.
pub struct HashJoinScan {
    left_buckets: Vec<TempTable>,
    right_buckets: Vec<TempTable>,
    left_field: String,
    right_field: String,
    /// Join of the bucket pair being probed.
    current: Option<NestedLoopJoinScan>,
    next_bucket: usize,
}

impl HashJoinScan {
    /// Both bucket lists must have the same length.
    pub fn new(
        left_buckets: Vec<TempTable>,
        right_buckets: Vec<TempTable>,
        left_field: String,
        right_field: String,
    ) -> Result<Self, ExecError> {
        if left_buckets.len() != right_buckets.len() {
            return Err(ExecError::InvalidPlan(format!(
                "hash join over {} and {} buckets",
                left_buckets.len(),
                right_buckets.len()
            )));
        }
        let mut scan = Self {
            left_buckets,
            right_buckets,
            left_field,
            right_field,
            current: None,
            next_bucket: 0,
        };
        scan.before_first()?;
        Ok(scan)
    }

    pub fn bucket_count(&self) -> usize {
        self.left_buckets.len()
    }

    fn open_bucket(&self, i: usize) -> Result<NestedLoopJoinScan, ExecError> {
        let left = Scan::Table(self.left_buckets[i].open()?);
        let right = Scan::Table(self.right_buckets[i].open()?);
        NestedLoopJoinScan::new(
            left,
            right,
            JoinCondition::Fields {
                outer: self.left_field.clone(),
                inner: self.right_field.clone(),
            },
        )
    }

    pub fn before_first(&mut self) -> Result<(), ExecError> {
        if let Some(mut join) = self.current.take() {
            join.close();
        }
        self.next_bucket = 0;
        Ok(())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<bool, ExecError> {
        loop {
            if let Some(join) = self.current.as_mut() {
                if join.next()? {
                    return Ok(true);
                }
                join.close();
                self.current = None;
            }
            if self.next_bucket >= self.left_buckets.len() {
                return Ok(false);
            }
            let join = self.open_bucket(self.next_bucket)?;
            self.next_bucket += 1;
            self.current = Some(join);
        }
    }

    pub fn get_val(&self, field: &str) -> Result<Constant, ExecError> {
        match &self.current {
            Some(join) => join.get_val(field),
            None => Err(ExecError::NoCurrentRecord),
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        let declares = |buckets: &[TempTable]| {
            buckets
                .first()
                .is_some_and(|b| b.layout().schema().has_field(field))
        };
        declares(&self.left_buckets) || declares(&self.right_buckets)
    }

    /// Closes the probe and deletes every bucket.
    pub fn close(&mut self) {
        if let Some(mut join) = self.current.take() {
            join.close();
        }
        self.left_buckets.clear();
        self.right_buckets.clear();
        self.next_bucket = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::table_scan::tests::test_tx;
    use crate::record::{Schema, TableScan};
    use crate::scan::tests::collect_ints;
    use crate::tx::Transaction;

    fn partition(tx: &Transaction, field: &str, values: &[i32], k: usize) -> Vec<TempTable> {
        let mut schema = Schema::new();
        schema.add_int_field(field);
        let buckets: Vec<TempTable> = (0..k).map(|_| TempTable::new(tx, &schema)).collect();
        let mut scans: Vec<TableScan> = buckets.iter().map(|b| b.open().unwrap()).collect();
        for v in values {
            let key = Constant::Int(*v);
            let dest = &mut scans[key.bucket(k)];
            dest.insert().unwrap();
            dest.set_val(field, &key).unwrap();
        }
        buckets
    }

    #[test]
    fn test_joins_matching_buckets() {
        let tx = test_tx(64);
        let left = partition(&tx, "x", &[1, 2, 2, 3], 3);
        let right = partition(&tx, "y", &[2, 2, 3, 4], 3);
        let join = HashJoinScan::new(left, right, "x".to_string(), "y".to_string()).unwrap();
        assert_eq!(join.bucket_count(), 3);
        let mut scan = Scan::HashJoin(join);
        let mut rows = collect_ints(&mut scan, &["x", "y"]);
        rows.sort();
        assert_eq!(
            rows,
            vec![vec![2, 2], vec![2, 2], vec![2, 2], vec![2, 2], vec![3, 3]]
        );
        assert!(scan.has_field("y"));
        assert!(!scan.has_field("z"));
    }

    #[test]
    fn test_mismatched_bucket_counts_fail() {
        let tx = test_tx(64);
        let left = partition(&tx, "x", &[1], 2);
        let right = partition(&tx, "y", &[1], 3);
        let result = HashJoinScan::new(left, right, "x".to_string(), "y".to_string());
        assert!(matches!(result, Err(ExecError::InvalidPlan(_))));
    }

    #[test]
    fn test_close_deletes_buckets() {
        let tx = test_tx(64);
        let left = partition(&tx, "x", &[1, 2], 2);
        let right = partition(&tx, "y", &[], 2);
        let mut scan =
            HashJoinScan::new(left, right, "x".to_string(), "y".to_string()).unwrap();
        assert!(!scan.next().unwrap());
        scan.close();
        assert!(tx.storage().file_names().is_empty());
        assert!(!scan.next().unwrap());
        assert!(!scan.has_field("x"));
    }
}
