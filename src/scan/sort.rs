//! Merging scan over sorted runs.

use std::cmp::Ordering;

use crate::query::{Constant, ExecError, FieldSource, SortField};
use crate::record::{Rid, TableScan};

use super::temp::TempTable;

/// Lexicographic record ordering over a list of sort fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordComparator {
    fields: Vec<SortField>,
}

impl RecordComparator {
    pub fn new(fields: Vec<SortField>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[SortField] {
        &self.fields
    }

    /// Compares the current records of `a` and `b`, field by field.
    pub fn compare<A, B>(&self, a: &A, b: &B) -> Result<Ordering, ExecError>
    where
        A: FieldSource + ?Sized,
        B: FieldSource + ?Sized,
    {
        for sort_field in &self.fields {
            let lhs = a.get_val(&sort_field.field)?;
            let rhs = b.get_val(&sort_field.field)?;
            let ord = sort_field.direction.apply(lhs.try_cmp(&rhs)?);
            if ord != Ordering::Equal {
                return Ok(ord);
            }
        }
        Ok(Ordering::Equal)
    }
}

struct Cursor {
    scan: TableScan,
    /// Whether `scan` sits on a record not yet returned.
    has_more: bool,
}

/// A saved [`SortScan`] position; see [`SortScan::save_position`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortPosition {
    rids: Vec<Option<Rid>>,
    current: Option<usize>,
}

/// Returns the records of several sorted runs in comparator order.
///
/// A sort plan normally reduces its input to one run before building the
/// scan, but any number of runs is merged correctly. Ties go to the run
/// listed first.
pub struct SortScan {
    cursors: Vec<Cursor>,
    runs: Vec<TempTable>,
    comparator: RecordComparator,
    current: Option<usize>,
}

impl SortScan {
    /// Opens a scan over `runs`, each already sorted by `comparator`.
    pub fn new(runs: Vec<TempTable>, comparator: RecordComparator) -> Result<Self, ExecError> {
        let cursors = runs
            .iter()
            .map(|run| {
                Ok(Cursor {
                    scan: run.open()?,
                    has_more: false,
                })
            })
            .collect::<Result<Vec<_>, ExecError>>()?;
        let mut scan = Self {
            cursors,
            runs,
            comparator,
            current: None,
        };
        scan.before_first()?;
        Ok(scan)
    }

    pub fn before_first(&mut self) -> Result<(), ExecError> {
        self.current = None;
        for cursor in &mut self.cursors {
            cursor.scan.before_first()?;
            cursor.has_more = cursor.scan.next()?;
        }
        Ok(())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<bool, ExecError> {
        if let Some(i) = self.current {
            let cursor = &mut self.cursors[i];
            cursor.has_more = cursor.scan.next()?;
        }

        let mut best: Option<usize> = None;
        for i in 0..self.cursors.len() {
            if !self.cursors[i].has_more {
                continue;
            }
            let smaller = match best {
                None => true,
                Some(b) => {
                    self.comparator
                        .compare(&self.cursors[i].scan, &self.cursors[b].scan)?
                        == Ordering::Less
                }
            };
            if smaller {
                best = Some(i);
            }
        }
        self.current = best;
        Ok(best.is_some())
    }

    fn current_scan(&self) -> Result<&TableScan, ExecError> {
        self.current
            .map(|i| &self.cursors[i].scan)
            .ok_or(ExecError::NoCurrentRecord)
    }

    pub fn get_val(&self, field: &str) -> Result<Constant, ExecError> {
        self.current_scan()?.get_val(field)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.runs
            .first()
            .is_some_and(|run| run.layout().schema().has_field(field))
    }

    /// Records where every run is, so that [`restore_position`] can return
    /// to the current record and continue from there.
    ///
    /// [`restore_position`]: SortScan::restore_position
    pub fn save_position(&self) -> Result<SortPosition, ExecError> {
        let rids = self
            .cursors
            .iter()
            .map(|c| c.has_more.then(|| c.scan.rid()).transpose())
            .collect::<Result<Vec<_>, ExecError>>()?;
        Ok(SortPosition {
            rids,
            current: self.current,
        })
    }

    pub fn restore_position(&mut self, pos: &SortPosition) -> Result<(), ExecError> {
        for (cursor, rid) in self.cursors.iter_mut().zip(&pos.rids) {
            cursor.has_more = rid.is_some();
            if let Some(rid) = rid {
                cursor.scan.move_to_rid(*rid)?;
            }
        }
        self.current = pos.current;
        Ok(())
    }

    /// Closes the run scans and deletes the runs.
    pub fn close(&mut self) {
        for cursor in &mut self.cursors {
            cursor.scan.close();
        }
        self.cursors.clear();
        self.runs.clear();
        self.current = None;
    }
}

impl FieldSource for SortScan {
    fn get_val(&self, field: &str) -> Result<Constant, ExecError> {
        SortScan::get_val(self, field)
    }

    fn has_field(&self, field: &str) -> bool {
        SortScan::has_field(self, field)
    }
}
