//! Pull-based scans: the runtime side of plans.
//!
//! A [`Scan`] is opened from a [`Plan`](crate::plan::Plan) and iterated with
//! `before_first` / `next`. While `next` keeps returning `true` the scan sits
//! on a record whose fields are read with `get_val` and friends.
//!
//! ```text
//! Project
//!   └── Select
//!         └── HashJoin
//!               ├── bucket i of left  (TempTable)
//!               └── bucket i of right (TempTable)
//! ```
//!
//! Every scan owns its children. `close` releases them, together with any
//! temporary tables the scan owns, and may be called at any point and any
//! number of times. Dropping a scan has the same effect.

mod basic;
mod distinct;
mod group_by;
mod hash_join;
mod index;
mod merge_join;
mod nested_loop;
mod sort;
mod temp;

pub use basic::{ProductScan, ProjectScan, SelectScan};
pub use distinct::DistinctScan;
pub use group_by::GroupByScan;
pub use hash_join::HashJoinScan;
pub use index::{IndexJoinScan, IndexSelectScan};
pub use merge_join::MergeJoinScan;
pub use nested_loop::{JoinCondition, NestedLoopJoinScan};
pub use sort::{RecordComparator, SortPosition, SortScan};
pub use temp::TempTable;

use crate::query::{Constant, ExecError, FieldSource};
use crate::record::{Rid, TableScan};

/// A scan over the output of one operator.
///
/// Uses enum dispatch; the set of operators is small and fixed.
pub enum Scan {
    Table(TableScan),
    Select(SelectScan),
    Project(ProjectScan),
    Product(ProductScan),
    IndexSelect(IndexSelectScan),
    IndexJoin(IndexJoinScan),
    NestedLoopJoin(NestedLoopJoinScan),
    MergeJoin(MergeJoinScan),
    HashJoin(HashJoinScan),
    Sort(SortScan),
    Distinct(DistinctScan),
    GroupBy(GroupByScan),
}

macro_rules! dispatch {
    ($self:expr, $s:ident => $body:expr) => {
        match $self {
            Scan::Table($s) => $body,
            Scan::Select($s) => $body,
            Scan::Project($s) => $body,
            Scan::Product($s) => $body,
            Scan::IndexSelect($s) => $body,
            Scan::IndexJoin($s) => $body,
            Scan::NestedLoopJoin($s) => $body,
            Scan::MergeJoin($s) => $body,
            Scan::HashJoin($s) => $body,
            Scan::Sort($s) => $body,
            Scan::Distinct($s) => $body,
            Scan::GroupBy($s) => $body,
        }
    };
}

impl Scan {
    /// Positions the scan before its first record.
    pub fn before_first(&mut self) -> Result<(), ExecError> {
        dispatch!(self, s => s.before_first())
    }

    /// Moves to the next record. Returns `false` once the input is exhausted.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<bool, ExecError> {
        dispatch!(self, s => s.next())
    }

    pub fn get_val(&self, field: &str) -> Result<Constant, ExecError> {
        dispatch!(self, s => s.get_val(field))
    }

    pub fn get_int(&self, field: &str) -> Result<i32, ExecError> {
        let val = self.get_val(field)?;
        val.as_int().ok_or_else(|| ExecError::TypeMismatch {
            expected: "int".to_string(),
            found: val.type_name().to_string(),
        })
    }

    pub fn get_string(&self, field: &str) -> Result<String, ExecError> {
        match self.get_val(field)? {
            Constant::Str(s) => Ok(s),
            other => Err(ExecError::TypeMismatch {
                expected: "varchar".to_string(),
                found: other.type_name().to_string(),
            }),
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        dispatch!(self, s => s.has_field(field))
    }

    /// Closes the scan and everything it owns.
    pub fn close(&mut self) {
        dispatch!(self, s => s.close())
    }

    // ==================== Update operations ====================
    //
    // Only table scans, and selections over them, can be updated.

    fn updatable(&mut self) -> Result<&mut TableScan, ExecError> {
        match self {
            Scan::Table(ts) => Ok(ts),
            Scan::Select(s) => s.input_mut().updatable(),
            _ => Err(ExecError::NotUpdatable),
        }
    }

    pub fn set_val(&mut self, field: &str, value: &Constant) -> Result<(), ExecError> {
        self.updatable()?.set_val(field, value)
    }

    pub fn insert(&mut self) -> Result<(), ExecError> {
        self.updatable()?.insert()
    }

    pub fn delete(&mut self) -> Result<(), ExecError> {
        self.updatable()?.delete()
    }

    pub fn rid(&mut self) -> Result<Rid, ExecError> {
        self.updatable()?.rid()
    }

    pub fn move_to_rid(&mut self, rid: Rid) -> Result<(), ExecError> {
        self.updatable()?.move_to_rid(rid)
    }
}

impl FieldSource for Scan {
    fn get_val(&self, field: &str) -> Result<Constant, ExecError> {
        Scan::get_val(self, field)
    }

    fn has_field(&self, field: &str) -> bool {
        Scan::has_field(self, field)
    }
}

impl FieldSource for TableScan {
    fn get_val(&self, field: &str) -> Result<Constant, ExecError> {
        TableScan::get_val(self, field)
    }

    fn has_field(&self, field: &str) -> bool {
        TableScan::has_field(self, field)
    }
}

/// Reads `field` from whichever of two scans declares it, `left` first.
pub(crate) fn get_from_either(
    left: &Scan,
    right: &Scan,
    field: &str,
) -> Result<Constant, ExecError> {
    if left.has_field(field) {
        left.get_val(field)
    } else if right.has_field(field) {
        right.get_val(field)
    } else {
        Err(ExecError::FieldNotFound(field.to_string()))
    }
}

/// Copies every field of `fields` from the current record of `src` into a
/// newly inserted record of `dest`.
pub(crate) fn copy_record<S: FieldSource + ?Sized>(
    src: &S,
    dest: &mut TableScan,
    fields: &[String],
) -> Result<(), ExecError> {
    dest.insert()?;
    for field in fields {
        dest.set_val(field, &src.get_val(field)?)?;
    }
    Ok(())
}
