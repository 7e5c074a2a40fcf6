//! Index-driven selection and join.

use crate::catalog::Index;
use crate::query::{Constant, ExecError};
use crate::record::{Rid, TableScan};

use super::Scan;

/// Returns the records of a table whose indexed field equals a constant.
pub struct IndexSelectScan {
    table: TableScan,
    index: Index,
    key: Constant,
    /// Matches of `key`; searched on the first `next` after `before_first`.
    rids: Option<Vec<Rid>>,
    pos: usize,
}

impl IndexSelectScan {
    pub fn new(table: TableScan, index: Index, key: Constant) -> Self {
        Self {
            table,
            index,
            key,
            rids: None,
            pos: 0,
        }
    }

    pub fn before_first(&mut self) -> Result<(), ExecError> {
        self.rids = None;
        self.pos = 0;
        Ok(())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<bool, ExecError> {
        if self.rids.is_none() {
            self.rids = Some(self.index.lookup(&self.key)?);
        }
        let Some(rid) = self.rids.as_ref().and_then(|r| r.get(self.pos)).copied() else {
            return Ok(false);
        };
        self.pos += 1;
        self.table.move_to_rid(rid)?;
        Ok(true)
    }

    pub fn get_val(&self, field: &str) -> Result<Constant, ExecError> {
        self.table.get_val(field)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.table.has_field(field)
    }

    pub fn close(&mut self) {
        self.rids = Some(Vec::new());
        self.pos = 0;
        self.table.close();
    }
}

/// For each outer record, looks up the inner table records whose indexed
/// field equals the outer join field.
pub struct IndexJoinScan {
    outer: Box<Scan>,
    table: TableScan,
    index: Index,
    join_field: String,
    /// Matches of the bound outer record; `None` while no record is bound.
    rids: Option<Vec<Rid>>,
    pos: usize,
    exhausted: bool,
}

impl IndexJoinScan {
    pub fn new(
        outer: Scan,
        table: TableScan,
        index: Index,
        join_field: String,
    ) -> Result<Self, ExecError> {
        let mut scan = Self {
            outer: Box::new(outer),
            table,
            index,
            join_field,
            rids: None,
            pos: 0,
            exhausted: false,
        };
        scan.before_first()?;
        Ok(scan)
    }

    pub fn before_first(&mut self) -> Result<(), ExecError> {
        self.rids = None;
        self.pos = 0;
        self.exhausted = false;
        self.outer.before_first()
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<bool, ExecError> {
        while !self.exhausted {
            if let Some(rid) = self.rids.as_ref().and_then(|r| r.get(self.pos)).copied() {
                self.pos += 1;
                self.table.move_to_rid(rid)?;
                return Ok(true);
            }
            if !self.outer.next()? {
                self.exhausted = true;
                self.rids = None;
                break;
            }
            let key = self.outer.get_val(&self.join_field)?;
            self.rids = Some(self.index.lookup(&key)?);
            self.pos = 0;
        }
        Ok(false)
    }

    pub fn get_val(&self, field: &str) -> Result<Constant, ExecError> {
        if self.table.has_field(field) {
            self.table.get_val(field)
        } else {
            self.outer.get_val(field)
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.table.has_field(field) || self.outer.has_field(field)
    }

    pub fn close(&mut self) {
        self.exhausted = true;
        self.rids = None;
        self.outer.close();
        self.table.close();
    }
}
