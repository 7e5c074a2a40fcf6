//! Sort-merge join.

use std::cmp::Ordering;

use crate::query::{Constant, ExecError};

use super::sort::{SortPosition, SortScan};

/// Joins two inputs sorted ascending on their join fields.
///
/// For each group of equal keys the right scan position at the start of the
/// group is saved. Every further left record with the same key rewinds the
/// right scan to it, so equal-key groups produce their full cross product.
pub struct MergeJoinScan {
    left: SortScan,
    right: SortScan,
    left_field: String,
    right_field: String,
    /// Key of the group being joined and where it starts on the right.
    group: Option<(Constant, SortPosition)>,
}

impl MergeJoinScan {
    pub fn new(
        left: SortScan,
        right: SortScan,
        left_field: String,
        right_field: String,
    ) -> Result<Self, ExecError> {
        let mut scan = Self {
            left,
            right,
            left_field,
            right_field,
            group: None,
        };
        scan.before_first()?;
        Ok(scan)
    }

    pub fn before_first(&mut self) -> Result<(), ExecError> {
        self.group = None;
        self.left.before_first()?;
        self.right.before_first()
    }

    fn in_group(&self, value: &Constant) -> Result<bool, ExecError> {
        match &self.group {
            Some((key, _)) => Ok(value.try_cmp(key)? == Ordering::Equal),
            None => Ok(false),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<bool, ExecError> {
        let mut right_more = self.right.next()?;
        if right_more && self.in_group(&self.right.get_val(&self.right_field)?)? {
            return Ok(true);
        }

        let mut left_more = self.left.next()?;
        if left_more && self.in_group(&self.left.get_val(&self.left_field)?)? {
            if let Some((_, start)) = &self.group {
                self.right.restore_position(start)?;
            }
            return Ok(true);
        }

        while left_more && right_more {
            let lhs = self.left.get_val(&self.left_field)?;
            let rhs = self.right.get_val(&self.right_field)?;
            match lhs.try_cmp(&rhs)? {
                Ordering::Less => left_more = self.left.next()?,
                Ordering::Greater => right_more = self.right.next()?,
                Ordering::Equal => {
                    self.group = Some((rhs, self.right.save_position()?));
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    pub fn get_val(&self, field: &str) -> Result<Constant, ExecError> {
        if self.left.has_field(field) {
            self.left.get_val(field)
        } else if self.right.has_field(field) {
            self.right.get_val(field)
        } else {
            Err(ExecError::FieldNotFound(field.to_string()))
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.left.has_field(field) || self.right.has_field(field)
    }

    pub fn close(&mut self) {
        self.group = None;
        self.left.close();
        self.right.close();
    }
}
