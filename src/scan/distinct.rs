//! Duplicate elimination over sorted input.

use crate::query::{Constant, ExecError};

use super::Scan;

/// Skips records equal on every field to the record returned before them.
///
/// The input must be sorted on those fields so that duplicates are
/// adjacent.
pub struct DistinctScan {
    input: Box<Scan>,
    fields: Vec<String>,
    /// Field values of the last record returned.
    prev: Option<Vec<Constant>>,
}

impl DistinctScan {
    pub fn new(input: Scan, fields: Vec<String>) -> Self {
        Self {
            input: Box::new(input),
            fields,
            prev: None,
        }
    }

    pub fn before_first(&mut self) -> Result<(), ExecError> {
        self.prev = None;
        self.input.before_first()
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<bool, ExecError> {
        while self.input.next()? {
            let values = self
                .fields
                .iter()
                .map(|f| self.input.get_val(f))
                .collect::<Result<Vec<_>, _>>()?;
            if self.prev.as_ref() != Some(&values) {
                self.prev = Some(values);
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn get_val(&self, field: &str) -> Result<Constant, ExecError> {
        self.input.get_val(field)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.input.has_field(field)
    }

    pub fn close(&mut self) {
        self.prev = None;
        self.input.close();
    }
}
