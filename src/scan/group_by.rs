//! Grouping and aggregation over sorted input.

use crate::query::{AggregationFn, Constant, ExecError};

use super::Scan;

/// Produces one record per group of adjacent input records that agree on
/// the group fields.
///
/// Each output record carries the group field values and the value of every
/// aggregation function over the group. With no group fields the whole input
/// is one group, and an empty input produces no record.
pub struct GroupByScan {
    input: Box<Scan>,
    group_fields: Vec<String>,
    aggregates: Vec<Box<dyn AggregationFn>>,
    /// Group field values of the current output record.
    group_val: Option<Vec<Constant>>,
    /// Whether the input sits on the first record of a group not yet read.
    more_groups: bool,
}

impl GroupByScan {
    pub fn new(
        input: Scan,
        group_fields: Vec<String>,
        aggregates: Vec<Box<dyn AggregationFn>>,
    ) -> Result<Self, ExecError> {
        let mut scan = Self {
            input: Box::new(input),
            group_fields,
            aggregates,
            group_val: None,
            more_groups: false,
        };
        scan.before_first()?;
        Ok(scan)
    }

    fn current_group(&self) -> Result<Vec<Constant>, ExecError> {
        self.group_fields
            .iter()
            .map(|f| self.input.get_val(f))
            .collect()
    }

    pub fn before_first(&mut self) -> Result<(), ExecError> {
        self.group_val = None;
        self.input.before_first()?;
        self.more_groups = self.input.next()?;
        Ok(())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<bool, ExecError> {
        if !self.more_groups {
            self.group_val = None;
            return Ok(false);
        }
        for agg in &mut self.aggregates {
            agg.process_first(self.input.as_ref())?;
        }
        let group = self.current_group()?;
        loop {
            self.more_groups = self.input.next()?;
            if !self.more_groups || self.current_group()? != group {
                break;
            }
            for agg in &mut self.aggregates {
                agg.process_next(self.input.as_ref())?;
            }
        }
        self.group_val = Some(group);
        Ok(true)
    }

    pub fn get_val(&self, field: &str) -> Result<Constant, ExecError> {
        let Some(group) = &self.group_val else {
            return Err(ExecError::NoCurrentRecord);
        };
        if let Some(i) = self.group_fields.iter().position(|f| f == field) {
            return Ok(group[i].clone());
        }
        self.aggregates
            .iter()
            .find(|agg| agg.field_name() == field)
            .map(|agg| agg.value())
            .ok_or_else(|| ExecError::FieldNotFound(field.to_string()))
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.group_fields.iter().any(|f| f == field)
            || self.aggregates.iter().any(|agg| agg.field_name() == field)
    }

    pub fn close(&mut self) {
        self.more_groups = false;
        self.group_val = None;
        self.input.close();
    }
}
