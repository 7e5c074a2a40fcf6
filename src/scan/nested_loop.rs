//! Nested-loop join.

use std::cmp::Ordering;

use crate::query::{Constant, ExecError, Predicate};

use super::{get_from_either, Scan};

/// When an outer record matches an inner one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinCondition {
    /// Every term holds across the pair of records.
    Predicate(Predicate),
    /// `outer.outer == inner.inner`.
    Fields { outer: String, inner: String },
}

impl JoinCondition {
    fn matches(&self, outer: &Scan, inner: &Scan) -> Result<bool, ExecError> {
        match self {
            JoinCondition::Predicate(pred) => pred.is_satisfied_pair(outer, inner),
            JoinCondition::Fields {
                outer: outer_field,
                inner: inner_field,
            } => {
                let lhs = outer.get_val(outer_field)?;
                let rhs = inner.get_val(inner_field)?;
                Ok(lhs.try_cmp(&rhs)? == Ordering::Equal)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    /// No outer record is bound; the next call advances the outer scan.
    Unbound,
    /// An outer record is bound and the inner scan is being probed.
    Probing,
    /// The outer scan is exhausted.
    Exhausted,
}

/// Joins two scans by rescanning the inner scan for each outer record.
///
/// After a match, the next call keeps probing the inner scan against the
/// same outer record. The outer scan only moves once the inner scan is
/// exhausted.
pub struct NestedLoopJoinScan {
    outer: Box<Scan>,
    inner: Box<Scan>,
    condition: JoinCondition,
    state: LoopState,
}

impl NestedLoopJoinScan {
    pub fn new(outer: Scan, inner: Scan, condition: JoinCondition) -> Result<Self, ExecError> {
        let mut scan = Self {
            outer: Box::new(outer),
            inner: Box::new(inner),
            condition,
            state: LoopState::Unbound,
        };
        scan.before_first()?;
        Ok(scan)
    }

    pub fn before_first(&mut self) -> Result<(), ExecError> {
        self.outer.before_first()?;
        self.state = LoopState::Unbound;
        Ok(())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<bool, ExecError> {
        loop {
            match self.state {
                LoopState::Exhausted => return Ok(false),
                LoopState::Unbound => {
                    if !self.outer.next()? {
                        self.state = LoopState::Exhausted;
                        return Ok(false);
                    }
                    self.inner.before_first()?;
                    self.state = LoopState::Probing;
                }
                LoopState::Probing => {
                    while self.inner.next()? {
                        if self.condition.matches(&self.outer, &self.inner)? {
                            return Ok(true);
                        }
                    }
                    self.state = LoopState::Unbound;
                }
            }
        }
    }

    pub fn get_val(&self, field: &str) -> Result<Constant, ExecError> {
        if self.state != LoopState::Probing {
            return Err(ExecError::NoCurrentRecord);
        }
        get_from_either(&self.outer, &self.inner, field)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.outer.has_field(field) || self.inner.has_field(field)
    }

    pub fn close(&mut self) {
        self.state = LoopState::Exhausted;
        self.outer.close();
        self.inner.close();
    }
}
