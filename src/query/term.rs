//! Terms: `expression operator expression`.

use std::fmt;

use super::constant::Constant;
use super::error::ExecError;
use super::expr::{Expression, FieldSource};
use super::operator::Operator;
use crate::plan::Plan;
use crate::record::Schema;

/// Reduction factor assumed for `<`, `>`, `<=` and `>=`.
const INEQUALITY_REDUCTION: u64 = 3;

/// A comparison between two expressions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Term {
    pub lhs: Expression,
    pub op: Operator,
    pub rhs: Expression,
}

impl Term {
    pub fn new(lhs: Expression, op: Operator, rhs: Expression) -> Self {
        Self { lhs, op, rhs }
    }

    /// Shorthand for the equality term `lhs = rhs`.
    pub fn equality(lhs: Expression, rhs: Expression) -> Self {
        Self::new(lhs, Operator::Eq, rhs)
    }

    fn compare(&self, lhs: &Constant, rhs: &Constant) -> Result<bool, ExecError> {
        Ok(self.op.holds(lhs.try_cmp(rhs)?))
    }

    /// Evaluates the term against the current record of one scan.
    pub fn is_satisfied<S: FieldSource + ?Sized>(&self, s: &S) -> Result<bool, ExecError> {
        let lhs = self.lhs.evaluate(s)?;
        let rhs = self.rhs.evaluate(s)?;
        self.compare(&lhs, &rhs)
    }

    /// Evaluates the term across two scans. Each field is read from the scan
    /// that owns it, checking `s1` first.
    pub fn is_satisfied_pair<A, B>(&self, s1: &A, s2: &B) -> Result<bool, ExecError>
    where
        A: FieldSource + ?Sized,
        B: FieldSource + ?Sized,
    {
        let lhs = evaluate_pair(&self.lhs, s1, s2)?;
        let rhs = evaluate_pair(&self.rhs, s1, s2)?;
        self.compare(&lhs, &rhs)
    }

    /// How many times smaller the output of `plan` gets when filtered by
    /// this term.
    ///
    /// Equality uses the distinct-value counts of the fields involved.
    /// Range comparisons are assumed to keep a third of the records and
    /// `<>` to keep nearly all of them. A term over two constants keeps
    /// everything or nothing.
    pub fn reduction_factor(&self, plan: &Plan) -> u64 {
        if let (Some(a), Some(b)) = (self.lhs.as_constant(), self.rhs.as_constant()) {
            return match self.compare(a, b) {
                Ok(true) => 1,
                _ => u64::MAX,
            };
        }
        if self.op.is_inequality() {
            return INEQUALITY_REDUCTION;
        }
        if self.op.is_non_equal() {
            return 1;
        }
        match (self.lhs.as_field(), self.rhs.as_field()) {
            (Some(l), Some(r)) => plan.distinct_values(l).max(plan.distinct_values(r)),
            (Some(f), None) | (None, Some(f)) => plan.distinct_values(f),
            (None, None) => 1,
        }
    }

    /// If this is `field = c` (or `c = field`), returns `c`.
    pub fn equates_with_constant(&self, field: &str) -> Option<&Constant> {
        if !self.op.is_equality() {
            return None;
        }
        match (&self.lhs, &self.rhs) {
            (Expression::Field(f), Expression::Constant(c))
            | (Expression::Constant(c), Expression::Field(f))
                if f == field =>
            {
                Some(c)
            }
            _ => None,
        }
    }

    /// If this is `field = other` (or `other = field`), returns `other`.
    pub fn equates_with_field(&self, field: &str) -> Option<&str> {
        if !self.op.is_equality() {
            return None;
        }
        match (&self.lhs, &self.rhs) {
            (Expression::Field(a), Expression::Field(b)) if a == field => Some(b.as_str()),
            (Expression::Field(a), Expression::Field(b)) if b == field => Some(a.as_str()),
            _ => None,
        }
    }

    /// Whether both sides only mention fields of `schema`.
    pub fn applies_to(&self, schema: &Schema) -> bool {
        self.lhs.applies_to(schema) && self.rhs.applies_to(schema)
    }

    /// Field names mentioned by the term.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.lhs.as_field().into_iter().chain(self.rhs.as_field())
    }
}

fn evaluate_pair<A, B>(expr: &Expression, s1: &A, s2: &B) -> Result<Constant, ExecError>
where
    A: FieldSource + ?Sized,
    B: FieldSource + ?Sized,
{
    match expr {
        Expression::Field(name) if s1.has_field(name) => s1.get_val(name),
        Expression::Field(name) => s2.get_val(name),
        Expression::Constant(c) => Ok(c.clone()),
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.op, self.rhs)
    }
}
