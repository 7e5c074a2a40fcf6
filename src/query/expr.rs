//! Expressions and the field-access contract they are evaluated against.

use std::fmt;

use super::constant::Constant;
use super::error::ExecError;
use crate::record::Schema;

/// Anything that can answer field lookups for the current record.
///
/// Implemented by [`Scan`](crate::scan::Scan) and by the individual scans,
/// so that terms and aggregation functions can read from any of them.
pub trait FieldSource {
    fn get_val(&self, field: &str) -> Result<Constant, ExecError>;

    fn has_field(&self, field: &str) -> bool;
}

/// Either a field reference or a literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expression {
    Field(String),
    Constant(Constant),
}

impl Expression {
    pub fn field(name: impl Into<String>) -> Self {
        Expression::Field(name.into())
    }

    pub fn constant(value: impl Into<Constant>) -> Self {
        Expression::Constant(value.into())
    }

    pub fn as_field(&self) -> Option<&str> {
        match self {
            Expression::Field(name) => Some(name.as_str()),
            Expression::Constant(_) => None,
        }
    }

    pub fn as_constant(&self) -> Option<&Constant> {
        match self {
            Expression::Field(_) => None,
            Expression::Constant(c) => Some(c),
        }
    }

    pub fn evaluate<S: FieldSource + ?Sized>(&self, source: &S) -> Result<Constant, ExecError> {
        match self {
            Expression::Field(name) => source.get_val(name),
            Expression::Constant(c) => Ok(c.clone()),
        }
    }

    /// Whether every field the expression mentions is in `schema`.
    pub fn applies_to(&self, schema: &Schema) -> bool {
        match self {
            Expression::Field(name) => schema.has_field(name),
            Expression::Constant(_) => true,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Field(name) => f.write_str(name),
            Expression::Constant(c) => write!(f, "{c}"),
        }
    }
}
