//! Comparison operators.

use std::cmp::Ordering;
use std::fmt;

/// A comparison operator of a term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `=`
    Eq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,
    /// `<>`
    Neq,
    /// `!=`
    BangEq,
}

impl Operator {
    /// Parses an operator from its source text, e.g. `"<="`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "=" => Some(Operator::Eq),
            "<" => Some(Operator::Lt),
            ">" => Some(Operator::Gt),
            "<=" => Some(Operator::LtEq),
            ">=" => Some(Operator::GtEq),
            "<>" => Some(Operator::Neq),
            "!=" => Some(Operator::BangEq),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::LtEq => "<=",
            Operator::GtEq => ">=",
            Operator::Neq => "<>",
            Operator::BangEq => "!=",
        }
    }

    /// `=`: the only operator index selects and equi-joins can use.
    pub fn is_equality(&self) -> bool {
        matches!(self, Operator::Eq)
    }

    /// `<`, `>`, `<=`, `>=`.
    pub fn is_inequality(&self) -> bool {
        matches!(
            self,
            Operator::Lt | Operator::Gt | Operator::LtEq | Operator::GtEq
        )
    }

    /// `<>` and `!=`.
    pub fn is_non_equal(&self) -> bool {
        matches!(self, Operator::Neq | Operator::BangEq)
    }

    /// Whether `lhs op rhs` holds given `lhs.cmp(rhs)`.
    pub fn holds(&self, ord: Ordering) -> bool {
        match self {
            Operator::Eq => ord == Ordering::Equal,
            Operator::Lt => ord == Ordering::Less,
            Operator::Gt => ord == Ordering::Greater,
            Operator::LtEq => ord != Ordering::Greater,
            Operator::GtEq => ord != Ordering::Less,
            Operator::Neq | Operator::BangEq => ord != Ordering::Equal,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
