//! Constants: the values stored in fields and produced by expressions.

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::error::ExecError;

/// A field value: either a 32-bit integer or a string.
///
/// The derived `Ord` is total (integers sort before strings) so constants can
/// key B-tree indexes. Query semantics use [`Constant::try_cmp`] instead,
/// which refuses to compare an integer with a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Constant {
    Int(i32),
    Str(String),
}

impl Constant {
    /// Returns the integer value, if this is an integer constant.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Constant::Int(v) => Some(*v),
            Constant::Str(_) => None,
        }
    }

    /// Returns the string value, if this is a string constant.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Constant::Int(_) => None,
            Constant::Str(s) => Some(s),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Constant::Int(_) => "int",
            Constant::Str(_) => "varchar",
        }
    }

    /// Compares two constants of the same kind.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::TypeMismatch`] when one side is an integer and the
    /// other a string.
    pub fn try_cmp(&self, other: &Constant) -> Result<Ordering, ExecError> {
        match (self, other) {
            (Constant::Int(a), Constant::Int(b)) => Ok(a.cmp(b)),
            (Constant::Str(a), Constant::Str(b)) => Ok(a.cmp(b)),
            _ => Err(ExecError::TypeMismatch {
                expected: self.type_name().to_string(),
                found: other.type_name().to_string(),
            }),
        }
    }

    /// Maps this constant to one of `buckets` partitions.
    ///
    /// Equal constants always land in the same bucket.
    pub fn bucket(&self, buckets: usize) -> usize {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        (hasher.finish() % buckets.max(1) as u64) as usize
    }
}

impl From<i32> for Constant {
    fn from(v: i32) -> Self {
        Constant::Int(v)
    }
}

impl From<&str> for Constant {
    fn from(s: &str) -> Self {
        Constant::Str(s.to_string())
    }
}

impl From<String> for Constant {
    fn from(s: String) -> Self {
        Constant::Str(s)
    }
}

/// Formats the constant as a SQL literal (strings are single-quoted).
impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(v) => write!(f, "{v}"),
            Constant::Str(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}
