//! Execution errors.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::sql::SyntaxError;
use crate::storage::StorageError;
use crate::tx::TxError;

/// Errors raised while planning or running a statement.
#[derive(Debug, Error)]
pub enum ExecError {
    /// A scan was asked for a field it does not own.
    #[error("field \"{0}\" not found")]
    FieldNotFound(String),

    /// A value of the wrong kind was compared, stored or aggregated.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// A string is longer than its field's declared length.
    #[error("value for field \"{field}\" exceeds its length of {max}")]
    ValueTooLong { field: String, max: usize },

    /// A field accessor was called while the scan is not on a record.
    #[error("scan is not positioned on a record")]
    NoCurrentRecord,

    /// A write was attempted through a scan that cannot be updated.
    #[error("scan is not updatable")]
    NotUpdatable,

    /// Integer arithmetic overflowed while computing the named value.
    #[error("integer overflow in {0}")]
    IntegerOverflow(String),

    /// An insert listed a different number of fields and values.
    #[error("{fields} fields but {values} values")]
    ArityMismatch { fields: usize, values: usize },

    /// The query cannot be turned into a plan.
    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Tx(#[from] TxError),

    /// A stored view definition no longer parses.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}
