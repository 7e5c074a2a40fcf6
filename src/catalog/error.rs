//! Catalog-specific errors.

use thiserror::Error;

/// Errors that can occur during catalog operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("table \"{name}\" does not exist")]
    TableNotFound { name: String },

    #[error("table \"{name}\" already exists")]
    TableAlreadyExists { name: String },

    #[error("view \"{name}\" already exists")]
    ViewAlreadyExists { name: String },

    #[error("index \"{name}\" already exists")]
    IndexAlreadyExists { name: String },

    /// A column list named a field the table does not have.
    #[error("column \"{field}\" of table \"{table}\" does not exist")]
    FieldNotFound { table: String, field: String },
}
