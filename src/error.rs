//! Errors returned to callers of [`Database`](crate::db::Database) and
//! [`Planner`](crate::planner::Planner).

use thiserror::Error;

use crate::config::ConfigError;
use crate::query::ExecError;
use crate::sql::SyntaxError;

/// A statement failed. Nothing it would have changed has been applied.
#[derive(Debug, Error)]
pub enum DbError {
    /// The statement text does not parse.
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    /// The statement parsed but could not be planned or run.
    #[error(transparent)]
    Execution(#[from] ExecError),

    /// The database was opened with an unusable configuration.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}
