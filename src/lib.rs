pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod opt;
pub mod plan;
pub mod planner;
pub mod query;
pub mod record;
pub mod scan;
pub mod sql;
pub mod storage;
pub mod tx;

pub use config::{ConfigError, DbConfig};
pub use db::Database;
pub use error::DbError;
pub use planner::{Planner, StatementResult};
