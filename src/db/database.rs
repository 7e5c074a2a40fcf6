use std::sync::Arc;

use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::config::DbConfig;
use crate::error::DbError;
use crate::plan::Plan;
use crate::planner::{Planner, StatementResult};
use crate::storage::MemoryStorage;
use crate::tx::{Transaction, TransactionManager};

/// An in-memory database: storage, catalog and the planner that runs
/// statements against them.
///
/// Statements run inside a [`Transaction`] obtained from [`Database::new_tx`].
pub struct Database {
    config: Arc<DbConfig>,
    storage: Arc<MemoryStorage>,
    tx_manager: Arc<TransactionManager>,
    catalog: Arc<Catalog>,
    planner: Planner,
}

impl Database {
    /// Creates an empty database that plans queries by cost.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if `config` fails validation.
    pub fn new(config: DbConfig) -> Result<Self, DbError> {
        Self::with_planner(config, Planner::heuristic)
    }

    /// Creates an empty database whose planner is built by `make_planner`
    /// from the database's catalog.
    pub fn with_planner<F>(config: DbConfig, make_planner: F) -> Result<Self, DbError>
    where
        F: FnOnce(Arc<Catalog>) -> Planner,
    {
        config.validate()?;
        let storage = match config.max_blocks {
            Some(max) => MemoryStorage::with_max_blocks(config.block_size, max),
            None => MemoryStorage::new(config.block_size),
        };
        let catalog = Arc::new(Catalog::new(config.hash_index_buckets));
        info!(
            block_size = config.block_size,
            buffers = config.buffer_count,
            "database created"
        );
        Ok(Self {
            config: Arc::new(config),
            storage: Arc::new(storage),
            tx_manager: Arc::new(TransactionManager::new()),
            planner: make_planner(Arc::clone(&catalog)),
            catalog,
        })
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn storage(&self) -> &Arc<MemoryStorage> {
        &self.storage
    }

    pub fn planner(&self) -> &Planner {
        &self.planner
    }

    /// Begins a transaction.
    pub fn new_tx(&self) -> Transaction {
        Transaction::begin(
            Arc::clone(&self.tx_manager),
            Arc::clone(&self.storage),
            Arc::clone(&self.config),
        )
    }

    /// Runs one statement in `tx`.
    pub fn execute(&self, tx: &Transaction, sql: &str) -> Result<StatementResult, DbError> {
        debug!(txid = %tx.id(), sql, "execute");
        self.planner.execute(tx, sql)
    }

    /// Runs an update statement in `tx` and returns the rows affected.
    pub fn execute_update(&self, tx: &Transaction, sql: &str) -> Result<usize, DbError> {
        debug!(txid = %tx.id(), sql, "execute update");
        self.planner.execute_update(tx, sql)
    }

    /// Plans a select statement without running it.
    pub fn query_plan(&self, tx: &Transaction, sql: &str) -> Result<Plan, DbError> {
        self.planner.create_query_plan(tx, sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = DbConfig::default().with_buffer_count(0);
        assert!(matches!(Database::new(config), Err(DbError::Config(_))));
    }

    #[test]
    fn test_statements_share_catalog() {
        let db = Database::new(DbConfig::default()).unwrap();
        let tx = db.new_tx();
        db.execute_update(&tx, "create table t (a int, b varchar(3))")
            .unwrap();
        db.execute_update(&tx, "insert into t (a, b) values (1, 'x')")
            .unwrap();
        assert!(db.catalog().has_table("t"));
        assert!(db.storage().file_exists("t"));

        let plan = db.query_plan(&tx, "select b from t").unwrap();
        assert_eq!(plan.records_output(), 1);
        tx.commit().unwrap();
    }

    #[test]
    fn test_basic_planner_database() {
        let db = Database::with_planner(DbConfig::default(), Planner::basic).unwrap();
        let tx = db.new_tx();
        db.execute_update(&tx, "create table t (a int)").unwrap();
        let StatementResult::Query { mut scan, .. } = db.execute(&tx, "select a from t").unwrap()
        else {
            panic!("expected a query result");
        };
        assert!(!scan.next().unwrap());
        scan.close();
    }
}
