//! Statement planning and execution.
//!
//! The [`Planner`] parses a statement and hands it to the right planner:
//!
//! ```text
//!                  +-------------------+
//!   SQL text  ---> |      Parser       |
//!                  +---------+---------+
//!                            |
//!             select         |        insert / delete / update / create
//!        +-------------------+--------------------+
//!        v                                        v
//! +----------------+                    +--------------------+
//! | QueryPlanner   |                    | IndexUpdatePlanner |
//! | (basic or      |                    | (rows + indexes)   |
//! |  heuristic)    |                    +--------------------+
//! +-------+--------+
//!         |  Plan
//!         v
//!   Plan::open -> Scan
//! ```

mod basic;
pub(crate) mod pipeline;
mod update;

pub use basic::BasicQueryPlanner;
pub use update::IndexUpdatePlanner;

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::catalog::Catalog;
use crate::error::DbError;
use crate::opt::HeuristicQueryPlanner;
use crate::plan::Plan;
use crate::query::ExecError;
use crate::record::Schema;
use crate::scan::Scan;
use crate::sql::{Parser, QueryData, Statement};
use crate::tx::Transaction;

/// Turns a parsed select statement into a plan.
pub trait QueryPlanner: Send + Sync {
    fn create_plan(&self, tx: &Transaction, data: &QueryData) -> Result<Plan, ExecError>;
}

/// Outcome of one statement.
pub enum StatementResult {
    /// An open scan over the rows of a select, positioned before the first.
    Query { schema: Schema, scan: Scan },
    /// Rows affected by an update statement.
    Update(usize),
}

impl fmt::Debug for StatementResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementResult::Query { schema, .. } => {
                f.debug_struct("Query").field("schema", schema).finish()
            }
            StatementResult::Update(count) => f.debug_tuple("Update").field(count).finish(),
        }
    }
}

/// Runs SQL statements against one catalog.
pub struct Planner {
    query_planner: Box<dyn QueryPlanner>,
    update_planner: IndexUpdatePlanner,
}

impl Planner {
    pub fn new(query_planner: Box<dyn QueryPlanner>, update_planner: IndexUpdatePlanner) -> Self {
        Self {
            query_planner,
            update_planner,
        }
    }

    /// A planner that picks join strategies by cost.
    pub fn heuristic(catalog: Arc<Catalog>) -> Self {
        Self::new(
            Box::new(HeuristicQueryPlanner::new(Arc::clone(&catalog))),
            IndexUpdatePlanner::new(catalog),
        )
    }

    /// A planner that joins tables with plain products.
    pub fn basic(catalog: Arc<Catalog>) -> Self {
        Self::new(
            Box::new(BasicQueryPlanner::new(Arc::clone(&catalog))),
            IndexUpdatePlanner::new(catalog),
        )
    }

    /// Plans a select statement.
    pub fn create_query_plan(&self, tx: &Transaction, sql: &str) -> Result<Plan, DbError> {
        let data = Parser::new(sql).parse_query()?;
        Ok(self.plan_query(tx, &data)?)
    }

    /// Runs an insert, delete, update or create statement and returns the
    /// number of rows affected.
    pub fn execute_update(&self, tx: &Transaction, sql: &str) -> Result<usize, DbError> {
        match parse(sql)? {
            Statement::Query(_) => Err(ExecError::InvalidPlan(
                "expected an update statement, found a query".to_string(),
            )
            .into()),
            stmt => Ok(self.apply_update(tx, stmt)?),
        }
    }

    /// Runs any statement.
    pub fn execute(&self, tx: &Transaction, sql: &str) -> Result<StatementResult, DbError> {
        match parse(sql)? {
            Statement::Query(data) => {
                let plan = self.plan_query(tx, &data)?;
                let schema = plan.schema().clone();
                let scan = plan.open(tx)?;
                Ok(StatementResult::Query { schema, scan })
            }
            stmt => Ok(StatementResult::Update(self.apply_update(tx, stmt)?)),
        }
    }

    fn plan_query(&self, tx: &Transaction, data: &QueryData) -> Result<Plan, ExecError> {
        let plan = self.query_planner.create_plan(tx, data)?;
        debug!(query = %data, plan = %plan.explain(), "planned query");
        Ok(plan)
    }

    fn apply_update(&self, tx: &Transaction, stmt: Statement) -> Result<usize, ExecError> {
        let updates = &self.update_planner;
        match stmt {
            Statement::Insert(data) => updates.execute_insert(tx, &data),
            Statement::Delete(data) => updates.execute_delete(tx, &data),
            Statement::Modify(data) => updates.execute_modify(tx, &data),
            Statement::CreateTable(data) => updates.execute_create_table(&data),
            Statement::CreateView(data) => {
                // The view's query must plan now; this also rejects a view
                // that names itself.
                self.plan_query(tx, &data.query)?;
                updates.execute_create_view(&data)
            }
            Statement::CreateIndex(data) => updates.execute_create_index(tx, &data),
            Statement::Query(_) => Err(ExecError::InvalidPlan(
                "expected an update statement, found a query".to_string(),
            )),
        }
    }
}

fn parse(sql: &str) -> Result<Statement, DbError> {
    Parser::new(sql)
        .parse()?
        .ok_or_else(|| ExecError::InvalidPlan("empty statement".to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::table_scan::tests::test_tx;

    fn planner() -> (Transaction, Planner) {
        let tx = test_tx(64);
        let planner = Planner::heuristic(Arc::new(Catalog::new(4)));
        for sql in [
            "create table a (x int)",
            "insert into a (x) values (1)",
            "insert into a (x) values (2)",
            "insert into a (x) values (2)",
            "insert into a (x) values (3)",
        ] {
            planner.execute_update(&tx, sql).unwrap();
        }
        (tx, planner)
    }

    fn ints(result: StatementResult, field: &str) -> Vec<i32> {
        let StatementResult::Query { mut scan, .. } = result else {
            panic!("expected a query result");
        };
        let mut values = Vec::new();
        while scan.next().unwrap() {
            values.push(scan.get_int(field).unwrap());
        }
        scan.close();
        values
    }

    #[test]
    fn test_execute_dispatches_on_statement() {
        let (tx, planner) = planner();
        let result = planner.execute(&tx, "select x from a where x = 2 order by x");
        assert_eq!(ints(result.unwrap(), "x"), vec![2, 2]);

        let result = planner.execute(&tx, "delete from a where x = 2").unwrap();
        assert!(matches!(result, StatementResult::Update(2)));

        let result = planner.execute(&tx, "select distinct x from a").unwrap();
        let StatementResult::Query { schema, .. } = &result else {
            panic!("expected a query result");
        };
        assert_eq!(schema.fields(), ["x".to_string()]);
        assert_eq!(ints(result, "x"), vec![1, 3]);
    }

    #[test]
    fn test_statement_kind_errors() {
        let (tx, planner) = planner();
        assert!(matches!(
            planner.execute_update(&tx, "select x from a"),
            Err(DbError::Execution(ExecError::InvalidPlan(_)))
        ));
        assert!(matches!(
            planner.create_query_plan(&tx, "delete from a"),
            Err(DbError::Syntax(_))
        ));
        assert!(matches!(
            planner.execute(&tx, "  "),
            Err(DbError::Execution(ExecError::InvalidPlan(_)))
        ));
        assert!(matches!(
            planner.execute(&tx, "select from a"),
            Err(DbError::Syntax(_))
        ));
    }

    #[test]
    fn test_create_view_must_plan() {
        let (tx, planner) = planner();
        assert!(matches!(
            planner.execute_update(&tx, "create view v as select x from v"),
            Err(DbError::Execution(ExecError::Catalog(_)))
        ));
        planner
            .execute_update(&tx, "create view v as select x from a where x > 1")
            .unwrap();
        let result = planner.execute(&tx, "select x from v order by x").unwrap();
        assert_eq!(ints(result, "x"), vec![2, 2, 3]);
    }
}
