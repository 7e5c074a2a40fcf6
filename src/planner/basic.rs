use std::sync::Arc;

use crate::catalog::Catalog;
use crate::plan::{Plan, ProductPlan, SelectPlan, TablePlan};
use crate::query::ExecError;
use crate::sql::QueryData;
use crate::tx::Transaction;

use super::pipeline::{check_predicate, finish, view_query};
use super::QueryPlanner;

/// Plans a query without weighing alternatives: the product of every table
/// in FROM order, filtered by the whole predicate.
pub struct BasicQueryPlanner {
    catalog: Arc<Catalog>,
}

impl BasicQueryPlanner {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }
}

impl QueryPlanner for BasicQueryPlanner {
    fn create_plan(&self, tx: &Transaction, data: &QueryData) -> Result<Plan, ExecError> {
        let mut plans = Vec::with_capacity(data.tables.len());
        for name in &data.tables {
            let plan = match view_query(&self.catalog, name)? {
                Some(view) => self.create_plan(tx, &view)?,
                None => Plan::Table(TablePlan::new(tx, name, &self.catalog)?),
            };
            plans.push(plan);
        }

        let mut plans = plans.into_iter();
        let first = plans
            .next()
            .ok_or_else(|| ExecError::InvalidPlan("query names no tables".to_string()))?;
        let mut plan = plans.fold(first, |acc, next| Plan::Product(ProductPlan::new(acc, next)));

        check_predicate(&data.pred, plan.schema())?;
        if !data.pred.is_empty() {
            plan = Plan::Select(SelectPlan::new(plan, data.pred.clone()));
        }
        finish(tx, data, plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::tests::{create_table, run};
    use crate::record::table_scan::tests::test_tx;
    use crate::sql::Parser;

    #[test]
    fn test_product_then_select() {
        let tx = test_tx(64);
        let catalog = Arc::new(Catalog::new(4));
        create_table(&tx, &catalog, "a", &["x"], &[vec![1], vec![2], vec![3]]);
        create_table(&tx, &catalog, "b", &["y"], &[vec![2], vec![3], vec![3]]);
        let planner = BasicQueryPlanner::new(Arc::clone(&catalog));

        let data = Parser::new("select x from a, b where x = y order by x")
            .parse_query()
            .unwrap();
        let plan = planner.create_plan(&tx, &data).unwrap();
        assert!(plan.explain().contains("Product"));
        assert_eq!(run(&tx, &plan, &["x"]), vec![vec![2], vec![3], vec![3]]);

        let data = Parser::new("select x from a where w = 1").parse_query().unwrap();
        assert!(matches!(
            planner.create_plan(&tx, &data),
            Err(ExecError::FieldNotFound(f)) if f == "w"
        ));
    }

    #[test]
    fn test_view_is_planned_as_subquery() {
        let tx = test_tx(64);
        let catalog = Arc::new(Catalog::new(4));
        create_table(&tx, &catalog, "a", &["x"], &[vec![1], vec![2], vec![3]]);
        catalog.create_view("big", "select x from a where x > 1").unwrap();
        let planner = BasicQueryPlanner::new(Arc::clone(&catalog));

        let data = Parser::new("select x from big").parse_query().unwrap();
        let plan = planner.create_plan(&tx, &data).unwrap();
        assert_eq!(run(&tx, &plan, &["x"]), vec![vec![2], vec![3]]);
    }
}
