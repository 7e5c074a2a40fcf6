use std::sync::Arc;

use tracing::debug;

use crate::catalog::Catalog;
use crate::plan::Plan;
use crate::planner::pipeline::{check_predicate, finish, view_query};
use crate::planner::QueryPlanner;
use crate::query::ExecError;
use crate::record::Schema;
use crate::sql::QueryData;
use crate::tx::Transaction;

use super::TablePlanner;

/// Orders the joins of a query greedily.
///
/// The table whose own selection yields the fewest records comes first.
/// After that, the table whose join with the plan so far yields the fewest
/// records is added next; a table that joins with nothing is added through
/// a product only when no table joins.
pub struct HeuristicQueryPlanner {
    catalog: Arc<Catalog>,
}

impl HeuristicQueryPlanner {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    fn table_planners(
        &self,
        tx: &Transaction,
        data: &QueryData,
    ) -> Result<Vec<TablePlanner>, ExecError> {
        let mut planners = Vec::with_capacity(data.tables.len());
        for name in &data.tables {
            let planner = match view_query(&self.catalog, name)? {
                Some(view) => {
                    let plan = self.create_plan(tx, &view)?;
                    TablePlanner::for_view(tx, name, plan, data.pred.clone())
                }
                None => TablePlanner::new(tx, &self.catalog, name, data.pred.clone())?,
            };
            planners.push(planner);
        }
        Ok(planners)
    }
}

impl QueryPlanner for HeuristicQueryPlanner {
    fn create_plan(&self, tx: &Transaction, data: &QueryData) -> Result<Plan, ExecError> {
        let mut planners = self.table_planners(tx, data)?;
        let mut fields = Schema::new();
        for planner in &planners {
            fields.add_all(planner.schema());
        }
        check_predicate(&data.pred, &fields)?;

        let mut current = take_lowest_select(&mut planners)
            .ok_or_else(|| ExecError::InvalidPlan("query names no tables".to_string()))?;
        while let Some(next) = take_lowest_join(&mut planners, &current)
            .or_else(|| take_lowest_product(&mut planners, &current))
        {
            current = next;
        }
        finish(tx, data, current)
    }
}

fn take_lowest_select(planners: &mut Vec<TablePlanner>) -> Option<Plan> {
    let (pos, plan) = planners
        .iter()
        .map(TablePlanner::make_select_plan)
        .enumerate()
        .min_by_key(|(_, plan)| plan.records_output())?;
    let planner = planners.remove(pos);
    debug!(table = planner.name(), rows = plan.records_output(), "first table");
    Some(plan)
}

fn take_lowest_join(planners: &mut Vec<TablePlanner>, current: &Plan) -> Option<Plan> {
    let (pos, plan) = planners
        .iter()
        .enumerate()
        .filter_map(|(pos, planner)| Some((pos, planner.make_join_plan(current)?)))
        .min_by_key(|(_, plan)| plan.records_output())?;
    let planner = planners.remove(pos);
    debug!(table = planner.name(), rows = plan.records_output(), "join table");
    Some(plan)
}

fn take_lowest_product(planners: &mut Vec<TablePlanner>, current: &Plan) -> Option<Plan> {
    let (pos, plan) = planners
        .iter()
        .map(|planner| planner.make_product_plan(current))
        .enumerate()
        .min_by_key(|(_, plan)| plan.records_output())?;
    let planner = planners.remove(pos);
    debug!(table = planner.name(), rows = plan.records_output(), "product table");
    Some(plan)
}
