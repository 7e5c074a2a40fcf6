//! Steps shared by every query planner once the tables are combined.

use tracing::debug;

use crate::catalog::Catalog;
use crate::plan::{DistinctPlan, GroupByPlan, Plan, ProjectPlan, SortPlan};
use crate::query::{ExecError, Predicate};
use crate::record::Schema;
use crate::sql::{Parser, QueryData};
use crate::tx::Transaction;

/// The parsed query of view `name`, or `None` if `name` is not a view.
pub(crate) fn view_query(catalog: &Catalog, name: &str) -> Result<Option<QueryData>, ExecError> {
    let Some(definition) = catalog.view_definition(name) else {
        return Ok(None);
    };
    debug!(view = name, definition = %definition, "expand view");
    Ok(Some(Parser::new(&definition).parse_query()?))
}

/// Fails if `pred` mentions a field that none of the query's tables has.
pub(crate) fn check_predicate(pred: &Predicate, schema: &Schema) -> Result<(), ExecError> {
    let missing = pred
        .terms()
        .iter()
        .flat_map(|term| term.fields())
        .find(|field| !schema.has_field(field));
    match missing {
        Some(field) => Err(ExecError::FieldNotFound(field.to_string())),
        None => Ok(()),
    }
}

/// Adds grouping, duplicate removal, ordering and the final projection on
/// top of `plan`, which already joins and filters the query's tables.
///
/// With `distinct`, the output fields are projected first and the sort on
/// `order by` runs last, so every sort field must be an output field.
pub(crate) fn finish(tx: &Transaction, data: &QueryData, plan: Plan) -> Result<Plan, ExecError> {
    let mut plan = plan;
    if data.is_grouped() {
        let ungrouped = data
            .fields()
            .find(|f| !data.group_by.iter().any(|g| g.as_str() == *f));
        if let Some(field) = ungrouped {
            return Err(ExecError::InvalidPlan(format!(
                "field \"{field}\" must appear in group by or an aggregate"
            )));
        }
        let aggregates = data.aggregates().cloned().collect();
        plan = Plan::GroupBy(GroupByPlan::new(tx, plan, data.group_by.clone(), aggregates)?);
    }

    let output = data.output_fields();
    if data.distinct {
        if let Some(sort) = data.order_by.iter().find(|s| !output.contains(&s.field)) {
            return Err(ExecError::InvalidPlan(format!(
                "order by field \"{}\" must appear in the select list of a distinct query",
                sort.field
            )));
        }
        plan = Plan::Project(ProjectPlan::new(plan, output.clone())?);
        plan = Plan::Distinct(DistinctPlan::new(tx, plan, output)?);
        if !data.order_by.is_empty() {
            plan = Plan::Sort(SortPlan::new(tx, plan, data.order_by.clone()));
        }
        return Ok(plan);
    }

    if !data.order_by.is_empty() {
        if let Some(sort) = data.order_by.iter().find(|s| !plan.schema().has_field(&s.field)) {
            return Err(ExecError::FieldNotFound(sort.field.clone()));
        }
        plan = Plan::Sort(SortPlan::new(tx, plan, data.order_by.clone()));
    }
    Ok(Plan::Project(ProjectPlan::new(plan, output)?))
}
