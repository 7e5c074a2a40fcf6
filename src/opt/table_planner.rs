//! Per-table planning decisions.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::catalog::{Catalog, IndexInfo};
use crate::plan::{
    HashJoinPlan, IndexJoinPlan, IndexSelectPlan, MergeJoinPlan, NestedLoopJoinPlan, Plan,
    ProductPlan, SelectPlan, TablePlan,
};
use crate::query::{ExecError, Predicate};
use crate::record::Schema;
use crate::tx::Transaction;

use super::join_choice::{choose_join, Cost, JoinStrategy};

#[derive(Debug, Clone)]
enum Source {
    Table(TablePlan),
    /// A view, already planned.
    View(Plan),
}

/// Plans access to one table of a query: how to read it on its own, and
/// how to combine it with the plan built so far.
#[derive(Debug, Clone)]
pub struct TablePlanner {
    name: String,
    source: Source,
    pred: Predicate,
    /// Indexes of a base table, keyed by field.
    indexes: HashMap<String, IndexInfo>,
    tx: Transaction,
}

impl TablePlanner {
    /// Planner for the stored table `table`. `pred` is the whole query's
    /// predicate.
    pub fn new(
        tx: &Transaction,
        catalog: &Catalog,
        table: &str,
        pred: Predicate,
    ) -> Result<Self, ExecError> {
        let plan = TablePlan::new(tx, table, catalog)?;
        let indexes = catalog.index_info(tx, table)?;
        Ok(Self {
            name: table.to_string(),
            source: Source::Table(plan),
            pred,
            indexes,
            tx: tx.clone(),
        })
    }

    /// Planner for a view whose query has been planned as `plan`. Views
    /// have no indexes.
    pub fn for_view(tx: &Transaction, name: &str, plan: Plan, pred: Predicate) -> Self {
        Self {
            name: name.to_string(),
            source: Source::View(plan),
            pred,
            indexes: HashMap::new(),
            tx: tx.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        match &self.source {
            Source::Table(plan) => plan.schema(),
            Source::View(plan) => plan.schema(),
        }
    }

    fn base_plan(&self) -> Plan {
        match &self.source {
            Source::Table(plan) => Plan::Table(plan.clone()),
            Source::View(plan) => plan.clone(),
        }
    }

    /// Reads the table on its own, applying every predicate term that
    /// mentions only its fields.
    ///
    /// If some indexed field is equated with a constant, the table is read
    /// through that index instead of scanned.
    pub fn make_select_plan(&self) -> Plan {
        let plan = self.make_index_select().unwrap_or_else(|| self.base_plan());
        self.add_select_pred(plan)
    }

    fn make_index_select(&self) -> Option<Plan> {
        let Source::Table(table) = &self.source else {
            return None;
        };
        table.schema().fields().iter().find_map(|field| {
            let info = self.indexes.get(field)?;
            let key = self.pred.equates_with_constant(field)?;
            debug!(table = %self.name, index = info.name(), field, key = %key, "index select");
            Some(Plan::IndexSelect(IndexSelectPlan::new(
                table.clone(),
                info.clone(),
                key.clone(),
            )))
        })
    }

    /// Joins `current` with this table using the cheapest join strategy.
    ///
    /// Returns `None` when the predicate relates the two only through
    /// non-equality terms, or not at all; the caller then falls back to a
    /// product.
    pub fn make_join_plan(&self, current: &Plan) -> Option<Plan> {
        let join_pred = self.pred.join_sub_pred(current.schema(), self.schema())?;
        let (term, outer_field, inner_field) =
            join_pred.first_equijoin(current.schema(), self.schema())?;
        let residual = join_pred.without(term);

        let index = self.make_index_join(current, &join_pred);
        let inner = self.make_select_plan();
        let merge = MergeJoinPlan::new(
            &self.tx,
            current.clone(),
            inner.clone(),
            outer_field.clone(),
            inner_field.clone(),
        );
        let nested = NestedLoopJoinPlan::new(current.clone(), inner.clone(), join_pred.clone());
        let hash = HashJoinPlan::new(&self.tx, current.clone(), inner, outer_field, inner_field);

        let candidates = [
            (
                JoinStrategy::Index,
                Cost::from(index.as_ref().map(|(plan, _)| plan.blocks_accessed())),
            ),
            (JoinStrategy::Merge, Cost::Finite(merge.blocks_accessed())),
            (JoinStrategy::NestedLoop, Cost::Finite(nested.blocks_accessed())),
            (JoinStrategy::Hash, Cost::Finite(hash.blocks_accessed())),
        ];
        for (strategy, cost) in &candidates {
            debug!(table = %self.name, strategy = %strategy, cost = %cost, "join candidate");
        }
        let strategy = choose_join(&candidates)?;
        let cost = candidates
            .iter()
            .find(|(s, _)| *s == strategy)
            .map_or(Cost::Infinite, |(_, c)| *c);
        info!(table = %self.name, strategy = %strategy, cost = %cost, "chose join strategy");

        match strategy {
            // Index joins read the raw table, so its own terms still apply.
            JoinStrategy::Index => {
                index.map(|(plan, rest)| with_pred(self.add_select_pred(plan), rest))
            }
            JoinStrategy::Merge => Some(with_pred(Plan::MergeJoin(merge), residual)),
            JoinStrategy::NestedLoop => Some(Plan::NestedLoopJoin(nested)),
            JoinStrategy::Hash => Some(with_pred(Plan::HashJoin(hash), residual)),
        }
    }

    /// An index join on the first equality term whose field of this table
    /// is indexed, with the join terms it leaves unapplied.
    fn make_index_join(
        &self,
        current: &Plan,
        join_pred: &Predicate,
    ) -> Option<(Plan, Predicate)> {
        let Source::Table(table) = &self.source else {
            return None;
        };
        join_pred
            .equijoins(current.schema(), self.schema())
            .find_map(|(term, outer_field, inner_field)| {
                let info = self.indexes.get(&inner_field)?;
                let plan = Plan::IndexJoin(IndexJoinPlan::new(
                    current.clone(),
                    table.clone(),
                    info.clone(),
                    outer_field,
                ));
                Some((plan, join_pred.without(term)))
            })
    }

    /// Cross product of `current` with this table, filtered by every term
    /// relating the two.
    pub fn make_product_plan(&self, current: &Plan) -> Plan {
        let join_pred = self.pred.join_sub_pred(current.schema(), self.schema());
        let plan = Plan::Product(ProductPlan::new(current.clone(), self.make_select_plan()));
        debug!(table = %self.name, "product");
        match join_pred {
            Some(pred) => with_pred(plan, pred),
            None => plan,
        }
    }

    fn add_select_pred(&self, plan: Plan) -> Plan {
        match self.pred.select_sub_pred(self.schema()) {
            Some(pred) => with_pred(plan, pred),
            None => plan,
        }
    }
}

fn with_pred(plan: Plan, pred: Predicate) -> Plan {
    if pred.is_empty() {
        plan
    } else {
        Plan::Select(SelectPlan::new(plan, pred))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::IndexKind;
    use crate::plan::tests::{create_table, run, table_plan};
    use crate::query::{Expression, Operator, Term};
    use crate::record::table_scan::tests::test_tx;

    fn eq_fields(a: &str, b: &str) -> Term {
        Term::equality(Expression::field(a), Expression::field(b))
    }

    fn eq_const(a: &str, v: i32) -> Term {
        Term::equality(Expression::field(a), Expression::constant(v))
    }

    fn setup() -> (Transaction, Catalog) {
        let tx = test_tx(64);
        let catalog = Catalog::new(100);
        let big: Vec<Vec<i32>> = (0..60).map(|i| vec![i, i % 6]).collect();
        let small: Vec<Vec<i32>> = (0..6).map(|i| vec![i, i * 100]).collect();
        create_table(&tx, &catalog, "big", &["id", "grp"], &big);
        create_table(&tx, &catalog, "small", &["gid", "label"], &small);
        (tx, catalog)
    }

    #[test]
    fn test_select_plan_uses_index_for_equality() {
        let (tx, catalog) = setup();
        catalog
            .create_index(&tx, "big_grp", "big", "grp", IndexKind::Hash)
            .unwrap();
        let pred = Predicate::from(eq_const("grp", 4));
        let planner = TablePlanner::new(&tx, &catalog, "big", pred).unwrap();
        let plan = planner.make_select_plan();
        let Plan::Select(select) = &plan else {
            panic!("expected a select on top, got {}", plan.explain());
        };
        assert!(select.predicate().equates_with_constant("grp").is_some());
        assert!(plan.explain().contains("IndexSelect on big using big_grp"));
        assert_eq!(run(&tx, &plan, &["grp"]).len(), 10);
    }

    #[test]
    fn test_select_plan_ignores_index_for_inequality() {
        let (tx, catalog) = setup();
        catalog
            .create_index(&tx, "big_grp", "big", "grp", IndexKind::BTree)
            .unwrap();
        let pred = Predicate::from(Term::new(
            Expression::field("grp"),
            Operator::Lt,
            Expression::constant(2),
        ));
        let planner = TablePlanner::new(&tx, &catalog, "big", pred).unwrap();
        let plan = planner.make_select_plan();
        assert!(!plan.explain().contains("IndexSelect"));
        assert_eq!(run(&tx, &plan, &["grp"]).len(), 20);
    }

    #[test]
    fn test_join_plan_prefers_index_join() {
        let (tx, catalog) = setup();
        catalog
            .create_index(&tx, "big_grp", "big", "grp", IndexKind::Hash)
            .unwrap();
        let pred = Predicate::from(eq_fields("gid", "grp"));
        let planner = TablePlanner::new(&tx, &catalog, "big", pred).unwrap();
        let current = table_plan(&tx, &catalog, "small");
        let plan = planner.make_join_plan(&current).unwrap();
        assert!(plan.explain().starts_with("IndexJoin: gid = big.grp"), "{}", plan.explain());
        assert_eq!(run(&tx, &plan, &["id"]).len(), 60);
    }

    #[test]
    fn test_index_join_on_later_equality_term() {
        let (tx, catalog) = setup();
        catalog
            .create_index(&tx, "big_grp", "big", "grp", IndexKind::Hash)
            .unwrap();
        let pred = Predicate::from_terms(vec![eq_fields("gid", "id"), eq_fields("gid", "grp")]);
        let planner = TablePlanner::new(&tx, &catalog, "big", pred).unwrap();
        let current = table_plan(&tx, &catalog, "small");
        let plan = planner.make_join_plan(&current).unwrap();
        assert!(plan.explain().contains("IndexJoin: gid = big.grp"), "{}", plan.explain());
        let mut rows = run(&tx, &plan, &["gid", "id"]);
        rows.sort();
        let expected: Vec<Vec<i32>> = (0..6).map(|i| vec![i, i]).collect();
        assert_eq!(rows, expected);
    }

    #[test]
    fn test_join_plan_applies_residual_terms() {
        let (tx, catalog) = setup();
        let pred = Predicate::from_terms(vec![
            eq_fields("gid", "grp"),
            Term::new(Expression::field("id"), Operator::Gt, Expression::field("label")),
            eq_const("grp", 1),
        ]);
        let planner = TablePlanner::new(&tx, &catalog, "big", pred).unwrap();
        let current = table_plan(&tx, &catalog, "small");
        let plan = planner.make_join_plan(&current).unwrap();
        // Rows with grp 1 pair with label 100, which no id exceeds.
        assert!(run(&tx, &plan, &["id"]).is_empty());

        let pred = Predicate::from_terms(vec![eq_fields("gid", "grp"), eq_const("grp", 0)]);
        let planner = TablePlanner::new(&tx, &catalog, "big", pred).unwrap();
        let mut rows = run(&tx, &planner.make_join_plan(&current).unwrap(), &["id", "gid"]);
        rows.sort();
        let expected: Vec<Vec<i32>> = (0..10).map(|i| vec![i * 6, 0]).collect();
        assert_eq!(rows, expected);
    }

    #[test]
    fn test_no_equijoin_means_no_join_plan() {
        let (tx, catalog) = setup();
        let pred = Predicate::from(Term::new(
            Expression::field("id"),
            Operator::Lt,
            Expression::field("gid"),
        ));
        let planner = TablePlanner::new(&tx, &catalog, "big", pred).unwrap();
        let current = table_plan(&tx, &catalog, "small");
        assert!(planner.make_join_plan(&current).is_none());

        let plan = planner.make_product_plan(&current);
        // Each gid pairs with the ids below it: 1 + 2 + 3 + 4 + 5.
        assert_eq!(run(&tx, &plan, &["id", "gid"]).len(), 15);
    }

    #[test]
    fn test_unrelated_tables_have_no_join_plan() {
        let (tx, catalog) = setup();
        let planner = TablePlanner::new(&tx, &catalog, "big", Predicate::new()).unwrap();
        let current = table_plan(&tx, &catalog, "small");
        assert!(planner.make_join_plan(&current).is_none());
        assert_eq!(run(&tx, &planner.make_product_plan(&current), &["id"]).len(), 360);
    }

    #[test]
    fn test_view_source_never_uses_indexes() {
        let (tx, catalog) = setup();
        let view = table_plan(&tx, &catalog, "small");
        let pred = Predicate::from(eq_const("gid", 3));
        let planner = TablePlanner::for_view(&tx, "v", view, pred);
        assert_eq!(planner.name(), "v");
        let plan = planner.make_select_plan();
        assert_eq!(run(&tx, &plan, &["label"]), vec![vec![300]]);
    }
}
