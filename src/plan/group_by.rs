use crate::query::{AggregateKind, AggregateSpec, ExecError, SortField};
use crate::record::{FieldType, Schema};
use crate::scan::{GroupByScan, Scan};
use crate::tx::Transaction;

use super::{explain_node, Plan, SortPlan};

/// Groups its input on a list of fields and computes aggregates per group.
///
/// With group fields the input is sorted on them first. Without any, the
/// whole input forms a single group.
#[derive(Debug, Clone)]
pub struct GroupByPlan {
    input: Box<Plan>,
    group_fields: Vec<String>,
    aggregates: Vec<AggregateSpec>,
    schema: Schema,
}

impl GroupByPlan {
    /// Fails if `input` lacks a group field or an aggregated field.
    pub fn new(
        tx: &Transaction,
        input: Plan,
        group_fields: Vec<String>,
        aggregates: Vec<AggregateSpec>,
    ) -> Result<Self, ExecError> {
        let mut schema = Schema::new();
        for field in &group_fields {
            if !schema.add(field, input.schema()) {
                return Err(ExecError::FieldNotFound(field.clone()));
            }
        }
        for spec in &aggregates {
            let Some(info) = input.schema().info(&spec.field) else {
                return Err(ExecError::FieldNotFound(spec.field.clone()));
            };
            match spec.kind {
                AggregateKind::Max | AggregateKind::Min => {
                    schema.add_field(spec.field_name(), info.ty, info.length)
                }
                AggregateKind::Count | AggregateKind::Sum | AggregateKind::Avg => {
                    schema.add_field(spec.field_name(), FieldType::Int, 0)
                }
            }
        }

        let input = if group_fields.is_empty() {
            input
        } else {
            let keys = group_fields.iter().map(|f| SortField::asc(f.as_str())).collect();
            Plan::Sort(SortPlan::new(tx, input, keys))
        };
        Ok(Self {
            input: Box::new(input),
            group_fields,
            aggregates,
            schema,
        })
    }

    pub fn open(&self, tx: &Transaction) -> Result<Scan, ExecError> {
        let input = self.input.open(tx)?;
        let functions = self.aggregates.iter().map(AggregateSpec::create_fn).collect();
        let scan = GroupByScan::new(input, self.group_fields.clone(), functions)?;
        Ok(Scan::GroupBy(scan))
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn blocks_accessed(&self) -> u64 {
        self.input.blocks_accessed()
    }

    /// Number of groups: the product of the group fields' distinct values,
    /// bounded by the input size.
    pub fn records_output(&self) -> u64 {
        if self.group_fields.is_empty() {
            return 1;
        }
        let groups = self
            .group_fields
            .iter()
            .fold(1u64, |acc, f| acc.saturating_mul(self.input.distinct_values(f)));
        groups.min(self.input.records_output())
    }

    pub fn distinct_values(&self, field: &str) -> u64 {
        if self.group_fields.iter().any(|f| f == field) {
            self.input.distinct_values(field)
        } else {
            self.records_output()
        }
    }

    pub(crate) fn explain_at(&self, indent: usize) -> String {
        let aggregates: Vec<String> = self.aggregates.iter().map(|a| a.to_string()).collect();
        let label = if self.group_fields.is_empty() {
            format!("Aggregate: {}", aggregates.join(", "))
        } else {
            format!(
                "GroupBy: {}; {}",
                self.group_fields.join(", "),
                aggregates.join(", ")
            )
        };
        explain_node(
            indent,
            &label,
            self.blocks_accessed(),
            self.records_output(),
            &[self.input.explain_at(indent + 1)],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::plan::tests::{create_table, run, table_plan};
    use crate::record::table_scan::tests::test_tx;

    fn setup() -> (Transaction, Catalog) {
        let tx = test_tx(64);
        let catalog = Catalog::new(4);
        let rows = vec![vec![3, 1], vec![1, 4], vec![3, 5], vec![2, 9], vec![1, 6]];
        create_table(&tx, &catalog, "t", &["g", "v"], &rows);
        (tx, catalog)
    }

    #[test]
    fn test_group_by_sorts_input() {
        let (tx, catalog) = setup();
        let plan = GroupByPlan::new(
            &tx,
            table_plan(&tx, &catalog, "t"),
            vec!["g".to_string()],
            vec![
                AggregateSpec::new(AggregateKind::Sum, "v"),
                AggregateSpec::new(AggregateKind::Max, "v"),
            ],
        )
        .unwrap();
        // Three distinct group values among five records.
        assert_eq!(plan.records_output(), 3);
        assert_eq!(
            plan.schema().fields(),
            ["g".to_string(), "sumofv".to_string(), "maxofv".to_string()]
        );
        assert!(plan.explain_at(0).starts_with("GroupBy: g; sum(v), max(v)"));
        assert_eq!(
            run(&tx, &Plan::GroupBy(plan), &["g", "sumofv", "maxofv"]),
            vec![vec![1, 10, 6], vec![2, 9, 9], vec![3, 6, 5]]
        );
    }

    #[test]
    fn test_aggregate_without_groups() {
        let (tx, catalog) = setup();
        let plan = GroupByPlan::new(
            &tx,
            table_plan(&tx, &catalog, "t"),
            Vec::new(),
            vec![AggregateSpec::new(AggregateKind::Count, "g")],
        )
        .unwrap();
        assert_eq!(plan.records_output(), 1);
        assert_eq!(run(&tx, &Plan::GroupBy(plan), &["countofg"]), vec![vec![5]]);
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let (tx, catalog) = setup();
        let bad_group = GroupByPlan::new(
            &tx,
            table_plan(&tx, &catalog, "t"),
            vec!["z".to_string()],
            Vec::new(),
        );
        assert!(matches!(bad_group, Err(ExecError::FieldNotFound(_))));
        let bad_agg = GroupByPlan::new(
            &tx,
            table_plan(&tx, &catalog, "t"),
            Vec::new(),
            vec![AggregateSpec::new(AggregateKind::Avg, "z")],
        );
        assert!(matches!(bad_agg, Err(ExecError::FieldNotFound(_))));
    }
}
