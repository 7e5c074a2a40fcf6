use crate::query::{ExecError, Predicate};
use crate::record::Schema;
use crate::scan::{ProductScan, ProjectScan, Scan, SelectScan};
use crate::tx::Transaction;

use super::{explain_node, union_schema, Plan};

/// Filters its input by a predicate.
#[derive(Debug, Clone)]
pub struct SelectPlan {
    input: Box<Plan>,
    pred: Predicate,
    records: u64,
}

impl SelectPlan {
    pub fn new(input: Plan, pred: Predicate) -> Self {
        let records = input.records_output() / pred.reduction_factor(&input);
        Self {
            input: Box::new(input),
            pred,
            records,
        }
    }

    pub fn predicate(&self) -> &Predicate {
        &self.pred
    }

    pub fn open(&self, tx: &Transaction) -> Result<Scan, ExecError> {
        let input = self.input.open(tx)?;
        Ok(Scan::Select(SelectScan::new(input, self.pred.clone())))
    }

    pub fn schema(&self) -> &Schema {
        self.input.schema()
    }

    pub fn blocks_accessed(&self) -> u64 {
        self.input.blocks_accessed()
    }

    pub fn records_output(&self) -> u64 {
        self.records
    }

    /// A field equated with a constant has one value. A field equated with
    /// another field has at most as many values as either of them.
    pub fn distinct_values(&self, field: &str) -> u64 {
        if self.pred.equates_with_constant(field).is_some() {
            return 1;
        }
        let own = self.input.distinct_values(field);
        match self.pred.equates_with_field(field) {
            Some(other) => own.min(self.input.distinct_values(other)),
            None => own,
        }
    }

    pub(crate) fn explain_at(&self, indent: usize) -> String {
        explain_node(
            indent,
            &format!("Select: {}", self.pred),
            self.blocks_accessed(),
            self.records_output(),
            &[self.input.explain_at(indent + 1)],
        )
    }
}

/// Keeps a subset of its input's fields.
#[derive(Debug, Clone)]
pub struct ProjectPlan {
    input: Box<Plan>,
    fields: Vec<String>,
    schema: Schema,
}

impl ProjectPlan {
    /// Fails if `input` lacks one of `fields`.
    pub fn new(input: Plan, fields: Vec<String>) -> Result<Self, ExecError> {
        let mut schema = Schema::new();
        for field in &fields {
            if !schema.add(field, input.schema()) {
                return Err(ExecError::FieldNotFound(field.clone()));
            }
        }
        Ok(Self {
            input: Box::new(input),
            fields,
            schema,
        })
    }

    pub fn open(&self, tx: &Transaction) -> Result<Scan, ExecError> {
        let input = self.input.open(tx)?;
        Ok(Scan::Project(ProjectScan::new(input, self.fields.clone())))
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn blocks_accessed(&self) -> u64 {
        self.input.blocks_accessed()
    }

    pub fn records_output(&self) -> u64 {
        self.input.records_output()
    }

    pub fn distinct_values(&self, field: &str) -> u64 {
        self.input.distinct_values(field)
    }

    pub(crate) fn explain_at(&self, indent: usize) -> String {
        explain_node(
            indent,
            &format!("Project: {}", self.fields.join(", ")),
            self.blocks_accessed(),
            self.records_output(),
            &[self.input.explain_at(indent + 1)],
        )
    }
}

/// Cross product of two inputs; the right input is rescanned per left record.
#[derive(Debug, Clone)]
pub struct ProductPlan {
    left: Box<Plan>,
    right: Box<Plan>,
    schema: Schema,
}

impl ProductPlan {
    pub fn new(left: Plan, right: Plan) -> Self {
        let schema = union_schema(left.schema(), right.schema());
        Self {
            left: Box::new(left),
            right: Box::new(right),
            schema,
        }
    }

    pub fn open(&self, tx: &Transaction) -> Result<Scan, ExecError> {
        let left = self.left.open(tx)?;
        let right = self.right.open(tx)?;
        Ok(Scan::Product(ProductScan::new(left, right)?))
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn blocks_accessed(&self) -> u64 {
        let (left, right) = (&self.left, &self.right);
        left.blocks_accessed()
            .saturating_add(left.records_output().saturating_mul(right.blocks_accessed()))
    }

    pub fn records_output(&self) -> u64 {
        self.left
            .records_output()
            .saturating_mul(self.right.records_output())
    }

    pub fn distinct_values(&self, field: &str) -> u64 {
        if self.left.schema().has_field(field) {
            self.left.distinct_values(field)
        } else {
            self.right.distinct_values(field)
        }
    }

    pub(crate) fn explain_at(&self, indent: usize) -> String {
        explain_node(
            indent,
            "Product",
            self.blocks_accessed(),
            self.records_output(),
            &[
                self.left.explain_at(indent + 1),
                self.right.explain_at(indent + 1),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::plan::tests::{create_table, run, table_plan};
    use crate::query::{Expression, Operator, Term};
    use crate::record::table_scan::tests::test_tx;

    fn eq_const(field: &str, v: i32) -> Term {
        Term::equality(Expression::field(field), Expression::constant(v))
    }

    fn setup() -> (Transaction, Catalog) {
        let tx = test_tx(64);
        let catalog = Catalog::new(4);
        let rows: Vec<Vec<i32>> = (0..20).map(|i| vec![i, i % 5]).collect();
        create_table(&tx, &catalog, "t", &["a", "b"], &rows);
        create_table(&tx, &catalog, "u", &["c"], &[vec![1], vec![2], vec![3]]);
        (tx, catalog)
    }

    #[test]
    fn test_select_estimates() {
        let (tx, catalog) = setup();
        let pred = Predicate::from(eq_const("b", 3));
        let plan = SelectPlan::new(table_plan(&tx, &catalog, "t"), pred);
        assert_eq!(plan.blocks_accessed(), 4);
        assert_eq!(plan.records_output(), 4);
        assert_eq!(plan.distinct_values("b"), 1);
        assert_eq!(plan.distinct_values("a"), 20);

        let plan = Plan::Select(plan);
        assert_eq!(plan.distinct_values("a"), 4);
        assert_eq!(
            run(&tx, &plan, &["a"]),
            vec![vec![3], vec![8], vec![13], vec![18]]
        );

        let range = Predicate::from(Term::new(
            Expression::field("a"),
            Operator::Lt,
            Expression::constant(5),
        ));
        let plan = SelectPlan::new(table_plan(&tx, &catalog, "t"), range);
        assert_eq!(plan.records_output(), 6);
    }

    #[test]
    fn test_select_on_field_equality() {
        let (tx, catalog) = setup();
        let pred = Predicate::from(Term::equality(
            Expression::field("a"),
            Expression::field("b"),
        ));
        let plan = SelectPlan::new(table_plan(&tx, &catalog, "t"), pred);
        assert_eq!(plan.records_output(), 1);
        assert_eq!(plan.distinct_values("a"), 5);
        assert_eq!(run(&tx, &Plan::Select(plan), &["a"]).len(), 5);
    }

    #[test]
    fn test_project_requires_known_fields() {
        let (tx, catalog) = setup();
        let plan =
            ProjectPlan::new(table_plan(&tx, &catalog, "t"), vec!["b".to_string()]).unwrap();
        assert_eq!(plan.schema().fields(), ["b".to_string()]);
        assert_eq!(plan.records_output(), 20);

        let err = ProjectPlan::new(table_plan(&tx, &catalog, "t"), vec!["z".to_string()]);
        assert!(matches!(err, Err(ExecError::FieldNotFound(f)) if f == "z"));
    }

    #[test]
    fn test_product_estimates() {
        let (tx, catalog) = setup();
        let plan = ProductPlan::new(
            table_plan(&tx, &catalog, "u"),
            table_plan(&tx, &catalog, "t"),
        );
        assert_eq!(plan.blocks_accessed(), 1 + 3 * 4);
        assert_eq!(plan.records_output(), 60);
        assert_eq!(plan.distinct_values("c"), 3);
        assert_eq!(plan.distinct_values("b"), 5);
        assert_eq!(run(&tx, &Plan::Product(plan), &["c", "a"]).len(), 60);
    }
}
