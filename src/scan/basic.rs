//! Selection, projection and product.

use crate::query::{Constant, ExecError, Predicate};

use super::{get_from_either, Scan};

/// Returns the input records that satisfy a predicate.
pub struct SelectScan {
    input: Box<Scan>,
    pred: Predicate,
}

impl SelectScan {
    pub fn new(input: Scan, pred: Predicate) -> Self {
        Self {
            input: Box::new(input),
            pred,
        }
    }

    /// The filtered scan, for updates through the selection.
    pub fn input_mut(&mut self) -> &mut Scan {
        &mut self.input
    }

    pub fn before_first(&mut self) -> Result<(), ExecError> {
        self.input.before_first()
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<bool, ExecError> {
        while self.input.next()? {
            if self.pred.is_satisfied(self.input.as_ref())? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn get_val(&self, field: &str) -> Result<Constant, ExecError> {
        self.input.get_val(field)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.input.has_field(field)
    }

    pub fn close(&mut self) {
        self.input.close();
    }
}

/// Restricts the input to a list of fields.
pub struct ProjectScan {
    input: Box<Scan>,
    fields: Vec<String>,
}

impl ProjectScan {
    pub fn new(input: Scan, fields: Vec<String>) -> Self {
        Self {
            input: Box::new(input),
            fields,
        }
    }

    pub fn before_first(&mut self) -> Result<(), ExecError> {
        self.input.before_first()
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<bool, ExecError> {
        self.input.next()
    }

    pub fn get_val(&self, field: &str) -> Result<Constant, ExecError> {
        if self.has_field(field) {
            self.input.get_val(field)
        } else {
            Err(ExecError::FieldNotFound(field.to_string()))
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    pub fn close(&mut self) {
        self.input.close();
    }
}

/// Every combination of a left record with a right record.
///
/// The right scan is rewound once per left record.
pub struct ProductScan {
    left: Box<Scan>,
    right: Box<Scan>,
    /// Whether `left` sits on a record.
    left_bound: bool,
}

impl ProductScan {
    pub fn new(left: Scan, right: Scan) -> Result<Self, ExecError> {
        let mut scan = Self {
            left: Box::new(left),
            right: Box::new(right),
            left_bound: false,
        };
        scan.before_first()?;
        Ok(scan)
    }

    pub fn before_first(&mut self) -> Result<(), ExecError> {
        self.left.before_first()?;
        self.left_bound = self.left.next()?;
        self.right.before_first()
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<bool, ExecError> {
        while self.left_bound {
            if self.right.next()? {
                return Ok(true);
            }
            self.right.before_first()?;
            self.left_bound = self.left.next()?;
        }
        Ok(false)
    }

    pub fn get_val(&self, field: &str) -> Result<Constant, ExecError> {
        get_from_either(&self.left, &self.right, field)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.left.has_field(field) || self.right.has_field(field)
    }

    pub fn close(&mut self) {
        self.left_bound = false;
        self.left.close();
        self.right.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Expression, Operator, Term};
    use crate::record::table_scan::tests::test_tx;
    use crate::scan::tests::{collect_ints, int_table, table_scan};

    #[test]
    fn test_select_filters_records() {
        let tx = test_tx(64);
        let layout = int_table(&tx, "t", &["a"], &[&[1], &[5], &[3], &[7]]);
        let pred = Predicate::from(Term::new(
            Expression::field("a"),
            Operator::Gt,
            Expression::constant(2),
        ));
        let mut scan = Scan::Select(SelectScan::new(table_scan(&tx, "t", &layout), pred));
        assert_eq!(collect_ints(&mut scan, &["a"]), vec![vec![5], vec![3], vec![7]]);
    }

    #[test]
    fn test_select_is_updatable() {
        let tx = test_tx(64);
        let layout = int_table(&tx, "t", &["a"], &[&[1], &[2], &[3]]);
        let pred = Predicate::from(Term::equality(
            Expression::field("a"),
            Expression::constant(2),
        ));
        let mut scan = Scan::Select(SelectScan::new(table_scan(&tx, "t", &layout), pred));
        while scan.next().unwrap() {
            scan.delete().unwrap();
        }
        let mut all = table_scan(&tx, "t", &layout);
        assert_eq!(collect_ints(&mut all, &["a"]), vec![vec![1], vec![3]]);
    }

    #[test]
    fn test_project_hides_fields() {
        let tx = test_tx(64);
        let layout = int_table(&tx, "t", &["a", "b"], &[&[1, 2]]);
        let mut scan = Scan::Project(ProjectScan::new(
            table_scan(&tx, "t", &layout),
            vec!["b".to_string()],
        ));
        assert!(scan.next().unwrap());
        assert_eq!(scan.get_int("b").unwrap(), 2);
        assert!(!scan.has_field("a"));
        assert!(matches!(
            scan.get_val("a"),
            Err(ExecError::FieldNotFound(f)) if f == "a"
        ));
        assert!(matches!(scan.insert(), Err(ExecError::NotUpdatable)));
    }

    #[test]
    fn test_product_pairs_every_record() {
        let tx = test_tx(64);
        let l = int_table(&tx, "l", &["a"], &[&[1], &[2]]);
        let r = int_table(&tx, "r", &["b"], &[&[10], &[20], &[30]]);
        let product = ProductScan::new(table_scan(&tx, "l", &l), table_scan(&tx, "r", &r));
        let mut scan = Scan::Product(product.unwrap());
        let rows = collect_ints(&mut scan, &["a", "b"]);
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0], vec![1, 10]);
        assert_eq!(rows[5], vec![2, 30]);
    }

    #[test]
    fn test_product_with_empty_side_is_empty() {
        let tx = test_tx(64);
        let l = int_table(&tx, "l", &["a"], &[]);
        let r = int_table(&tx, "r", &["b"], &[&[10]]);
        for (a, b) in [("l", "r"), ("r", "l")] {
            let (la, lb) = if a == "l" { (&l, &r) } else { (&r, &l) };
            let product = ProductScan::new(table_scan(&tx, a, la), table_scan(&tx, b, lb));
            let mut scan = Scan::Product(product.unwrap());
            assert!(!scan.next().unwrap());
            scan.close();
            scan.close();
        }
    }
}
