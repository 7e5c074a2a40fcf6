//! Aggregation functions for `group by` queries.
//!
//! - [`AggregateKind`]: the supported functions
//! - [`AggregateSpec`]: a function applied to one field, as parsed
//! - [`AggregationFn`]: per-group state, seeded by the first record of a
//!   group and folded over the rest
//!
//! Every record of a group contributes; there are no nulls to skip.

use std::cmp::Ordering;
use std::fmt;

use super::constant::Constant;
use super::error::ExecError;
use super::expr::FieldSource;

/// Supported aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    Count,
    Sum,
    /// Integer average: sum divided by count, truncated.
    Avg,
    Max,
    Min,
}

impl AggregateKind {
    /// Resolves a function name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "count" => Some(AggregateKind::Count),
            "sum" => Some(AggregateKind::Sum),
            "avg" => Some(AggregateKind::Avg),
            "max" => Some(AggregateKind::Max),
            "min" => Some(AggregateKind::Min),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateKind::Count => "count",
            AggregateKind::Sum => "sum",
            AggregateKind::Avg => "avg",
            AggregateKind::Max => "max",
            AggregateKind::Min => "min",
        }
    }
}

/// An aggregate function over one field, e.g. `max(gradyear)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AggregateSpec {
    pub kind: AggregateKind,
    pub field: String,
}

impl AggregateSpec {
    pub fn new(kind: AggregateKind, field: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.into(),
        }
    }

    /// Output column name: function prefix plus source field, e.g. `maxofgradyear`.
    pub fn field_name(&self) -> String {
        format!("{}of{}", self.kind.as_str(), self.field)
    }

    /// Creates fresh per-group state for this aggregate.
    pub fn create_fn(&self) -> Box<dyn AggregationFn> {
        let field = self.field.clone();
        match self.kind {
            AggregateKind::Count => Box::new(CountFn { field, count: 0 }),
            AggregateKind::Sum => Box::new(SumFn { field, sum: 0 }),
            AggregateKind::Avg => Box::new(AvgFn {
                field,
                sum: 0,
                count: 0,
            }),
            AggregateKind::Max => Box::new(ExtremeFn {
                field,
                keep: Ordering::Greater,
                value: None,
            }),
            AggregateKind::Min => Box::new(ExtremeFn {
                field,
                keep: Ordering::Less,
                value: None,
            }),
        }
    }
}

/// Formats the aggregate as it is written in a query, e.g. `count(sid)`.
impl fmt::Display for AggregateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind.as_str(), self.field)
    }
}

/// Stateful aggregate computation over one group.
pub trait AggregationFn {
    /// Resets the state to the current record of `s`, the first of a group.
    fn process_first(&mut self, s: &dyn FieldSource) -> Result<(), ExecError>;

    /// Folds the current record of `s` into the state.
    fn process_next(&mut self, s: &dyn FieldSource) -> Result<(), ExecError>;

    /// The aggregate of the records processed since `process_first`.
    fn value(&self) -> Constant;

    /// Name of the output column.
    fn field_name(&self) -> String;
}

fn int_field(s: &dyn FieldSource, field: &str) -> Result<i32, ExecError> {
    let value = s.get_val(field)?;
    value.as_int().ok_or_else(|| ExecError::TypeMismatch {
        expected: "int".to_string(),
        found: value.type_name().to_string(),
    })
}

struct CountFn {
    field: String,
    count: i32,
}

impl AggregationFn for CountFn {
    fn process_first(&mut self, _s: &dyn FieldSource) -> Result<(), ExecError> {
        self.count = 1;
        Ok(())
    }

    fn process_next(&mut self, _s: &dyn FieldSource) -> Result<(), ExecError> {
        self.count += 1;
        Ok(())
    }

    fn value(&self) -> Constant {
        Constant::Int(self.count)
    }

    fn field_name(&self) -> String {
        format!("countof{}", self.field)
    }
}

/// Uses checked arithmetic to detect overflow.
struct SumFn {
    field: String,
    sum: i32,
}

impl AggregationFn for SumFn {
    fn process_first(&mut self, s: &dyn FieldSource) -> Result<(), ExecError> {
        self.sum = int_field(s, &self.field)?;
        Ok(())
    }

    fn process_next(&mut self, s: &dyn FieldSource) -> Result<(), ExecError> {
        let v = int_field(s, &self.field)?;
        self.sum = self
            .sum
            .checked_add(v)
            .ok_or_else(|| ExecError::IntegerOverflow(self.field_name()))?;
        Ok(())
    }

    fn value(&self) -> Constant {
        Constant::Int(self.sum)
    }

    fn field_name(&self) -> String {
        format!("sumof{}", self.field)
    }
}

struct AvgFn {
    field: String,
    sum: i64,
    count: i64,
}

impl AggregationFn for AvgFn {
    fn process_first(&mut self, s: &dyn FieldSource) -> Result<(), ExecError> {
        self.sum = i64::from(int_field(s, &self.field)?);
        self.count = 1;
        Ok(())
    }

    fn process_next(&mut self, s: &dyn FieldSource) -> Result<(), ExecError> {
        self.sum += i64::from(int_field(s, &self.field)?);
        self.count += 1;
        Ok(())
    }

    fn value(&self) -> Constant {
        // The mean of i32 values always fits in an i32.
        Constant::Int((self.sum / self.count.max(1)) as i32)
    }

    fn field_name(&self) -> String {
        format!("avgof{}", self.field)
    }
}

/// `max` (keep = Greater) and `min` (keep = Less).
struct ExtremeFn {
    field: String,
    keep: Ordering,
    value: Option<Constant>,
}

impl AggregationFn for ExtremeFn {
    fn process_first(&mut self, s: &dyn FieldSource) -> Result<(), ExecError> {
        self.value = Some(s.get_val(&self.field)?);
        Ok(())
    }

    fn process_next(&mut self, s: &dyn FieldSource) -> Result<(), ExecError> {
        let candidate = s.get_val(&self.field)?;
        let replace = match &self.value {
            Some(current) => candidate.try_cmp(current)? == self.keep,
            None => true,
        };
        if replace {
            self.value = Some(candidate);
        }
        Ok(())
    }

    fn value(&self) -> Constant {
        self.value.clone().unwrap_or(Constant::Int(0))
    }

    fn field_name(&self) -> String {
        let prefix = if self.keep == Ordering::Greater {
            "max"
        } else {
            "min"
        };
        format!("{prefix}of{}", self.field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::expr::tests::Row;

    fn run(spec: &AggregateSpec, values: &[Constant]) -> Result<Constant, ExecError> {
        let mut f = spec.create_fn();
        for (i, v) in values.iter().enumerate() {
            let row = Row::new(&[("x", v.clone())]);
            if i == 0 {
                f.process_first(&row)?;
            } else {
                f.process_next(&row)?;
            }
        }
        Ok(f.value())
    }

    fn ints(values: &[i32]) -> Vec<Constant> {
        values.iter().map(|&v| Constant::Int(v)).collect()
    }

    #[test]
    fn test_field_names() {
        for (kind, name) in [
            (AggregateKind::Count, "countofx"),
            (AggregateKind::Sum, "sumofx"),
            (AggregateKind::Avg, "avgofx"),
            (AggregateKind::Max, "maxofx"),
            (AggregateKind::Min, "minofx"),
        ] {
            let spec = AggregateSpec::new(kind, "x");
            assert_eq!(spec.field_name(), name);
            assert_eq!(spec.create_fn().field_name(), name);
        }
    }

    #[test]
    fn test_values() {
        let values = ints(&[4, -1, 9, 3]);
        let agg = |kind| run(&AggregateSpec::new(kind, "x"), &values).unwrap();
        assert_eq!(agg(AggregateKind::Count), Constant::Int(4));
        assert_eq!(agg(AggregateKind::Sum), Constant::Int(15));
        assert_eq!(agg(AggregateKind::Avg), Constant::Int(3));
        assert_eq!(agg(AggregateKind::Max), Constant::Int(9));
        assert_eq!(agg(AggregateKind::Min), Constant::Int(-1));
    }

    #[test]
    fn test_process_first_resets_state() {
        let spec = AggregateSpec::new(AggregateKind::Sum, "x");
        let mut f = spec.create_fn();
        f.process_first(&Row::new(&[("x", Constant::Int(5))])).unwrap();
        f.process_next(&Row::new(&[("x", Constant::Int(5))])).unwrap();
        f.process_first(&Row::new(&[("x", Constant::Int(1))])).unwrap();
        assert_eq!(f.value(), Constant::Int(1));
    }

    #[test]
    fn test_max_of_strings() {
        let values = vec![Constant::from("b"), Constant::from("c"), Constant::from("a")];
        let spec = AggregateSpec::new(AggregateKind::Max, "x");
        assert_eq!(run(&spec, &values).unwrap(), Constant::from("c"));
    }

    #[test]
    fn test_sum_rejects_strings_and_overflow() {
        let spec = AggregateSpec::new(AggregateKind::Sum, "x");
        assert!(matches!(
            run(&spec, &[Constant::from("a")]),
            Err(ExecError::TypeMismatch { .. })
        ));
        assert!(matches!(
            run(&spec, &ints(&[i32::MAX, 1])),
            Err(ExecError::IntegerOverflow(_))
        ));
    }

    #[test]
    fn test_from_name() {
        assert_eq!(AggregateKind::from_name("COUNT"), Some(AggregateKind::Count));
        assert_eq!(AggregateKind::from_name("median"), None);
        assert_eq!(
            AggregateSpec::new(AggregateKind::Avg, "y").to_string(),
            "avg(y)"
        );
    }
}
