//! Values, expressions and predicates shared by the parser, planners and scans.

pub mod aggregate;
pub mod constant;
pub mod error;
pub mod expr;
pub mod operator;
pub mod predicate;
pub mod sort_field;
pub mod term;

pub use aggregate::{AggregateKind, AggregateSpec, AggregationFn};
pub use constant::Constant;
pub use error::ExecError;
pub use expr::{Expression, FieldSource};
pub use operator::Operator;
pub use predicate::Predicate;
pub use sort_field::{Direction, SortField};
pub use term::Term;
