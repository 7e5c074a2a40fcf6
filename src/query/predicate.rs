//! Predicates: conjunctions of terms.

use std::fmt;

use super::constant::Constant;
use super::error::ExecError;
use super::expr::FieldSource;
use super::term::Term;
use crate::plan::Plan;
use crate::record::Schema;

/// A conjunction of terms. The empty predicate is always true.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    terms: Vec<Term>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_terms(terms: Vec<Term>) -> Self {
        Self { terms }
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn push(&mut self, term: Term) {
        self.terms.push(term);
    }

    /// Appends every term of `other`.
    pub fn conjoin_with(&mut self, other: Predicate) {
        self.terms.extend(other.terms);
    }

    pub fn is_satisfied<S: FieldSource + ?Sized>(&self, s: &S) -> Result<bool, ExecError> {
        for term in &self.terms {
            if !term.is_satisfied(s)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Evaluates the predicate across two scans; see [`Term::is_satisfied_pair`].
    pub fn is_satisfied_pair<A, B>(&self, s1: &A, s2: &B) -> Result<bool, ExecError>
    where
        A: FieldSource + ?Sized,
        B: FieldSource + ?Sized,
    {
        for term in &self.terms {
            if !term.is_satisfied_pair(s1, s2)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Product of the terms' reduction factors (saturating).
    pub fn reduction_factor(&self, plan: &Plan) -> u64 {
        self.terms
            .iter()
            .fold(1u64, |acc, t| acc.saturating_mul(t.reduction_factor(plan)))
    }

    /// The terms that only mention fields of `schema`, or `None` if there
    /// are none.
    pub fn select_sub_pred(&self, schema: &Schema) -> Option<Predicate> {
        let terms: Vec<Term> = self
            .terms
            .iter()
            .filter(|t| t.applies_to(schema))
            .cloned()
            .collect();
        (!terms.is_empty()).then(|| Predicate::from_terms(terms))
    }

    /// The terms that need both schemas: they apply to the union of `s1`
    /// and `s2` but to neither alone. `None` if there are none.
    pub fn join_sub_pred(&self, s1: &Schema, s2: &Schema) -> Option<Predicate> {
        let mut union = s1.clone();
        union.add_all(s2);
        let terms: Vec<Term> = self
            .terms
            .iter()
            .filter(|t| !t.applies_to(s1) && !t.applies_to(s2) && t.applies_to(&union))
            .cloned()
            .collect();
        (!terms.is_empty()).then(|| Predicate::from_terms(terms))
    }

    /// The constant of the first `field = c` term, if any.
    pub fn equates_with_constant(&self, field: &str) -> Option<&Constant> {
        self.terms
            .iter()
            .find_map(|t| t.equates_with_constant(field))
    }

    /// The other field of the first `field = other` term, if any.
    pub fn equates_with_field(&self, field: &str) -> Option<&str> {
        self.terms.iter().find_map(|t| t.equates_with_field(field))
    }

    /// Every equality term between a field of `s1` and a field of `s2`, in
    /// order, each returned as `(term, s1 field, s2 field)`.
    pub fn equijoins<'a>(
        &'a self,
        s1: &'a Schema,
        s2: &'a Schema,
    ) -> impl Iterator<Item = (&'a Term, String, String)> + 'a {
        self.terms.iter().filter_map(move |t| {
            if !t.op.is_equality() {
                return None;
            }
            let (l, r) = (t.lhs.as_field()?, t.rhs.as_field()?);
            if s1.has_field(l) && s2.has_field(r) {
                Some((t, l.to_string(), r.to_string()))
            } else if s1.has_field(r) && s2.has_field(l) {
                Some((t, r.to_string(), l.to_string()))
            } else {
                None
            }
        })
    }

    /// The first of [`Predicate::equijoins`].
    pub fn first_equijoin<'a>(&'a self, s1: &'a Schema, s2: &'a Schema) -> Option<(&'a Term, String, String)> {
        self.equijoins(s1, s2).next()
    }

    /// A copy without the first occurrence of `term`.
    pub fn without(&self, term: &Term) -> Predicate {
        let mut terms = self.terms.clone();
        if let Some(pos) = terms.iter().position(|t| t == term) {
            terms.remove(pos);
        }
        Predicate::from_terms(terms)
    }
}

impl From<Term> for Predicate {
    fn from(term: Term) -> Self {
        Predicate { terms: vec![term] }
    }
}

/// Terms joined by `and`; the empty predicate prints as nothing.
impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, " and ")?;
            }
            write!(f, "{term}")?;
        }
        Ok(())
    }
}
