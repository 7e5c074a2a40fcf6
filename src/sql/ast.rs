//! Statement descriptors produced by the parser.
//!
//! Descriptors are plain data: the planners turn them into plans and the
//! update planner applies them.

use std::fmt;

use crate::catalog::IndexKind;
use crate::query::{AggregateSpec, Constant, Expression, Predicate, SortField};
use crate::record::Schema;

/// A parsed SQL statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// SELECT statement.
    Query(Box<QueryData>),
    /// INSERT statement.
    Insert(InsertData),
    /// DELETE statement.
    Delete(DeleteData),
    /// UPDATE statement.
    Modify(ModifyData),
    /// CREATE TABLE statement.
    CreateTable(CreateTableData),
    /// CREATE VIEW statement.
    CreateView(CreateViewData),
    /// CREATE INDEX statement.
    CreateIndex(CreateIndexData),
}

/// An item in the SELECT list.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    Field(String),
    Aggregate(AggregateSpec),
}

impl SelectItem {
    /// Name of the column this item produces.
    pub fn output_name(&self) -> String {
        match self {
            SelectItem::Field(name) => name.clone(),
            SelectItem::Aggregate(spec) => spec.field_name(),
        }
    }
}

impl fmt::Display for SelectItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectItem::Field(name) => f.write_str(name),
            SelectItem::Aggregate(spec) => write!(f, "{spec}"),
        }
    }
}

/// SELECT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryData {
    pub distinct: bool,
    pub items: Vec<SelectItem>,
    /// Tables and views named in FROM.
    pub tables: Vec<String>,
    /// WHERE clause; empty when absent.
    pub pred: Predicate,
    pub group_by: Vec<String>,
    pub order_by: Vec<SortField>,
}

impl QueryData {
    /// Plain fields of the select list.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|item| match item {
            SelectItem::Field(name) => Some(name.as_str()),
            SelectItem::Aggregate(_) => None,
        })
    }

    /// Aggregates of the select list.
    pub fn aggregates(&self) -> impl Iterator<Item = &AggregateSpec> {
        self.items.iter().filter_map(|item| match item {
            SelectItem::Aggregate(spec) => Some(spec),
            SelectItem::Field(_) => None,
        })
    }

    /// Output column names, in select-list order.
    pub fn output_fields(&self) -> Vec<String> {
        self.items.iter().map(SelectItem::output_name).collect()
    }

    /// Whether the query groups its input.
    pub fn is_grouped(&self) -> bool {
        !self.group_by.is_empty() || self.aggregates().next().is_some()
    }
}

/// Formats the query as SQL text that parses back to the same descriptor.
/// View definitions are stored in this form.
impl fmt::Display for QueryData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "select ")?;
        if self.distinct {
            write!(f, "distinct ")?;
        }
        write_list(f, &self.items)?;
        write!(f, " from ")?;
        write_list(f, &self.tables)?;
        if !self.pred.is_empty() {
            write!(f, " where {}", self.pred)?;
        }
        if !self.group_by.is_empty() {
            write!(f, " group by ")?;
            write_list(f, &self.group_by)?;
        }
        if !self.order_by.is_empty() {
            write!(f, " order by ")?;
            write_list(f, &self.order_by)?;
        }
        Ok(())
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// INSERT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertData {
    pub table: String,
    pub fields: Vec<String>,
    pub values: Vec<Constant>,
}

/// DELETE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteData {
    pub table: String,
    pub pred: Predicate,
}

/// UPDATE statement (`update T set field = expr [where ...]`).
#[derive(Debug, Clone, PartialEq)]
pub struct ModifyData {
    pub table: String,
    pub field: String,
    pub new_value: Expression,
    pub pred: Predicate,
}

/// CREATE TABLE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableData {
    pub table: String,
    pub schema: Schema,
}

/// CREATE VIEW statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateViewData {
    pub view: String,
    pub query: QueryData,
}

impl CreateViewData {
    /// Text stored in the catalog for this view.
    pub fn view_def(&self) -> String {
        self.query.to_string()
    }
}

/// CREATE INDEX statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndexData {
    pub index: String,
    pub table: String,
    pub field: String,
    pub kind: IndexKind,
}
