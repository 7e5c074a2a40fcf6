//! Executes statements that change data or metadata.

use std::sync::Arc;

use tracing::debug;

use crate::catalog::Catalog;
use crate::plan::{Plan, SelectPlan, TablePlan};
use crate::query::{ExecError, Predicate};
use crate::record::{check_value, TableScan};
use crate::sql::{
    CreateIndexData, CreateTableData, CreateViewData, DeleteData, InsertData, ModifyData,
};
use crate::tx::Transaction;

use super::pipeline::check_predicate;

/// Applies inserts, deletes and updates, keeping every index of the
/// affected table in step with its rows.
///
/// Each method returns the number of rows affected; the `create` statements
/// affect none.
pub struct IndexUpdatePlanner {
    catalog: Arc<Catalog>,
}

impl IndexUpdatePlanner {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Every value is checked against its field before the row is written,
    /// so a rejected insert leaves the table unchanged.
    pub fn execute_insert(&self, tx: &Transaction, data: &InsertData) -> Result<usize, ExecError> {
        if data.fields.len() != data.values.len() {
            return Err(ExecError::ArityMismatch {
                fields: data.fields.len(),
                values: data.values.len(),
            });
        }
        let layout = self.catalog.layout(&data.table)?;
        for (field, value) in data.fields.iter().zip(&data.values) {
            let info = layout
                .schema()
                .info(field)
                .ok_or_else(|| ExecError::FieldNotFound(field.clone()))?;
            check_value(field, info, value)?;
        }

        let mut scan = TableScan::open(tx, &data.table, layout)?;
        scan.insert()?;
        for (field, value) in data.fields.iter().zip(&data.values) {
            scan.set_val(field, value)?;
        }
        let rid = scan.rid()?;
        for (field, index) in self.catalog.indexes_of(&data.table) {
            index.insert(scan.get_val(&field)?, rid);
        }
        scan.close();
        debug!(table = %data.table, rid = %rid, "insert");
        Ok(1)
    }

    pub fn execute_delete(&self, tx: &Transaction, data: &DeleteData) -> Result<usize, ExecError> {
        let plan = self.filtered_table(tx, &data.table, &data.pred)?;
        let indexes = self.catalog.indexes_of(&data.table);
        let mut scan = plan.open(tx)?;
        let mut count = 0;
        while scan.next()? {
            let rid = scan.rid()?;
            for (field, index) in &indexes {
                index.delete(&scan.get_val(field)?, rid);
            }
            scan.delete()?;
            count += 1;
        }
        scan.close();
        debug!(table = %data.table, rows = count, "delete");
        Ok(count)
    }

    pub fn execute_modify(&self, tx: &Transaction, data: &ModifyData) -> Result<usize, ExecError> {
        let plan = self.filtered_table(tx, &data.table, &data.pred)?;
        if !plan.schema().has_field(&data.field) {
            return Err(ExecError::FieldNotFound(data.field.clone()));
        }
        if let Some(field) = data.new_value.as_field() {
            if !plan.schema().has_field(field) {
                return Err(ExecError::FieldNotFound(field.to_string()));
            }
        }
        let index = self
            .catalog
            .indexes_of(&data.table)
            .into_iter()
            .find_map(|(field, index)| (field == data.field).then_some(index));

        let mut scan = plan.open(tx)?;
        let mut count = 0;
        while scan.next()? {
            let new_val = data.new_value.evaluate(&scan)?;
            let old_val = scan.get_val(&data.field)?;
            scan.set_val(&data.field, &new_val)?;
            if let Some(index) = &index {
                let rid = scan.rid()?;
                index.delete(&old_val, rid);
                index.insert(new_val, rid);
            }
            count += 1;
        }
        scan.close();
        debug!(table = %data.table, field = %data.field, rows = count, "update");
        Ok(count)
    }

    pub fn execute_create_table(&self, data: &CreateTableData) -> Result<usize, ExecError> {
        self.catalog.create_table(&data.table, data.schema.clone())?;
        Ok(0)
    }

    pub fn execute_create_view(&self, data: &CreateViewData) -> Result<usize, ExecError> {
        self.catalog.create_view(&data.view, &data.view_def())?;
        Ok(0)
    }

    pub fn execute_create_index(
        &self,
        tx: &Transaction,
        data: &CreateIndexData,
    ) -> Result<usize, ExecError> {
        self.catalog
            .create_index(tx, &data.index, &data.table, &data.field, data.kind)?;
        Ok(0)
    }

    /// `table` filtered by `pred`, as an updatable plan.
    fn filtered_table(
        &self,
        tx: &Transaction,
        table: &str,
        pred: &Predicate,
    ) -> Result<Plan, ExecError> {
        let plan = Plan::Table(TablePlan::new(tx, table, &self.catalog)?);
        check_predicate(pred, plan.schema())?;
        if pred.is_empty() {
            return Ok(plan);
        }
        Ok(Plan::Select(SelectPlan::new(plan, pred.clone())))
    }
}
