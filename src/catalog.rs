//! System catalog: tables, views and indexes.
//!
//! The catalog keeps the metadata the planner works from:
//!
//! | Entry  | Stored as                   | Used by                          |
//! |--------|-----------------------------|----------------------------------|
//! | table  | [`Layout`] of its records   | table plans, update planner      |
//! | view   | canonical query text        | re-parsed when a query names it  |
//! | index  | [`Index`] contents per field| index select / index join plans  |
//!
//! Statistics ([`StatInfo`]) are not stored; they are recomputed from the
//! table whenever a plan asks for them.

mod error;
pub mod index;
pub mod stats;

pub use error::CatalogError;
pub use index::{Index, IndexInfo, IndexKind};
pub use stats::StatInfo;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::query::ExecError;
use crate::record::{Layout, Schema, TableScan};
use crate::tx::Transaction;

struct IndexEntry {
    name: String,
    field: String,
    index: Index,
}

/// In-memory system catalog shared by every transaction of a database.
pub struct Catalog {
    tables: RwLock<HashMap<String, Arc<Layout>>>,
    views: RwLock<HashMap<String, String>>,
    /// table name -> indexes on that table.
    indexes: RwLock<HashMap<String, Vec<IndexEntry>>>,
    hash_buckets: usize,
}

impl Catalog {
    pub fn new(hash_buckets: usize) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            views: RwLock::new(HashMap::new()),
            indexes: RwLock::new(HashMap::new()),
            hash_buckets,
        }
    }

    fn name_taken(&self, name: &str) -> Option<CatalogError> {
        if self.tables.read().contains_key(name) {
            return Some(CatalogError::TableAlreadyExists {
                name: name.to_string(),
            });
        }
        if self.views.read().contains_key(name) {
            return Some(CatalogError::ViewAlreadyExists {
                name: name.to_string(),
            });
        }
        None
    }

    pub fn create_table(&self, name: &str, schema: Schema) -> Result<(), CatalogError> {
        if let Some(err) = self.name_taken(name) {
            return Err(err);
        }
        debug!(table = name, schema = %schema, "create table");
        self.tables
            .write()
            .insert(name.to_string(), Arc::new(Layout::new(schema)));
        Ok(())
    }

    pub fn layout(&self, table: &str) -> Result<Arc<Layout>, CatalogError> {
        self.tables
            .read()
            .get(table)
            .cloned()
            .ok_or_else(|| CatalogError::TableNotFound {
                name: table.to_string(),
            })
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.tables.read().contains_key(table)
    }

    /// Names of all tables, sorted.
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn create_view(&self, name: &str, definition: &str) -> Result<(), CatalogError> {
        if let Some(err) = self.name_taken(name) {
            return Err(err);
        }
        debug!(view = name, definition, "create view");
        self.views
            .write()
            .insert(name.to_string(), definition.to_string());
        Ok(())
    }

    pub fn view_definition(&self, name: &str) -> Option<String> {
        self.views.read().get(name).cloned()
    }

    /// Creates an index on `table.field` and fills it from the table's
    /// current rows.
    pub fn create_index(
        &self,
        tx: &Transaction,
        name: &str,
        table: &str,
        field: &str,
        kind: IndexKind,
    ) -> Result<(), ExecError> {
        let layout = self.layout(table)?;
        let Some(key_type) = layout.schema().field_type(field) else {
            return Err(CatalogError::FieldNotFound {
                table: table.to_string(),
                field: field.to_string(),
            }
            .into());
        };
        let name_exists = self
            .indexes
            .read()
            .values()
            .flatten()
            .any(|entry| entry.name == name);
        if name_exists {
            return Err(CatalogError::IndexAlreadyExists {
                name: name.to_string(),
            }
            .into());
        }

        let index = Index::new(kind, key_type, self.hash_buckets);
        let mut scan = TableScan::open(tx, table, layout)?;
        let mut entries = 0u64;
        while scan.next()? {
            index.insert(scan.get_val(field)?, scan.rid()?);
            entries += 1;
        }
        scan.close();
        debug!(index = name, table, field, kind = %kind, entries, "create index");

        self.indexes
            .write()
            .entry(table.to_string())
            .or_default()
            .push(IndexEntry {
                name: name.to_string(),
                field: field.to_string(),
                index,
            });
        Ok(())
    }

    /// Statistics of `table`, gathered now.
    pub fn stat_info(&self, tx: &Transaction, table: &str) -> Result<StatInfo, ExecError> {
        let layout = self.layout(table)?;
        StatInfo::compute(tx, table, &layout)
    }

    /// Indexes on `table`, keyed by indexed field.
    ///
    /// When a field carries several indexes the first one created wins.
    pub fn index_info(
        &self,
        tx: &Transaction,
        table: &str,
    ) -> Result<HashMap<String, IndexInfo>, ExecError> {
        let layout = self.layout(table)?;
        let indexes = self.indexes.read();
        let Some(entries) = indexes.get(table).filter(|e| !e.is_empty()) else {
            return Ok(HashMap::new());
        };
        let stats = StatInfo::compute(tx, table, &layout)?;

        let mut result = HashMap::new();
        for entry in entries {
            let Some(field_info) = layout.schema().info(&entry.field) else {
                continue;
            };
            result.entry(entry.field.clone()).or_insert_with(|| {
                IndexInfo::new(
                    entry.name.clone(),
                    entry.field.clone(),
                    field_info,
                    entry.index.clone(),
                    stats.clone(),
                    tx.block_size(),
                    self.hash_buckets,
                )
            });
        }
        Ok(result)
    }

    /// Every index on `table` as `(field, index)` pairs, for maintenance by
    /// inserts, deletes and updates.
    pub fn indexes_of(&self, table: &str) -> Vec<(String, Index)> {
        self.indexes
            .read()
            .get(table)
            .map(|entries| {
                entries
                    .iter()
                    .map(|entry| (entry.field.clone(), entry.index.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}
