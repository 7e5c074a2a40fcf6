//! Secondary indexes.
//!
//! Index contents live in memory next to the catalog. Costs are estimated as
//! if the index were stored in blocks of `(dataval, block, id)` records, which
//! is what the planner compares against table scans.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use super::stats::StatInfo;
use crate::query::{Constant, ExecError};
use crate::record::layout::{field_size, FLAG_SIZE, INT_SIZE};
use crate::record::{FieldInfo, FieldType, Rid};

/// Index organisation named in `create index ... using <kind>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// Static hash index with a fixed bucket count.
    Hash,
    /// Ordered index.
    BTree,
}

impl IndexKind {
    /// Parses an index type name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hash" => Some(IndexKind::Hash),
            "btree" => Some(IndexKind::BTree),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IndexKind::Hash => "hash",
            IndexKind::BTree => "btree",
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

enum IndexData {
    Hash(Vec<Vec<(Constant, Rid)>>),
    BTree(BTreeMap<Constant, Vec<Rid>>),
}

/// Shared handle on the contents of one index.
#[derive(Clone)]
pub struct Index {
    kind: IndexKind,
    key_type: FieldType,
    data: Arc<RwLock<IndexData>>,
}

impl Index {
    /// An empty index over keys of type `key_type`.
    pub fn new(kind: IndexKind, key_type: FieldType, buckets: usize) -> Self {
        let data = match kind {
            IndexKind::Hash => IndexData::Hash(vec![Vec::new(); buckets.max(1)]),
            IndexKind::BTree => IndexData::BTree(BTreeMap::new()),
        };
        Self {
            kind,
            key_type,
            data: Arc::new(RwLock::new(data)),
        }
    }

    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    /// Rids of every record whose indexed field equals `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::TypeMismatch`] when `key` is not of the indexed
    /// field's type, as comparing the field itself would.
    pub fn lookup(&self, key: &Constant) -> Result<Vec<Rid>, ExecError> {
        if key.type_name() != self.key_type.as_str() {
            return Err(ExecError::TypeMismatch {
                expected: self.key_type.as_str().to_string(),
                found: key.type_name().to_string(),
            });
        }
        let rids = match &*self.data.read() {
            IndexData::Hash(buckets) => buckets[key.bucket(buckets.len())]
                .iter()
                .filter(|(k, _)| k == key)
                .map(|(_, rid)| *rid)
                .collect(),
            IndexData::BTree(map) => map.get(key).cloned().unwrap_or_default(),
        };
        Ok(rids)
    }

    pub fn insert(&self, key: Constant, rid: Rid) {
        match &mut *self.data.write() {
            IndexData::Hash(buckets) => {
                let bucket = key.bucket(buckets.len());
                buckets[bucket].push((key, rid));
            }
            IndexData::BTree(map) => map.entry(key).or_default().push(rid),
        }
    }

    /// Removes one `(key, rid)` entry. Returns whether it was present.
    pub fn delete(&self, key: &Constant, rid: Rid) -> bool {
        match &mut *self.data.write() {
            IndexData::Hash(buckets) => {
                let i = key.bucket(buckets.len());
                let bucket = &mut buckets[i];
                match bucket.iter().position(|(k, r)| k == key && *r == rid) {
                    Some(pos) => {
                        bucket.swap_remove(pos);
                        true
                    }
                    None => false,
                }
            }
            IndexData::BTree(map) => {
                let Some(rids) = map.get_mut(key) else {
                    return false;
                };
                let Some(pos) = rids.iter().position(|r| *r == rid) else {
                    return false;
                };
                rids.remove(pos);
                if rids.is_empty() {
                    map.remove(key);
                }
                true
            }
        }
    }
}

/// Planner-facing description of an index: what it covers and what using it
/// costs, given the current statistics of its table.
#[derive(Clone)]
pub struct IndexInfo {
    name: String,
    field: String,
    field_info: FieldInfo,
    index: Index,
    stats: StatInfo,
    block_size: usize,
    buckets: usize,
}

impl IndexInfo {
    pub(crate) fn new(
        name: String,
        field: String,
        field_info: FieldInfo,
        index: Index,
        stats: StatInfo,
        block_size: usize,
        buckets: usize,
    ) -> Self {
        Self {
            name,
            field,
            field_info,
            index,
            stats,
            block_size,
            buckets,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn kind(&self) -> IndexKind {
        self.index.kind()
    }

    /// Handle for lookups and maintenance.
    pub fn open(&self) -> Index {
        self.index.clone()
    }

    /// Index records per block: `(dataval, block, id)` plus the slot flag.
    fn records_per_block(&self) -> u64 {
        let dataval = field_size(self.field_info.ty, self.field_info.length);
        let slot = FLAG_SIZE + dataval + 2 * INT_SIZE;
        (self.block_size / slot).max(1) as u64
    }

    /// Blocks the index would occupy.
    pub fn index_blocks(&self) -> u64 {
        self.stats.records_output() / self.records_per_block()
    }

    /// Estimated block accesses of one index search.
    pub fn blocks_accessed(&self) -> u64 {
        let blocks = self.index_blocks();
        match self.kind() {
            IndexKind::Hash => blocks / self.buckets.max(1) as u64,
            IndexKind::BTree => {
                let rpb = self.records_per_block().max(2);
                if blocks <= 1 {
                    1
                } else {
                    1 + ((blocks as f64).ln() / (rpb as f64).ln()) as u64
                }
            }
        }
    }

    /// Estimated number of records matching one search key.
    pub fn records_output(&self) -> u64 {
        self.stats.records_output() / self.stats.distinct_values(&self.field)
    }

    pub fn distinct_values(&self, field: &str) -> u64 {
        if field == self.field {
            1
        } else {
            self.stats.distinct_values(field)
        }
    }
}

impl fmt::Debug for IndexInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexInfo")
            .field("name", &self.name)
            .field("field", &self.field)
            .field("kind", &self.kind())
            .finish()
    }
}
