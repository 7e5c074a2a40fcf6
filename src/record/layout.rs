//! Physical record layout.
//!
//! Every record of a table occupies one fixed-size slot:
//!
//! ```text
//! +--------+---------+---------+-----+
//! | flag 4 | field 0 | field 1 | ... |
//! +--------+---------+---------+-----+
//! ```
//!
//! Integers take 4 bytes; a `varchar(n)` takes a 4-byte length prefix plus
//! `n` bytes.

use std::collections::HashMap;

use super::schema::{FieldType, Schema};

/// Size of the in-use flag at the start of every slot.
pub const FLAG_SIZE: usize = 4;

/// Size of an encoded integer.
pub const INT_SIZE: usize = 4;

/// Bytes needed to store a value of the given type and declared length.
pub fn field_size(ty: FieldType, length: usize) -> usize {
    match ty {
        FieldType::Int => INT_SIZE,
        FieldType::Varchar => INT_SIZE + length,
    }
}

/// A schema together with the byte offset of each field in a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    schema: Schema,
    offsets: HashMap<String, usize>,
    slot_size: usize,
}

impl Layout {
    pub fn new(schema: Schema) -> Self {
        let mut offsets = HashMap::with_capacity(schema.len());
        let mut pos = FLAG_SIZE;
        for name in schema.fields() {
            offsets.insert(name.clone(), pos);
            if let Some(info) = schema.info(name) {
                pos += field_size(info.ty, info.length);
            }
        }
        Self {
            schema,
            offsets,
            slot_size: pos,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn offset(&self, field: &str) -> Option<usize> {
        self.offsets.get(field).copied()
    }

    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    /// Number of slots that fit in a block of `block_size` bytes.
    pub fn records_per_block(&self, block_size: usize) -> usize {
        block_size / self.slot_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_follow_field_order() {
        let mut schema = Schema::new();
        schema.add_int_field("a");
        schema.add_string_field("b", 9);
        schema.add_int_field("c");
        let layout = Layout::new(schema);

        assert_eq!(layout.offset("a"), Some(4));
        assert_eq!(layout.offset("b"), Some(8));
        assert_eq!(layout.offset("c"), Some(21));
        assert_eq!(layout.offset("d"), None);
        assert_eq!(layout.slot_size(), 25);
        assert_eq!(layout.records_per_block(100), 4);
    }

    #[test]
    fn test_empty_schema_has_only_flag() {
        let layout = Layout::new(Schema::new());
        assert_eq!(layout.slot_size(), FLAG_SIZE);
    }
}
