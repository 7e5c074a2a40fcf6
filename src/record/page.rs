//! Slotted record page.
//!
//! A block is divided into `block_size / slot_size` fixed-size slots. Each
//! slot starts with a 4-byte flag ([`EMPTY`] or [`USED`]) followed by the
//! fields at the offsets given by the [`Layout`]. All integers are encoded
//! little-endian.

use super::layout::{Layout, INT_SIZE};
use super::schema::FieldType;
use crate::query::Constant;

/// Flag value of a free slot. A freshly allocated (zeroed) block is all free.
pub const EMPTY: u32 = 0;

/// Flag value of an occupied slot.
pub const USED: u32 = 1;

/// A view of one block interpreted as record slots.
///
/// Like the heap page it is generic over the buffer: `&[u8]` gives a
/// read-only view, `&mut [u8]` or `Vec<u8>` a writable one.
pub struct RecordPage<'a, T> {
    data: T,
    layout: &'a Layout,
}

impl<'a, T: AsRef<[u8]>> RecordPage<'a, T> {
    pub fn new(data: T, layout: &'a Layout) -> Self {
        Self { data, layout }
    }

    fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    /// Number of slots in this block.
    pub fn slot_count(&self) -> usize {
        self.layout.records_per_block(self.data().len())
    }

    fn slot_offset(&self, slot: usize) -> usize {
        slot * self.layout.slot_size()
    }

    fn read_u32(&self, pos: usize) -> u32 {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.data()[pos..pos + 4]);
        u32::from_le_bytes(bytes)
    }

    pub fn is_used(&self, slot: usize) -> bool {
        slot < self.slot_count() && self.read_u32(self.slot_offset(slot)) == USED
    }

    /// Reads `field` of the record in `slot`, or `None` if the layout has no
    /// such field.
    pub fn get_val(&self, slot: usize, field: &str) -> Option<Constant> {
        let info = self.layout.schema().info(field)?;
        let pos = self.slot_offset(slot) + self.layout.offset(field)?;
        let value = match info.ty {
            FieldType::Int => Constant::Int(self.read_u32(pos) as i32),
            FieldType::Varchar => {
                let len = (self.read_u32(pos) as usize).min(info.length);
                let start = pos + INT_SIZE;
                let bytes = &self.data()[start..start + len];
                Constant::Str(String::from_utf8_lossy(bytes).into_owned())
            }
        };
        Some(value)
    }

    /// First used slot strictly after `slot` (`None` = from the start).
    pub fn next_used_after(&self, slot: Option<usize>) -> Option<usize> {
        self.search_after(slot, USED)
    }

    /// First free slot strictly after `slot` (`None` = from the start).
    pub fn next_empty_after(&self, slot: Option<usize>) -> Option<usize> {
        self.search_after(slot, EMPTY)
    }

    fn search_after(&self, slot: Option<usize>, flag: u32) -> Option<usize> {
        let start = slot.map_or(0, |s| s + 1);
        (start..self.slot_count()).find(|&s| self.read_u32(self.slot_offset(s)) == flag)
    }

    /// Number of used slots.
    pub fn record_count(&self) -> usize {
        (0..self.slot_count())
            .filter(|&s| self.read_u32(self.slot_offset(s)) == USED)
            .count()
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> RecordPage<'_, T> {
    fn data_mut(&mut self) -> &mut [u8] {
        self.data.as_mut()
    }

    fn write_u32(&mut self, pos: usize, value: u32) {
        self.data_mut()[pos..pos + 4].copy_from_slice(&value.to_le_bytes());
    }

    pub fn set_flag(&mut self, slot: usize, flag: u32) {
        let pos = self.slot_offset(slot);
        self.write_u32(pos, flag);
    }

    /// Writes `value` into `field` of the record in `slot`.
    ///
    /// The caller has already checked the value's kind and length against
    /// the schema; a string longer than the field is truncated. Returns
    /// `false` if the layout has no such field.
    pub fn set_val(&mut self, slot: usize, field: &str, value: &Constant) -> bool {
        let (Some(info), Some(offset)) =
            (self.layout.schema().info(field), self.layout.offset(field))
        else {
            return false;
        };
        let pos = self.slot_offset(slot) + offset;
        match value {
            Constant::Int(v) => self.write_u32(pos, *v as u32),
            Constant::Str(s) => {
                let bytes = &s.as_bytes()[..s.len().min(info.length)];
                self.write_u32(pos, bytes.len() as u32);
                let start = pos + INT_SIZE;
                self.data_mut()[start..start + bytes.len()].copy_from_slice(bytes);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Schema;

    fn layout() -> Layout {
        let mut schema = Schema::new();
        schema.add_int_field("id");
        schema.add_string_field("name", 6);
        Layout::new(schema)
    }

    #[test]
    fn test_zeroed_block_is_empty() {
        let layout = layout();
        let data = vec![0u8; 64];
        let page = RecordPage::new(&data[..], &layout);
        assert_eq!(page.slot_count(), 3);
        assert_eq!(page.next_used_after(None), None);
        assert_eq!(page.next_empty_after(None), Some(0));
        assert_eq!(page.record_count(), 0);
    }

    #[test]
    fn test_set_and_get_values() {
        let layout = layout();
        let mut data = vec![0u8; 64];
        let mut page = RecordPage::new(&mut data[..], &layout);
        page.set_flag(1, USED);
        assert!(page.set_val(1, "id", &Constant::Int(-42)));
        assert!(page.set_val(1, "name", &Constant::from("bob")));
        assert!(!page.set_val(1, "missing", &Constant::Int(0)));

        assert!(page.is_used(1));
        assert!(!page.is_used(0));
        assert_eq!(page.get_val(1, "id"), Some(Constant::Int(-42)));
        assert_eq!(page.get_val(1, "name"), Some(Constant::from("bob")));
        assert_eq!(page.get_val(1, "missing"), None);
        assert_eq!(page.next_used_after(None), Some(1));
        assert_eq!(page.next_used_after(Some(1)), None);
        assert_eq!(page.next_empty_after(Some(0)), Some(2));
    }

    #[test]
    fn test_string_is_truncated_to_field_length() {
        let layout = layout();
        let mut data = vec![0u8; 64];
        let mut page = RecordPage::new(&mut data[..], &layout);
        page.set_flag(0, USED);
        page.set_val(0, "name", &Constant::from("abcdefghij"));
        assert_eq!(page.get_val(0, "name"), Some(Constant::from("abcdef")));
    }
}
