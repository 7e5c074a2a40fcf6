//! Sequential, updatable scan over a table file.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use super::layout::Layout;
use super::page::{RecordPage, EMPTY, USED};
use super::schema::{FieldInfo, FieldType};
use crate::query::{Constant, ExecError};
use crate::storage::{BlockId, MemoryStorage, StorageError};
use crate::tx::Transaction;

/// Identifies a record: block number plus slot within the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rid {
    pub block: u32,
    pub slot: usize,
}

impl Rid {
    pub fn new(block: u32, slot: usize) -> Self {
        Self { block, slot }
    }
}

impl fmt::Display for Rid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.block, self.slot)
    }
}

/// Scan over every record of one table file.
///
/// The scan keeps one block image in memory. Every write goes straight back
/// to storage, so nothing is lost if the scan is dropped without `close`.
pub struct TableScan {
    storage: Arc<MemoryStorage>,
    file: String,
    layout: Arc<Layout>,
    buf: Vec<u8>,
    /// Block held in `buf`, `None` while the file is empty.
    block: Option<u32>,
    /// Current slot; `None` means before the first slot of `block`.
    slot: Option<usize>,
}

impl TableScan {
    /// Opens a scan over `file`, positioned before the first record.
    ///
    /// The file does not need to exist yet; an empty scan is returned and
    /// the first `insert` creates it.
    pub fn open(tx: &Transaction, file: &str, layout: Arc<Layout>) -> Result<Self, ExecError> {
        let block_size = tx.block_size();
        if layout.slot_size() > block_size {
            return Err(StorageError::RecordTooLarge {
                slot_size: layout.slot_size(),
                block_size,
            }
            .into());
        }
        let mut scan = Self {
            storage: Arc::clone(tx.storage()),
            file: file.to_string(),
            layout,
            buf: vec![0u8; block_size],
            block: None,
            slot: None,
        };
        scan.before_first()?;
        Ok(scan)
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    pub fn before_first(&mut self) -> Result<(), ExecError> {
        if self.storage.block_count(&self.file) == 0 {
            self.block = None;
            self.slot = None;
            return Ok(());
        }
        self.move_to_block(0)
    }

    /// Advances to the next used slot, crossing block boundaries as needed.
    pub fn next(&mut self) -> Result<bool, ExecError> {
        let Some(mut block) = self.block else {
            return Ok(false);
        };
        loop {
            let page = RecordPage::new(&self.buf[..], &self.layout);
            if let Some(slot) = page.next_used_after(self.slot) {
                self.slot = Some(slot);
                return Ok(true);
            }
            if block + 1 >= self.storage.block_count(&self.file) {
                // Park past the last slot so repeated calls stay exhausted.
                self.slot = Some(page.slot_count());
                return Ok(false);
            }
            block += 1;
            self.move_to_block(block)?;
        }
    }

    fn move_to_block(&mut self, number: u32) -> Result<(), ExecError> {
        let id = BlockId::new(self.file.as_str(), number);
        self.storage.read_block(&id, &mut self.buf)?;
        self.block = Some(number);
        self.slot = None;
        Ok(())
    }

    fn flush(&self) -> Result<(), ExecError> {
        if let Some(number) = self.block {
            let id = BlockId::new(self.file.as_str(), number);
            self.storage.write_block(&id, &self.buf)?;
        }
        Ok(())
    }

    fn current_slot(&self) -> Result<usize, ExecError> {
        match (self.block, self.slot) {
            (Some(_), Some(slot)) if RecordPage::new(&self.buf[..], &self.layout).is_used(slot) => {
                Ok(slot)
            }
            _ => Err(ExecError::NoCurrentRecord),
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.layout.schema().has_field(field)
    }

    pub fn get_val(&self, field: &str) -> Result<Constant, ExecError> {
        let slot = self.current_slot()?;
        RecordPage::new(&self.buf[..], &self.layout)
            .get_val(slot, field)
            .ok_or_else(|| ExecError::FieldNotFound(field.to_string()))
    }

    pub fn get_int(&self, field: &str) -> Result<i32, ExecError> {
        let val = self.get_val(field)?;
        val.as_int().ok_or_else(|| ExecError::TypeMismatch {
            expected: "int".to_string(),
            found: val.type_name().to_string(),
        })
    }

    pub fn get_string(&self, field: &str) -> Result<String, ExecError> {
        match self.get_val(field)? {
            Constant::Str(s) => Ok(s),
            other => Err(ExecError::TypeMismatch {
                expected: "varchar".to_string(),
                found: other.type_name().to_string(),
            }),
        }
    }

    /// Writes `value` into `field` of the current record.
    ///
    /// # Errors
    ///
    /// `TypeMismatch` if the value's kind differs from the field's type and
    /// `ValueTooLong` if a string exceeds the declared length.
    pub fn set_val(&mut self, field: &str, value: &Constant) -> Result<(), ExecError> {
        let slot = self.current_slot()?;
        let info = self
            .layout
            .schema()
            .info(field)
            .ok_or_else(|| ExecError::FieldNotFound(field.to_string()))?;
        check_value(field, info, value)?;
        let layout = Arc::clone(&self.layout);
        RecordPage::new(&mut self.buf[..], &layout).set_val(slot, field, value);
        self.flush()
    }

    pub fn set_int(&mut self, field: &str, value: i32) -> Result<(), ExecError> {
        self.set_val(field, &Constant::Int(value))
    }

    pub fn set_string(&mut self, field: &str, value: &str) -> Result<(), ExecError> {
        self.set_val(field, &Constant::from(value))
    }

    /// Claims a free slot after the current position and moves onto it.
    ///
    /// Appends a block when every later slot is taken. The new record's
    /// fields are zeroed (0 / empty string).
    pub fn insert(&mut self) -> Result<(), ExecError> {
        let layout = Arc::clone(&self.layout);
        loop {
            if self.block.is_some() {
                let page = RecordPage::new(&self.buf[..], &layout);
                let after = self.slot.filter(|&s| s < page.slot_count());
                if let Some(slot) = page.next_empty_after(after) {
                    let mut page = RecordPage::new(&mut self.buf[..], &layout);
                    page.set_flag(slot, USED);
                    self.clear_slot(slot);
                    self.slot = Some(slot);
                    return self.flush();
                }
            }
            let next = self.block.map_or(0, |b| b + 1);
            if next >= self.storage.block_count(&self.file) {
                let id = self.storage.append_block(&self.file)?;
                trace!(file = %self.file, block = id.number, "append block");
                self.move_to_block(id.number)?;
            } else {
                self.move_to_block(next)?;
            }
        }
    }

    fn clear_slot(&mut self, slot: usize) {
        let layout = Arc::clone(&self.layout);
        let mut page = RecordPage::new(&mut self.buf[..], &layout);
        for field in layout.schema().fields() {
            let zero = match layout.schema().field_type(field) {
                Some(FieldType::Varchar) => Constant::Str(String::new()),
                _ => Constant::Int(0),
            };
            page.set_val(slot, field, &zero);
        }
    }

    /// Frees the current record's slot.
    pub fn delete(&mut self) -> Result<(), ExecError> {
        let slot = self.current_slot()?;
        let layout = Arc::clone(&self.layout);
        RecordPage::new(&mut self.buf[..], &layout).set_flag(slot, EMPTY);
        self.flush()
    }

    pub fn rid(&self) -> Result<Rid, ExecError> {
        match (self.block, self.slot) {
            (Some(block), Some(slot)) => Ok(Rid::new(block, slot)),
            _ => Err(ExecError::NoCurrentRecord),
        }
    }

    /// Positions the scan on `rid`. The next `next()` continues after it.
    pub fn move_to_rid(&mut self, rid: Rid) -> Result<(), ExecError> {
        if self.block != Some(rid.block) {
            self.move_to_block(rid.block)?;
        }
        self.slot = Some(rid.slot);
        Ok(())
    }

    /// Releases the block image. Writes are already in storage.
    pub fn close(&mut self) {
        self.block = None;
        self.slot = None;
    }
}

/// Checks that `value` can be stored in a field described by `info`.
pub(crate) fn check_value(
    field: &str,
    info: FieldInfo,
    value: &Constant,
) -> Result<(), ExecError> {
    match (info.ty, value) {
        (FieldType::Int, Constant::Int(_)) => Ok(()),
        (FieldType::Varchar, Constant::Str(s)) if s.len() > info.length => {
            Err(ExecError::ValueTooLong {
                field: field.to_string(),
                max: info.length,
            })
        }
        (FieldType::Varchar, Constant::Str(_)) => Ok(()),
        (ty, value) => Err(ExecError::TypeMismatch {
            expected: ty.as_str().to_string(),
            found: value.type_name().to_string(),
        }),
    }
}
