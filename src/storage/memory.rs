//! In-memory block storage.

use std::collections::HashMap;

use parking_lot::Mutex;

use super::{BlockId, StorageError};

/// In-memory file store.
///
/// Each file is a growable vector of zero-initialised blocks. All operations
/// take `&self`; the file map sits behind a single `parking_lot::Mutex`
/// because every operation is a short map access plus a memory copy.
///
/// The optional block budget (`max_blocks`) caps the number of blocks alive
/// across all files, which is how callers exercise `StorageFull` failures.
pub struct MemoryStorage {
    block_size: usize,
    files: Mutex<HashMap<String, Vec<Box<[u8]>>>>,
    max_blocks: Option<u64>,
}

impl MemoryStorage {
    /// Creates an empty storage with the given block size.
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size,
            files: Mutex::new(HashMap::new()),
            max_blocks: None,
        }
    }

    /// Creates an empty storage that refuses to hold more than `max_blocks`
    /// blocks in total.
    pub fn with_max_blocks(block_size: usize, max_blocks: u64) -> Self {
        Self {
            block_size,
            files: Mutex::new(HashMap::new()),
            max_blocks: Some(max_blocks),
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of blocks in `file`; a missing file has zero blocks.
    pub fn block_count(&self, file: &str) -> u32 {
        self.files
            .lock()
            .get(file)
            .map_or(0, |blocks| blocks.len() as u32)
    }

    /// Copies the contents of `block` into `buf`.
    pub fn read_block(&self, block: &BlockId, buf: &mut [u8]) -> Result<(), StorageError> {
        self.check_buf(buf.len())?;
        let files = self.files.lock();
        let data = files
            .get(&block.file)
            .and_then(|blocks| blocks.get(block.number as usize))
            .ok_or_else(|| StorageError::BlockNotFound(block.clone()))?;
        buf.copy_from_slice(data);
        Ok(())
    }

    /// Overwrites `block` with `buf`.
    pub fn write_block(&self, block: &BlockId, buf: &[u8]) -> Result<(), StorageError> {
        self.check_buf(buf.len())?;
        let mut files = self.files.lock();
        let data = files
            .get_mut(&block.file)
            .and_then(|blocks| blocks.get_mut(block.number as usize))
            .ok_or_else(|| StorageError::BlockNotFound(block.clone()))?;
        data.copy_from_slice(buf);
        Ok(())
    }

    /// Appends a zeroed block to `file`, creating the file if needed.
    pub fn append_block(&self, file: &str) -> Result<BlockId, StorageError> {
        let mut files = self.files.lock();
        if let Some(max_blocks) = self.max_blocks {
            let total: u64 = files.values().map(|blocks| blocks.len() as u64).sum();
            if total >= max_blocks {
                return Err(StorageError::StorageFull { max_blocks });
            }
        }
        let blocks = files.entry(file.to_string()).or_default();
        blocks.push(vec![0u8; self.block_size].into_boxed_slice());
        Ok(BlockId::new(file, (blocks.len() - 1) as u32))
    }

    /// Removes `file` and its blocks. Returns whether the file existed.
    pub fn delete_file(&self, file: &str) -> bool {
        self.files.lock().remove(file).is_some()
    }

    pub fn file_exists(&self, file: &str) -> bool {
        self.files.lock().contains_key(file)
    }

    /// Names of all files currently held, sorted.
    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.files.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Total number of blocks across all files.
    pub fn total_blocks(&self) -> u64 {
        self.files
            .lock()
            .values()
            .map(|blocks| blocks.len() as u64)
            .sum()
    }

    fn check_buf(&self, len: usize) -> Result<(), StorageError> {
        if len != self.block_size {
            return Err(StorageError::InvalidBufferSize {
                expected: self.block_size,
                actual: len,
            });
        }
        Ok(())
    }
}
