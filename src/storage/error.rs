//! Storage layer errors.

use thiserror::Error;

use super::BlockId;

/// Storage layer errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Block number past the end of its file.
    #[error("block not found: {0}")]
    BlockNotFound(BlockId),

    /// Buffer passed to a block read/write does not match the block size.
    #[error("invalid buffer size: expected {expected}, got {actual}")]
    InvalidBufferSize { expected: usize, actual: usize },

    /// The block budget is exhausted.
    #[error("storage is full ({max_blocks} blocks)")]
    StorageFull { max_blocks: u64 },

    /// A record slot does not fit in one block.
    #[error("record of {slot_size} bytes does not fit in a {block_size}-byte block")]
    RecordTooLarge { slot_size: usize, block_size: usize },
}
