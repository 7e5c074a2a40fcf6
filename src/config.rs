//! Engine configuration.
//!
//! [`DbConfig`] carries the knobs that the cost model and the record store
//! depend on. Every field has a default, so a config can be deserialized from
//! a partial document or built up with the `with_*` setters.

use serde::Deserialize;
use thiserror::Error;

/// Default block size in bytes.
pub const DEFAULT_BLOCK_SIZE: usize = 400;

/// Default number of buffers a transaction may use.
pub const DEFAULT_BUFFER_COUNT: usize = 8;

/// Default number of buffers used by external sort.
pub const DEFAULT_SORT_BUFFERS: usize = 3;

/// Default number of buckets of a static hash index.
pub const DEFAULT_HASH_INDEX_BUCKETS: usize = 100;

/// A [`DbConfig`] setting outside the range the engine can work with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("block_size {0} is too small")]
    BlockSizeTooSmall(usize),

    #[error("buffer_count must be at least 3, got {0}")]
    TooFewBuffers(usize),

    #[error("sort_buffers must be at least 3, got {0}")]
    TooFewSortBuffers(usize),

    #[error("hash_index_buckets must be positive")]
    NoHashBuckets,
}

/// Configuration for a [`Database`](crate::db::Database).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Size of one block in bytes. Record slots must fit in a block.
    pub block_size: usize,
    /// Buffer budget of each transaction; sizes hash partitions.
    pub buffer_count: usize,
    /// Buffers assumed by the external sort cost formula.
    pub sort_buffers: usize,
    /// Bucket count of static hash indexes.
    pub hash_index_buckets: usize,
    /// Upper bound on allocated blocks across all files (`None` = unlimited).
    pub max_blocks: Option<u64>,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            buffer_count: DEFAULT_BUFFER_COUNT,
            sort_buffers: DEFAULT_SORT_BUFFERS,
            hash_index_buckets: DEFAULT_HASH_INDEX_BUCKETS,
            max_blocks: None,
        }
    }
}

impl DbConfig {
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_buffer_count(mut self, buffer_count: usize) -> Self {
        self.buffer_count = buffer_count;
        self
    }

    pub fn with_sort_buffers(mut self, sort_buffers: usize) -> Self {
        self.sort_buffers = sort_buffers;
        self
    }

    pub fn with_hash_index_buckets(mut self, buckets: usize) -> Self {
        self.hash_index_buckets = buckets;
        self
    }

    pub fn with_max_blocks(mut self, max_blocks: u64) -> Self {
        self.max_blocks = Some(max_blocks);
        self
    }

    /// Checks that the configuration can drive the engine, reporting the
    /// first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_size < 16 {
            return Err(ConfigError::BlockSizeTooSmall(self.block_size));
        }
        if self.buffer_count < 3 {
            return Err(ConfigError::TooFewBuffers(self.buffer_count));
        }
        if self.sort_buffers < 3 {
            return Err(ConfigError::TooFewSortBuffers(self.sort_buffers));
        }
        if self.hash_index_buckets == 0 {
            return Err(ConfigError::NoHashBuckets);
        }
        Ok(())
    }
}
