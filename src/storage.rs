//! Block-addressed storage for table and temporary files.
//!
//! The storage layer is the record store's view of the disk: named files made
//! of fixed-size blocks. The query engine never touches it directly; it goes
//! through [`TableScan`](crate::record::TableScan), which reads and writes
//! whole blocks.
//!
//! ```text
//! +-------------------+
//! | TableScan         |  <- record
//! +-------------------+
//!          |
//!          v
//! +-------------------+
//! | MemoryStorage     |  file name -> [block 0, block 1, ...]
//! +-------------------+
//! ```

pub mod block;
pub mod error;
pub mod memory;

pub use block::BlockId;
pub use error::StorageError;
pub use memory::MemoryStorage;
