//! Block identifiers.

use std::fmt;

/// Identifies one block of one file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockId {
    /// Name of the file the block belongs to.
    pub file: String,
    /// Zero-based block number within the file.
    pub number: u32,
}

impl BlockId {
    pub fn new(file: impl Into<String>, number: u32) -> Self {
        Self {
            file: file.into(),
            number,
        }
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[file {}, block {}]", self.file, self.number)
    }
}
