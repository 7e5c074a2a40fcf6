//! Block-access arithmetic shared by the plan cost formulas.

use crate::record::{Layout, Schema};

/// `ceil(a / b)`, with division by zero treated as division by one.
pub fn ceil_div(a: u64, b: u64) -> u64 {
    a.div_ceil(b.max(1))
}

/// Block accesses of an external merge sort over `len` blocks with
/// `buffers` buffers.
///
/// `2 * len * (1 + passes)`, where `passes` is the number of merge passes
/// needed to reduce `ceil(len / buffers)` initial runs to one, merging
/// `buffers - 1` runs at a time. Sorting nothing costs nothing.
pub fn sort_cost(len: u64, buffers: usize) -> u64 {
    if len == 0 {
        return 0;
    }
    let runs = ceil_div(len, buffers as u64);
    let fan_in = (buffers as u64).saturating_sub(1).max(2);
    let mut passes = 0u64;
    let mut reach = 1u64;
    while reach < runs {
        reach = reach.saturating_mul(fan_in);
        passes += 1;
    }
    len.saturating_mul(2).saturating_mul(1 + passes)
}

/// Blocks needed to hold `records` records of `schema` in a temporary table.
pub fn materialized_blocks(schema: &Schema, records: u64, block_size: usize) -> u64 {
    let per_block = Layout::new(schema.clone()).records_per_block(block_size);
    ceil_div(records, per_block as u64)
}

/// The smallest number of chunks, each fitting in the available buffers,
/// that `size` blocks can be split into.
///
/// Two buffers are held back for the scans themselves. The result is always
/// at least one.
pub fn best_factor(available: usize, size: u64) -> usize {
    let avail = available.saturating_sub(2) as u64;
    if avail <= 1 {
        return 1;
    }
    let chunks = ceil_div(size, avail).max(1);
    usize::try_from(chunks).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_cost() {
        assert_eq!(sort_cost(0, 3), 0);
        // One run: no merge pass.
        assert_eq!(sort_cost(3, 3), 6);
        // 4 runs of 3 blocks, merged 2 at a time: 2 passes.
        assert_eq!(sort_cost(10, 3), 60);
        // 2 runs: 1 pass.
        assert_eq!(sort_cost(6, 3), 24);
        assert_eq!(sort_cost(100, 11), 400);
    }

    #[test]
    fn test_materialized_blocks() {
        let mut schema = Schema::new();
        schema.add_int_field("a");
        // 8-byte slots, 8 per 64-byte block.
        assert_eq!(materialized_blocks(&schema, 0, 64), 0);
        assert_eq!(materialized_blocks(&schema, 8, 64), 1);
        assert_eq!(materialized_blocks(&schema, 9, 64), 2);
    }

    #[test]
    fn test_best_factor() {
        assert_eq!(best_factor(3, 100), 1);
        assert_eq!(best_factor(8, 0), 1);
        assert_eq!(best_factor(8, 6), 1);
        assert_eq!(best_factor(8, 7), 2);
        assert_eq!(best_factor(8, 13), 3);
        assert_eq!(best_factor(12, 100), 10);
        assert_eq!(best_factor(12, 101), 11);
        assert_eq!(best_factor(12, u64::MAX) as u64, ceil_div(u64::MAX, 10));
    }
}
