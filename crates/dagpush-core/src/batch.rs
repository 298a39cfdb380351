//! Batch packing for upload transactions
//!
//! Blocks are grouped greedily, preserving order. A new batch starts when
//! the current one already holds `max_actions` blocks, or when its payload
//! total has already reached `max_bytes`. The byte check looks at what has
//! been accumulated, not at the incoming block, so an oversized block is
//! never split: it just ends up closing its batch.

use crate::types::Block;

/// Maximum number of blocks per batch
pub const MAX_BATCH_ACTIONS: usize = 7;

/// Cumulative payload size at which a batch is closed
pub const MAX_BATCH_BYTES: usize = 262_144;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    pub max_actions: usize,
    pub max_bytes: usize,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            max_actions: MAX_BATCH_ACTIONS,
            max_bytes: MAX_BATCH_BYTES,
        }
    }
}

/// Partition blocks into ordered batches
///
/// Always returns at least one (possibly empty) batch.
pub fn pack_batches(blocks: Vec<Block>, limits: BatchLimits) -> Vec<Vec<Block>> {
    let mut batches = vec![Vec::new()];
    let mut current_bytes = 0usize;

    for block in blocks {
        let full = match batches.last() {
            Some(current) => {
                !current.is_empty()
                    && (current.len() >= limits.max_actions || current_bytes >= limits.max_bytes)
            }
            None => true,
        };
        if full {
            batches.push(Vec::new());
            current_bytes = 0;
        }

        current_bytes += block.len();
        if let Some(current) = batches.last_mut() {
            current.push(block);
        }
    }

    batches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks_of(sizes: &[usize]) -> Vec<Block> {
        sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| {
                let mut data = vec![0u8; size];
                if let Some(first) = data.first_mut() {
                    *first = i as u8;
                }
                Block::raw(data)
            })
            .collect()
    }

    fn shape(batches: &[Vec<Block>]) -> Vec<usize> {
        batches.iter().map(|b| b.len()).collect()
    }

    #[test]
    fn test_empty_input_yields_one_empty_batch() {
        let batches = pack_batches(Vec::new(), BatchLimits::default());
        assert_eq!(batches.len(), 1);
        assert!(batches[0].is_empty());
    }

    #[test]
    fn test_count_limit() {
        let batches = pack_batches(blocks_of(&[1; 15]), BatchLimits::default());
        assert_eq!(shape(&batches), vec![7, 7, 1]);
    }

    #[test]
    fn test_preserves_order() {
        let input = blocks_of(&[1; 10]);
        let batches = pack_batches(input.clone(), BatchLimits::default());
        let flat: Vec<Block> = batches.into_iter().flatten().collect();
        assert_eq!(flat, input);
    }

    #[test]
    fn test_oversized_block_is_not_split() {
        let batches = pack_batches(
            blocks_of(&[MAX_BATCH_BYTES + 10, 1, 1]),
            BatchLimits::default(),
        );
        assert_eq!(shape(&batches), vec![1, 2]);
        assert_eq!(batches[0][0].len(), MAX_BATCH_BYTES + 10);
    }

    #[test]
    fn test_byte_limit_checks_accumulated_size() {
        let half = MAX_BATCH_BYTES / 2;
        // 2 halves reach the limit exactly; the third starts a new batch
        let batches = pack_batches(blocks_of(&[half, half, half]), BatchLimits::default());
        assert_eq!(shape(&batches), vec![2, 1]);

        // just under the limit accepts one more block even if it overshoots
        let batches = pack_batches(
            blocks_of(&[half, half - 1, half, 1]),
            BatchLimits::default(),
        );
        assert_eq!(shape(&batches), vec![3, 1]);
    }

    #[test]
    fn test_batch_bounds_hold() {
        let sizes: Vec<usize> = (0..40).map(|i| (i * 7919) % 90_000 + 1).collect();
        let limits = BatchLimits::default();
        for batch in pack_batches(blocks_of(&sizes), limits) {
            assert!(batch.len() <= limits.max_actions);
            let before_last: usize = batch[..batch.len() - 1].iter().map(|b| b.len()).sum();
            assert!(before_last < limits.max_bytes);
        }
    }

    #[test]
    fn test_custom_limits() {
        let limits = BatchLimits {
            max_actions: 2,
            max_bytes: usize::MAX,
        };
        let batches = pack_batches(blocks_of(&[1, 1, 1, 1, 1]), limits);
        assert_eq!(shape(&batches), vec![2, 2, 1]);
    }
}
