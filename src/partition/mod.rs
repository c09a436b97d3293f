//! Ordered block partition of the simulated address space
//!
//! The partition owns every block record, stored in address order. Between
//! public operations the blocks tile `[0, capacity)` exactly. Releasing a
//! block merges it with one free neighbor on each side. Buddy halving leaves
//! free blocks side by side, so after a buddy split the merged range can
//! still sit next to another free block.

pub mod block;

pub use block::{Block, BlockId, BlockInfo, Extent};

use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Result of a compaction pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactionSummary {
    /// Used blocks whose start offset changed
    pub moved_blocks: usize,
    /// Free records discarded (including a pre-existing trailing one)
    pub merged_free_blocks: usize,
    /// Size of the single trailing free block (0 when memory is full)
    pub free_space: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partition {
    /// Blocks in address order
    blocks: Vec<Block>,

    /// Size of the address space being tiled
    capacity: u64,

    /// Next identity handed to a new block record
    next_id: u64,
}

impl Partition {
    /// Create a partition holding one free block that spans the whole space
    pub fn new(capacity: u64) -> Self {
        let mut partition = Partition {
            blocks: Vec::new(),
            capacity,
            next_id: 0,
        };

        if capacity > 0 {
            let block = partition.new_block(0, capacity);
            partition.blocks.push(block);
        }

        partition
    }

    fn new_block(&mut self, start: u64, size: u64) -> Block {
        let id = BlockId(self.next_id);
        self.next_id += 1;
        Block {
            id,
            start,
            size,
            free: true,
        }
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Number of block records
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Iterate blocks in address order
    ///
    /// Each call starts again from the head.
    pub fn traverse(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    /// Block at a position in address order
    ///
    /// Panics if `index` is out of range, like slice indexing.
    pub fn block(&self, index: usize) -> &Block {
        &self.blocks[index]
    }

    pub fn get(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// Position of a block by identity
    pub fn position_of(&self, id: BlockId) -> Option<usize> {
        self.blocks.iter().position(|block| block.id == id)
    }

    /// Position of the block starting exactly at `start`
    pub fn find_by_start(&self, start: u64) -> Option<usize> {
        self.blocks.iter().position(|block| block.start == start)
    }

    /// Shrink the free block at `index` to `size` and insert the remainder after it
    ///
    /// Returns false (and leaves the partition untouched) unless the block is
    /// free and `0 < size < block.size`.
    ///
    /// Panics if `index` is out of range.
    pub fn split(&mut self, index: usize, size: u64) -> bool {
        let (start, total, free) = {
            let block = &self.blocks[index];
            (block.start, block.size, block.free)
        };

        if !free || size == 0 || size >= total {
            return false;
        }

        let remainder = self.new_block(start + size, total - size);
        self.blocks[index].size = size;
        self.blocks.insert(index + 1, remainder);

        debug!(
            "Split block at {}: {} -> {} + {}",
            start,
            total,
            size,
            total - size
        );
        true
    }

    /// Take `size` units from the front of the free block at `index`
    ///
    /// Splits when the block is larger than needed and marks the retained
    /// prefix used. The caller has already checked the block fits.
    pub(crate) fn claim(&mut self, index: usize, size: u64) -> Extent {
        self.split(index, size);
        let block = &mut self.blocks[index];
        block.free = false;
        block.extent()
    }

    /// Mark the block at `index` free and merge it with free neighbors
    ///
    /// Returns the position of the surviving free block. Panics if `index`
    /// is out of range.
    pub fn release(&mut self, index: usize) -> usize {
        self.blocks[index].free = true;
        self.coalesce_around(index)
    }

    /// Merge a free block with its free successor, then with its free predecessor
    ///
    /// The successor is absorbed into the block first; the block (with
    /// whatever it absorbed) is then absorbed into the predecessor. Only one
    /// neighbor on each side is merged.
    ///
    /// Panics if `index` is out of range.
    pub fn coalesce_around(&mut self, index: usize) -> usize {
        if !self.blocks[index].free {
            return index;
        }

        if index + 1 < self.blocks.len() && self.blocks[index + 1].free {
            let next = self.blocks.remove(index + 1);
            self.blocks[index].size += next.size;
            debug!(
                "Coalesced block at {} into block at {}",
                next.start, self.blocks[index].start
            );
        }

        if index > 0 && self.blocks[index - 1].free {
            let current = self.blocks.remove(index);
            self.blocks[index - 1].size += current.size;
            debug!(
                "Coalesced block at {} into block at {}",
                current.start,
                self.blocks[index - 1].start
            );
            return index - 1;
        }

        index
    }

    /// Slide every used block to the front and leave one trailing free block
    pub fn compact(&mut self) -> CompactionSummary {
        let mut current_start = 0;
        let mut moved_blocks = 0;
        let before = self.blocks.len();

        self.blocks.retain(|block| !block.free);
        let merged_free_blocks = before - self.blocks.len();

        for block in &mut self.blocks {
            if block.start != current_start {
                block.start = current_start;
                moved_blocks += 1;
            }
            current_start += block.size;
        }

        let free_space = self.capacity - current_start;
        if free_space > 0 {
            let tail = self.new_block(current_start, free_space);
            self.blocks.push(tail);
        }

        CompactionSummary {
            moved_blocks,
            merged_free_blocks,
            free_space,
        }
    }

    /// Snapshot of every block in address order
    pub fn dump(&self) -> Vec<BlockInfo> {
        self.blocks.iter().map(Block::info).collect()
    }

    /// Number of neighboring pairs that are both free
    pub fn adjacent_free_pairs(&self) -> usize {
        self.blocks
            .windows(2)
            .filter(|pair| pair[0].free && pair[1].free)
            .count()
    }

    /// Check the tiling invariant
    ///
    /// Reports the first violation found.
    pub fn validate(&self) -> Result<()> {
        let mut expected_start = 0;

        for (index, block) in self.blocks.iter().enumerate() {
            if block.size == 0 {
                return Err(SimError::InvariantViolation(format!(
                    "block {} at {} has zero size",
                    index, block.start
                )));
            }

            if block.start != expected_start {
                return Err(SimError::InvariantViolation(format!(
                    "block {} starts at {} but previous block ends at {}",
                    index, block.start, expected_start
                )));
            }

            expected_start = block.end();
        }

        if expected_start != self.capacity {
            return Err(SimError::InvariantViolation(format!(
                "blocks cover [0, {}) but capacity is {}",
                expected_start, self.capacity
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(partition: &Partition) -> Vec<(u64, u64, bool)> {
        partition
            .traverse()
            .map(|b| (b.start(), b.size(), b.is_free()))
            .collect()
    }

    #[test]
    fn test_partition_creation() {
        let partition = Partition::new(1024);
        assert_eq!(partition.len(), 1);
        assert_eq!(shape(&partition), vec![(0, 1024, true)]);
        assert!(partition.validate().is_ok());
    }

    #[test]
    #[should_panic]
    fn test_release_out_of_range_panics() {
        let mut partition = Partition::new(1024);
        partition.release(1);
    }

    #[test]
    #[should_panic]
    fn test_split_out_of_range_panics() {
        let mut partition = Partition::new(1024);
        partition.split(3, 10);
    }

    #[test]
    fn test_split() {
        let mut partition = Partition::new(1024);
        assert!(partition.split(0, 100));
        assert_eq!(shape(&partition), vec![(0, 100, true), (100, 924, true)]);

        // Equal or larger sizes are rejected
        assert!(!partition.split(0, 100));
        assert!(!partition.split(0, 200));
        assert!(!partition.split(0, 0));
        assert_eq!(partition.len(), 2);
    }

    #[test]
    fn test_split_rejects_used_block() {
        let mut partition = Partition::new(1024);
        partition.claim(0, 100);
        assert!(!partition.split(0, 50));
    }

    #[test]
    fn test_claim_exact_does_not_split() {
        let mut partition = Partition::new(1024);
        let extent = partition.claim(0, 1024);
        assert_eq!(extent, Extent::new(0, 1024));
        assert_eq!(shape(&partition), vec![(0, 1024, false)]);
    }

    #[test]
    fn test_release_coalesces_both_sides() {
        let mut partition = Partition::new(300);
        partition.claim(0, 100);
        partition.claim(1, 100);
        partition.claim(2, 100);

        assert_eq!(partition.release(0), 0);
        assert_eq!(partition.release(2), 2);
        assert_eq!(partition.len(), 3);

        // Middle block merges with successor first, then predecessor
        assert_eq!(partition.release(1), 0);
        assert_eq!(shape(&partition), vec![(0, 300, true)]);
        assert!(partition.validate().is_ok());
    }

    #[test]
    fn test_release_keeps_used_neighbors() {
        let mut partition = Partition::new(300);
        partition.claim(0, 100);
        partition.claim(1, 100);
        partition.claim(2, 100);

        partition.release(1);
        assert_eq!(
            shape(&partition),
            vec![(0, 100, false), (100, 100, true), (200, 100, false)]
        );
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut partition = Partition::new(1024);
        partition.claim(0, 100);
        let remainder = partition.block(1).id();

        partition.release(0);
        assert_eq!(partition.position_of(remainder), None);

        partition.claim(0, 100);
        assert_ne!(partition.block(1).id(), remainder);
    }

    #[test]
    fn test_compact() {
        let mut partition = Partition::new(1024);
        partition.claim(0, 100);
        partition.claim(1, 200);
        partition.claim(2, 50);
        partition.release(1);

        let summary = partition.compact();
        assert_eq!(summary.moved_blocks, 1);
        assert_eq!(summary.merged_free_blocks, 2);
        assert_eq!(summary.free_space, 874);
        assert_eq!(
            shape(&partition),
            vec![(0, 100, false), (100, 50, false), (150, 874, true)]
        );
        assert!(partition.validate().is_ok());
    }

    #[test]
    fn test_compact_empty_and_full() {
        let mut partition = Partition::new(1024);
        let summary = partition.compact();
        assert_eq!(summary.free_space, 1024);
        assert_eq!(shape(&partition), vec![(0, 1024, true)]);

        partition.claim(0, 1024);
        let summary = partition.compact();
        assert_eq!(summary.free_space, 0);
        assert_eq!(shape(&partition), vec![(0, 1024, false)]);
        assert!(partition.validate().is_ok());
    }

    #[test]
    fn test_find_by_start() {
        let mut partition = Partition::new(1024);
        partition.claim(0, 100);
        assert_eq!(partition.find_by_start(100), Some(1));
        assert_eq!(partition.find_by_start(50), None);
    }

    #[test]
    fn test_validate_detects_gap() {
        let mut partition = Partition::new(1024);
        partition.split(0, 100);
        partition.blocks[1].start = 120;

        assert!(matches!(
            partition.validate(),
            Err(SimError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_adjacent_free_pairs() {
        let mut partition = Partition::new(1024);
        assert_eq!(partition.adjacent_free_pairs(), 0);

        partition.split(0, 100);
        assert_eq!(partition.adjacent_free_pairs(), 1);
        assert!(partition.validate().is_ok());

        partition.coalesce_around(0);
        assert_eq!(partition.adjacent_free_pairs(), 0);
    }

    #[test]
    fn test_validate_detects_short_cover() {
        let mut partition = Partition::new(1024);
        partition.blocks[0].size = 1000;

        assert!(matches!(
            partition.validate(),
            Err(SimError::InvariantViolation(_))
        ));
    }
}
