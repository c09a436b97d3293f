//! Power-of-two buddy splitting on top of the block partition
//!
//! Requests are rounded up to a power of two no smaller than the granule.
//! The scan runs from the head: an exact free block is taken, a larger free
//! block is halved until its lower half matches and the scan restarts from
//! the head. There are no per-order free lists; every restart walks the
//! partition again and every visit counts as a step.
//!
//! Halving an odd-sized block gives the extra unit to the upper half. Free
//! space that is not a power-of-two multiple of the target can be split and
//! still never produce an exact block; such a request fails and the splits
//! made along the way are undone. A zero-size request is rejected like it is
//! by the fit strategies.

use crate::error::Result;
use crate::partition::Partition;
use crate::strategy::{no_fit, Allocation, AllocationStrategy, Strategy};
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct Buddy {
    /// Smallest block size produced by halving
    min_block: u64,
}

impl Buddy {
    pub fn new(min_block: u64) -> Self {
        Buddy { min_block }
    }

    pub fn min_block(&self) -> u64 {
        self.min_block
    }

    /// Block size a request is served with
    ///
    /// None when the rounded size does not fit in a u64.
    pub fn block_size_for(&self, size: u64) -> Option<u64> {
        size.max(self.min_block).checked_next_power_of_two()
    }

    fn can_halve(&self, size: u64, target: u64) -> bool {
        let half = size / 2;
        half >= target && half >= self.min_block
    }

    /// Halve the block at `index` until its lower half can't be halved again
    fn split_down(&self, partition: &mut Partition, index: usize, target: u64) {
        while self.can_halve(partition.block(index).size(), target) {
            let half = partition.block(index).size() / 2;
            partition.split(index, half);
        }
    }
}

impl AllocationStrategy for Buddy {
    fn kind(&self) -> Strategy {
        Strategy::Buddy
    }

    fn allocate(&mut self, partition: &mut Partition, size: u64) -> Result<Allocation> {
        if size == 0 {
            return Err(no_fit(Strategy::Buddy, size, 0));
        }

        let target = self
            .block_size_for(size)
            .ok_or_else(|| no_fit(Strategy::Buddy, size, 0))?;

        let mut steps = 0;
        // Taken before the first split; nothing to undo until then
        let mut snapshot: Option<Partition> = None;

        'scan: loop {
            for index in 0..partition.len() {
                steps += 1;
                let block = partition.block(index);
                if !block.is_free() {
                    continue;
                }

                if block.size() == target {
                    let extent = partition.claim(index, target);
                    debug!(
                        "Buddy placed {} as block of {} at {} (steps: {})",
                        size, target, extent.start, steps
                    );
                    return Ok(Allocation::single(Strategy::Buddy, size, steps, extent));
                }

                // A larger block that can't be halved toward the target is passed over
                if block.size() > target && self.can_halve(block.size(), target) {
                    snapshot.get_or_insert_with(|| partition.clone());
                    self.split_down(partition, index, target);
                    continue 'scan;
                }
            }

            if let Some(snapshot) = snapshot {
                *partition = snapshot;
            }
            return Err(no_fit(Strategy::Buddy, size, steps));
        }
    }
}
