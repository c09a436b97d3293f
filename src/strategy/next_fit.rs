//! Next-fit: first-fit that resumes where the previous search stopped
//!
//! The cursor is a block id, not a position. If the block it names has been
//! merged away or discarded by compaction, the search restarts at the head.

use crate::error::Result;
use crate::partition::{BlockId, Partition};
use crate::strategy::{no_fit, Allocation, AllocationStrategy, Strategy};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct NextFit {
    cursor: Option<BlockId>,
}

impl NextFit {
    pub fn new() -> Self {
        NextFit { cursor: None }
    }

    /// Position the next search will start from
    pub fn cursor_position(&self, partition: &Partition) -> usize {
        self.cursor
            .and_then(|id| partition.position_of(id))
            .unwrap_or(0)
    }

    /// Forget the cursor so the next search starts at the head
    pub fn reset(&mut self) {
        self.cursor = None;
    }
}

impl AllocationStrategy for NextFit {
    fn kind(&self) -> Strategy {
        Strategy::NextFit
    }

    fn allocate(&mut self, partition: &mut Partition, size: u64) -> Result<Allocation> {
        if size == 0 || partition.is_empty() {
            return Err(no_fit(Strategy::NextFit, size, 0));
        }

        let origin = self.cursor_position(partition);
        let len = partition.len();
        let mut index = origin;
        let mut steps = 0;

        loop {
            steps += 1;
            if partition.block(index).fits(size) {
                break;
            }

            index = (index + 1) % len;
            if index == origin {
                return Err(no_fit(Strategy::NextFit, size, steps));
            }
        }

        let extent = partition.claim(index, size);

        let following = if index + 1 < partition.len() { index + 1 } else { 0 };
        self.cursor = Some(partition.block(following).id());

        debug!(
            "Next-Fit placed {} at {} (steps: {}, resume at {})",
            size,
            extent.start,
            steps,
            partition.block(following).start()
        );
        Ok(Allocation::single(Strategy::NextFit, size, steps, extent))
    }
}
