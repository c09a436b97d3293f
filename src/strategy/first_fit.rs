//! First-fit: take the first free block large enough

use crate::error::Result;
use crate::partition::Partition;
use crate::strategy::{no_fit, Allocation, AllocationStrategy, Strategy};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct FirstFit;

impl AllocationStrategy for FirstFit {
    fn kind(&self) -> Strategy {
        Strategy::FirstFit
    }

    fn allocate(&mut self, partition: &mut Partition, size: u64) -> Result<Allocation> {
        if size == 0 {
            return Err(no_fit(Strategy::FirstFit, size, 0));
        }

        let mut steps = 0;
        let mut found = None;

        for (index, block) in partition.traverse().enumerate() {
            steps += 1;
            if block.fits(size) {
                found = Some(index);
                break;
            }
        }

        let index = found.ok_or_else(|| no_fit(Strategy::FirstFit, size, steps))?;
        let extent = partition.claim(index, size);

        debug!(
            "First-Fit placed {} at {} (steps: {})",
            size, extent.start, steps
        );
        Ok(Allocation::single(Strategy::FirstFit, size, steps, extent))
    }
}
