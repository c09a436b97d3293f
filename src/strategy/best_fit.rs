//! Best-fit: take the smallest free block large enough
//!
//! Always scans the full partition. Ties go to the leftmost candidate.

use crate::error::Result;
use crate::partition::Partition;
use crate::strategy::{no_fit, Allocation, AllocationStrategy, Strategy};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct BestFit;

impl AllocationStrategy for BestFit {
    fn kind(&self) -> Strategy {
        Strategy::BestFit
    }

    fn allocate(&mut self, partition: &mut Partition, size: u64) -> Result<Allocation> {
        if size == 0 {
            return Err(no_fit(Strategy::BestFit, size, 0));
        }

        let mut steps = 0;
        let mut best: Option<(usize, u64)> = None;

        for (index, block) in partition.traverse().enumerate() {
            steps += 1;
            if !block.fits(size) {
                continue;
            }
            // Strict comparison keeps the first of equal-sized candidates
            if best.map_or(true, |(_, best_size)| block.size() < best_size) {
                best = Some((index, block.size()));
            }
        }

        let (index, _) = best.ok_or_else(|| no_fit(Strategy::BestFit, size, steps))?;
        let extent = partition.claim(index, size);

        debug!(
            "Best-Fit placed {} at {} (steps: {})",
            size, extent.start, steps
        );
        Ok(Allocation::single(Strategy::BestFit, size, steps, extent))
    }
}
