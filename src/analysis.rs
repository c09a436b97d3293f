//! Fragmentation analysis
//!
//! External fragmentation is all free space, however it is scattered.
//! Internal fragmentation is approximated as `size mod page_size` summed
//! over used blocks, whichever strategy produced them.

use crate::partition::Partition;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentationReport {
    /// Sum of free block sizes
    pub external: u64,

    /// Sum over used blocks of `size mod page_size`
    pub internal: u64,

    /// Number of free blocks
    pub free_blocks: usize,

    /// Size of the largest free block
    pub largest_free: u64,
}

impl FragmentationReport {
    /// Walk a partition and total both kinds of fragmentation
    ///
    /// With a `page_size` of 0 there are no pages and internal fragmentation is 0.
    pub fn analyze(partition: &Partition, page_size: u64) -> Self {
        let mut report = FragmentationReport {
            external: 0,
            internal: 0,
            free_blocks: 0,
            largest_free: 0,
        };

        for block in partition.traverse() {
            if block.is_free() {
                report.external += block.size();
                report.free_blocks += 1;
                report.largest_free = report.largest_free.max(block.size());
            } else {
                report.internal += block.size().checked_rem(page_size).unwrap_or(0);
            }
        }

        report
    }

    /// Share of free space outside the largest free block
    ///
    /// 0.0 when free space is contiguous (or absent), approaching 1.0 as it
    /// scatters into many small blocks.
    pub fn external_index(&self) -> f64 {
        if self.external == 0 {
            return 0.0;
        }
        1.0 - self.largest_free as f64 / self.external as f64
    }
}

impl fmt::Display for FragmentationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "External Fragmentation: {}, Internal Fragmentation: {}",
            self.external, self.internal
        )
    }
}
