//! Allocation strategies over the block partition
//!
//! Five placement policies share one partition:
//! - First-fit, best-fit and next-fit search for a free block and split it
//! - Buddy rounds to a power of two and halves larger blocks until one fits exactly
//! - Paging breaks a request into page-sized first-fit allocations
//!
//! `select_strategy` holds the fixed routing table used by the simulator.

pub mod best_fit;
pub mod buddy;
pub mod first_fit;
pub mod next_fit;
pub mod paging;

pub use best_fit::BestFit;
pub use buddy::Buddy;
pub use first_fit::FirstFit;
pub use next_fit::NextFit;
pub use paging::Paging;

use crate::error::{Result, SimError};
use crate::partition::{Extent, Partition};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Requests below this size go to best-fit
const BEST_FIT_BELOW: u64 = 64;

/// Requests up to and including this size go to first-fit
const FIRST_FIT_UP_TO: u64 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    FirstFit,
    BestFit,
    NextFit,
    Buddy,
    Paging,
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::FirstFit,
        Strategy::BestFit,
        Strategy::NextFit,
        Strategy::Buddy,
        Strategy::Paging,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::FirstFit => "First-Fit",
            Strategy::BestFit => "Best-Fit",
            Strategy::NextFit => "Next-Fit",
            Strategy::Buddy => "Buddy",
            Strategy::Paging => "Paging",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pick the strategy for a request size
///
/// Checked in order, first match wins:
/// 1. power of two → buddy
/// 2. multiple of the page size → paging
/// 3. below 64 → best-fit
/// 4. up to 128 → first-fit
/// 5. anything else → next-fit
///
/// A `page_size` of 0 makes no size a page multiple.
pub fn select_strategy(size: u64, page_size: u64) -> Strategy {
    if size.is_power_of_two() {
        Strategy::Buddy
    } else if size.checked_rem(page_size) == Some(0) {
        Strategy::Paging
    } else if size < BEST_FIT_BELOW {
        Strategy::BestFit
    } else if size <= FIRST_FIT_UP_TO {
        Strategy::FirstFit
    } else {
        Strategy::NextFit
    }
}

/// Outcome of a successful allocation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Strategy that served the request
    pub strategy: Strategy,

    /// Size asked for by the caller
    pub requested: u64,

    /// Blocks visited while searching
    pub steps: u64,

    /// Ranges marked used, in allocation order
    pub extents: Vec<Extent>,

    /// Pages the request was broken into (paging only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<u64>,
}

impl Allocation {
    pub(crate) fn single(strategy: Strategy, requested: u64, steps: u64, extent: Extent) -> Self {
        Allocation {
            strategy,
            requested,
            steps,
            extents: vec![extent],
            pages: None,
        }
    }

    /// Start of the first placed range
    pub fn start(&self) -> Option<u64> {
        self.extents.first().map(|extent| extent.start)
    }

    /// Total units marked used by this request
    pub fn allocated(&self) -> u64 {
        self.extents.iter().map(|extent| extent.size).sum()
    }

    /// True when paging placed fewer pages than it asked for
    pub fn is_partial(&self) -> bool {
        self.pages
            .is_some_and(|pages| (self.extents.len() as u64) < pages)
    }
}

/// A placement policy operating on a partition
///
/// Implementations either mark at least one block used and return the
/// placement, or return `NoFitFound` with the partition unchanged.
pub trait AllocationStrategy {
    /// Which policy this is
    fn kind(&self) -> Strategy;

    /// Place `size` units in the partition
    fn allocate(&mut self, partition: &mut Partition, size: u64) -> Result<Allocation>;
}

pub(crate) fn no_fit(strategy: Strategy, size: u64, steps: u64) -> SimError {
    SimError::NoFitFound {
        strategy,
        size,
        steps,
    }
}
