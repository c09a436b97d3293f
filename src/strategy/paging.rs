//! Fixed-size paging on top of first-fit
//!
//! A request becomes `ceil(size / page_size)` independent one-page first-fit
//! allocations. Pages that fail are skipped; pages already placed stay
//! placed. The returned allocation lists every page that landed.

use crate::efficiency::EfficiencyTracker;
use crate::partition::Partition;
use crate::strategy::{Allocation, AllocationStrategy, FirstFit, Strategy};
use std::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
pub struct Paging {
    page_size: u64,
}

impl Paging {
    /// Panics if `page_size` is 0. `SimulatorConfig::validate` rejects that
    /// value before a simulator builds its pager.
    pub fn new(page_size: u64) -> Self {
        assert!(page_size > 0, "page size must be non-zero");
        Paging { page_size }
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Number of pages a request is broken into
    pub fn pages_for(&self, size: u64) -> u64 {
        size.div_ceil(self.page_size)
    }

    /// Place every page of a request with first-fit
    ///
    /// Each page is recorded in `tracker` as its own first-fit invocation;
    /// the request as a whole is recorded under paging.
    pub fn allocate(
        &self,
        partition: &mut Partition,
        size: u64,
        tracker: &mut EfficiencyTracker,
    ) -> Allocation {
        let started = Instant::now();
        let pages = self.pages_for(size);
        let mut first_fit = FirstFit;
        let mut extents = Vec::new();
        let mut steps = 0;

        for page in 0..pages {
            let result = tracker.measure(Strategy::FirstFit, || {
                first_fit.allocate(partition, self.page_size)
            });

            match result {
                Ok(placed) => {
                    steps += placed.steps;
                    extents.extend(placed.extents);
                }
                Err(e) => {
                    steps += e.steps();
                    warn!("Page {} of {} could not be placed: {}", page + 1, pages, e);
                }
            }
        }

        tracker.record(Strategy::Paging, steps, started.elapsed());

        if (extents.len() as u64) < pages {
            warn!(
                "Paging placed {} of {} pages for {} units",
                extents.len(),
                pages,
                size
            );
        } else {
            debug!("Paging placed {} pages for {} units", pages, size);
        }

        Allocation {
            strategy: Strategy::Paging,
            requested: size,
            steps,
            extents,
            pages: Some(pages),
        }
    }
}
