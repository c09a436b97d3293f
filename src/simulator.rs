//! The simulator: one partition, five strategies, one efficiency tracker

use crate::analysis::FragmentationReport;
use crate::config::SimulatorConfig;
use crate::efficiency::{EfficiencyReport, EfficiencyTracker};
use crate::error::{Result, SimError};
use crate::partition::{BlockInfo, CompactionSummary, Extent, Partition};
use crate::strategy::{
    select_strategy, Allocation, AllocationStrategy, BestFit, Buddy, FirstFit, NextFit, Paging,
    Strategy,
};
use tracing::{debug, info, warn};

/// Allocation policy simulator over `[0, total_capacity)`
///
/// Owns all mutable state: the partition, the next-fit cursor and the
/// efficiency counters. Independent instances never share anything.
///
/// # Examples
///
/// ```
/// use partition_sim::{Simulator, Strategy};
///
/// let mut sim = Simulator::new();
///
/// let allocation = sim.allocate(100).unwrap();
/// assert_eq!(allocation.strategy, Strategy::FirstFit);
/// assert_eq!(allocation.start(), Some(0));
///
/// sim.deallocate(0).unwrap();
/// assert_eq!(sim.dump_blocks().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Simulator {
    config: SimulatorConfig,
    partition: Partition,
    first_fit: FirstFit,
    best_fit: BestFit,
    next_fit: NextFit,
    buddy: Buddy,
    paging: Paging,
    tracker: EfficiencyTracker,
}

impl Simulator {
    /// Create a simulator with the default 1024-unit space
    pub fn new() -> Self {
        Self::build(SimulatorConfig::default())
    }

    /// Create a simulator from a validated configuration
    pub fn with_config(config: SimulatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: SimulatorConfig) -> Self {
        info!(
            "Creating simulator: capacity {}, page size {}, buddy granule {}",
            config.total_capacity, config.page_size, config.min_buddy_size
        );

        Simulator {
            config,
            partition: Partition::new(config.total_capacity),
            first_fit: FirstFit,
            best_fit: BestFit,
            next_fit: NextFit::new(),
            buddy: Buddy::new(config.min_buddy_size),
            paging: Paging::new(config.page_size),
            tracker: EfficiencyTracker::new(),
        }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Read access to the block partition
    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// Strategy the dispatcher would pick for `size`
    pub fn select_strategy(&self, size: u64) -> Strategy {
        select_strategy(size, self.config.page_size)
    }

    /// Allocate `size` units with the strategy the dispatcher picks
    pub fn allocate(&mut self, size: u64) -> Result<Allocation> {
        let strategy = self.select_strategy(size);
        debug!("Dispatching {} units to {}", size, strategy);
        self.allocate_with(strategy, size)
    }

    /// Allocate `size` units with a specific strategy, bypassing the dispatcher
    pub fn allocate_with(&mut self, strategy: Strategy, size: u64) -> Result<Allocation> {
        let result = match strategy {
            Strategy::FirstFit => self
                .tracker
                .measure(strategy, || self.first_fit.allocate(&mut self.partition, size)),
            Strategy::BestFit => self
                .tracker
                .measure(strategy, || self.best_fit.allocate(&mut self.partition, size)),
            Strategy::NextFit => self
                .tracker
                .measure(strategy, || self.next_fit.allocate(&mut self.partition, size)),
            Strategy::Buddy => self
                .tracker
                .measure(strategy, || self.buddy.allocate(&mut self.partition, size)),
            Strategy::Paging => Ok(self
                .paging
                .allocate(&mut self.partition, size, &mut self.tracker)),
        };

        match &result {
            Ok(allocation) => debug!(
                "Allocated {} using {} (steps: {})",
                size, allocation.strategy, allocation.steps
            ),
            Err(e) => warn!("Allocation of {} failed: {}", size, e),
        }

        result
    }

    pub fn first_fit(&mut self, size: u64) -> Result<Allocation> {
        self.allocate_with(Strategy::FirstFit, size)
    }

    pub fn best_fit(&mut self, size: u64) -> Result<Allocation> {
        self.allocate_with(Strategy::BestFit, size)
    }

    pub fn next_fit(&mut self, size: u64) -> Result<Allocation> {
        self.allocate_with(Strategy::NextFit, size)
    }

    pub fn buddy(&mut self, size: u64) -> Result<Allocation> {
        self.allocate_with(Strategy::Buddy, size)
    }

    /// Paging never fails as a whole; check `Allocation::is_partial`
    pub fn paging(&mut self, size: u64) -> Allocation {
        self.paging
            .allocate(&mut self.partition, size, &mut self.tracker)
    }

    /// Free the block starting at `start` and merge it with free neighbors
    ///
    /// Returns the free range the block ended up in.
    pub fn deallocate(&mut self, start: u64) -> Result<Extent> {
        let index = self.partition.find_by_start(start).ok_or_else(|| {
            warn!("Deallocation failed: no block starts at {}", start);
            SimError::InvalidAddress(start)
        })?;

        let survivor = self.partition.release(index);
        let extent = self.partition.block(survivor).extent();

        debug!(
            "Deallocated block at {}, free range now [{}, {})",
            start,
            extent.start,
            extent.end()
        );
        Ok(extent)
    }

    /// Slide used blocks to the front, leaving one trailing free block
    pub fn compact(&mut self) -> CompactionSummary {
        let summary = self.partition.compact();
        info!(
            "Memory compacted: {} blocks moved, {} free blocks merged into {} units",
            summary.moved_blocks, summary.merged_free_blocks, summary.free_space
        );
        summary
    }

    pub fn fragmentation_report(&self) -> FragmentationReport {
        FragmentationReport::analyze(&self.partition, self.config.page_size)
    }

    pub fn efficiency_report(&self) -> EfficiencyReport {
        self.tracker.report()
    }

    pub fn reset_efficiency(&mut self) {
        info!("Resetting efficiency counters");
        self.tracker.reset();
    }

    /// Blocks in address order
    pub fn dump_blocks(&self) -> Vec<BlockInfo> {
        self.partition.dump()
    }

    /// Block layout as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.dump_blocks())?)
    }

    /// Check that the blocks still tile the address space
    pub fn validate(&self) -> Result<()> {
        self.partition.validate()
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for simulators with non-default parameters
///
/// # Examples
///
/// ```
/// use partition_sim::SimulatorBuilder;
///
/// let sim = SimulatorBuilder::new()
///     .total_capacity(4096)
///     .page_size(128)
///     .build()
///     .unwrap();
///
/// assert_eq!(sim.dump_blocks()[0].size, 4096);
/// ```
pub struct SimulatorBuilder {
    config: SimulatorConfig,
}

impl SimulatorBuilder {
    pub fn new() -> Self {
        SimulatorBuilder {
            config: SimulatorConfig::default(),
        }
    }

    /// Start from an existing configuration
    pub fn from_config(config: SimulatorConfig) -> Self {
        SimulatorBuilder { config }
    }

    pub fn total_capacity(mut self, capacity: u64) -> Self {
        self.config.total_capacity = capacity;
        self
    }

    pub fn page_size(mut self, page_size: u64) -> Self {
        self.config.page_size = page_size;
        self
    }

    pub fn min_buddy_size(mut self, min_buddy_size: u64) -> Self {
        self.config.min_buddy_size = min_buddy_size;
        self
    }

    /// Validate the configuration and build the simulator
    pub fn build(self) -> Result<Simulator> {
        Simulator::with_config(self.config)
    }
}

impl Default for SimulatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
