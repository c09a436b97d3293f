//! # partition-sim - Memory Allocation Policy Simulator
//!
//! `partition-sim` models one contiguous address space `[0, capacity)` as an
//! ordered partition of blocks and simulates how different allocation
//! policies carve it up:
//!
//! - **Fit strategies**: first-fit, best-fit and next-fit with block splitting
//! - **Buddy splitting**: power-of-two rounding with top-down halving
//! - **Paging**: fixed-size pages placed one first-fit at a time
//! - **Coalescing** on free, **compaction** on demand
//! - **Fragmentation** and per-strategy **efficiency** reports
//!
//! No real memory is managed; every operation is bookkeeping over integer
//! offsets.
//!
//! ## Quick Start
//!
//! ```rust
//! use partition_sim::{Result, Simulator, Strategy};
//!
//! # fn main() -> Result<()> {
//! let mut sim = Simulator::new(); // 1024 units, 64-unit pages
//!
//! // The dispatcher picks the strategy from the size
//! let small = sim.allocate(50)?;
//! assert_eq!(small.strategy, Strategy::BestFit);
//!
//! let medium = sim.allocate(90)?;
//! assert_eq!(medium.strategy, Strategy::FirstFit);
//!
//! let report = sim.fragmentation_report();
//! assert_eq!(report.external, 1024 - 50 - 90);
//! assert_eq!(report.internal, 50 + 26);
//!
//! sim.deallocate(0)?;
//! sim.compact();
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom address spaces
//!
//! ```rust
//! use partition_sim::{Result, SimulatorBuilder};
//!
//! # fn main() -> Result<()> {
//! let mut sim = SimulatorBuilder::new()
//!     .total_capacity(8192)
//!     .page_size(256)
//!     .min_buddy_size(64)
//!     .build()?;
//!
//! sim.allocate(1000)?;
//! println!("{}", sim.efficiency_report());
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod config;
pub mod efficiency;
pub mod error;
pub mod partition;
pub mod simulator;
pub mod strategy;

pub use crate::analysis::FragmentationReport;
pub use crate::config::{SimulatorConfig, MIN_BUDDY_SIZE, PAGE_SIZE, TOTAL_CAPACITY};
pub use crate::efficiency::{EfficiencyReport, EfficiencyTracker, StrategyEfficiency};
pub use crate::error::{Result, SimError};
pub use crate::partition::{Block, BlockId, BlockInfo, CompactionSummary, Extent, Partition};
pub use crate::simulator::{Simulator, SimulatorBuilder};
pub use crate::strategy::{select_strategy, Allocation, AllocationStrategy, Strategy};
