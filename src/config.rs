//! Simulator configuration
//!
//! Provides the address-space parameters shared by every strategy:
//! - **total_capacity**: size of the simulated `[0, capacity)` range
//! - **page_size**: granularity of the paging allocator and of the
//!   internal fragmentation metric
//! - **min_buddy_size**: smallest block the buddy allocator will produce
//!
//! Configurations can be built in code or loaded from TOML:
//!
//! ```
//! use partition_sim::SimulatorConfig;
//!
//! let config = SimulatorConfig::from_toml_str(
//!     r#"
//!     total_capacity = 4096
//!     page_size = 128
//!     "#,
//! ).unwrap();
//!
//! assert_eq!(config.total_capacity, 4096);
//! assert_eq!(config.page_size, 128);
//! assert_eq!(config.min_buddy_size, 32); // default
//! ```

use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};

/// Default size of the simulated address space
pub const TOTAL_CAPACITY: u64 = 1024;

/// Default page size used by the paging allocator
pub const PAGE_SIZE: u64 = 64;

/// Default buddy granule
pub const MIN_BUDDY_SIZE: u64 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Size of the simulated address space
    pub total_capacity: u64,

    /// Page size (paging allocator, internal fragmentation, dispatch rule)
    pub page_size: u64,

    /// Minimum block size produced by the buddy allocator (power of two)
    pub min_buddy_size: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        SimulatorConfig {
            total_capacity: TOTAL_CAPACITY,
            page_size: PAGE_SIZE,
            min_buddy_size: MIN_BUDDY_SIZE,
        }
    }
}

impl SimulatorConfig {
    /// Parse and validate a configuration from TOML text
    ///
    /// Missing keys fall back to the defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: SimulatorConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Render the configuration as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| SimError::InvalidConfig(e.to_string()))
    }

    /// Validate all fields
    pub fn validate(&self) -> Result<()> {
        if self.total_capacity == 0 {
            return Err(SimError::InvalidConfig(
                "total_capacity must be positive".to_string(),
            ));
        }

        if self.page_size == 0 {
            return Err(SimError::InvalidConfig(
                "page_size must be positive".to_string(),
            ));
        }

        if !self.min_buddy_size.is_power_of_two() {
            return Err(SimError::InvalidConfig(format!(
                "min_buddy_size {} must be a power of two",
                self.min_buddy_size
            )));
        }

        if self.min_buddy_size > self.total_capacity {
            return Err(SimError::InvalidConfig(format!(
                "min_buddy_size {} exceeds total_capacity {}",
                self.min_buddy_size, self.total_capacity
            )));
        }

        Ok(())
    }
}
