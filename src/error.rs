use crate::strategy::Strategy;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("{strategy} found no free block for {size} units after {steps} steps")]
    NoFitFound {
        strategy: Strategy,
        size: u64,
        steps: u64,
    },

    #[error("Invalid address: no block starts at {0}")]
    InvalidAddress(u64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Partition invariant violated: {0}")]
    InvariantViolation(String),
}

impl SimError {
    /// Steps spent before the error was raised (only searches spend steps)
    pub fn steps(&self) -> u64 {
        match self {
            SimError::NoFitFound { steps, .. } => *steps,
            _ => 0,
        }
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
