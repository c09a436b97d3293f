//! Per-strategy step and timing counters
//!
//! Every strategy invocation, successful or not, adds its step count and
//! elapsed time to that strategy's totals. The counters are observability
//! only and never feed back into placement decisions.

use crate::error::Result;
use crate::strategy::{Allocation, Strategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Counters {
    invocations: u64,
    steps: u64,
    elapsed: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct EfficiencyTracker {
    counters: BTreeMap<Strategy, Counters>,
}

impl EfficiencyTracker {
    pub fn new() -> Self {
        EfficiencyTracker {
            counters: BTreeMap::new(),
        }
    }

    /// Add one invocation to a strategy's totals
    pub fn record(&mut self, strategy: Strategy, steps: u64, elapsed: Duration) {
        let counters = self.counters.entry(strategy).or_default();
        counters.invocations += 1;
        counters.steps += steps;
        counters.elapsed += elapsed;
    }

    /// Run a strategy body, timing it and recording its steps
    ///
    /// Steps come from the allocation on success and from the error on failure.
    pub fn measure<F>(&mut self, strategy: Strategy, body: F) -> Result<Allocation>
    where
        F: FnOnce() -> Result<Allocation>,
    {
        let started = Instant::now();
        let result = body();
        let elapsed = started.elapsed();

        let steps = match &result {
            Ok(allocation) => allocation.steps,
            Err(e) => e.steps(),
        };
        self.record(strategy, steps, elapsed);

        result
    }

    /// Averages for every strategy invoked at least once
    pub fn report(&self) -> EfficiencyReport {
        let entries = self
            .counters
            .iter()
            .filter(|(_, counters)| counters.invocations > 0)
            .map(|(&strategy, counters)| {
                let n = counters.invocations as f64;
                let efficiency = StrategyEfficiency {
                    invocations: counters.invocations,
                    total_steps: counters.steps,
                    total_time: counters.elapsed,
                    avg_steps: counters.steps as f64 / n,
                    avg_time: average(counters.elapsed, counters.invocations),
                };
                (strategy, efficiency)
            })
            .collect();

        EfficiencyReport { entries }
    }

    /// Zero every counter
    pub fn reset(&mut self) {
        self.counters.clear();
    }
}

fn average(total: Duration, invocations: u64) -> Duration {
    let nanos = total.as_nanos() / u128::from(invocations);
    Duration::new(
        (nanos / 1_000_000_000) as u64,
        (nanos % 1_000_000_000) as u32,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyEfficiency {
    pub invocations: u64,
    pub total_steps: u64,
    pub total_time: Duration,
    pub avg_steps: f64,
    pub avg_time: Duration,
}

/// Averages per strategy; strategies never invoked are absent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyReport {
    entries: BTreeMap<Strategy, StrategyEfficiency>,
}

impl EfficiencyReport {
    pub fn get(&self, strategy: Strategy) -> Option<&StrategyEfficiency> {
        self.entries.get(&strategy)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Strategy, &StrategyEfficiency)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for EfficiencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Efficiency Summary ---")?;
        for (strategy, efficiency) in &self.entries {
            writeln!(
                f,
                "{:<10} Avg Steps: {:.2}, Avg Time: {:.6}s",
                format!("{}:", strategy),
                efficiency.avg_steps,
                efficiency.avg_time.as_secs_f64()
            )?;
        }
        Ok(())
    }
}
