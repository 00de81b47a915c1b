//! Engine configuration.

use std::time::Duration;

use derive_builder::Builder;

/// How the engine walks the execution order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Process nodes one at a time in topological order.
    ///
    /// The required baseline: correct regardless of cross-node side
    /// effects or batching precision.
    #[default]
    Sequential,

    /// Fan out each dependency batch concurrently and wait for the whole
    /// batch to settle before advancing to the next one.
    ///
    /// Only sound when nodes within a batch are mutually independent,
    /// which the batcher guarantees by construction.
    Batched,
}

/// Configuration for the workflow execution engine.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct EngineConfig {
    /// Maximum number of concurrent workflow runs.
    #[builder(default = "4")]
    pub max_concurrent_runs: usize,

    /// Wall-clock budget for a single node execution.
    ///
    /// An unresponsive external call is recorded as that node's failure
    /// once the budget is spent, so a run cannot hang indefinitely.
    #[builder(default = "Duration::from_secs(45)")]
    pub node_timeout: Duration,

    /// Execution mode.
    #[builder(default)]
    pub mode: ExecutionMode,
}

impl EngineConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(max) = self.max_concurrent_runs {
            if max == 0 {
                return Err("max_concurrent_runs must be at least 1".into());
            }
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_runs: 4,
            node_timeout: Duration::from_secs(45),
            mode: ExecutionMode::default(),
        }
    }
}
