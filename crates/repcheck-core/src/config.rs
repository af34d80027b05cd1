use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default cap on bytes read from a single file.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 1024 * 1024;

/// Default cap on bytes read across one whole analysis.
pub const DEFAULT_MAX_TOTAL_BYTES: u64 = 64 * 1024 * 1024;

/// Default wall-clock budget for one analysis.
pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_secs(30);

/// Tunables for one engine instance.
///
/// Every field has a default, so a partial document (or none at all)
/// deserializes into a usable configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Evaluation worker threads. `0` selects the available parallelism,
    /// `1` evaluates rules sequentially on the calling thread.
    pub workers: usize,

    /// Per-file read cap; longer files are read up to this limit.
    pub max_file_bytes: u64,

    /// Budget shared by every read of an analysis.
    pub max_total_bytes: u64,

    /// Wall-clock budget in milliseconds. `None` disables the deadline.
    pub time_budget_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            max_total_bytes: DEFAULT_MAX_TOTAL_BYTES,
            time_budget_ms: Some(DEFAULT_TIME_BUDGET.as_millis() as u64),
        }
    }
}

impl EngineConfig {
    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_ms.map(Duration::from_millis)
    }

    /// Worker count with `0` resolved against the host.
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}
