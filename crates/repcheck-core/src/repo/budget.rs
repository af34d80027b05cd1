//! Shared read budget for one analysis.
//!
//! Evaluators may read concurrently, so every counter here is atomic.
//! Exhaustion is sticky: once a read is refused for size or time, every
//! later read is refused too and the analysis is reported as truncated.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::config::EngineConfig;
use crate::error::ReadError;

/// Caller-held handle that stops an analysis at the next read boundary.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct ReadBudget {
    max_total_bytes: u64,
    used: AtomicU64,
    deadline: Option<Instant>,
    exceeded: AtomicBool,
    cancel: CancellationToken,
}

impl ReadBudget {
    /// Starts the wall clock immediately.
    pub fn new(
        max_total_bytes: u64,
        time_budget: Option<Duration>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            max_total_bytes,
            used: AtomicU64::new(0),
            deadline: time_budget.map(|d| Instant::now() + d),
            exceeded: AtomicBool::new(false),
            cancel,
        }
    }

    pub fn from_config(config: &EngineConfig, cancel: CancellationToken) -> Self {
        Self::new(config.max_total_bytes, config.time_budget(), cancel)
    }

    pub fn unlimited() -> Self {
        Self::new(u64::MAX, None, CancellationToken::new())
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// True once the deadline has passed; marks the budget exceeded.
    pub fn deadline_passed(&self) -> bool {
        let passed = self.deadline.is_some_and(|d| Instant::now() >= d);
        if passed {
            self.exceeded.store(true, Ordering::SeqCst);
        }
        passed
    }

    /// True if any read was refused or the deadline was hit.
    pub fn was_exceeded(&self) -> bool {
        self.exceeded.load(Ordering::SeqCst)
    }

    pub fn bytes_used(&self) -> u64 {
        self.used.load(Ordering::SeqCst)
    }

    /// Fails if a new read must not start.
    pub fn check(&self) -> Result<(), ReadError> {
        if self.is_cancelled() {
            return Err(ReadError::Cancelled);
        }
        if self.was_exceeded() || self.deadline_passed() {
            return Err(ReadError::BudgetExceeded);
        }
        Ok(())
    }

    /// Reserves `bytes` against the total budget.
    pub fn charge(&self, bytes: u64) -> Result<(), ReadError> {
        self.check()?;

        let max = self.max_total_bytes;
        let reserved = self
            .used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                used.checked_add(bytes).filter(|total| *total <= max)
            });

        if reserved.is_err() {
            self.exceeded.store(true, Ordering::SeqCst);
            tracing::warn!(
                requested = bytes,
                used = self.bytes_used(),
                max,
                "read budget exhausted"
            );
            return Err(ReadError::BudgetExceeded);
        }
        Ok(())
    }
}
