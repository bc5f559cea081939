// src/onec/monitor.rs

//! Output-size stability tracking.
//!
//! The configurator gives no "dump finished" signal other than exiting.
//! [`OutputMonitor`] records how many consecutive polls saw the archive at
//! the same non-zero size. The count is reported but never ends the wait.

use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputMonitor {
    last_size: u64,
    stable_count: u32,
    polls: u32,
}

impl OutputMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observation of the archive size (`None` = file absent).
    pub fn observe(&mut self, size: Option<u64>) {
        self.polls += 1;
        match size {
            Some(current) => {
                if current > 0 && current == self.last_size {
                    self.stable_count += 1;
                } else {
                    self.stable_count = 0;
                }
                self.last_size = current;
            }
            None => {
                self.stable_count = 0;
                self.last_size = 0;
            }
        }
    }

    pub fn stable_count(&self) -> u32 {
        self.stable_count
    }

    pub fn last_size(&self) -> u64 {
        self.last_size
    }

    pub fn polls(&self) -> u32 {
        self.polls
    }

    pub fn stats(&self, elapsed: Duration) -> MonitorStats {
        MonitorStats {
            polls: self.polls,
            stable_observations: self.stable_count,
            last_observed_size: self.last_size,
            elapsed,
        }
    }
}

/// Snapshot of the monitoring state when a run ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    /// Stability observations made (excludes the iteration that saw the exit).
    pub polls: u32,
    pub stable_observations: u32,
    pub last_observed_size: u64,
    pub elapsed: Duration,
}
