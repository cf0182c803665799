//! Purpose: Hold the process until the property backend is reachable.
//! Exports: `ReadinessGate`, `DEFAULT_READY_MARKER`, `READY_POLL_INTERVAL`.
//! Role: First blocking step of the wait; runs before any native binding is attempted.
//! Invariants: Never times out and never fails; returns only once the marker exists.
//! Invariants: Probe errors (permissions, races with mount) count as "not ready yet".

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::debug;

pub const DEFAULT_READY_MARKER: &str = "/dev/socket/property_service";
pub const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Clone, Debug)]
pub struct ReadinessGate {
    marker: PathBuf,
    interval: Duration,
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new(DEFAULT_READY_MARKER)
    }
}

impl ReadinessGate {
    pub fn new(marker: impl Into<PathBuf>) -> Self {
        Self {
            marker: marker.into(),
            interval: READY_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn marker(&self) -> &Path {
        &self.marker
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.marker.try_exists(), Ok(true))
    }

    /// Blocks until the marker is observable. Returns how many checks found it missing.
    pub fn await_ready(&self) -> u64 {
        let mut misses = 0u64;
        while !self.is_ready() {
            if misses == 0 {
                debug!(marker = %self.marker.display(), "property backend not ready, polling");
            }
            misses += 1;
            thread::sleep(self.interval);
        }
        debug!(marker = %self.marker.display(), misses, "property backend ready");
        misses
    }
}
