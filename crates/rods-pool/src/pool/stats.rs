//! Pool statistics types

use serde::{Deserialize, Serialize};

/// Snapshot of a connection pool's state
///
/// Slot gauges describe the moment the snapshot was taken; the counters
/// accumulate over the lifetime of the pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub(crate) capacity: usize,
    pub(crate) connected: usize,
    pub(crate) in_use: usize,
    pub(crate) idle: usize,
    pub(crate) waiting: usize,
    pub(crate) opened: u64,
    pub(crate) refreshed: u64,
    pub(crate) released: u64,
    pub(crate) failed_connects: u64,
}

impl PoolStats {
    /// Number of slots
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots whose session is open: parked, leased, or held by a claim that
    /// is probing or refreshing it
    pub fn connected(&self) -> usize {
        self.connected
    }

    /// Slots claimed by a lease or by an in-flight acquire
    pub fn in_use(&self) -> usize {
        self.in_use
    }

    /// Free slots with a parked session
    pub fn idle(&self) -> usize {
        self.idle
    }

    /// Callers currently waiting for a free slot
    pub fn waiting(&self) -> usize {
        self.waiting
    }

    /// Sessions established since the pool was created
    pub fn opened(&self) -> u64 {
        self.opened
    }

    /// Sessions replaced because they were stale or failed a probe
    pub fn refreshed(&self) -> u64 {
        self.refreshed
    }

    /// Sessions whose ownership was transferred out of the pool
    pub fn released(&self) -> u64 {
        self.released
    }

    /// Failed attempts to establish a session
    pub fn failed_connects(&self) -> u64 {
        self.failed_connects
    }

    /// Fraction of slots in use (0.0 to 1.0)
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.in_use as f64 / self.capacity as f64
        }
    }

    /// Check if every slot is in use
    pub fn is_full(&self) -> bool {
        self.capacity > 0 && self.in_use == self.capacity
    }
}
