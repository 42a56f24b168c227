//! Idle check report

use serde::{Deserialize, Serialize};

use super::status::HealthStatus;

/// Outcome of probing the parked sessions of a pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Sessions probed
    pub checked: usize,
    /// Sessions that answered within the healthy threshold
    pub healthy: usize,
    /// Sessions that answered, but slowly
    pub degraded: usize,
    /// Sessions that answered very slowly; kept in the pool
    pub unhealthy: usize,
    /// Sessions that did not answer and were closed
    pub evicted: usize,
}

impl HealthReport {
    pub(crate) fn record(&mut self, status: HealthStatus) {
        self.checked += 1;
        match status {
            HealthStatus::Healthy => self.healthy += 1,
            HealthStatus::Degraded => self.degraded += 1,
            HealthStatus::Unhealthy => self.unhealthy += 1,
        }
    }

    pub(crate) fn record_eviction(&mut self) {
        self.checked += 1;
        self.evicted += 1;
    }

    /// True if every probed session answered
    pub fn all_responsive(&self) -> bool {
        self.evicted == 0
    }
}
