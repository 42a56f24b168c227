//! Health status classification
//!
//! Classifies session health from ping latency.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Health status of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Answering quickly
    #[default]
    Healthy,
    /// Answering, but slowly
    Degraded,
    /// Answering very slowly, or not at all
    Unhealthy,
}

impl HealthStatus {
    /// Classify a latency using the default thresholds (100ms / 500ms)
    ///
    /// ```
    /// use rods_pool::health::HealthStatus;
    /// use std::time::Duration;
    ///
    /// assert_eq!(HealthStatus::from_latency(Duration::from_millis(50)), HealthStatus::Healthy);
    /// assert_eq!(HealthStatus::from_latency(Duration::from_millis(200)), HealthStatus::Degraded);
    /// assert_eq!(HealthStatus::from_latency(Duration::from_secs(1)), HealthStatus::Unhealthy);
    /// ```
    pub fn from_latency(latency: Duration) -> Self {
        Self::from_latency_with_thresholds(latency, &HealthThresholds::default())
    }

    /// Classify a latency using custom thresholds
    pub fn from_latency_with_thresholds(latency: Duration, thresholds: &HealthThresholds) -> Self {
        if latency <= thresholds.healthy_threshold {
            HealthStatus::Healthy
        } else if latency <= thresholds.degraded_threshold {
            HealthStatus::Degraded
        } else {
            HealthStatus::Unhealthy
        }
    }

    /// Healthy and degraded sessions are still worth handing out
    pub fn is_usable(&self) -> bool {
        !matches!(self, HealthStatus::Unhealthy)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
        };
        f.write_str(label)
    }
}

/// Latency thresholds for [`HealthStatus`] classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthThresholds {
    /// Highest latency still considered healthy
    pub healthy_threshold: Duration,
    /// Highest latency still considered degraded
    pub degraded_threshold: Duration,
}

impl HealthThresholds {
    /// Create thresholds from milliseconds
    ///
    /// The degraded threshold is raised to the healthy one if it is lower.
    pub fn new(healthy_ms: u64, degraded_ms: u64) -> Self {
        Self {
            healthy_threshold: Duration::from_millis(healthy_ms),
            degraded_threshold: Duration::from_millis(degraded_ms.max(healthy_ms)),
        }
    }
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self::new(100, 500)
    }
}
