//! Pool configuration types

use std::time::Duration;

use rods_core::{Result, RodsError};
use serde::{Deserialize, Serialize};

/// Configuration for a connection pool
///
/// Controls the slot count and how long a session may live before it is
/// replaced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Number of slots, fixed for the lifetime of the pool
    capacity: usize,
    /// Age in milliseconds after which a parked session is replaced on acquire
    refresh_interval_ms: u64,
    /// Timeout in milliseconds for establishing a new session
    #[serde(default = "default_connect_timeout_ms")]
    connect_timeout_ms: u64,
    /// Probe parked sessions with the connector before handing them out
    #[serde(default)]
    validate_on_acquire: bool,
}

fn default_connect_timeout_ms() -> u64 {
    30_000
}

impl PoolConfig {
    /// Create a new pool configuration
    ///
    /// Nothing is checked here; `ConnectionPool::new` rejects invalid
    /// values through `validate`.
    pub fn new(capacity: usize, refresh_interval_ms: u64) -> Self {
        Self {
            capacity,
            refresh_interval_ms,
            connect_timeout_ms: default_connect_timeout_ms(),
            validate_on_acquire: false,
        }
    }

    /// Set the connect timeout in milliseconds
    pub fn with_connect_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.connect_timeout_ms = timeout_ms;
        self
    }

    /// Enable or disable the liveness probe on acquire
    pub fn with_validate_on_acquire(mut self, validate: bool) -> Self {
        self.validate_on_acquire = validate;
        self
    }

    /// Get the number of slots
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the refresh interval as a Duration
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    /// Get the connect timeout as a Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Whether parked sessions are probed before being handed out
    pub fn validate_on_acquire(&self) -> bool {
        self.validate_on_acquire
    }

    /// Check that the configuration describes a usable pool
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(RodsError::Configuration(
                "pool capacity must be greater than 0".to_string(),
            ));
        }
        if self.refresh_interval_ms == 0 {
            return Err(RodsError::Configuration(
                "refresh interval must be greater than 0".to_string(),
            ));
        }
        if self.connect_timeout_ms == 0 {
            return Err(RodsError::Configuration(
                "connect timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    /// Defaults:
    /// - capacity: 4
    /// - refresh_interval: 10 minutes
    /// - connect_timeout: 30 seconds
    /// - validate_on_acquire: false
    fn default() -> Self {
        Self::new(4, 600_000)
    }
}
