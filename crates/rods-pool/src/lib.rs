//! rods pool - bounded connection pooling for the data-grid service
//!
//! This crate keeps a fixed number of long-lived sessions, hands them out
//! under a lease discipline and replaces sessions that outlive the refresh
//! interval. A lease can also be released, which moves its session out of
//! the pool for good.

pub mod health;
pub mod pool;

pub use health::{
    HealthReport, HealthStatus, HealthThresholds, PingError, PingResult, ping_connection,
    ping_connection_with_timeout,
};
pub use pool::{ConnectionPool, Lease, PoolConfig, PoolStats};
