//! Health probing for pooled sessions
//!
//! Provides a ping with latency measurement, latency-based status
//! classification and the report produced by `ConnectionPool::check_idle`.
//!
//! # Example
//!
//! ```ignore
//! use rods_pool::health::{ping_connection, HealthStatus};
//!
//! let latency = ping_connection(lease.connection()?).await?;
//! let status = HealthStatus::from_latency(latency);
//! ```

mod ping;
mod report;
mod status;


pub use ping::{PingError, PingResult, ping_connection, ping_connection_with_timeout};
pub use report::HealthReport;
pub use status::{HealthStatus, HealthThresholds};
