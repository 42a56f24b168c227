//! Connection pooling for data-grid sessions
//!
//! The pool owns a fixed set of slots. Each slot holds at most one session,
//! opened lazily on first use and replaced once it is older than the
//! refresh interval.
//!
//! # Example
//!
//! ```ignore
//! use rods_pool::pool::{ConnectionPool, PoolConfig};
//!
//! let config = PoolConfig::new(4, 600_000).with_connect_timeout_ms(5_000);
//! let pool = ConnectionPool::new(config, endpoint, connector)?;
//!
//! let lease = pool.acquire().await?;
//! lease.connection()?.ping().await?;
//! // Session returned to its slot on drop
//! ```

mod config;
mod lease;
mod pool;
mod slot;
mod stats;


pub use config::PoolConfig;
pub use lease::Lease;
pub use pool::ConnectionPool;
pub use stats::PoolStats;
