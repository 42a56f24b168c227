//! Session ping
//!
//! Round-trips a no-op request through the session and measures how long
//! the server took to answer.

use std::time::Duration;

use rods_core::Connection;
use thiserror::Error;
use tokio::time::Instant;

/// Result of a ping operation
pub type PingResult = Result<Duration, PingError>;

/// Error that can occur during a ping operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PingError {
    #[error("Connection is closed")]
    ConnectionClosed,

    #[error("Ping failed: {0}")]
    Failed(String),

    #[error("Ping timed out")]
    Timeout,
}

/// Ping a session and return the round-trip time
///
/// Fails fast with [`PingError::ConnectionClosed`] without touching the
/// network when the session already reports itself closed.
pub async fn ping_connection(conn: &dyn Connection) -> PingResult {
    if conn.is_closed() {
        return Err(PingError::ConnectionClosed);
    }

    let start = Instant::now();
    match conn.ping().await {
        Ok(()) => Ok(start.elapsed()),
        Err(e) => Err(PingError::Failed(e.to_string())),
    }
}

/// Ping a session, giving up after `timeout`
pub async fn ping_connection_with_timeout(conn: &dyn Connection, timeout: Duration) -> PingResult {
    tokio::time::timeout(timeout, ping_connection(conn))
        .await
        .unwrap_or(Err(PingError::Timeout))
}
