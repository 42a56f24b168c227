//! Error types for rods

use thiserror::Error;

/// Core error type for rods operations
#[derive(Error, Debug)]
pub enum RodsError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Connection pool is closed")]
    PoolClosed,

    #[error("Lease no longer holds a connection")]
    LeaseReleased,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl RodsError {
    /// Whether the error came from establishing or keeping a session alive
    /// (as opposed to a misuse of the API or bad configuration).
    pub fn is_connect_error(&self) -> bool {
        matches!(
            self,
            RodsError::Connection(_)
                | RodsError::Authentication(_)
                | RodsError::Timeout(_)
                | RodsError::Io(_)
        )
    }
}

/// Result type alias for rods operations
pub type Result<T> = std::result::Result<T, RodsError>;
