//! Connector trait definition

use std::sync::Arc;

use async_trait::async_trait;

use crate::{Connection, EndpointConfig, Result};

/// Establishes sessions with the remote service
///
/// This is the narrow interface the pool consumes from the client layer.
/// Closing goes through `Connection::close`.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Open and authenticate a new session against `endpoint`
    async fn connect(&self, endpoint: &EndpointConfig) -> Result<Box<dyn Connection>>;

    /// Liveness probe for an established session
    ///
    /// Default implementation pings the server.
    async fn is_valid(&self, conn: &dyn Connection) -> bool {
        if conn.is_closed() {
            return false;
        }
        match conn.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "liveness probe failed");
                false
            }
        }
    }
}

#[async_trait]
impl<T: Connector> Connector for Arc<T> {
    async fn connect(&self, endpoint: &EndpointConfig) -> Result<Box<dyn Connection>> {
        (**self).connect(endpoint).await
    }

    async fn is_valid(&self, conn: &dyn Connection) -> bool {
        (**self).is_valid(conn).await
    }
}
