//! Connection trait for sessions with the remote service

use async_trait::async_trait;

use crate::Result;

/// A live session with the data-grid service
///
/// Implementations wrap whatever the client layer uses to talk to the
/// server (socket, native handle, ...). The pool owns sessions through
/// `Box<dyn Connection>`, so a session is never shared between the pool
/// and a caller.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Zone the session is authenticated against
    fn zone(&self) -> &str;

    /// User the session is authenticated as
    fn user_name(&self) -> &str;

    /// Round-trip a no-op request to prove the server still answers
    async fn ping(&self) -> Result<()>;

    /// Close the session
    ///
    /// Closing an already-closed session is a no-op.
    async fn close(&self) -> Result<()>;

    /// Check if the session is closed
    fn is_closed(&self) -> bool;
}
