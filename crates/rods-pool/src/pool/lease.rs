//! Leases handed out by the pool

use std::time::Duration;

use rods_core::{Connection, Result, RodsError};
use tokio::sync::OwnedSemaphorePermit;
use uuid::Uuid;

use super::pool::ConnectionPool;
use super::slot::SlotConnection;

/// A session borrowed from the pool
///
/// While the lease holds its session, no other lease can reach that slot.
/// When dropped, the session is parked in its slot again. [`release`]
/// instead moves the session out of the pool; the slot then opens a brand
/// new session on its next use.
///
/// After [`return_to_pool`] or [`release`] the lease is empty:
/// [`is_valid`] is false and [`connection`] fails with
/// [`RodsError::LeaseReleased`]. Both operations are idempotent.
///
/// [`release`]: Lease::release
/// [`return_to_pool`]: Lease::return_to_pool
/// [`is_valid`]: Lease::is_valid
/// [`connection`]: Lease::connection
pub struct Lease<'a> {
    pool: &'a ConnectionPool,
    slot: usize,
    entry: Option<SlotConnection>,
    permit: Option<OwnedSemaphorePermit>,
}

impl<'a> Lease<'a> {
    pub(crate) fn new(
        pool: &'a ConnectionPool,
        slot: usize,
        entry: SlotConnection,
        permit: OwnedSemaphorePermit,
    ) -> Self {
        Self {
            pool,
            slot,
            entry: Some(entry),
            permit: Some(permit),
        }
    }

    /// Whether the lease currently holds a live session
    pub fn is_valid(&self) -> bool {
        self.entry.is_some()
    }

    /// Borrow the session for use with the client API
    pub fn connection(&self) -> Result<&dyn Connection> {
        self.entry
            .as_ref()
            .map(|entry| entry.connection.as_ref())
            .ok_or(RodsError::LeaseReleased)
    }

    /// Identifier the pool assigned to the session when it was established
    pub fn connection_id(&self) -> Option<Uuid> {
        self.entry.as_ref().map(|entry| entry.id)
    }

    /// Time since the session was established
    pub fn age(&self) -> Option<Duration> {
        self.entry.as_ref().map(SlotConnection::age)
    }

    /// Index of the slot this lease was taken from
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Give the session back to its slot now instead of on drop
    pub fn return_to_pool(&mut self) {
        if let Some(entry) = self.entry.take() {
            self.pool.check_in(self.slot, entry);
        }
        // slot is free before the permit wakes the next waiter
        self.permit.take();
    }

    /// Take ownership of the session away from the pool
    ///
    /// The caller becomes responsible for closing it. Returns `None` if the
    /// lease was already returned or released.
    pub fn release(&mut self) -> Option<Box<dyn Connection>> {
        let entry = self.entry.take()?;
        self.pool.vacate(self.slot);
        self.permit.take();

        tracing::debug!(slot = self.slot, connection_id = %entry.id, "connection released from pool");
        Some(entry.connection)
    }
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        self.return_to_pool();
    }
}
