//! Slot bookkeeping for the pool

use std::time::Duration;

use rods_core::Connection;
use tokio::time::Instant;
use uuid::Uuid;

/// An established session together with its metadata
pub(crate) struct SlotConnection {
    pub(crate) connection: Box<dyn Connection>,
    pub(crate) id: Uuid,
    pub(crate) created_at: Instant,
}

impl SlotConnection {
    pub(crate) fn new(connection: Box<dyn Connection>) -> Self {
        Self {
            connection,
            id: Uuid::new_v4(),
            created_at: Instant::now(),
        }
    }

    pub(crate) fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    pub(crate) fn is_stale(&self, refresh_interval: Duration) -> bool {
        self.age() > refresh_interval
    }

    /// Close the session, logging rather than propagating failures
    pub(crate) async fn close_quietly(&self) {
        if self.connection.is_closed() {
            return;
        }
        if let Err(e) = self.connection.close().await {
            tracing::warn!(connection_id = %self.id, error = %e, "failed to close connection");
        }
    }
}

/// State of a single slot
pub(crate) enum SlotState {
    /// Free, no session; the next claim connects
    Empty,
    /// Free, holding a parked session
    Idle(SlotConnection),
    /// Claimed by an acquire or a probe that is still working on it;
    /// `connected` while the claim still holds an open session
    Claimed { connected: bool },
    /// Session handed out to a lease
    Leased,
}

impl SlotState {
    pub(crate) fn is_free(&self) -> bool {
        matches!(self, SlotState::Empty | SlotState::Idle(_))
    }
}

/// The fixed set of slots plus the round-robin cursor
pub(crate) struct SlotTable {
    slots: Vec<SlotState>,
    cursor: usize,
}

impl SlotTable {
    pub(crate) fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            slots.push(SlotState::Empty);
        }
        Self { slots, cursor: 0 }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Claim the next free slot in round-robin order
    ///
    /// Returns the slot index and the session parked there, if any.
    pub(crate) fn claim_next(&mut self) -> Option<(usize, Option<SlotConnection>)> {
        let len = self.slots.len();
        let idx = (0..len)
            .map(|offset| (self.cursor + offset) % len)
            .find(|&idx| self.slots[idx].is_free())?;
        self.cursor = (idx + 1) % len;
        Some((idx, self.take_claim(idx)))
    }

    /// Claim the first free slot matching `pred`, without moving the cursor
    pub(crate) fn claim_where<F>(&mut self, pred: F) -> Option<(usize, Option<SlotConnection>)>
    where
        F: Fn(usize, &SlotState) -> bool,
    {
        let idx = self
            .slots
            .iter()
            .enumerate()
            .position(|(idx, state)| state.is_free() && pred(idx, state))?;
        Some((idx, self.take_claim(idx)))
    }

    fn take_claim(&mut self, idx: usize) -> Option<SlotConnection> {
        let connected = matches!(self.slots[idx], SlotState::Idle(_));
        match std::mem::replace(&mut self.slots[idx], SlotState::Claimed { connected }) {
            SlotState::Idle(entry) => Some(entry),
            _ => None,
        }
    }

    pub(crate) fn set(&mut self, idx: usize, state: SlotState) {
        self.slots[idx] = state;
    }

    /// Take every parked session, leaving those slots empty
    pub(crate) fn drain_idle(&mut self) -> Vec<SlotConnection> {
        let mut drained = Vec::new();
        for state in &mut self.slots {
            match std::mem::replace(state, SlotState::Empty) {
                SlotState::Idle(entry) => drained.push(entry),
                other => *state = other,
            }
        }
        drained
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &SlotState> {
        self.slots.iter()
    }
}
