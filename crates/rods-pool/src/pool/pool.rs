//! Connection pool implementation

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rods_core::{Connector, EndpointConfig, Result, RodsError};
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

use super::config::PoolConfig;
use super::lease::Lease;
use super::slot::{SlotConnection, SlotState, SlotTable};
use super::stats::PoolStats;
use crate::health::{
    HealthReport, HealthStatus, HealthThresholds, PingError, ping_connection_with_timeout,
};

/// Lifetime counters, kept outside the slot lock
#[derive(Default)]
struct PoolCounters {
    opened: AtomicU64,
    refreshed: AtomicU64,
    released: AtomicU64,
    failed_connects: AtomicU64,
}

/// A bounded pool of sessions to one endpoint
///
/// The pool owns `capacity` slots. `acquire` claims a free slot in
/// round-robin order, (re)connects it when it is empty or its session is
/// older than the refresh interval, and hands the session out as a
/// [`Lease`]. Dropping the lease parks the session in its slot again;
/// [`Lease::release`] moves it out of the pool for good.
///
/// A FIFO semaphore with one permit per slot bounds the number of
/// outstanding leases, so waiters are served in arrival order. Network I/O
/// never happens under the slot lock: a slot is marked claimed first, and
/// only that slot is unavailable while it connects.
pub struct ConnectionPool {
    config: PoolConfig,
    endpoint: EndpointConfig,
    connector: Arc<dyn Connector>,
    slots: Mutex<SlotTable>,
    semaphore: Arc<Semaphore>,
    waiting: AtomicUsize,
    closed: AtomicBool,
    counters: PoolCounters,
}

impl ConnectionPool {
    /// Create a new pool
    ///
    /// No session is opened here; slots are connected on first use (or by
    /// [`warm_up`](Self::warm_up)). Fails with a configuration error when
    /// the capacity or refresh interval is zero or the endpoint is invalid.
    pub fn new<C: Connector>(
        config: PoolConfig,
        endpoint: EndpointConfig,
        connector: C,
    ) -> Result<Self> {
        config.validate()?;
        endpoint.validate()?;

        tracing::info!(
            capacity = config.capacity(),
            refresh_interval = ?config.refresh_interval(),
            endpoint = %endpoint.address(),
            zone = %endpoint.zone_name,
            "creating connection pool"
        );

        Ok(Self {
            slots: Mutex::new(SlotTable::new(config.capacity())),
            semaphore: Arc::new(Semaphore::new(config.capacity())),
            config,
            endpoint,
            connector: Arc::new(connector),
            waiting: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            counters: PoolCounters::default(),
        })
    }

    /// Get a session from the pool, waiting as long as it takes for a slot
    ///
    /// Fails if a fresh session has to be established and that fails, or
    /// if the pool is closed while waiting.
    #[tracing::instrument(skip(self), fields(endpoint = %self.endpoint.address()))]
    pub async fn acquire(&self) -> Result<Lease<'_>> {
        let permit = self.wait_for_permit(None).await?;
        self.checkout(permit).await
    }

    /// Get a session, waiting at most `timeout` for a free slot
    ///
    /// The timeout covers only the wait for a slot; establishing a session
    /// is bounded separately by the configured connect timeout.
    #[tracing::instrument(skip(self), fields(endpoint = %self.endpoint.address()))]
    pub async fn acquire_timeout(&self, timeout: Duration) -> Result<Lease<'_>> {
        let permit = self.wait_for_permit(Some(timeout)).await?;
        self.checkout(permit).await
    }

    /// Get a session only if a slot is free right now
    ///
    /// Returns `Ok(None)` when every slot is in use.
    pub async fn try_acquire(&self) -> Result<Option<Lease<'_>>> {
        self.ensure_open()?;
        match self.semaphore.clone().try_acquire_owned() {
            Ok(permit) => self.checkout(permit).await.map(Some),
            Err(TryAcquireError::NoPermits) => Ok(None),
            Err(TryAcquireError::Closed) => Err(RodsError::PoolClosed),
        }
    }

    async fn wait_for_permit(&self, timeout: Option<Duration>) -> Result<OwnedSemaphorePermit> {
        self.ensure_open()?;
        let _waiting = WaitingGuard::enter(&self.waiting);

        let acquire = self.semaphore.clone().acquire_owned();
        let permit = match timeout {
            Some(limit) => tokio::time::timeout(limit, acquire).await.map_err(|_| {
                RodsError::Timeout(format!(
                    "Timed out waiting for a pooled connection (timeout: {:?})",
                    limit
                ))
            })?,
            None => acquire.await,
        };

        permit.map_err(|_| RodsError::PoolClosed)
    }

    /// Claim a slot for a granted permit and turn it into a lease
    async fn checkout(&self, permit: OwnedSemaphorePermit) -> Result<Lease<'_>> {
        let (slot, parked) = self.slots.lock().claim_next().ok_or_else(|| {
            RodsError::Other("no free slot available for a granted permit".to_string())
        })?;

        let mut claim = ClaimGuard::new(self, slot, parked);
        let entry = self.prepare(&mut claim).await?;
        claim.into_leased();

        tracing::debug!(
            slot,
            connection_id = %entry.id,
            age = ?entry.age(),
            "connection leased"
        );
        Ok(Lease::new(self, slot, entry, permit))
    }

    /// Make sure the claimed slot ends up with a fresh, usable session
    ///
    /// The parked session stays with the claim until it is either handed
    /// back or closed, so a cancelled acquire never drops it unclosed.
    async fn prepare(&self, claim: &mut ClaimGuard<'_>) -> Result<SlotConnection> {
        let reusable = match claim.entry() {
            Some(entry) => self.is_reusable(claim.slot, entry).await,
            None => false,
        };
        if reusable {
            if let Some(entry) = claim.take_entry() {
                return Ok(entry);
            }
        }

        if claim.entry().is_some() {
            self.counters.refreshed.fetch_add(1, Ordering::SeqCst);
            claim.close_entry().await;
        }
        self.open_connection(claim.slot).await
    }

    async fn is_reusable(&self, slot: usize, entry: &SlotConnection) -> bool {
        if entry.is_stale(self.config.refresh_interval()) {
            tracing::debug!(
                slot,
                connection_id = %entry.id,
                age = ?entry.age(),
                "refreshing stale connection"
            );
            return false;
        }
        if !self.config.validate_on_acquire() {
            return true;
        }

        let timeout = self.config.connect_timeout();
        let check = self.connector.is_valid(entry.connection.as_ref());
        match tokio::time::timeout(timeout, check).await {
            Ok(true) => true,
            Ok(false) => {
                tracing::warn!(
                    slot,
                    connection_id = %entry.id,
                    "connection failed liveness probe, replacing"
                );
                false
            }
            Err(_) => {
                tracing::warn!(
                    slot,
                    connection_id = %entry.id,
                    ?timeout,
                    "liveness check timed out, replacing"
                );
                false
            }
        }
    }

    async fn open_connection(&self, slot: usize) -> Result<SlotConnection> {
        let timeout = self.config.connect_timeout();
        let result = tokio::time::timeout(timeout, self.connector.connect(&self.endpoint))
            .await
            .unwrap_or_else(|_| {
                Err(RodsError::Timeout(format!(
                    "Timed out connecting to {} (timeout: {:?})",
                    self.endpoint.address(),
                    timeout
                )))
            });

        match result {
            Ok(connection) => {
                self.counters.opened.fetch_add(1, Ordering::SeqCst);
                let entry = SlotConnection::new(connection);
                tracing::debug!(slot, connection_id = %entry.id, "connection established");
                Ok(entry)
            }
            Err(e) => {
                self.counters.failed_connects.fetch_add(1, Ordering::SeqCst);
                tracing::warn!(
                    slot,
                    endpoint = %self.endpoint.address(),
                    error = %e,
                    "failed to establish connection"
                );
                Err(e)
            }
        }
    }

    /// Park a returned session in its slot
    ///
    /// The closed flag is read under the slot lock, the same lock `close`
    /// drains under, so a session is never parked in a drained pool.
    pub(crate) fn check_in(&self, slot: usize, entry: SlotConnection) {
        let mut slots = self.slots.lock();
        if self.is_closed() {
            slots.set(slot, SlotState::Empty);
            drop(slots);
            tracing::debug!(
                slot,
                connection_id = %entry.id,
                "pool closed, closing returned connection"
            );
            close_detached(vec![entry]);
            return;
        }

        tracing::debug!(slot, connection_id = %entry.id, "connection returned");
        slots.set(slot, SlotState::Idle(entry));
    }

    /// Forget the session of a slot whose lease was released
    pub(crate) fn vacate(&self, slot: usize) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
        self.slots.lock().set(slot, SlotState::Empty);
    }

    /// Connect every free, empty slot up front
    ///
    /// Stops at the first failure and returns it. Returns the number of
    /// sessions opened otherwise.
    #[tracing::instrument(skip(self), fields(endpoint = %self.endpoint.address()))]
    pub async fn warm_up(&self) -> Result<usize> {
        self.ensure_open()?;
        let mut opened = 0;

        loop {
            let Ok(permit) = self.semaphore.clone().try_acquire_owned() else {
                break;
            };
            let Some((slot, _)) = self
                .slots
                .lock()
                .claim_where(|_, state| matches!(state, SlotState::Empty))
            else {
                break;
            };

            let mut claim = ClaimGuard::new(self, slot, None);
            let entry = self.open_connection(slot).await?;
            claim.hold(entry);
            claim.into_idle();
            drop(permit);
            opened += 1;
        }

        tracing::info!(opened, "connection pool warmed up");
        Ok(opened)
    }

    /// Ping every parked session and evict the ones that do not answer
    ///
    /// Each slot is claimed while it is probed, so no lease can observe a
    /// session that is being checked. Slots in use are skipped. Latencies
    /// are classified with the default [`HealthThresholds`].
    pub async fn check_idle(&self) -> HealthReport {
        self.check_idle_with_thresholds(&HealthThresholds::default()).await
    }

    /// Like [`check_idle`](Self::check_idle), classifying latencies with
    /// `thresholds`
    #[tracing::instrument(skip(self), fields(endpoint = %self.endpoint.address()))]
    pub async fn check_idle_with_thresholds(&self, thresholds: &HealthThresholds) -> HealthReport {
        let mut report = HealthReport::default();
        let mut checked = HashSet::new();

        while !self.is_closed() {
            let Ok(permit) = self.semaphore.clone().try_acquire_owned() else {
                break;
            };
            let claimed = self.slots.lock().claim_where(|idx, state| {
                matches!(state, SlotState::Idle(_)) && !checked.contains(&idx)
            });
            let Some((slot, Some(entry))) = claimed else {
                break;
            };
            checked.insert(slot);

            let connection_id = entry.id;
            let mut claim = ClaimGuard::new(self, slot, Some(entry));
            let ping = match claim.entry() {
                Some(entry) => {
                    ping_connection_with_timeout(
                        entry.connection.as_ref(),
                        self.config.connect_timeout(),
                    )
                    .await
                }
                None => Err(PingError::ConnectionClosed),
            };

            match ping {
                Ok(latency) => {
                    let status = HealthStatus::from_latency_with_thresholds(latency, thresholds);
                    report.record(status);
                    claim.into_idle();
                }
                Err(e) => {
                    tracing::warn!(
                        slot,
                        %connection_id,
                        error = %e,
                        "evicting unresponsive connection"
                    );
                    report.record_eviction();
                    claim.close_entry().await;
                    // guard drop leaves the slot empty
                }
            }
            drop(permit);
        }

        tracing::debug!(?report, "idle connection check finished");
        report
    }

    /// Shut the pool down
    ///
    /// Wakes every waiter with [`RodsError::PoolClosed`] and closes every
    /// parked session. Sessions still leased are closed when their lease
    /// is returned. Closing twice is a no-op.
    #[tracing::instrument(skip(self), fields(endpoint = %self.endpoint.address()))]
    pub async fn close(&self) {
        let parked = {
            let mut slots = self.slots.lock();
            if self.closed.swap(true, Ordering::SeqCst) {
                return;
            }
            slots.drain_idle()
        };
        self.semaphore.close();

        let count = parked.len();
        for entry in parked {
            entry.close_quietly().await;
        }

        tracing::info!(closed_connections = count, "connection pool closed");
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(RodsError::PoolClosed)
        } else {
            Ok(())
        }
    }

    /// Get current pool statistics
    pub fn stats(&self) -> PoolStats {
        let slots = self.slots.lock();
        let mut stats = PoolStats {
            capacity: slots.len(),
            waiting: self.waiting.load(Ordering::SeqCst),
            opened: self.counters.opened.load(Ordering::SeqCst),
            refreshed: self.counters.refreshed.load(Ordering::SeqCst),
            released: self.counters.released.load(Ordering::SeqCst),
            failed_connects: self.counters.failed_connects.load(Ordering::SeqCst),
            ..PoolStats::default()
        };

        for state in slots.iter() {
            match state {
                SlotState::Empty => {}
                SlotState::Idle(_) => {
                    stats.idle += 1;
                    stats.connected += 1;
                }
                SlotState::Claimed { connected } => {
                    stats.in_use += 1;
                    if *connected {
                        stats.connected += 1;
                    }
                }
                SlotState::Leased => {
                    stats.in_use += 1;
                    stats.connected += 1;
                }
            }
        }
        stats
    }

    /// Get the pool configuration
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Get the endpoint sessions are opened against
    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }
}

impl Drop for ConnectionPool {
    fn drop(&mut self) {
        let parked = self.slots.get_mut().drain_idle();
        if !parked.is_empty() {
            tracing::debug!(count = parked.len(), "closing parked connections on pool drop");
            close_detached(parked);
        }
    }
}

/// Close sessions without awaiting, from a context that cannot await
///
/// Uses a detached task when a tokio runtime is available. Otherwise the
/// sessions are dropped, leaving teardown to their own `Drop`.
fn close_detached(entries: Vec<SlotConnection>) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                for entry in entries {
                    entry.close_quietly().await;
                }
            });
        }
        Err(_) => {
            tracing::warn!(
                count = entries.len(),
                "no async runtime available, dropping connections without closing them"
            );
        }
    }
}

/// Counts a caller as waiting for as long as the guard lives
struct WaitingGuard<'a> {
    waiting: &'a AtomicUsize,
}

impl<'a> WaitingGuard<'a> {
    fn enter(waiting: &'a AtomicUsize) -> Self {
        waiting.fetch_add(1, Ordering::SeqCst);
        Self { waiting }
    }
}

impl Drop for WaitingGuard<'_> {
    fn drop(&mut self) {
        self.waiting.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Holds a slot in the claimed state, along with any session taken from it
///
/// Unless converted, dropping the guard leaves the slot empty and closes a
/// session it still holds. That covers failed connects as well as acquire
/// and idle-check futures cancelled mid-flight.
struct ClaimGuard<'a> {
    pool: &'a ConnectionPool,
    slot: usize,
    entry: Option<SlotConnection>,
    armed: bool,
}

impl<'a> ClaimGuard<'a> {
    fn new(pool: &'a ConnectionPool, slot: usize, entry: Option<SlotConnection>) -> Self {
        Self {
            pool,
            slot,
            entry,
            armed: true,
        }
    }

    fn entry(&self) -> Option<&SlotConnection> {
        self.entry.as_ref()
    }

    fn take_entry(&mut self) -> Option<SlotConnection> {
        self.entry.take()
    }

    fn hold(&mut self, entry: SlotConnection) {
        self.entry = Some(entry);
    }

    /// Close the held session; the slot stays claimed
    async fn close_entry(&mut self) {
        if let Some(entry) = &self.entry {
            entry.close_quietly().await;
        }
        self.entry = None;
        self.pool
            .slots
            .lock()
            .set(self.slot, SlotState::Claimed { connected: false });
    }

    fn into_leased(mut self) {
        self.armed = false;
        self.pool.slots.lock().set(self.slot, SlotState::Leased);
    }

    fn into_idle(mut self) {
        if let Some(entry) = self.entry.take() {
            self.armed = false;
            self.pool.check_in(self.slot, entry);
        }
    }
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.pool.slots.lock().set(self.slot, SlotState::Empty);
        }
        if let Some(entry) = self.entry.take() {
            tracing::debug!(
                slot = self.slot,
                connection_id = %entry.id,
                "claim abandoned, closing its connection"
            );
            close_detached(vec![entry]);
        }
    }
}
