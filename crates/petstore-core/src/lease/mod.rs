//! Lease-based mutual exclusion on the lock table
//!
//! A [`LeaseLock`] owns at most one row of the lock table. Acquiring sweeps
//! expired rows for the action, then inserts a fresh row; the store's unique
//! index on `action` decides the winner when several holders race. While the
//! lock is held a background task keeps pushing `expired_at` forward. A holder
//! that crashes stops renewing, and its row becomes reclaimable once expired.
//!
//! The sweep only shrinks the window in which an abandoned row blocks new
//! holders. Safety rests on the unique index alone.

mod error;
mod observer;
mod renewal;

use std::sync::Arc;
use std::time::Duration;

use petstore_common::{Clock, SystemClock, add_saturating};
use petstore_persistence::{LockFilter, LockPersistence, LockRow};
use tracing::debug;

pub use error::{LeaseError, LockState, RenewalError};
pub use observer::{
    LEASE_ACQUIRE_TOTAL, LEASE_RELEASE_TOTAL, LEASE_RENEW_TOTAL, LeaseObserver, TracingObserver,
};

use renewal::{RenewalContext, RenewalHandle, renewal_period};

/// Lease used when callers have no better estimate of their critical section
pub const DEFAULT_LEASE: Duration = Duration::from_secs(60);

/// Outcome of an acquisition attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireResult {
    /// Row inserted; the lock is held and being renewed
    Acquired,
    /// Another holder owns the row; expected under contention
    Contended,
    /// The attempt failed for a reason other than contention
    Failed(LeaseError),
}

impl AcquireResult {
    /// Collapse into `Ok(true)` / `Ok(false)` / `Err(..)`
    pub fn into_result(self) -> Result<bool, LeaseError> {
        match self {
            AcquireResult::Acquired => Ok(true),
            AcquireResult::Contended => Ok(false),
            AcquireResult::Failed(e) => Err(e),
        }
    }
}

/// A named lease lock held by one holder identity
pub struct LeaseLock {
    store: Arc<dyn LockPersistence>,
    clock: Arc<dyn Clock>,
    observer: Arc<dyn LeaseObserver>,
    action: String,
    holder: String,
    lease: Duration,
    state: LockState,
    renewal: Option<RenewalHandle>,
}

impl LeaseLock {
    /// Create an idle lock for `action` owned by `holder`
    ///
    /// Uses the system clock and [`TracingObserver`] unless replaced with
    /// [`with_clock`](Self::with_clock) / [`with_observer`](Self::with_observer).
    pub fn new(
        store: Arc<dyn LockPersistence>,
        action: impl Into<String>,
        holder: impl Into<String>,
        lease: Duration,
    ) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            observer: Arc::new(TracingObserver),
            action: action.into(),
            holder: holder.into(),
            lease,
            state: LockState::Idle,
            renewal: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn LeaseObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn holder(&self) -> &str {
        &self.holder
    }

    pub fn lease(&self) -> Duration {
        self.lease
    }

    pub fn state(&self) -> LockState {
        self.state
    }

    fn lease_is_valid(&self) -> bool {
        !renewal_period(self.lease).is_zero() && chrono::Duration::from_std(self.lease).is_ok()
    }

    /// Attempt to take the lock once
    ///
    /// Contention leaves the lock `Idle`, so the attempt may be repeated.
    /// Storage failures also leave it `Idle`. An unusable lease duration moves
    /// it to `AcquireFailed` for good.
    pub async fn try_acquire(&mut self) -> AcquireResult {
        if self.state != LockState::Idle {
            return AcquireResult::Failed(LeaseError::InvalidState {
                op: "acquire",
                state: self.state,
            });
        }

        if !self.lease_is_valid() {
            self.state = LockState::AcquireFailed;
            let err = LeaseError::InvalidLease(self.lease);
            self.observer
                .on_acquire_failed(&self.action, &self.holder, &err);
            return AcquireResult::Failed(err);
        }

        let now = self.clock.now();

        let sweep = LockFilter::action(self.action.as_str()).expired_before(now);
        match self.store.lock_delete_where(&sweep).await {
            Ok(0) => {}
            Ok(swept) => {
                debug!(action = %self.action, swept, "Removed expired lock rows");
            }
            Err(e) => return self.fail(e.into()),
        }

        let row = LockRow::new(
            self.action.as_str(),
            self.holder.as_str(),
            now,
            add_saturating(now, self.lease),
        );

        match self.store.lock_insert(&row).await {
            Ok(()) => {
                self.renewal = Some(renewal::spawn(RenewalContext {
                    store: self.store.clone(),
                    clock: self.clock.clone(),
                    observer: self.observer.clone(),
                    action: self.action.clone(),
                    holder: self.holder.clone(),
                    lease: self.lease,
                }));
                self.state = LockState::Held;
                self.observer
                    .on_acquired(&self.action, &self.holder, row.expired_at);
                AcquireResult::Acquired
            }
            Err(e) if e.is_unique_violation() => {
                self.observer.on_contended(&self.action, &self.holder);
                AcquireResult::Contended
            }
            Err(e) => self.fail(e.into()),
        }
    }

    fn fail(&self, err: LeaseError) -> AcquireResult {
        self.observer
            .on_acquire_failed(&self.action, &self.holder, &err);
        AcquireResult::Failed(err)
    }

    /// Take the lock, returning `Ok(false)` when another holder owns it
    pub async fn acquire(&mut self) -> Result<bool, LeaseError> {
        self.try_acquire().await.into_result()
    }

    /// Stop renewing and delete this holder's row
    ///
    /// The renewal task is joined before the delete so no refresh can land
    /// after it. The lock ends up `Released` even when the delete fails; the
    /// orphaned row is still bounded by its expiry. A row that is already
    /// gone is not an error.
    pub async fn release(&mut self) -> Result<(), LeaseError> {
        if self.state != LockState::Held {
            return Err(LeaseError::InvalidState {
                op: "release",
                state: self.state,
            });
        }

        if let Some(renewal) = self.renewal.take() {
            renewal.stop().await;
        }
        self.state = LockState::Released;

        let filter = LockFilter::action(self.action.as_str()).with_holder(self.holder.as_str());
        let removed = self.store.lock_delete_where(&filter).await?;
        self.observer
            .on_released(&self.action, &self.holder, removed);

        Ok(())
    }
}

impl Drop for LeaseLock {
    fn drop(&mut self) {
        // Row is left to expire
        if let Some(renewal) = self.renewal.take() {
            renewal.abort();
        }
    }
}

impl std::fmt::Debug for LeaseLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeaseLock")
            .field("action", &self.action)
            .field("holder", &self.holder)
            .field("lease", &self.lease)
            .field("state", &self.state)
            .finish()
    }
}
