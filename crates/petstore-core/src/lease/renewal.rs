//! Background lease renewal
//!
//! One task per held lock. It refreshes `expired_at` every three quarters of
//! the lease and exits only when its stop channel fires (or its sender is
//! dropped). Tick failures are reported and the loop keeps going.

use std::sync::Arc;
use std::time::Duration;

use petstore_common::{Clock, add_saturating};
use petstore_persistence::LockPersistence;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::error::RenewalError;
use super::observer::LeaseObserver;

/// Renew when a quarter of the lease remains
pub(crate) fn renewal_period(lease: Duration) -> Duration {
    lease / 4 * 3
}

/// Everything a renewal tick needs, owned by the background task
pub(crate) struct RenewalContext {
    pub(crate) store: Arc<dyn LockPersistence>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) observer: Arc<dyn LeaseObserver>,
    pub(crate) action: String,
    pub(crate) holder: String,
    pub(crate) lease: Duration,
}

impl RenewalContext {
    async fn renew_once(&self) {
        let now = self.clock.now();
        let expired_at = add_saturating(now, self.lease);

        match self
            .store
            .lock_update_expiry(&self.action, &self.holder, expired_at, now)
            .await
        {
            Ok(0) => self.observer.on_renew_failed(
                &self.action,
                &self.holder,
                &RenewalError::RowMissing {
                    action: self.action.clone(),
                    holder: self.holder.clone(),
                },
            ),
            Ok(_) => self
                .observer
                .on_renewed(&self.action, &self.holder, expired_at),
            Err(e) => self.observer.on_renew_failed(
                &self.action,
                &self.holder,
                &RenewalError::Storage(e.to_string()),
            ),
        }
    }
}

/// Handle to a running renewal task
pub(crate) struct RenewalHandle {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl RenewalHandle {
    /// Signal the loop and wait until it has exited
    pub(crate) async fn stop(self) {
        // Err means the loop is already gone; joining still applies
        let _ = self.stop_tx.send(());
        if let Err(e) = self.handle.await {
            warn!(error = %e, "Lease renewal task ended abnormally");
        }
    }

    /// Stop without waiting, for use from `Drop`
    pub(crate) fn abort(self) {
        self.handle.abort();
    }
}

/// Start the renewal loop for a freshly acquired lock
pub(crate) fn spawn(ctx: RenewalContext) -> RenewalHandle {
    let period = renewal_period(ctx.lease);
    let (stop_tx, stop_rx) = oneshot::channel();
    let handle = tokio::spawn(run(ctx, period, stop_rx));

    RenewalHandle { stop_tx, handle }
}

async fn run(ctx: RenewalContext, period: Duration, mut stop_rx: oneshot::Receiver<()>) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    debug!(action = %ctx.action, holder = %ctx.holder, period = ?period, "Lease renewal started");

    loop {
        tokio::select! {
            biased;
            _ = &mut stop_rx => {
                debug!(action = %ctx.action, holder = %ctx.holder, "Lease renewal stopped");
                break;
            }
            _ = ticker.tick() => {
                ctx.renew_once().await;
            }
        }
    }
}
