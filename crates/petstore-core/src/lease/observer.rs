//! Observability capability injected into lease locks
//!
//! Every lock reports its lifecycle events to a [`LeaseObserver`] handed in at
//! construction. Renewal failures have no caller to return to, so this is the
//! only place they surface.

use chrono::{DateTime, Utc};
use metrics::counter;
use tracing::{debug, error, info, warn};

use super::error::{LeaseError, RenewalError};

pub const LEASE_ACQUIRE_TOTAL: &str = "lease_acquire_total";
pub const LEASE_RENEW_TOTAL: &str = "lease_renew_total";
pub const LEASE_RELEASE_TOTAL: &str = "lease_release_total";

/// Receiver of lease lifecycle events
///
/// All methods default to doing nothing.
pub trait LeaseObserver: Send + Sync {
    fn on_acquired(&self, _action: &str, _holder: &str, _expired_at: DateTime<Utc>) {}

    fn on_contended(&self, _action: &str, _holder: &str) {}

    fn on_acquire_failed(&self, _action: &str, _holder: &str, _error: &LeaseError) {}

    fn on_renewed(&self, _action: &str, _holder: &str, _expired_at: DateTime<Utc>) {}

    fn on_renew_failed(&self, _action: &str, _holder: &str, _error: &RenewalError) {}

    fn on_released(&self, _action: &str, _holder: &str, _removed: u64) {}
}

/// Observer that emits `tracing` events and `metrics` counters
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl LeaseObserver for TracingObserver {
    fn on_acquired(&self, action: &str, holder: &str, expired_at: DateTime<Utc>) {
        counter!(LEASE_ACQUIRE_TOTAL, "outcome" => "acquired").increment(1);
        info!(action = %action, holder = %holder, expired_at = %expired_at, "Lock acquired");
    }

    fn on_contended(&self, action: &str, holder: &str) {
        counter!(LEASE_ACQUIRE_TOTAL, "outcome" => "contended").increment(1);
        debug!(action = %action, holder = %holder, "Lock held by another holder");
    }

    fn on_acquire_failed(&self, action: &str, holder: &str, error: &LeaseError) {
        counter!(LEASE_ACQUIRE_TOTAL, "outcome" => "failed").increment(1);
        error!(action = %action, holder = %holder, error = %error, "Lock acquisition failed");
    }

    fn on_renewed(&self, action: &str, holder: &str, expired_at: DateTime<Utc>) {
        counter!(LEASE_RENEW_TOTAL, "outcome" => "renewed").increment(1);
        debug!(action = %action, holder = %holder, expired_at = %expired_at, "Lease refreshed");
    }

    fn on_renew_failed(&self, action: &str, holder: &str, error: &RenewalError) {
        counter!(LEASE_RENEW_TOTAL, "outcome" => "failed").increment(1);
        error!(action = %action, holder = %holder, error = %error, "Failed to refresh lease");
    }

    fn on_released(&self, action: &str, holder: &str, removed: u64) {
        counter!(LEASE_RELEASE_TOTAL).increment(1);
        if removed == 0 {
            warn!(action = %action, holder = %holder, "Lock released but its row was already gone");
        } else {
            debug!(action = %action, holder = %holder, "Lock released");
        }
    }
}
