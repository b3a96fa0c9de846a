// Metric descriptions for the lease lock counters

use metrics::describe_counter;
use petstore_core::{LEASE_ACQUIRE_TOTAL, LEASE_RELEASE_TOTAL, LEASE_RENEW_TOTAL};

/// Initialize all metric descriptions
/// Should be called once at application startup
pub fn init_metrics() {
    describe_counter!(
        LEASE_ACQUIRE_TOTAL,
        "Lease acquisition attempts by outcome (acquired, contended, failed)"
    );
    describe_counter!(
        LEASE_RENEW_TOTAL,
        "Lease renewals by outcome (renewed, failed)"
    );
    describe_counter!(LEASE_RELEASE_TOTAL, "Lease releases");
}
