//! Counters emitted by the default lease observer

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use petstore_common::{Clock, TokioClock};
use petstore_core::{LEASE_ACQUIRE_TOTAL, LEASE_RELEASE_TOTAL, LEASE_RENEW_TOTAL, LeaseLock};
use petstore_persistence::MemoryLockStore;

/// Counter name, `outcome` label and value
type CounterEntry = (String, Option<String>, u64);

fn counter(entries: &[CounterEntry], name: &str, outcome: Option<&str>) -> u64 {
    entries
        .iter()
        .filter(|(n, o, _)| n == name && o.as_deref() == outcome)
        .map(|(_, _, v)| *v)
        .sum()
}

#[test]
fn test_lifecycle_counters_and_labels() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap();

    metrics::with_local_recorder(&recorder, || {
        runtime.block_on(async {
            let store = Arc::new(MemoryLockStore::new());
            let clock: Arc<dyn Clock> = Arc::new(TokioClock::starting_at(
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            ));
            let lease = Duration::from_secs(4);

            let mut holder =
                LeaseLock::new(store.clone(), "init", "node-a", lease).with_clock(clock.clone());
            let mut contender =
                LeaseLock::new(store.clone(), "init", "node-b", lease).with_clock(clock.clone());
            let mut misconfigured = LeaseLock::new(store.clone(), "init", "node-c", Duration::ZERO)
                .with_clock(clock.clone());

            assert_eq!(holder.acquire().await, Ok(true));
            assert_eq!(contender.acquire().await, Ok(false));
            assert!(misconfigured.acquire().await.is_err());

            // Renewal every 3s: one success, then one failure
            tokio::time::sleep(Duration::from_millis(3500)).await;
            store.set_fail_updates(true);
            tokio::time::sleep(Duration::from_secs(3)).await;
            store.set_fail_updates(false);

            holder.release().await.unwrap();
        });
    });

    let entries: Vec<CounterEntry> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter_map(|(key, _, _, value)| match value {
            DebugValue::Counter(v) => {
                let key = key.key();
                let outcome = key
                    .labels()
                    .find(|l| l.key() == "outcome")
                    .map(|l| l.value().to_string());
                Some((key.name().to_string(), outcome, v))
            }
            _ => None,
        })
        .collect();

    assert_eq!(counter(&entries, LEASE_ACQUIRE_TOTAL, Some("acquired")), 1);
    assert_eq!(counter(&entries, LEASE_ACQUIRE_TOTAL, Some("contended")), 1);
    assert_eq!(counter(&entries, LEASE_ACQUIRE_TOTAL, Some("failed")), 1);
    assert_eq!(counter(&entries, LEASE_RENEW_TOTAL, Some("renewed")), 1);
    assert_eq!(counter(&entries, LEASE_RENEW_TOTAL, Some("failed")), 1);
    assert_eq!(counter(&entries, LEASE_RELEASE_TOTAL, None), 1);

    assert_eq!(LEASE_ACQUIRE_TOTAL, "lease_acquire_total");
    assert_eq!(LEASE_RENEW_TOTAL, "lease_renew_total");
    assert_eq!(LEASE_RELEASE_TOTAL, "lease_release_total");
}
