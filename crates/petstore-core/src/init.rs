//! One-time data initialization
//!
//! When a fleet boots at once, every node tries to seed initial data. The
//! `"init"` lease lock lets exactly one of them do it; the others treat the
//! step as handled elsewhere and carry on.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use petstore_common::{Clock, SystemClock};
use petstore_persistence::LockPersistence;
use tracing::{error, info, warn};

use crate::lease::{LeaseError, LeaseLock, LeaseObserver, TracingObserver};

/// Lock action guarding data seeding
pub const INIT_ACTION: &str = "init";

/// What happened on this node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// This node held the lock and ran the seeding step
    Seeded,
    /// Another node holds the lock
    Skipped,
}

#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("init lock error: {0}")]
    Lock(#[from] LeaseError),

    #[error("seed data error: {0}")]
    Seed(#[source] anyhow::Error),
}

/// Runs a seeding step on at most one node at a time
pub struct DataInitializer {
    store: Arc<dyn LockPersistence>,
    clock: Arc<dyn Clock>,
    observer: Arc<dyn LeaseObserver>,
    holder: String,
    lease: Duration,
}

impl DataInitializer {
    pub fn new(store: Arc<dyn LockPersistence>, holder: impl Into<String>, lease: Duration) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            observer: Arc::new(TracingObserver),
            holder: holder.into(),
            lease,
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

    /// Acquire the init lock and run `seed` if this node won it
    ///
    /// The lock is released whether `seed` succeeds, fails or panics. A
    /// seeding error takes precedence over a release error, and a panic is
    /// resumed once the lock is released.
    pub async fn run<F, Fut>(&self, seed: F) -> Result<InitOutcome, InitError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let mut lock = LeaseLock::new(
            self.store.clone(),
            INIT_ACTION,
            self.holder.as_str(),
            self.lease,
        )
        .with_clock(self.clock.clone())
        .with_observer(self.observer.clone());

        if !lock.acquire().await? {
            info!(holder = %self.holder, "Init data handled by another node");
            return Ok(InitOutcome::Skipped);
        }

        info!(holder = %self.holder, "Begin init data");
        let seeded = AssertUnwindSafe(async move { seed().await })
            .catch_unwind()
            .await;
        let released = lock.release().await;

        let seeded = match seeded {
            Ok(seeded) => seeded,
            Err(panic) => {
                if let Err(e) = released {
                    error!(error = %e, "Failed to release init lock after seed panic");
                }
                std::panic::resume_unwind(panic);
            }
        };

        match (seeded, released) {
            (Ok(()), Ok(())) => Ok(InitOutcome::Seeded),
            (Ok(()), Err(e)) => Err(InitError::Lock(e)),
            (Err(e), Ok(())) => Err(InitError::Seed(e)),
            (Err(e), Err(release_err)) => {
                warn!(error = %release_err, "Failed to release init lock after seed failure");
                Err(InitError::Seed(e))
            }
        }
    }
}
