//! Record sink that captures deliveries instead of sending them.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use signalpost_core::{ActionBatch, Identity, TaskError};
use signalpost_dispatch::RecordSink;
use tokio::sync::Notify;

/// How long [`RecordingSink`] waits before declaring a test stuck.
const WAIT_TIMEOUT: Duration = Duration::from_secs(10);

/// [`RecordSink`] implementation that stores everything it receives.
///
/// Deliveries are recorded in arrival order. `fail_next_batches` scripts
/// transport failures, which the pool then retries.
#[derive(Debug, Default)]
pub struct RecordingSink {
    batches: Mutex<Vec<ActionBatch>>,
    identities: Mutex<Vec<Identity>>,
    scripted_failures: AtomicUsize,
    changed: Notify,
}

impl RecordingSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every delivered batch, in arrival order.
    pub fn batches(&self) -> Vec<ActionBatch> {
        self.batches.lock().unwrap().clone()
    }

    /// Snapshot of every delivered identity record, in arrival order.
    pub fn identities(&self) -> Vec<Identity> {
        self.identities.lock().unwrap().clone()
    }

    /// Makes the next `n` batch deliveries fail with a scripted error.
    ///
    /// Failed deliveries are not recorded.
    pub fn fail_next_batches(&self, n: usize) {
        self.scripted_failures.store(n, Ordering::SeqCst);
    }

    /// Blocks until at least `n` batches have been delivered.
    ///
    /// # Panics
    ///
    /// Panics when the count is not reached within ten seconds.
    pub async fn wait_for_batches(&self, n: usize) {
        self.wait_until(|| self.batches.lock().unwrap().len() >= n, "batches").await;
    }

    /// Blocks until at least `n` identity records have been delivered.
    ///
    /// # Panics
    ///
    /// Panics when the count is not reached within ten seconds.
    pub async fn wait_for_identities(&self, n: usize) {
        self.wait_until(|| self.identities.lock().unwrap().len() >= n, "identities").await;
    }

    async fn wait_until(&self, predicate: impl Fn() -> bool, what: &str) {
        let wait = async {
            loop {
                let notified = self.changed.notified();
                tokio::pin!(notified);
                // Register before checking, so a notification arriving
                // between the check and the await is not lost.
                notified.as_mut().enable();
                if predicate() {
                    return;
                }
                notified.await;
            }
        };
        if tokio::time::timeout(WAIT_TIMEOUT, wait).await.is_err() {
            panic!(
                "timed out waiting for {what}, batches: {}, identities: {}",
                self.batches.lock().unwrap().len(),
                self.identities.lock().unwrap().len(),
            );
        }
    }
}

#[async_trait]
impl RecordSink for RecordingSink {
    async fn send_batch(&self, batch: &ActionBatch) -> Result<(), TaskError> {
        let failing = self
            .scripted_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(TaskError::other("scripted batch delivery failure"));
        }
        self.batches.lock().unwrap().push(batch.clone());
        self.changed.notify_waiters();
        Ok(())
    }

    async fn send_identity(&self, identity: &Identity) -> Result<(), TaskError> {
        self.identities.lock().unwrap().push(identity.clone());
        self.changed.notify_waiters();
        Ok(())
    }
}
