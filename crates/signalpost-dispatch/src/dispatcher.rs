//! Batching dispatcher in front of the worker pool.
//!
//! Action records accumulate in a pending batch owned by a single
//! sequencer task, so no lock guards the batch. The batch is flushed to
//! the [`RecordSink`] when it reaches the configured size, when the flush
//! interval elapses, and once more during shutdown. Identity records skip
//! batching entirely and go straight to the pool.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use signalpost_core::{Action, ActionBatch, ConfigError, Identity, SubmitError};
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
    time::{sleep_until, Instant},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    sink::RecordSink,
    task::Task,
    worker_pool::WorkerPool,
    DEFAULT_BATCH_SIZE, DEFAULT_FLUSH_INTERVAL, MIN_FLUSH_INTERVAL,
};

/// Capacity of the channel between submitters and the sequencer.
const SEQUENCER_INBOX_CAPACITY: usize = 16;

/// Batching thresholds for the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Number of pending actions that triggers an immediate flush.
    /// Must be at least 1.
    pub batch_size: usize,
    /// Longest time a pending action may wait before being flushed.
    /// Must be at least [`MIN_FLUSH_INTERVAL`].
    pub flush_interval: std::time::Duration,
}

impl DispatchConfig {
    /// Checks every documented bound, naming the offending parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size < 1 {
            return Err(ConfigError::BelowMinimum {
                name: "batch_size",
                min: 1,
                got: self.batch_size as u64,
            });
        }
        if self.flush_interval < MIN_FLUSH_INTERVAL {
            return Err(ConfigError::DurationBelowMinimum {
                name: "flush_interval",
                min: MIN_FLUSH_INTERVAL,
                got: self.flush_interval,
            });
        }
        Ok(())
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { batch_size: DEFAULT_BATCH_SIZE, flush_interval: DEFAULT_FLUSH_INTERVAL }
    }
}

enum Submission {
    Action(Action),
    Identity(Identity),
}

/// Lifecycle of the sequencer task, guarded by one mutex so that the
/// starting submission and a concurrent shutdown always see each other.
enum SequencerSlot {
    Seed(Sequencer),
    Running(JoinHandle<()>),
    Finished,
}

struct DispatcherShared {
    submit_tx: mpsc::Sender<Submission>,
    sequencer: Mutex<SequencerSlot>,
    cancel: CancellationToken,
    started: AtomicBool,
    in_shutdown: AtomicBool,
}

/// Accepts records, batches actions and forwards work to the pool.
///
/// Cloning is cheap and every clone drives the same dispatcher. Nothing
/// runs until the first submission starts the sequencer task.
#[derive(Clone)]
pub struct Dispatcher {
    shared: Arc<DispatcherShared>,
}

impl Dispatcher {
    /// Creates a dispatcher that flushes batches into `sink` via `pool`.
    pub fn new(
        config: DispatchConfig,
        pool: WorkerPool,
        sink: Arc<dyn RecordSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let (submit_tx, inbox) = mpsc::channel(SEQUENCER_INBOX_CAPACITY);
        let cancel = CancellationToken::new();
        let sequencer = Sequencer {
            config,
            pool,
            sink,
            inbox,
            pending: Vec::new(),
            cancel: cancel.clone(),
        };
        Ok(Self {
            shared: Arc::new(DispatcherShared {
                submit_tx,
                sequencer: Mutex::new(SequencerSlot::Seed(sequencer)),
                cancel,
                started: AtomicBool::new(false),
                in_shutdown: AtomicBool::new(false),
            }),
        })
    }

    /// Queues an action record for batching.
    ///
    /// Starts the sequencer on the first call. Returns
    /// [`SubmitError::ShuttingDown`] once shutdown has begun.
    pub async fn submit_action(&self, action: Action) -> Result<(), SubmitError> {
        self.submit(Submission::Action(action)).await
    }

    /// Sends an identity record to the pool immediately, without batching.
    ///
    /// Pending actions stay pending; the flush timer is not touched.
    pub async fn submit_identity(&self, identity: Identity) -> Result<(), SubmitError> {
        self.submit(Submission::Identity(identity)).await
    }

    async fn submit(&self, submission: Submission) -> Result<(), SubmitError> {
        if self.shared.in_shutdown.load(Ordering::Acquire) {
            return Err(SubmitError::ShuttingDown);
        }
        self.ensure_started().await;
        self.shared
            .submit_tx
            .send(submission)
            .await
            .map_err(|_| SubmitError::ShuttingDown)
    }

    async fn ensure_started(&self) {
        if self
            .shared
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        let mut slot = self.shared.sequencer.lock().await;
        if let SequencerSlot::Seed(sequencer) =
            std::mem::replace(&mut *slot, SequencerSlot::Finished)
        {
            *slot = SequencerSlot::Running(tokio::spawn(sequencer.run()));
            debug!("dispatcher started");
        }
    }

    /// Flushes everything and stops the sequencer and the pool.
    ///
    /// Idempotent: repeated calls and calls on a dispatcher that never
    /// started are no-ops. Otherwise the call blocks until buffered
    /// submissions are handled, the final batch is flushed and the pool
    /// has drained.
    pub async fn shutdown(&self) {
        if !self.shared.started.load(Ordering::Acquire) {
            return;
        }
        if self
            .shared
            .in_shutdown
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        self.shared.cancel.cancel();
        // The lock is held across the join so a submission racing the
        // first start cannot slip a record past the drain.
        let mut slot = self.shared.sequencer.lock().await;
        match std::mem::replace(&mut *slot, SequencerSlot::Finished) {
            SequencerSlot::Running(handle) => {
                if let Err(join_error) = handle.await {
                    tracing::error!(error = %join_error, "sequencer terminated abnormally");
                }
            }
            // Started but not yet spawned; dropping the seed closes the
            // inbox, so the racing submission is rejected instead of lost.
            SequencerSlot::Seed(sequencer) => drop(sequencer),
            SequencerSlot::Finished => {}
        }
        drop(slot);
        info!("dispatcher stopped");
    }

    /// Whether the first submission has already started the sequencer.
    pub fn has_started(&self) -> bool {
        self.shared.started.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("started", &self.has_started())
            .finish_non_exhaustive()
    }
}

/// Single owner of the pending batch. Runs as one spawned task, so batch
/// state needs no synchronization.
struct Sequencer {
    config: DispatchConfig,
    pool: WorkerPool,
    sink: Arc<dyn RecordSink>,
    inbox: mpsc::Receiver<Submission>,
    pending: Vec<Action>,
    cancel: CancellationToken,
}

impl Sequencer {
    async fn run(mut self) {
        let mut deadline = Instant::now() + self.config.flush_interval;
        loop {
            tokio::select! {
                submission = self.inbox.recv() => match submission {
                    Some(submission) => {
                        if self.handle(submission).await {
                            deadline = Instant::now() + self.config.flush_interval;
                        }
                    }
                    None => break,
                },
                () = sleep_until(deadline) => {
                    if !self.pending.is_empty() {
                        self.flush_pending("interval").await;
                    }
                    deadline = Instant::now() + self.config.flush_interval;
                }
                () = self.cancel.cancelled() => break,
            }
        }
        self.drain().await;
    }

    /// Applies one submission. Returns true when the flush timer must be
    /// re-armed, which only a size-triggered flush does.
    async fn handle(&mut self, submission: Submission) -> bool {
        match submission {
            Submission::Action(action) => {
                self.pending.push(action);
                if self.pending.len() >= self.config.batch_size {
                    self.flush_pending("size").await;
                    return true;
                }
                false
            }
            Submission::Identity(identity) => {
                self.flush_identity(identity).await;
                false
            }
        }
    }

    /// Handles buffered submissions, flushes the final batch and drains
    /// the pool.
    async fn drain(&mut self) {
        self.inbox.close();
        while let Some(submission) = self.inbox.recv().await {
            self.handle(submission).await;
        }
        if !self.pending.is_empty() {
            self.flush_pending("shutdown").await;
        }
        self.pool.shutdown().await;
    }

    async fn flush_pending(&mut self, trigger: &'static str) {
        let actions = std::mem::take(&mut self.pending);
        let batch_len = actions.len();
        let batch = Arc::new(ActionBatch::new(actions));
        debug!(batch_len, trigger, "flushing action batch");
        let sink = Arc::clone(&self.sink);
        let task = Task::new(move || {
            let sink = Arc::clone(&sink);
            let batch = Arc::clone(&batch);
            async move { sink.send_batch(&batch).await }
        });
        if self.pool.submit(task).await.is_err() {
            warn!(batch_len, "dropping action batch, pool is shutting down");
        }
    }

    async fn flush_identity(&mut self, identity: Identity) {
        let identity = Arc::new(identity);
        let sink = Arc::clone(&self.sink);
        let task = Task::new(move || {
            let sink = Arc::clone(&sink);
            let identity = Arc::clone(&identity);
            async move { sink.send_identity(&identity).await }
        });
        if self.pool.submit(task).await.is_err() {
            warn!("dropping identity record, pool is shutting down");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn rejects_zero_batch_size() {
        let cfg = DispatchConfig { batch_size: 0, flush_interval: Duration::from_secs(10) };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::BelowMinimum { name: "batch_size", .. })
        ));
    }

    #[test]
    fn rejects_short_flush_interval() {
        let cfg = DispatchConfig { batch_size: 10, flush_interval: Duration::from_secs(4) };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::DurationBelowMinimum { name: "flush_interval", .. })
        ));
    }

    #[test]
    fn minimum_flush_interval_is_valid() {
        let cfg = DispatchConfig { batch_size: 1, flush_interval: MIN_FLUSH_INTERVAL };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn default_config_is_valid() {
        assert!(DispatchConfig::default().validate().is_ok());
    }
}
