//! Bounded worker pool with linear retry backoff.
//!
//! Workers pull tasks from a shared bounded queue and execute them with the
//! pool's [`RetryPolicy`]. The queue bounds memory: once it is full, the
//! next submission suspends until a worker frees a slot. Workers are
//! spawned lazily on the first submission and drain completely on shutdown.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use signalpost_core::{Clock, ConfigError, RealClock, SubmitError, WorkerId};
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::{
    hooks::{NoopHooks, TaskHooks},
    retry::RetryPolicy,
    task::Task,
    DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKER_COUNT,
};

/// Worker pool sizing and retry configuration.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of concurrent workers. Must be at least 1.
    pub worker_count: usize,
    /// Capacity of the bounded task queue. Must be at least 1.
    pub queue_capacity: usize,
    /// Retry schedule applied to every task.
    pub retry: RetryPolicy,
}

impl PoolConfig {
    /// Checks every documented bound, naming the offending parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count < 1 {
            return Err(ConfigError::BelowMinimum {
                name: "worker_count",
                min: 1,
                got: self.worker_count as u64,
            });
        }
        if self.queue_capacity < 1 {
            return Err(ConfigError::BelowMinimum {
                name: "queue_capacity",
                min: 1,
                got: self.queue_capacity as u64,
            });
        }
        if self.retry.backoff_unit.is_zero() {
            return Err(ConfigError::ZeroDuration { name: "backoff_unit" });
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            retry: RetryPolicy::default(),
        }
    }
}

/// Completion counters, readable at any time through [`WorkerPool::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Tasks accepted onto the queue.
    pub submitted: u64,
    /// Tasks that eventually succeeded.
    pub succeeded: u64,
    /// Tasks dropped after exhausting every attempt.
    pub exhausted: u64,
}

impl PoolStats {
    /// Tasks accepted but not yet finished.
    pub fn in_flight(&self) -> u64 {
        self.submitted.saturating_sub(self.succeeded.saturating_add(self.exhausted))
    }
}

#[derive(Debug, Default)]
struct PoolCounters {
    submitted: AtomicU64,
    succeeded: AtomicU64,
    exhausted: AtomicU64,
}

struct PoolShared {
    config: PoolConfig,
    hooks: Arc<dyn TaskHooks>,
    clock: Arc<dyn Clock>,
    queue_tx: Mutex<Option<mpsc::Sender<Task>>>,
    queue_rx: Mutex<mpsc::Receiver<Task>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    started: AtomicBool,
    in_shutdown: AtomicBool,
    counters: PoolCounters,
}

/// Fixed-size pool of workers executing tasks with retry.
///
/// Cloning is cheap and every clone drives the same pool. Construction
/// validates the configuration but spawns nothing; workers start on the
/// first successful [`submit`](WorkerPool::submit).
#[derive(Clone)]
pub struct WorkerPool {
    shared: Arc<PoolShared>,
}

impl WorkerPool {
    /// Creates a pool that reports completions only through logs.
    pub fn new(config: PoolConfig) -> Result<Self, ConfigError> {
        Self::with_hooks(config, Arc::new(NoopHooks))
    }

    /// Creates a pool with completion hooks.
    pub fn with_hooks(config: PoolConfig, hooks: Arc<dyn TaskHooks>) -> Result<Self, ConfigError> {
        Self::with_clock(config, hooks, Arc::new(RealClock))
    }

    /// Creates a pool with hooks and an injected clock for retry sleeps.
    pub fn with_clock(
        config: PoolConfig,
        hooks: Arc<dyn TaskHooks>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let (queue_tx, queue_rx) = mpsc::channel(config.queue_capacity);
        Ok(Self {
            shared: Arc::new(PoolShared {
                config,
                hooks,
                clock,
                queue_tx: Mutex::new(Some(queue_tx)),
                queue_rx: Mutex::new(queue_rx),
                handles: Mutex::new(Vec::new()),
                started: AtomicBool::new(false),
                in_shutdown: AtomicBool::new(false),
                counters: PoolCounters::default(),
            }),
        })
    }

    /// Places a task on the queue, starting the workers on the first call.
    ///
    /// Suspends only while the queue is full. Returns
    /// [`SubmitError::ShuttingDown`] once shutdown has begun; the task is
    /// then dropped without being enqueued.
    pub async fn submit(&self, task: Task) -> Result<(), SubmitError> {
        if self.shared.in_shutdown.load(Ordering::Acquire) {
            return Err(SubmitError::ShuttingDown);
        }
        if self
            .shared
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.spawn_workers().await;
        }
        let queue_tx = self.shared.queue_tx.lock().await.clone();
        let Some(queue_tx) = queue_tx else {
            return Err(SubmitError::ShuttingDown);
        };
        queue_tx.send(task).await.map_err(|_| SubmitError::ShuttingDown)?;
        self.shared.counters.submitted.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    /// Drains the pool and stops all workers.
    ///
    /// Idempotent: repeated calls and calls on a pool that never started are
    /// no-ops. Otherwise the call blocks until every queued and in-flight
    /// task, including retry sleeps already in progress, has finished.
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
        debug!("worker pool draining");
        self.shared.queue_tx.lock().await.take();
        let handles = std::mem::take(&mut *self.shared.handles.lock().await);
        for handle in handles {
            if let Err(join_error) = handle.await {
                error!(error = %join_error, "worker terminated abnormally");
            }
        }
        let stats = self.stats();
        info!(
            submitted = stats.submitted,
            succeeded = stats.succeeded,
            exhausted = stats.exhausted,
            "worker pool drained"
        );
    }

    /// Whether the first submission has already spawned the workers.
    pub fn has_started(&self) -> bool {
        self.shared.started.load(Ordering::Acquire)
    }

    /// Snapshot of the completion counters.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            submitted: self.shared.counters.submitted.load(Ordering::Acquire),
            succeeded: self.shared.counters.succeeded.load(Ordering::Acquire),
            exhausted: self.shared.counters.exhausted.load(Ordering::Acquire),
        }
    }

    async fn spawn_workers(&self) {
        let mut handles = self.shared.handles.lock().await;
        for index in 0..self.shared.config.worker_count {
            let worker = Worker { id: WorkerId(index), shared: Arc::clone(&self.shared) };
            handles.push(tokio::spawn(worker.run()));
        }
        debug!(worker_count = self.shared.config.worker_count, "worker pool started");
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("config", &self.shared.config)
            .field("started", &self.has_started())
            .finish_non_exhaustive()
    }
}

struct Worker {
    id: WorkerId,
    shared: Arc<PoolShared>,
}

impl Worker {
    async fn run(self) {
        debug!(worker_id = %self.id, "worker started");
        loop {
            let task = {
                let mut queue_rx = self.shared.queue_rx.lock().await;
                queue_rx.recv().await
            };
            let Some(task) = task else { break };
            self.execute(task).await;
        }
        debug!(worker_id = %self.id, "worker stopped");
    }

    /// Runs every attempt of one task; retries never move to another worker.
    async fn execute(&self, task: Task) {
        let policy = self.shared.config.retry;
        let started_at = self.shared.clock.now();
        for attempt in 0..policy.total_attempts() {
            match task.attempt().await {
                Ok(()) => {
                    self.shared.counters.succeeded.fetch_add(1, Ordering::AcqRel);
                    self.shared.hooks.on_success(task.id(), self.id);
                    debug!(
                        task_id = %task.id(),
                        worker_id = %self.id,
                        attempt,
                        duration_ms = duration_ms(self.shared.clock.now() - started_at),
                        "task succeeded"
                    );
                    return;
                }
                Err(error) => {
                    self.shared.hooks.on_failure(task.id(), self.id, &error);
                    if attempt + 1 < policy.total_attempts() {
                        let delay = policy.delay_after(attempt);
                        debug!(
                            task_id = %task.id(),
                            worker_id = %self.id,
                            attempt,
                            delay_ms = duration_ms(delay),
                            error = %error,
                            "task attempt failed, retrying"
                        );
                        self.shared.clock.sleep(delay).await;
                    } else {
                        self.shared.counters.exhausted.fetch_add(1, Ordering::AcqRel);
                        warn!(
                            task_id = %task.id(),
                            worker_id = %self.id,
                            attempts = policy.total_attempts(),
                            error = %error,
                            "task exhausted all attempts, dropping"
                        );
                    }
                }
            }
        }
    }
}

fn duration_ms(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
