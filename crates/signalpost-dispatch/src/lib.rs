//! Batching dispatcher and retrying worker pool.
//!
//! This crate implements the concurrent core of the Signalpost SDK: action
//! records are accumulated into batches and handed off, as retryable tasks,
//! to a bounded pool of workers that deliver them through a caller-supplied
//! [`RecordSink`].
//!
//! # Architecture
//!
//! ```text
//! submit_action ──┐
//!                 ├──► sequencer ──► pending batch ──┐ size / interval /
//! submit_identity ┘    (one task,                    │ shutdown flush
//!                       owns all                     ▼
//!                       mutable state)          Task (batch send)
//!                                                    │
//!                                                    ▼
//!                                      bounded queue ──► worker 0..N
//!                                      (back-pressure)   retry with
//!                                                        linear backoff
//! ```
//!
//! The sequencer is the single owner of the pending batch, so no lock guards
//! it. Workers pull tasks from a bounded queue; a full queue suspends the
//! submitter instead of dropping data. Both components start lazily on the
//! first submission and drain completely on shutdown.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use signalpost_core::{Action, ActionBatch, Identity, Metadata, TaskError};
//! use signalpost_dispatch::{DispatchConfig, Dispatcher, PoolConfig, RecordSink, WorkerPool};
//!
//! struct StdoutSink;
//!
//! #[async_trait::async_trait]
//! impl RecordSink for StdoutSink {
//!     async fn send_batch(&self, batch: &ActionBatch) -> Result<(), TaskError> {
//!         println!("batch of {} actions", batch.len());
//!         Ok(())
//!     }
//!
//!     async fn send_identity(&self, identity: &Identity) -> Result<(), TaskError> {
//!         println!("identity for {}", identity.user_key);
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = WorkerPool::new(PoolConfig::default())?;
//! let dispatcher = Dispatcher::new(DispatchConfig::default(), pool, Arc::new(StdoutSink))?;
//!
//! dispatcher.submit_action(Action::new("signup", "user-1", Metadata::new())).await?;
//! dispatcher.shutdown().await;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::time::Duration;

pub mod dispatcher;
pub mod hooks;
pub mod retry;
pub mod sink;
pub mod task;
pub mod worker_pool;

pub use dispatcher::{DispatchConfig, Dispatcher};
pub use hooks::{NoopHooks, TaskHooks};
pub use retry::RetryPolicy;
pub use sink::RecordSink;
pub use task::Task;
pub use worker_pool::{PoolConfig, PoolStats, WorkerPool};

/// Default number of concurrent workers.
pub const DEFAULT_WORKER_COUNT: usize = 3;

/// Default capacity of the bounded task queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Default number of retries after a failed first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Default base delay multiplied by the attempt number between retries.
pub const DEFAULT_BACKOFF_UNIT: Duration = Duration::from_secs(1);

/// Default number of actions that triggers a size flush.
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// Default interval between timer flushes.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(10);

/// Smallest accepted flush interval.
pub const MIN_FLUSH_INTERVAL: Duration = Duration::from_secs(5);
