//! Batching, retrying event-delivery SDK for the Signalpost ingest API.
//!
//! Applications embed a [`Client`] and hand it action and identity
//! records. Actions accumulate into batches that are flushed when they
//! reach the configured size, when the flush interval elapses, or at
//! [`Client::close`]. Identity records skip batching and go out
//! immediately. Delivery runs on a bounded worker pool that retries
//! failed requests with linear backoff.
//!
//! This crate re-exports the whole public surface of the workspace:
//! the facade from `signalpost-client`, the records and errors from
//! `signalpost-core`, and the dispatch building blocks from
//! `signalpost-dispatch` for embedders that bring their own transport.
//!
//! # Quickstart
//!
//! ```no_run
//! use signalpost::{Client, Config, Metadata};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new(Config::new("sp-live-..."))?;
//!
//! client.emit("signup", "user-1", Metadata::new()).await?;
//! client
//!     .identify(
//!         "user-1",
//!         Metadata::from([("plan".to_owned(), serde_json::json!("pro"))]),
//!     )
//!     .await?;
//!
//! // Flushes the pending batch and drains in-flight deliveries.
//! client.close().await;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub use signalpost_client::{Client, ClientError, Config, IngestClient, DEFAULT_BASE_URL};
pub use signalpost_core::{
    Action, ActionBatch, Clock, ConfigError, Identity, Metadata, RealClock, SubmitError,
    TaskError, TaskId, TestClock, WorkerId,
};
pub use signalpost_dispatch::{
    DispatchConfig, Dispatcher, NoopHooks, PoolConfig, PoolStats, RecordSink, RetryPolicy, Task,
    TaskHooks, WorkerPool,
};
