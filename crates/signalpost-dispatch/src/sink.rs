//! Boundary contract between the dispatcher and the transport.

use async_trait::async_trait;
use signalpost_core::{ActionBatch, Identity, TaskError};

/// Destination for flushed records.
///
/// The dispatcher is transport-agnostic: a flush wraps one `send_batch` or
/// `send_identity` call into a [`Task`](crate::Task) and hands it to the
/// worker pool, which retries the call on failure. Implementations must be
/// safe to call concurrently from several workers, and a repeated call with
/// the same payload must be acceptable to the receiving side (retries
/// re-send the identical batch).
#[async_trait]
pub trait RecordSink: Send + Sync + 'static {
    /// Delivers a flushed batch of actions.
    async fn send_batch(&self, batch: &ActionBatch) -> Result<(), TaskError>;

    /// Delivers a single identity record.
    async fn send_identity(&self, identity: &Identity) -> Result<(), TaskError>;
}
