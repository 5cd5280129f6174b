//! Public SDK facade wiring configuration, transport, dispatcher and pool.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use signalpost_core::{Action, ConfigError, Identity, Metadata, SubmitError};
use signalpost_dispatch::{Dispatcher, NoopHooks, TaskHooks, WorkerPool};
use thiserror::Error;
use tracing::debug;

use crate::{config::Config, transport::IngestClient};

/// Rejection of a record submitted through the [`Client`] facade.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClientError {
    /// A required record field is empty.
    #[error("{name} must not be empty")]
    EmptyField {
        /// Name of the offending field.
        name: &'static str,
    },

    /// The client is shutting down and accepts no new records.
    #[error(transparent)]
    Submit(#[from] SubmitError),
}

/// Handle applications embed to emit actions and identify users.
///
/// Cloning is cheap; all clones share one dispatcher and worker pool.
/// Records are accepted immediately and delivered in the background. Call
/// [`close`](Client::close) before process exit, otherwise buffered
/// records are lost.
#[derive(Debug, Clone)]
pub struct Client {
    dispatcher: Dispatcher,
}

impl Client {
    /// Builds a client from the given configuration.
    ///
    /// Validates the configuration and constructs the transport, but opens
    /// no connections and spawns nothing until the first record arrives.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        Self::with_hooks(config, Arc::new(NoopHooks))
    }

    /// Builds a client that reports delivery outcomes through `hooks`.
    pub fn with_hooks(config: Config, hooks: Arc<dyn TaskHooks>) -> Result<Self, ConfigError> {
        config.validate()?;
        let transport =
            IngestClient::new(&config.base_url, &config.api_key, config.request_timeout())?;
        let pool = WorkerPool::with_hooks(config.pool_config(), hooks)?;
        let dispatcher = Dispatcher::new(config.dispatch_config(), pool, Arc::new(transport))?;
        debug!(base_url = %config.base_url, "signalpost client ready");
        Ok(Self { dispatcher })
    }

    /// Records an action for a known user, stamped with the current time.
    pub async fn emit(
        &self,
        key: impl Into<String>,
        user_key: impl Into<String>,
        metadata: Metadata,
    ) -> Result<(), ClientError> {
        self.submit_action(Action::new(key, user_key, metadata)).await
    }

    /// Records an action that happened at an explicit time.
    pub async fn emit_at(
        &self,
        key: impl Into<String>,
        user_key: impl Into<String>,
        timestamp: DateTime<Utc>,
        metadata: Metadata,
    ) -> Result<(), ClientError> {
        let mut action = Action::new(key, user_key, metadata);
        action.timestamp = timestamp;
        self.submit_action(action).await
    }

    /// Records an action attributed to a not-yet-identified user.
    pub async fn emit_anonymous(
        &self,
        key: impl Into<String>,
        anonymous_key: impl Into<String>,
        metadata: Metadata,
    ) -> Result<(), ClientError> {
        self.submit_action(Action::anonymous(key, anonymous_key, metadata)).await
    }

    /// Describes a user. Delivered immediately, never batched.
    pub async fn identify(
        &self,
        user_key: impl Into<String>,
        metadata: Metadata,
    ) -> Result<(), ClientError> {
        let identity = Identity::new(user_key, metadata);
        if identity.user_key.is_empty() {
            return Err(ClientError::EmptyField { name: "user_key" });
        }
        self.dispatcher.submit_identity(identity).await?;
        Ok(())
    }

    /// Flushes all pending records and stops background delivery.
    ///
    /// Idempotent. Blocks until buffered and in-flight records have been
    /// delivered, or dropped after exhausting their retries.
    pub async fn close(&self) {
        self.dispatcher.shutdown().await;
    }

    async fn submit_action(&self, action: Action) -> Result<(), ClientError> {
        if action.key.is_empty() {
            return Err(ClientError::EmptyField { name: "key" });
        }
        self.dispatcher.submit_action(action).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Client {
        Client::new(Config::new("sp-test")).expect("default config with key is valid")
    }

    #[test]
    fn construction_validates_the_config() {
        let err = Client::new(Config::default()).err().expect("must reject");
        assert!(matches!(err, ConfigError::Empty { name: "api_key" }));
    }

    #[tokio::test]
    async fn empty_action_key_is_rejected_before_submission() {
        let client = client();
        let err = client.emit("", "user-1", Metadata::new()).await.err().expect("must reject");
        assert_eq!(err, ClientError::EmptyField { name: "key" });
        // The rejected record must not have started background delivery.
        assert!(!client.dispatcher.has_started());
    }

    #[tokio::test]
    async fn empty_user_key_is_rejected_for_identify() {
        let client = client();
        let err = client.identify("", Metadata::new()).await.err().expect("must reject");
        assert_eq!(err, ClientError::EmptyField { name: "user_key" });
        assert!(!client.dispatcher.has_started());
    }

    #[tokio::test]
    async fn close_without_records_is_a_noop() {
        let client = client();
        client.close().await;
        client.close().await;
    }
}
