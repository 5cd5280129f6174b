//! Wire-faithful record models for the Signalpost ingest API.
//!
//! Field names and JSON casing are fixed by the server contract; changing
//! them here breaks ingestion. Action records travel in batches wrapped in
//! an [`ActionBatch`] envelope, identity records are always sent alone.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Free-form metadata attached to actions and identities.
///
/// The server treats the value as an opaque JSON object.
pub type Metadata = HashMap<String, serde_json::Value>;

/// A single tracked event produced by the embedding application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Event name, e.g. `"purchase"` or `"page-view"`. Must not be empty.
    pub key: String,
    /// Identifier of the user the event belongs to.
    pub user_key: String,
    /// Whether `user_key` refers to an anonymous (not yet identified) user.
    pub is_anonymous_user: bool,
    /// When the event happened, as reported by the producer.
    pub timestamp: DateTime<Utc>,
    /// Opaque event attributes.
    #[serde(default)]
    pub metadata: Metadata,
}

impl Action {
    /// Creates an action for a known user, stamped with the current time.
    pub fn new(
        key: impl Into<String>,
        user_key: impl Into<String>,
        metadata: Metadata,
    ) -> Self {
        Self {
            key: key.into(),
            user_key: user_key.into(),
            is_anonymous_user: false,
            timestamp: Utc::now(),
            metadata,
        }
    }

    /// Creates an action attributed to an anonymous user, stamped with the
    /// current time.
    pub fn anonymous(
        key: impl Into<String>,
        anonymous_key: impl Into<String>,
        metadata: Metadata,
    ) -> Self {
        Self {
            key: key.into(),
            user_key: anonymous_key.into(),
            is_anonymous_user: true,
            timestamp: Utc::now(),
            metadata,
        }
    }
}

/// Envelope for a flushed group of actions.
///
/// The `timestamp` records when the batch was flushed, not when any
/// contained action happened. The contained actions are in submission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionBatch {
    /// Flush time of the batch.
    pub timestamp: DateTime<Utc>,
    /// Actions in submission order.
    pub actions: Vec<Action>,
}

impl ActionBatch {
    /// Wraps the given actions in an envelope stamped with the current time.
    pub fn new(actions: Vec<Action>) -> Self {
        Self { timestamp: Utc::now(), actions }
    }

    /// Number of actions in the batch.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the batch contains no actions.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// A user-identification record.
///
/// Never batched: each identity is delivered in its own request as soon as
/// it is submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Identifier of the user being described. Must not be empty.
    pub user_key: String,
    /// Opaque user attributes.
    #[serde(default)]
    pub metadata: Metadata,
}

impl Identity {
    /// Creates an identity record.
    pub fn new(user_key: impl Into<String>, metadata: Metadata) -> Self {
        Self { user_key: user_key.into(), metadata }
    }
}
