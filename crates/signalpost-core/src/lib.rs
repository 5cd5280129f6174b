//! Core domain types for the Signalpost event-delivery SDK.
//!
//! Defines the wire-faithful record models (`Action`, `ActionBatch`,
//! `Identity`), strongly-typed identifiers used for hook and log
//! correlation, the error taxonomy shared across the workspace, and a
//! clock abstraction that keeps retry timing testable.
//!
//! This crate carries no I/O and no async machinery beyond the `Clock`
//! trait; the batching and delivery logic lives in `signalpost-dispatch`,
//! the HTTP transport in `signalpost-client`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod ids;
pub mod records;
pub mod time;

pub use error::{ConfigError, SubmitError, TaskError};
pub use ids::{TaskId, WorkerId};
pub use records::{Action, ActionBatch, Identity, Metadata};
pub use time::{Clock, RealClock, TestClock};
