//! Client-facing surface of the Signalpost SDK.
//!
//! Ties the batching dispatcher and worker pool to the real ingest API:
//! [`Config`] loads layered configuration, [`IngestClient`] speaks the
//! HTTP wire protocol and [`Client`] is the facade applications embed.
//!
//! Most applications only need the facade:
//!
//! ```no_run
//! use signalpost_client::{Client, Config};
//! use signalpost_core::Metadata;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new(Config::new("sp-live-...".to_owned()))?;
//! client.emit("signup", "user-1", Metadata::new()).await?;
//! client.close().await;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod transport;

pub use client::{Client, ClientError};
pub use config::{Config, DEFAULT_BASE_URL};
pub use transport::IngestClient;
