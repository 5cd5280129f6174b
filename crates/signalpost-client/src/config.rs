//! Layered SDK configuration.
//!
//! Configuration is loaded in priority order:
//! 1. Environment variables prefixed `SIGNALPOST_` (highest priority)
//! 2. Configuration file (`signalpost.toml`)
//! 3. Built-in defaults (lowest priority)
//!
//! Only the API key has no usable default; everything else works
//! out-of-the-box.

use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use signalpost_core::ConfigError;
use signalpost_dispatch::{
    DispatchConfig, PoolConfig, RetryPolicy, DEFAULT_BACKOFF_UNIT, DEFAULT_BATCH_SIZE,
    DEFAULT_FLUSH_INTERVAL, DEFAULT_MAX_RETRIES, DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKER_COUNT,
    MIN_FLUSH_INTERVAL,
};

/// Ingest host used when no other base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://ingest.signalpost.dev";

const CONFIG_FILE: &str = "signalpost.toml";

/// Complete SDK configuration with defaults, file and environment
/// overrides.
///
/// Build one with [`Config::new`] when the API key is the only setting, or
/// with [`Config::load`] to honor `signalpost.toml` and `SIGNALPOST_*`
/// environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API key identifying the environment. Must not be empty.
    ///
    /// Environment variable: `SIGNALPOST_API_KEY`
    #[serde(default)]
    pub api_key: String,

    /// Base URL of the ingest API. May carry a path prefix.
    ///
    /// Environment variable: `SIGNALPOST_BASE_URL`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Number of concurrent delivery workers.
    ///
    /// Environment variable: `SIGNALPOST_WORKER_COUNT`
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Capacity of the delivery queue; a full queue suspends submitters.
    ///
    /// Environment variable: `SIGNALPOST_QUEUE_CAPACITY`
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Retries after the first failed delivery attempt.
    ///
    /// Environment variable: `SIGNALPOST_MAX_RETRIES`
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff unit in seconds; the delay grows linearly per attempt.
    ///
    /// Environment variable: `SIGNALPOST_BACKOFF_SECONDS`
    #[serde(default = "default_backoff_seconds")]
    pub backoff_seconds: u64,

    /// Number of pending actions that triggers a flush.
    ///
    /// Environment variable: `SIGNALPOST_BATCH_SIZE`
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Longest time in seconds an action may stay pending. At least 5.
    ///
    /// Environment variable: `SIGNALPOST_FLUSH_INTERVAL_SECONDS`
    #[serde(default = "default_flush_interval_seconds")]
    pub flush_interval_seconds: u64,

    /// Timeout in seconds for a single ingest request.
    ///
    /// Environment variable: `SIGNALPOST_REQUEST_TIMEOUT_SECONDS`
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

impl Config {
    /// Creates a configuration with the given API key and defaults for
    /// everything else.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { api_key: api_key.into(), ..Self::default() }
    }

    /// Loads configuration from defaults, `signalpost.toml` and
    /// `SIGNALPOST_*` environment variables, then validates it.
    pub fn load() -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed("SIGNALPOST_"));

        let config: Self = figment
            .extract()
            .map_err(|e| ConfigError::Load { message: e.to_string() })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every documented bound, naming the offending parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.is_empty() {
            return Err(ConfigError::Empty { name: "api_key" });
        }
        if let Err(e) = Url::parse(&self.base_url) {
            return Err(ConfigError::InvalidUrl { name: "base_url", reason: e.to_string() });
        }
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
        if self.backoff_seconds < 1 {
            return Err(ConfigError::ZeroDuration { name: "backoff_seconds" });
        }
        if self.batch_size < 1 {
            return Err(ConfigError::BelowMinimum {
                name: "batch_size",
                min: 1,
                got: self.batch_size as u64,
            });
        }
        if Duration::from_secs(self.flush_interval_seconds) < MIN_FLUSH_INTERVAL {
            return Err(ConfigError::DurationBelowMinimum {
                name: "flush_interval_seconds",
                min: MIN_FLUSH_INTERVAL,
                got: Duration::from_secs(self.flush_interval_seconds),
            });
        }
        if self.request_timeout_seconds < 1 {
            return Err(ConfigError::ZeroDuration { name: "request_timeout_seconds" });
        }
        Ok(())
    }

    /// Worker pool settings derived from this configuration.
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            worker_count: self.worker_count,
            queue_capacity: self.queue_capacity,
            retry: RetryPolicy::new(
                self.max_retries,
                Duration::from_secs(self.backoff_seconds),
            ),
        }
    }

    /// Dispatcher settings derived from this configuration.
    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            batch_size: self.batch_size,
            flush_interval: Duration::from_secs(self.flush_interval_seconds),
        }
    }

    /// Per-request timeout as a duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            worker_count: default_worker_count(),
            queue_capacity: default_queue_capacity(),
            max_retries: default_max_retries(),
            backoff_seconds: default_backoff_seconds(),
            batch_size: default_batch_size(),
            flush_interval_seconds: default_flush_interval_seconds(),
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

fn default_worker_count() -> usize {
    DEFAULT_WORKER_COUNT
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_backoff_seconds() -> u64 {
    DEFAULT_BACKOFF_UNIT.as_secs()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_flush_interval_seconds() -> u64 {
    DEFAULT_FLUSH_INTERVAL.as_secs()
}

fn default_request_timeout_seconds() -> u64 {
    30
}
