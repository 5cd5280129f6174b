//! HTTP transport speaking the ingest wire protocol.
//!
//! Handles request construction, response processing and error
//! categorization so the worker pool can decide what to retry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Serialize;
use signalpost_core::{ActionBatch, ConfigError, Identity, TaskError};
use signalpost_dispatch::RecordSink;
use tracing::debug;

/// User agent sent with every ingest request.
const USER_AGENT: &str = concat!("signalpost-rust/", env!("CARGO_PKG_VERSION"));

/// Response bodies longer than this are truncated in error messages.
const MAX_ERROR_BODY_LEN: usize = 512;

const ACTIONS_PATH: [&str; 2] = ["events", "send-actions"];
const IDENTIFY_PATH: [&str; 2] = ["users", "identify"];

/// HTTP client for the ingest API.
///
/// Holds a pooled connection to the ingest host and the resolved endpoint
/// URLs. Cloning shares the connection pool.
#[derive(Clone)]
pub struct IngestClient {
    http: reqwest::Client,
    actions_url: Url,
    identify_url: Url,
    api_key: String,
}

impl IngestClient {
    /// Creates a transport for the given ingest host.
    ///
    /// `base_url` may carry a path prefix; the endpoint paths are appended
    /// to it. The key is sent as the `X-API-Key` header on every request.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, ConfigError> {
        if api_key.is_empty() {
            return Err(ConfigError::Empty { name: "api_key" });
        }
        let base = Url::parse(base_url).map_err(|e| ConfigError::InvalidUrl {
            name: "base_url",
            reason: e.to_string(),
        })?;
        let actions_url = endpoint_url(&base, &ACTIONS_PATH)?;
        let identify_url = endpoint_url(&base, &IDENTIFY_PATH)?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ConfigError::HttpClient { message: e.to_string() })?;
        Ok(Self { http, actions_url, identify_url, api_key: api_key.to_owned() })
    }

    /// Posts an action batch to the send-actions endpoint.
    pub async fn send_actions(&self, batch: &ActionBatch) -> Result<(), TaskError> {
        debug!(batch_len = batch.len(), "sending action batch");
        self.post_json(&self.actions_url, batch).await
    }

    /// Posts an identity record to the identify endpoint.
    pub async fn send_identity(&self, identity: &Identity) -> Result<(), TaskError> {
        debug!(user_key = %identity.user_key, "sending identity record");
        self.post_json(&self.identify_url, identity).await
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &Url,
        payload: &T,
    ) -> Result<(), TaskError> {
        let response = self
            .http
            .post(url.clone())
            .header("X-API-Key", &self.api_key)
            .json(payload)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if status.is_success() {
            debug!(%url, status = status.as_u16(), "ingest request accepted");
            return Ok(());
        }

        let body = match response.text().await {
            Ok(body) => truncate_body(body),
            Err(e) => format!("failed to read response body: {e}"),
        };
        Err(TaskError::http(status.as_u16(), body))
    }
}

// The API key must never appear in logs or debug output.
impl std::fmt::Debug for IngestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestClient")
            .field("actions_url", &self.actions_url.as_str())
            .field("identify_url", &self.identify_url.as_str())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RecordSink for IngestClient {
    async fn send_batch(&self, batch: &ActionBatch) -> Result<(), TaskError> {
        self.send_actions(batch).await
    }

    async fn send_identity(&self, identity: &Identity) -> Result<(), TaskError> {
        IngestClient::send_identity(self, identity).await
    }
}

/// Appends endpoint segments to the base URL, keeping any path prefix.
fn endpoint_url(base: &Url, segments: &[&str]) -> Result<Url, ConfigError> {
    let mut url = base.clone();
    {
        let mut parts = url.path_segments_mut().map_err(|()| ConfigError::InvalidUrl {
            name: "base_url",
            reason: "URL cannot be a base".to_owned(),
        })?;
        parts.pop_if_empty().extend(segments);
    }
    Ok(url)
}

fn request_error(error: reqwest::Error) -> TaskError {
    if error.is_timeout() {
        TaskError::timeout(error.to_string())
    } else if error.is_connect() {
        TaskError::network(format!("connection failed: {error}"))
    } else {
        TaskError::network(error.to_string())
    }
}

fn truncate_body(body: String) -> String {
    if body.len() <= MAX_ERROR_BODY_LEN {
        return body;
    }
    let mut cut = MAX_ERROR_BODY_LEN;
    while !body.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}... (truncated)", &body[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_api_key() {
        let err = IngestClient::new("https://ingest.example.com", "", Duration::from_secs(5))
            .err()
            .expect("must reject");
        assert!(matches!(err, ConfigError::Empty { name: "api_key" }));
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let err = IngestClient::new("not a url", "key", Duration::from_secs(5))
            .err()
            .expect("must reject");
        assert!(matches!(err, ConfigError::InvalidUrl { name: "base_url", .. }));
    }

    #[test]
    fn endpoint_urls_append_to_bare_host() {
        let base = Url::parse("https://ingest.example.com").unwrap();
        let url = endpoint_url(&base, &ACTIONS_PATH).unwrap();
        assert_eq!(url.as_str(), "https://ingest.example.com/events/send-actions");
    }

    #[test]
    fn endpoint_urls_keep_path_prefix() {
        let base = Url::parse("https://example.com/ingest/v2").unwrap();
        let url = endpoint_url(&base, &IDENTIFY_PATH).unwrap();
        assert_eq!(url.as_str(), "https://example.com/ingest/v2/users/identify");
    }

    #[test]
    fn trailing_slash_does_not_double_up() {
        let base = Url::parse("https://example.com/ingest/").unwrap();
        let url = endpoint_url(&base, &ACTIONS_PATH).unwrap();
        assert_eq!(url.as_str(), "https://example.com/ingest/events/send-actions");
    }

    #[test]
    fn debug_output_hides_the_api_key() {
        let client =
            IngestClient::new("https://ingest.example.com", "sp-secret", Duration::from_secs(5))
                .unwrap();
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("sp-secret"));
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let body = "x".repeat(2000);
        let truncated = truncate_body(body);
        assert!(truncated.len() < 600);
        assert!(truncated.ends_with("... (truncated)"));
    }
}
