//! End-to-end tests driving the public facade against a mock ingest API.
//!
//! Exercises the full path: facade, dispatcher batching, worker pool and
//! the HTTP transport, with delivery outcomes observed through hooks.

use std::sync::Arc;

use anyhow::Result;
use chrono::{TimeZone, Utc};
use serde_json::json;
use signalpost::{Client, ClientError, Config, Metadata, SubmitError};
use signalpost_testing::{init_tracing, RecordingHooks};
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn config(server: &MockServer) -> Config {
    let mut config = Config::new("e2e-key");
    config.base_url = server.uri();
    config.flush_interval_seconds = 60;
    config
}

#[tokio::test]
async fn actions_are_batched_and_flushed_through_the_facade() -> Result<()> {
    init_tracing();
    let server = MockServer::start().await;
    // Five actions with a threshold of two: two size flushes plus the
    // final flush at close.
    Mock::given(method("POST"))
        .and(path("/events/send-actions"))
        .and(header("X-API-Key", "e2e-key"))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/identify"))
        .and(header("X-API-Key", "e2e-key"))
        .and(body_partial_json(json!({"user_key": "user-3", "metadata": {"plan": "pro"}})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config(&server);
    config.batch_size = 2;
    config.worker_count = 2;

    let hooks = Arc::new(RecordingHooks::new());
    let client = Client::with_hooks(config, Arc::clone(&hooks) as _)?;

    for n in 0..5 {
        client.emit("page-view", format!("user-{n}"), Metadata::new()).await?;
    }
    let metadata = Metadata::from([("plan".to_owned(), json!("pro"))]);
    client.identify("user-3", metadata).await?;
    client.close().await;

    // Close drains everything, so the counts are final.
    assert_eq!(hooks.success_count(), 4);
    assert_eq!(hooks.failure_count(), 0);
    server.verify().await;
    Ok(())
}

#[tokio::test]
async fn emitted_payloads_match_the_wire_contract() -> Result<()> {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/events/send-actions"))
        .and(body_partial_json(json!({
            "actions": [{
                "key": "purchase",
                "user_key": "user-1",
                "is_anonymous_user": false,
                "timestamp": "2026-03-14T09:26:53Z",
                "metadata": {"amount": 42},
            }]
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/events/send-actions"))
        .and(body_partial_json(json!({
            "actions": [{
                "key": "page-view",
                "user_key": "visitor-9",
                "is_anonymous_user": true,
            }]
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config(&server);
    config.batch_size = 1;
    let client = Client::new(config)?;

    let happened_at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
    let metadata = Metadata::from([("amount".to_owned(), json!(42))]);
    client.emit_at("purchase", "user-1", happened_at, metadata).await?;
    client.emit_anonymous("page-view", "visitor-9", Metadata::new()).await?;
    client.close().await;

    server.verify().await;
    Ok(())
}

#[tokio::test]
async fn close_flushes_pending_records_and_rejects_later_ones() -> Result<()> {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/events/send-actions"))
        .and(body_partial_json(json!({"actions": [{"key": "signup"}]})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(config(&server))?;

    // Far below the default threshold, so only close can flush it.
    client.emit("signup", "user-1", Metadata::new()).await?;
    client.close().await;
    client.close().await;

    let late = client.emit("late", "user-1", Metadata::new()).await;
    assert_eq!(late, Err(ClientError::Submit(SubmitError::ShuttingDown)));
    server.verify().await;
    Ok(())
}
