//! Integration tests for the ingest transport against a mock server.
//!
//! Covers the wire contract (paths, headers, payloads), error
//! categorization, and the full dispatcher-to-transport retry path.

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use serde_json::json;
use signalpost_client::IngestClient;
use signalpost_core::{Action, ActionBatch, Identity, Metadata, TaskError};
use signalpost_dispatch::{DispatchConfig, Dispatcher, PoolConfig, RetryPolicy, WorkerPool};
use signalpost_testing::{init_tracing, RecordingHooks};
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn transport(server: &MockServer) -> Result<IngestClient> {
    Ok(IngestClient::new(&server.uri(), "test-key", Duration::from_secs(5))?)
}

#[tokio::test]
async fn action_batch_is_posted_with_key_and_agent_headers() -> Result<()> {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/events/send-actions"))
        .and(header("X-API-Key", "test-key"))
        .and(header("content-type", "application/json"))
        .and(header("user-agent", concat!("signalpost-rust/", env!("CARGO_PKG_VERSION"))))
        .and(body_partial_json(json!({
            "actions": [{
                "key": "signup",
                "user_key": "user-1",
                "is_anonymous_user": false,
            }]
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let batch = ActionBatch::new(vec![Action::new("signup", "user-1", Metadata::new())]);
    transport(&server)?.send_actions(&batch).await?;

    server.verify().await;
    Ok(())
}

#[tokio::test]
async fn identity_is_posted_to_the_identify_endpoint() -> Result<()> {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/identify"))
        .and(header("X-API-Key", "test-key"))
        .and(body_partial_json(json!({
            "user_key": "user-1",
            "metadata": { "plan": "pro" },
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let metadata = Metadata::from([("plan".to_owned(), json!("pro"))]);
    transport(&server)?.send_identity(&Identity::new("user-1", metadata)).await?;

    server.verify().await;
    Ok(())
}

#[tokio::test]
async fn base_url_path_prefix_is_preserved() -> Result<()> {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ingest/v2/events/send-actions"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let base = format!("{}/ingest/v2", server.uri());
    let client = IngestClient::new(&base, "test-key", Duration::from_secs(5))?;
    let batch = ActionBatch::new(vec![Action::new("signup", "user-1", Metadata::new())]);
    client.send_actions(&batch).await?;

    server.verify().await;
    Ok(())
}

#[tokio::test]
async fn server_error_carries_status_and_body() -> Result<()> {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("ingest overloaded"))
        .mount(&server)
        .await;

    let batch = ActionBatch::new(vec![Action::new("signup", "user-1", Metadata::new())]);
    let err = transport(&server)?.send_actions(&batch).await.err().expect("must fail");

    match err {
        TaskError::Http { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "ingest overloaded");
        }
        other => panic!("expected http error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn unreachable_host_maps_to_a_network_error() -> Result<()> {
    init_tracing();
    // Bind a port, then free it again, so connecting is refused.
    // (A pooled wiremock server keeps its port listening after drop, so a
    // plain std listener is bound and dropped instead.)
    let dead_uri = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        format!("http://{}", listener.local_addr()?)
    };

    let client = IngestClient::new(&dead_uri, "test-key", Duration::from_secs(5))?;
    let identity = Identity::new("user-1", Metadata::new());
    let err = client.send_identity(&identity).await.err().expect("must fail");
    assert!(matches!(err, TaskError::Network { .. }), "got {err:?}");
    Ok(())
}

#[tokio::test]
async fn slow_response_maps_to_a_timeout_error() -> Result<()> {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let client = IngestClient::new(&server.uri(), "test-key", Duration::from_millis(200))?;
    let batch = ActionBatch::new(vec![Action::new("signup", "user-1", Metadata::new())]);
    let err = client.send_actions(&batch).await.err().expect("must fail");
    assert!(matches!(err, TaskError::Timeout { .. }), "got {err:?}");
    Ok(())
}

#[tokio::test]
async fn failed_deliveries_are_retried_until_the_server_recovers() -> Result<()> {
    init_tracing();
    let server = MockServer::start().await;
    // The first two attempts hit a failing server, the third lands.
    Mock::given(method("POST"))
        .and(path("/events/send-actions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/events/send-actions"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let hooks = Arc::new(RecordingHooks::new());
    let pool = WorkerPool::with_hooks(
        PoolConfig {
            worker_count: 1,
            queue_capacity: 8,
            retry: RetryPolicy::new(2, Duration::from_millis(20)),
        },
        Arc::clone(&hooks) as _,
    )?;
    let dispatcher = Dispatcher::new(
        DispatchConfig { batch_size: 1, flush_interval: Duration::from_secs(60) },
        pool,
        Arc::new(transport(&server)?),
    )?;

    dispatcher.submit_action(Action::new("signup", "user-1", Metadata::new())).await?;
    hooks.wait_for_successes(1).await;
    dispatcher.shutdown().await;

    assert_eq!(hooks.failure_count(), 2);
    assert_eq!(hooks.success_count(), 1);
    server.verify().await;
    Ok(())
}
