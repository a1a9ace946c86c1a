//! HTTP-level behavior of the streaming client against a mock backend.

use std::sync::Arc;

use jdgen_stream::prelude::*;
use jdgen_stream::{GENERATE_STREAM_PATH, StreamOpener as _};
use wiremock::matchers::{body_json_string, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sse_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/event-stream")
}

async fn server_with_body(body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_STREAM_PATH))
        .respond_with(sse_response(body))
        .mount(&server)
        .await;
    server
}

fn client_for(server: &MockServer) -> StreamClient {
    StreamClient::new(ClientConfig::new(server.uri())).expect("client")
}

#[tokio::test]
async fn full_stream_collects_content() {
    let server = server_with_body(concat!(
        "event: start\ndata: {\"request_id\":\"r1\"}\n\n",
        "event: delta\ndata: {\"text\":\"Hello\"}\n\n",
        "event: delta\ndata: {\"text\":\" world\"}\n\n",
        "event: end\ndata: {\"title\":\"T\"}\n\n",
    ))
    .await;

    let stream = client_for(&server)
        .open(&GenerateRequest::new("c01", "j01"))
        .await
        .expect("open");
    assert_eq!(stream.collect_text().await.expect("text"), "Hello world");
}

#[tokio::test]
async fn http_500_fails_fast_with_status_in_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_STREAM_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .open(&GenerateRequest::new("c01", "j01"))
        .await
        .expect_err("must fail");
    assert_eq!(err, StreamError::Http { status: 500 });
    assert_eq!(err.to_string(), "HTTP 500");
}

#[tokio::test]
async fn server_error_event_is_surfaced_as_failure() {
    let server = server_with_body(concat!(
        "event: start\ndata: {\"request_id\":\"r1\"}\n\n",
        "event: error\ndata: {\"message\":\"boom\"}\n\n",
    ))
    .await;

    let stream = client_for(&server)
        .open(&GenerateRequest::new("c01", "j01"))
        .await
        .expect("open");
    assert_eq!(
        stream.collect_text().await,
        Err(StreamFailure::Server {
            message: "boom".into()
        })
    );
}

#[tokio::test]
async fn malformed_event_does_not_abort_the_stream() {
    let server = server_with_body(concat!(
        "event: start\ndata: {\"request_id\":\"r1\"}\n\n",
        "event: delta\ndata: {broken json\n\n",
        "event: delta\ndata: {\"text\":\"still here\"}\n\n",
        "event: end\ndata: {}\n\n",
    ))
    .await;

    let stream = client_for(&server)
        .open(&GenerateRequest::new("c01", "j01"))
        .await
        .expect("open");
    assert_eq!(stream.collect_text().await.expect("text"), "still here");
}

#[tokio::test]
async fn truncated_stream_is_a_protocol_failure() {
    let server = server_with_body(concat!(
        "event: start\ndata: {\"request_id\":\"r1\"}\n\n",
        "event: delta\ndata: {\"text\":\"partial\"}\n\n",
    ))
    .await;

    let stream = client_for(&server)
        .open(&GenerateRequest::new("c01", "j01"))
        .await
        .expect("open");
    assert!(matches!(
        stream.collect_text().await,
        Err(StreamFailure::Protocol { .. })
    ));
}

#[tokio::test]
async fn request_body_is_sent_as_json() {
    let server = MockServer::start().await;
    let expected = serde_json::json!({"company_code": "c01", "job_code": "j01"}).to_string();
    Mock::given(method("POST"))
        .and(path(GENERATE_STREAM_PATH))
        .and(body_json_string(&expected))
        .respond_with(sse_response("event: end\ndata: {}\n\n"))
        .expect(1)
        .mount(&server)
        .await;

    let stream = client_for(&server)
        .open(&GenerateRequest::new("c01", "j01"))
        .await
        .expect("open");
    let _ = stream.collect_text().await;
}

#[tokio::test]
async fn lifecycle_runs_end_to_end_over_http() {
    let server = server_with_body(concat!(
        "event: start\ndata: {\"request_id\":\"r9\"}\n\n",
        "event: delta\ndata: {\"text\":\"draft\"}\n\n",
        "event: end\ndata: {\"title\":\"Backend Engineer\"}\n\n",
    ))
    .await;

    let client = Arc::new(client_for(&server));
    let generation = Generation::new(client, Arc::new(LogNotifier));
    generation.start(GenerateRequest::new("c01", "j01"));
    generation.join().await;

    let state = generation.snapshot();
    assert_eq!(state.phase, GenPhase::Done);
    assert_eq!(state.request_id, "r9");
    assert_eq!(state.content, "draft");
    assert_eq!(
        state.meta.get("title").and_then(serde_json::Value::as_str),
        Some("Backend Engineer")
    );
}
