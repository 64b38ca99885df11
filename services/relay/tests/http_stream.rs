use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request};
use http_body_util::BodyExt;
use relay::state::{AppState, RelayConfig};
use relay_store::InMemoryStore;
use relay_test_utils::parse_sse_events;
use serde_json::{json, Value};
use tower::ServiceExt;

fn fast_drain_config() -> RelayConfig {
    let mut config = RelayConfig::default();
    config.stream_drain_interval_secs = 1;
    config.heartbeat_interval_secs = 60;
    config.stream_deadline_secs = 600;
    config
}

async fn post_json(app: axum::Router, path: &str, body: Value) {
    let req = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    let status = app.oneshot(req).await.unwrap().status();
    assert!(status.is_success());
}

async fn create_session(app: axum::Router) -> String {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/sessions")
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let bytes = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    body["code"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn stream_emits_connected_then_drained_request() {
    let state = AppState::new(Arc::new(InMemoryStore::new()), fast_drain_config());
    let app = relay::build_router(state);

    let code = create_session(app.clone()).await;
    post_json(
        app.clone(),
        "/request",
        json!({"code": code, "id": "r1", "tool": "echo"}),
    )
    .await;

    let req = Request::builder()
        .method(Method::GET)
        .uri(format!("/stream?code={code}"))
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let mut body = resp.into_body();

    let mut collected = String::new();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if tokio::time::Instant::now() >= deadline {
            break;
        }
        match tokio::time::timeout(Duration::from_millis(500), body.frame()).await {
            Ok(Some(Ok(frame))) => {
                if let Some(chunk) = frame.data_ref() {
                    collected.push_str(&String::from_utf8_lossy(chunk));
                }
                if collected.contains("tool-request") {
                    break;
                }
            }
            Ok(Some(Err(_))) | Ok(None) => break,
            Err(_) => continue,
        }
    }

    let events = parse_sse_events(&collected);
    assert!(events.iter().any(|e| e.event == "connected"));
    let tool_request = events
        .iter()
        .find(|e| e.event == "tool-request")
        .expect("expected a tool-request event");
    assert!(tool_request.data.contains("\"id\":\"r1\""));
}
