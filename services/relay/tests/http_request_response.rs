use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use relay::state::{AppState, RelayConfig};
use relay_store::InMemoryStore;
use serde_json::{json, Value};
use tower::ServiceExt;

fn setup() -> axum::Router {
    let state = AppState::new(Arc::new(InMemoryStore::new()), RelayConfig::default());
    relay::build_router(state)
}

async fn post_json(app: axum::Router, path: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let val = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, val)
}

async fn get(app: axum::Router, path: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::GET)
        .uri(path)
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let val = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, val)
}

async fn create_session(app: axum::Router) -> String {
    let (status, body) = post_json(app, "/sessions", json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    body["code"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn request_then_response_round_trips_through_polling() {
    let app = setup();
    let code = create_session(app.clone()).await;

    let (status, body) = post_json(
        app.clone(),
        "/request",
        json!({"code": code, "id": "req-1", "tool": "echo", "args": {"text": "hi"}}),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "queued");

    let (status, _) = get(app.clone(), &format!("/response?code={code}&id=req-1")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = post_json(
        app.clone(),
        "/response",
        json!({"code": code, "id": "req-1", "result": {"content": [{"type": "text", "text": "hello"}]}}),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "stored");

    let (status, body) = get(app, &format!("/response?code={code}&id=req-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "req-1");
    assert_eq!(body["result"]["content"][0]["text"], "hello");
}

#[tokio::test]
async fn response_poll_is_non_destructive() {
    let app = setup();
    let code = create_session(app.clone()).await;

    post_json(
        app.clone(),
        "/response",
        json!({"code": code, "id": "req-1", "result": {"content": []}}),
    )
    .await;

    for _ in 0..3 {
        let (status, body) = get(app.clone(), &format!("/response?code={code}&id=req-1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "req-1");
    }
}

#[tokio::test]
async fn request_poll_is_non_destructive_and_leaves_the_stream_drain_intact() {
    let app = setup();
    let code = create_session(app.clone()).await;

    post_json(
        app.clone(),
        "/request",
        json!({"code": code, "id": "r1", "tool": "echo", "args": {"text": "hi"}}),
    )
    .await;

    let (status, body) = get(app.clone(), &format!("/request?code={code}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["requests"].as_array().unwrap().len(), 1);

    // Polling doesn't consume the queue; a later stream drain still sees it.
    let (status, body) = get(app, &format!("/request?code={code}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["requests"][0]["id"], "r1");
}

#[tokio::test]
async fn request_against_unknown_session_is_not_found() {
    let app = setup();
    let (status, body) = post_json(
        app,
        "/request",
        json!({"code": "ZZZZZZZZ", "id": "r1", "tool": "echo"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "session_not_found");
}

#[tokio::test]
async fn request_with_malformed_session_code_is_rejected() {
    let app = setup();
    let (status, body) = post_json(
        app,
        "/request",
        json!({"code": "nope", "id": "r1", "tool": "echo"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_session_code");
}

#[tokio::test]
async fn request_with_empty_tool_is_a_validation_error() {
    let app = setup();
    let code = create_session(app.clone()).await;
    let (status, body) = post_json(
        app,
        "/request",
        json!({"code": code, "id": "r1", "tool": ""}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn request_missing_code_field_is_a_validation_error_not_invalid_json() {
    let app = setup();
    let (status, body) = post_json(app, "/request", json!({"id": "r1", "tool": "echo"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn request_with_malformed_json_body_is_invalid_json() {
    let app = setup();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/request")
        .header("content-type", "application/json")
        .body(Body::from("{not valid json"))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "invalid_json");
}
