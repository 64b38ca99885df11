use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use relay::state::{AppState, RelayConfig};
use relay_store::InMemoryStore;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn post_json(app: axum::Router, path: &str, body: Value) -> StatusCode {
    let req = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    app.oneshot(req).await.unwrap().status()
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
async fn request_rate_limit_is_scoped_per_session_code() {
    let mut config = RelayConfig::default();
    config.request_cap = 1;
    let state = AppState::new(Arc::new(InMemoryStore::new()), config);
    let app = relay::build_router(state);

    let code_a = create_session(app.clone()).await;
    let code_b = create_session(app.clone()).await;

    assert_eq!(
        post_json(
            app.clone(),
            "/request",
            json!({"code": code_a, "id": "1", "tool": "echo"})
        )
        .await,
        StatusCode::ACCEPTED
    );
    assert_eq!(
        post_json(
            app.clone(),
            "/request",
            json!({"code": code_a, "id": "2", "tool": "echo"})
        )
        .await,
        StatusCode::TOO_MANY_REQUESTS
    );
    // A different session code is an independent rate-limit scope.
    assert_eq!(
        post_json(
            app,
            "/request",
            json!({"code": code_b, "id": "1", "tool": "echo"})
        )
        .await,
        StatusCode::ACCEPTED
    );
}

#[tokio::test]
async fn response_rate_limit_trips_independently_of_request_rate_limit() {
    let mut config = RelayConfig::default();
    config.request_cap = 1;
    config.response_cap = 1;
    let state = AppState::new(Arc::new(InMemoryStore::new()), config);
    let app = relay::build_router(state);

    let code = create_session(app.clone()).await;

    assert_eq!(
        post_json(
            app.clone(),
            "/request",
            json!({"code": code, "id": "1", "tool": "echo"})
        )
        .await,
        StatusCode::ACCEPTED
    );

    assert_eq!(
        post_json(
            app.clone(),
            "/response",
            json!({"code": code, "id": "1", "result": {"content": []}})
        )
        .await,
        StatusCode::ACCEPTED
    );
    assert_eq!(
        post_json(
            app,
            "/response",
            json!({"code": code, "id": "2", "result": {"content": []}})
        )
        .await,
        StatusCode::TOO_MANY_REQUESTS
    );
}
