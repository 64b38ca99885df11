pub mod codes;
pub mod config;
pub mod errors;
pub mod http;
pub mod rate_limit;
pub mod state;

pub use state::AppState;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::errors::AppError;

/// Called by a route's `MethodRouter` when the incoming method isn't one of
/// the ones registered for that path, so a `DELETE /sessions` or
/// `PUT /request` gets the documented `{error, message}` envelope instead of
/// axum's default empty 405 body.
async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/sessions",
            post(http::sessions::create_session).fallback(method_not_allowed),
        )
        .route(
            "/request",
            post(http::requests::enqueue_request)
                .get(http::requests::poll_requests)
                .fallback(method_not_allowed),
        )
        .route(
            "/response",
            post(http::responses::post_response)
                .get(http::poll::poll_response)
                .fallback(method_not_allowed),
        )
        .route(
            "/stream",
            get(http::stream::open_stream).fallback(method_not_allowed),
        )
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

mod health {
    use axum::response::IntoResponse;
    pub async fn healthz() -> impl IntoResponse {
        "ok"
    }
    pub async fn readyz() -> impl IntoResponse {
        "ok"
    }
}
