//! `POST /request` — caller enqueues a tool invocation for the browser
//! worker attached to a session. `GET /request` is the polling fallback a
//! worker uses in place of `/stream` (§4.1 "Queue discipline").

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::errors::AppError;
use crate::http::ip::client_ip;
use crate::http::respond;
use crate::rate_limit;
use crate::state::AppState;
use relay_protocol::{Accepted, QueuedRequest, RequestEnvelope};

pub async fn enqueue_request(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Result<Json<RequestEnvelope>, axum::extract::rejection::JsonRejection>,
) -> Result<Response, AppError> {
    let Json(envelope) = body?;

    relay_protocol::validate::validate_session_code(&envelope.code)
        .map_err(|_| AppError::InvalidSessionCode)?;
    relay_protocol::validate::validate_non_empty("id", &envelope.id)
        .map_err(|err| AppError::Validation(err.to_string()))?;
    relay_protocol::validate::validate_non_empty("tool", &envelope.tool)
        .map_err(|err| AppError::Validation(err.to_string()))?;

    let ip = client_ip(&headers, connect_info.as_ref());
    rate_limit::check_request(&state, &ip, &envelope.code).await?;

    if state.store.get_session(&envelope.code).await?.is_none() {
        return Err(AppError::SessionNotFound);
    }

    let queued = QueuedRequest {
        code: envelope.code.clone(),
        id: envelope.id.clone(),
        tool: envelope.tool,
        args: envelope.args,
        enqueued_at: Utc::now().to_rfc3339(),
    };
    let payload = serde_json::to_string(&queued)
        .map_err(|err| AppError::Internal(format!("encoding queued request: {err}")))?;

    state
        .store
        .push_request(&envelope.code, &payload, state.config.queue_ttl_secs)
        .await?;

    Ok(respond::accepted(Accepted::queued(queued.id)))
}

#[derive(Debug, Deserialize)]
pub struct RequestPollQuery {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct QueuedRequests {
    pub requests: Vec<QueuedRequest>,
}

/// Non-destructive peek of the request queue, polled at ~1 Hz by a worker
/// that has fallen back off `/stream`. Items are left in place so a later
/// stream reconnect still drains them; the worker is responsible for
/// deduplicating by `id` across both channels.
pub async fn poll_requests(
    State(state): State<AppState>,
    Query(query): Query<RequestPollQuery>,
) -> Result<Response, AppError> {
    relay_protocol::validate::validate_session_code(&query.code)
        .map_err(|_| AppError::InvalidSessionCode)?;

    if state.store.get_session(&query.code).await?.is_none() {
        return Err(AppError::SessionNotFound);
    }

    let stored = state.store.list_requests(&query.code).await?;
    let mut requests = Vec::with_capacity(stored.len());
    for payload in stored {
        match serde_json::from_str::<QueuedRequest>(&payload) {
            Ok(request) => requests.push(request),
            Err(err) => tracing::warn!(%err, "skipping malformed queued request"),
        }
    }

    Ok(respond::ok(QueuedRequests { requests }))
}
