//! `POST /response` — browser worker posts the result of a tool invocation.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use chrono::Utc;

use crate::errors::AppError;
use crate::http::ip::client_ip;
use crate::http::respond;
use crate::rate_limit;
use crate::state::AppState;
use relay_protocol::{Accepted, ResponseEnvelope, StoredResponse};

pub async fn post_response(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Result<Json<ResponseEnvelope>, axum::extract::rejection::JsonRejection>,
) -> Result<Response, AppError> {
    let Json(envelope) = body?;

    relay_protocol::validate::validate_session_code(&envelope.code)
        .map_err(|_| AppError::InvalidSessionCode)?;
    relay_protocol::validate::validate_non_empty("id", &envelope.id)
        .map_err(|err| AppError::Validation(err.to_string()))?;

    let ip = client_ip(&headers, connect_info.as_ref());
    rate_limit::check_response(&state, &ip, &envelope.code).await?;

    if state.store.get_session(&envelope.code).await?.is_none() {
        return Err(AppError::SessionNotFound);
    }

    let stored = StoredResponse {
        code: envelope.code.clone(),
        id: envelope.id.clone(),
        result: envelope.result,
        posted_at: Utc::now().to_rfc3339(),
    };
    let payload = serde_json::to_string(&stored)
        .map_err(|err| AppError::Internal(format!("encoding stored response: {err}")))?;

    state
        .store
        .push_response(&envelope.code, &payload, state.config.queue_ttl_secs)
        .await?;

    Ok(respond::accepted(Accepted::stored(stored.id)))
}
