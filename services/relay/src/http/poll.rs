//! `GET /response?code=..&id=..` — polling fallback for callers that can't
//! hold an SSE connection open. Reads are non-destructive: the same result
//! can be fetched repeatedly until the response queue's TTL expires.

use axum::extract::{Query, State};
use axum::response::Response;
use serde::Deserialize;

use crate::errors::AppError;
use crate::http::respond;
use crate::state::AppState;
use relay_protocol::StoredResponse;

#[derive(Debug, Deserialize)]
pub struct PollQuery {
    pub code: String,
    pub id: String,
}

pub async fn poll_response(
    State(state): State<AppState>,
    Query(query): Query<PollQuery>,
) -> Result<Response, AppError> {
    relay_protocol::validate::validate_session_code(&query.code)
        .map_err(|_| AppError::InvalidSessionCode)?;
    relay_protocol::validate::validate_non_empty("id", &query.id)
        .map_err(|err| AppError::Validation(err.to_string()))?;

    if state.store.get_session(&query.code).await?.is_none() {
        return Err(AppError::SessionNotFound);
    }

    let stored = state.store.list_responses(&query.code).await?;
    for payload in stored {
        let response: StoredResponse = match serde_json::from_str(&payload) {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(%err, "skipping malformed stored response");
                continue;
            }
        };
        if response.id == query.id {
            return Ok(respond::ok(response));
        }
    }

    Ok(respond::no_content())
}
