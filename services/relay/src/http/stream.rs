//! `GET /stream?code=..` — the browser worker's primary transport: an SSE
//! connection that emits `connected` once, `tool-request` for each drained
//! request, `heartbeat` on a fixed interval, and `timeout` right before the
//! relay closes the connection at its absolute deadline.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::header::CACHE_CONTROL;
use axum::http::HeaderValue;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Deserialize;
use tokio::time::{interval, Instant, MissedTickBehavior};

use crate::errors::AppError;
use crate::state::AppState;
use relay_protocol::{ConnectedEvent, HeartbeatEvent, QueuedRequest, StreamErrorEvent, TimeoutEvent};

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    pub code: String,
}

pub async fn open_stream(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Result<Response, AppError> {
    relay_protocol::validate::validate_session_code(&query.code)
        .map_err(|_| AppError::InvalidSessionCode)?;

    if state.store.get_session(&query.code).await?.is_none() {
        return Err(AppError::SessionNotFound);
    }

    let sse = Sse::new(drain_stream(query.code, state)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(config_keep_alive_secs()))
            .text("keepalive"),
    );

    let mut response = sse.into_response();
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
        .headers_mut()
        .insert("x-accel-buffering", HeaderValue::from_static("no"));
    Ok(response)
}

fn drain_stream(
    code: String,
    state: AppState,
) -> impl futures_util::stream::Stream<Item = Result<Event, Infallible>> {
    let config = state.config.clone();
    let store = state.store.clone();

    async_stream::stream! {
        let connected = ConnectedEvent {
            code: code.clone(),
            timestamp: Utc::now().to_rfc3339(),
            message: "stream connected".to_owned(),
        };
        yield Ok(sse_json("connected", &connected));

        let deadline = Instant::now() + Duration::from_secs(config.stream_deadline_secs);
        let mut drain_tick = interval(Duration::from_secs(config.stream_drain_interval_secs));
        drain_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut heartbeat_tick = interval(Duration::from_secs(config.heartbeat_interval_secs));
        heartbeat_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if Instant::now() >= deadline {
                yield Ok(sse_json(
                    "timeout",
                    &TimeoutEvent {
                        reason: "stream reached its absolute deadline".to_owned(),
                    },
                ));
                break;
            }

            tokio::select! {
                _ = drain_tick.tick() => {
                    match store.drain_requests(&code).await {
                        Ok(drained) => {
                            for payload in drained {
                                match serde_json::from_str::<QueuedRequest>(&payload) {
                                    Ok(request) => yield Ok(sse_json("tool-request", &request)),
                                    Err(err) => {
                                        tracing::warn!(%err, "skipping malformed queued request");
                                    }
                                }
                            }
                        }
                        Err(err) => {
                            yield Ok(sse_json(
                                "error",
                                &StreamErrorEvent { message: err.to_string() },
                            ));
                        }
                    }
                }
                _ = heartbeat_tick.tick() => {
                    yield Ok(sse_json(
                        "heartbeat",
                        &HeartbeatEvent { timestamp: Utc::now().to_rfc3339() },
                    ));
                }
            }
        }
    }
}

fn config_keep_alive_secs() -> u64 {
    relay_protocol::HEARTBEAT_INTERVAL_SECS
}

fn sse_json<T: serde::Serialize>(event: &str, payload: &T) -> Event {
    match serde_json::to_string(payload) {
        Ok(json) => Event::default().event(event).data(json),
        Err(_) => Event::default().event("error").data("{\"message\":\"encoding failure\"}"),
    }
}
