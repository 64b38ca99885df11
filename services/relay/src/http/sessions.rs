//! `POST /sessions` — mint a fresh session code.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::response::Response;
use chrono::Utc;

use crate::errors::AppError;
use crate::http::ip::client_ip;
use crate::http::respond;
use crate::rate_limit;
use crate::state::AppState;
use crate::{codes, config};
use relay_protocol::SessionCreated;

const MAX_COLLISION_RETRIES: usize = 5;

pub async fn create_session(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let ip = client_ip(&headers, connect_info.as_ref());
    rate_limit::check_sessions(&state, &ip).await?;

    let mut rng = config::rng();
    let ttl = state.config.session_ttl_secs;
    let now = Utc::now();

    for attempt in 0..MAX_COLLISION_RETRIES {
        let code = codes::generate(&mut rng);
        let created = state
            .store
            .create_session(&code, ttl, &now.to_rfc3339())
            .await?;
        if created {
            let expires_at = now + chrono::Duration::seconds(ttl as i64);
            return Ok(respond::created(SessionCreated {
                code,
                ttl,
                expires_at: expires_at.to_rfc3339(),
            }));
        }
        tracing::warn!(attempt, "session code collision, retrying");
    }

    Err(AppError::Internal(
        "failed to allocate a unique session code".to_owned(),
    ))
}
