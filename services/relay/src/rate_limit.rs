//! Sliding-window rate limiting on top of [`relay_store::Store::incr_rate`].
//!
//! Each endpoint class owns an independent counter keyed by scope (IP, or
//! IP+code), so exhausting one class never affects another.

use crate::errors::AppError;
use crate::state::AppState;
use relay_protocol::rate_limit_codes;

pub async fn check(
    state: &AppState,
    endpoint: &str,
    scope: &str,
    cap: u64,
    response_code: &'static str,
) -> Result<(), AppError> {
    let key = format!("{endpoint}:{scope}");
    let value = state
        .store
        .incr_rate(&key, state.config.rate_limit_window_secs)
        .await?;
    if value > cap {
        return Err(AppError::RateLimited {
            code: response_code,
        });
    }
    Ok(())
}

pub async fn check_sessions(state: &AppState, ip: &str) -> Result<(), AppError> {
    check(
        state,
        "sessions",
        ip,
        state.config.sessions_cap,
        rate_limit_codes::SESSION,
    )
    .await
}

pub async fn check_request(state: &AppState, ip: &str, code: &str) -> Result<(), AppError> {
    check(
        state,
        "request",
        &format!("{ip}:{code}"),
        state.config.request_cap,
        rate_limit_codes::REQUEST,
    )
    .await
}

pub async fn check_response(state: &AppState, ip: &str, code: &str) -> Result<(), AppError> {
    check(
        state,
        "response",
        &format!("{ip}:{code}"),
        state.config.response_cap,
        rate_limit_codes::RESPONSE,
    )
    .await
}
