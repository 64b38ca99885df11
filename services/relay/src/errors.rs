//! Error taxonomy for relay HTTP handlers, per the validation policy: each
//! variant maps to exactly one status code and `error` discriminator.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use relay_protocol::HttpErrorEnvelope;

#[derive(Debug)]
pub enum AppError {
    InvalidSessionCode,
    InvalidJson(String),
    Validation(String),
    SessionNotFound,
    RateLimited { code: &'static str },
    MethodNotAllowed,
    Internal(String),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String, Option<&'static str>) {
        match self {
            AppError::InvalidSessionCode => (
                StatusCode::BAD_REQUEST,
                "invalid_session_code",
                "session code must match ^[A-Z2-7]{8}$".to_owned(),
                None,
            ),
            AppError::InvalidJson(reason) => {
                (StatusCode::BAD_REQUEST, "invalid_json", reason.clone(), None)
            }
            AppError::Validation(reason) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                reason.clone(),
                None,
            ),
            AppError::SessionNotFound => (
                StatusCode::NOT_FOUND,
                "session_not_found",
                "no session exists for this code".to_owned(),
                None,
            ),
            AppError::RateLimited { code } => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limit_exceeded",
                "rate limit exceeded".to_owned(),
                Some(code),
            ),
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "method_not_allowed",
                "method not allowed on this route".to_owned(),
                None,
            ),
            AppError::Internal(reason) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_server_error",
                reason.clone(),
                None,
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message, code) = self.parts();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(%message, "internal_server_error");
        } else if matches!(self, AppError::RateLimited { .. }) {
            tracing::debug!(?code, "rate limit exceeded");
        }
        (
            status,
            Json(HttpErrorEnvelope {
                error: error.to_owned(),
                message,
                code: code.map(str::to_owned),
            }),
        )
            .into_response()
    }
}

impl From<relay_store::StoreError> for AppError {
    fn from(err: relay_store::StoreError) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Distinguishes a malformed request body (`invalid_json`) from a
/// well-formed body that's missing a required field or has the wrong
/// shape (`validation_error`) — axum's `JsonRejection` already tells the
/// two apart, so the request handlers don't have to.
impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        use axum::extract::rejection::JsonRejection;
        match rejection {
            JsonRejection::JsonDataError(err) => AppError::Validation(err.body_text()),
            other => AppError::InvalidJson(other.body_text()),
        }
    }
}
