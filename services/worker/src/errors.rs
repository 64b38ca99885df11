//! Worker error taxonomy (`Transient`, `Permanent`, `Degraded`, `Critical`).
//!
//! Every fallible boundary in the worker (stream read, poll fetch, tool
//! invocation, response post) classifies its failure into one of these four
//! categories before handing it to the Supervisor; the category, not the
//! originating subsystem, decides the recovery policy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    /// Network timeout, 5xx, or an abrupt stream close. Retried with backoff.
    #[error("transient error: {0}")]
    Transient(String),

    /// 4xx other than 429, a schema mismatch, or an unknown tool. Surfaced,
    /// never retried.
    #[error("permanent error: {0}")]
    Permanent(String),

    /// Heartbeat loss or an elevated 5xx rate. Triggers a channel failover
    /// rather than a hard stop.
    #[error("degraded: {0}")]
    Degraded(String),

    /// Repeated panics or a contract violation. The worker stops and an
    /// operator must restart it.
    #[error("critical: {0}")]
    Critical(String),
}

impl WorkerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            WorkerError::Transient(_) => ErrorCategory::Transient,
            WorkerError::Permanent(_) => ErrorCategory::Permanent,
            WorkerError::Degraded(_) => ErrorCategory::Degraded,
            WorkerError::Critical(_) => ErrorCategory::Critical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Transient,
    Permanent,
    Degraded,
    Critical,
}

/// Classifies a transport-layer outcome from the Subscriber or Poster.
/// `status` is `None` for connection-level failures (no response received).
pub fn classify_http(status: Option<u16>, transport_err: bool) -> WorkerError {
    match status {
        Some(429) => WorkerError::Transient("rate limited (429)".to_owned()),
        Some(s) if (500..600).contains(&s) => WorkerError::Transient(format!("server error {s}")),
        Some(s) if (400..500).contains(&s) => WorkerError::Permanent(format!("client error {s}")),
        Some(s) => WorkerError::Permanent(format!("unexpected status {s}")),
        None if transport_err => WorkerError::Transient("transport error".to_owned()),
        None => WorkerError::Transient("connection closed".to_owned()),
    }
}

/// Errors produced by a `Tool::validate_args`/`Tool::invoke` implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("tool not found: {0}")]
    NotFound(String),

    #[error("invalid args: {0}")]
    InvalidArgs(String),

    #[error("execution error: {0}")]
    ExecutionError(String),

    #[error("execution timed out")]
    Timeout,
}

impl ToolError {
    /// The error kind string embedded in the response text, per §4.2.2.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::NotFound(_) => "tool_not_found",
            ToolError::InvalidArgs(_) => "invalid_args",
            ToolError::ExecutionError(_) => "execution_error",
            ToolError::Timeout => "execution_error",
        }
    }
}
