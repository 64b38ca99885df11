// relay-protocol: wire types and validators shared by the relay service and
// the browser worker.
//
// Every JSON shape that crosses the relay's HTTP surface is defined here so
// both sides serialize/deserialize against the same schema. Unknown fields
// are ignored on decode to keep forward compatibility with newer clients.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub mod validate;

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Default session TTL, in seconds, applied when a session is created.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 3600;

/// TTL applied to the request and response queues. Independent of the
/// session TTL even though both currently default to the same value.
pub const QUEUE_TTL_SECS: u64 = 3600;

/// Absolute lifetime of one `/stream` connection before the relay closes it.
pub const STREAM_DEADLINE_SECS: u64 = 600;

/// Interval between `heartbeat` events on an open stream.
pub const HEARTBEAT_INTERVAL_SECS: u64 = 30;

/// Interval between drain sweeps of the request queue on an open stream.
pub const STREAM_DRAIN_INTERVAL_SECS: u64 = 1;

/// Response body for `POST /sessions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCreated {
    pub code: String,
    pub ttl: u64,
    /// RFC 3339 timestamp; `createdAt + ttl`.
    pub expires_at: String,
}

// ---------------------------------------------------------------------------
// Request / Response envelopes
// ---------------------------------------------------------------------------

/// Request body for `POST /request`.
///
/// `args` is optional on the wire; an absent value decodes to an empty map
/// so handlers never need to special-case it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub code: String,
    /// Opaque, caller-chosen correlation id. The relay does not enforce
    /// uniqueness; the worker must deduplicate by this value.
    pub id: String,
    pub tool: String,
    #[serde(default)]
    pub args: BTreeMap<String, serde_json::Value>,
}

/// `RequestEnvelope` plus the server-assigned enqueue timestamp, as stored
/// in the request queue and emitted on `tool-request` stream events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedRequest {
    pub code: String,
    pub id: String,
    pub tool: String,
    #[serde(default)]
    pub args: BTreeMap<String, serde_json::Value>,
    pub enqueued_at: String,
}

/// One item of a response's content bundle. The wire shape only ever
/// carries `{type: "text", text: ...}`; other `type` values are accepted on
/// decode (forward compatibility) and simply ignored by the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl ContentItem {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_owned(),
            text: text.into(),
        }
    }
}

/// The `result` field of `POST /response`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResultBundle {
    pub content: Vec<ContentItem>,
}

impl ResultBundle {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem::text(text)],
        }
    }
}

/// Request body for `POST /response`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub code: String,
    /// Echoes the `id` of the `RequestEnvelope` this responds to.
    pub id: String,
    pub result: ResultBundle,
}

/// `ResponseEnvelope` plus the server-assigned post timestamp, as stored in
/// the response queue and returned by `GET /response`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResponse {
    pub code: String,
    pub id: String,
    pub result: ResultBundle,
    pub posted_at: String,
}

/// Response for `POST /request` and `POST /response`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accepted {
    pub id: String,
    pub status: String,
}

impl Accepted {
    pub fn queued(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: "queued".to_owned(),
        }
    }

    pub fn stored(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: "stored".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// SSE event payloads
// ---------------------------------------------------------------------------

/// Payload of the `connected` event, sent once right after a stream opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedEvent {
    pub code: String,
    pub timestamp: String,
    pub message: String,
}

/// Payload of the `heartbeat` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatEvent {
    pub timestamp: String,
}

/// Payload of the `timeout` event, emitted right before the relay closes a
/// stream that reached its absolute deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutEvent {
    pub reason: String,
}

/// Payload of the `error` event, used for per-tick drain problems that
/// aren't fatal to the stream itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamErrorEvent {
    pub message: String,
}

// ---------------------------------------------------------------------------
// HTTP error envelope
// ---------------------------------------------------------------------------

/// Frozen error body shape used by every non-2xx relay response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpErrorEnvelope {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Machine-readable discriminators for `429 rate_limit_exceeded` bodies.
/// Named per endpoint class so a client can distinguish which limit tripped.
pub mod rate_limit_codes {
    pub const SESSION: &str = "SESSION_RATE_LIMIT";
    pub const REQUEST: &str = "REQUEST_RATE_LIMIT";
    pub const RESPONSE: &str = "RESPONSE_RATE_LIMIT";
}
