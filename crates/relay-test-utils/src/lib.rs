//! Shared test helpers for the relay service and browser worker.
//!
//! Both sides need to parse raw SSE bytes and build fixture envelopes, so
//! that lives here instead of being duplicated per test suite.

pub mod fixtures;
pub mod sse;

pub use sse::{parse_sse_events, SseEvent};
