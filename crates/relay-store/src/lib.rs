//! Key-value access layer for the relay: sessions, per-session FIFOs, and
//! rate-limit counters, all with native TTL.
//!
//! The relay handlers only ever talk to the [`Store`] trait; [`RedisStore`]
//! is the production backend and [`memory::InMemoryStore`] backs unit and
//! integration tests without a running Redis.

pub mod memory;
pub mod redis_store;

pub use memory::InMemoryStore;
pub use redis_store::RedisStore;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backend error: {0}")]
    Backend(String),
}

/// A session record as persisted under `session:{code}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub code: String,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    pub ttl_secs: u64,
}

/// The KV primitives the relay needs: session existence with TTL, two
/// per-session FIFOs (request/response), and sliding rate-limit counters.
///
/// Every write that touches a queue refreshes that queue's TTL, matching the
/// "refreshed on append" invariant in the data model.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Creates `session:{code}` if absent. Returns `false` on collision
    /// (the caller should retry with a freshly generated code).
    async fn create_session(
        &self,
        code: &str,
        ttl_secs: u64,
        created_at: &str,
    ) -> Result<bool, StoreError>;

    /// Returns the session record, or `None` if it never existed or has
    /// expired.
    async fn get_session(&self, code: &str) -> Result<Option<SessionRecord>, StoreError>;

    /// Appends `payload` to the right of `req:{code}` and refreshes its TTL
    /// to `ttl_secs`.
    async fn push_request(
        &self,
        code: &str,
        payload: &str,
        ttl_secs: u64,
    ) -> Result<(), StoreError>;

    /// Atomically takes and empties the entire request queue for `code`.
    /// Uses a rename-and-drain sequence: the live list is renamed out of the
    /// way before being read and discarded, so a concurrent `push_request`
    /// lands in a fresh list rather than racing the read.
    async fn drain_requests(&self, code: &str) -> Result<Vec<String>, StoreError>;

    /// Returns every request currently queued for `code` without removing
    /// them. Used by the worker's polling fallback (§4.1 "Queue discipline");
    /// items remain available for a subsequent stream drain, so the worker
    /// is responsible for its own dedup by `id`.
    async fn list_requests(&self, code: &str) -> Result<Vec<String>, StoreError>;

    /// Appends `payload` to the right of `res:{code}` and refreshes its TTL
    /// to `ttl_secs`.
    async fn push_response(
        &self,
        code: &str,
        payload: &str,
        ttl_secs: u64,
    ) -> Result<(), StoreError>;

    /// Returns every response currently stored for `code`. Non-destructive:
    /// producers may poll the same `id` more than once.
    async fn list_responses(&self, code: &str) -> Result<Vec<String>, StoreError>;

    /// Atomically increments `ratelimit:{key}`. If this is the first
    /// increment of a fresh window, sets a `window_secs` TTL on the key.
    /// Returns the post-increment value.
    async fn incr_rate(&self, key: &str, window_secs: u64) -> Result<u64, StoreError>;
}
