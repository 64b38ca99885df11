//! In-process [`Store`] implementation for tests and local development.
//!
//! Mirrors Redis TTL semantics with `Instant`-based expiry checked lazily on
//! access — no background sweeper. Good enough for unit tests and the
//! integration suite; never intended for production (the relay is meant to
//! be stateless between requests, which this type violates by design).
//!
//! Uses `tokio::time::Instant` rather than `std::time::Instant` so the
//! crate's own unit tests can exercise TTL expiry with `tokio::time::pause`
//! + `advance` instead of sleeping in real time; `std::time::Instant::now()`
//! is not affected by the paused test clock and would leave every `is_live`
//! check true regardless of how far a paused test advances it.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::{SessionRecord, Store, StoreError};

struct Expiring<T> {
    value: T,
    expires_at: Instant,
}

impl<T> Expiring<T> {
    fn new(value: T, ttl_secs: u64) -> Self {
        Self {
            value,
            expires_at: Instant::now() + Duration::from_secs(ttl_secs),
        }
    }

    fn is_live(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

#[derive(Default)]
struct Inner {
    sessions: HashMap<String, Expiring<SessionRecord>>,
    requests: HashMap<String, Expiring<VecDeque<String>>>,
    responses: HashMap<String, Expiring<Vec<String>>>,
    rates: HashMap<String, Expiring<u64>>,
}

/// Thread-safe, TTL-aware, entirely in-memory store.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn create_session(
        &self,
        code: &str,
        ttl_secs: u64,
        created_at: &str,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(existing) = inner.sessions.get(code) {
            if existing.is_live() {
                return Ok(false);
            }
        }
        let record = SessionRecord {
            code: code.to_owned(),
            created_at: created_at.to_owned(),
            ttl_secs,
        };
        inner
            .sessions
            .insert(code.to_owned(), Expiring::new(record, ttl_secs));
        Ok(true)
    }

    async fn get_session(&self, code: &str) -> Result<Option<SessionRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .sessions
            .get(code)
            .filter(|e| e.is_live())
            .map(|e| e.value.clone()))
    }

    async fn push_request(
        &self,
        code: &str,
        payload: &str,
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let entry = inner
            .requests
            .entry(code.to_owned())
            .or_insert_with(|| Expiring::new(VecDeque::new(), ttl_secs));
        if !entry.is_live() {
            entry.value.clear();
        }
        entry.value.push_back(payload.to_owned());
        entry.expires_at = Instant::now() + Duration::from_secs(ttl_secs);
        Ok(())
    }

    async fn drain_requests(&self, code: &str) -> Result<Vec<String>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.requests.get_mut(code) {
            Some(entry) if entry.is_live() => {
                Ok(std::mem::take(&mut entry.value).into_iter().collect())
            }
            _ => Ok(Vec::new()),
        }
    }

    async fn list_requests(&self, code: &str) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .requests
            .get(code)
            .filter(|e| e.is_live())
            .map(|e| e.value.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn push_response(
        &self,
        code: &str,
        payload: &str,
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let entry = inner
            .responses
            .entry(code.to_owned())
            .or_insert_with(|| Expiring::new(Vec::new(), ttl_secs));
        if !entry.is_live() {
            entry.value.clear();
        }
        entry.value.push(payload.to_owned());
        entry.expires_at = Instant::now() + Duration::from_secs(ttl_secs);
        Ok(())
    }

    async fn list_responses(&self, code: &str) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .responses
            .get(code)
            .filter(|e| e.is_live())
            .map(|e| e.value.clone())
            .unwrap_or_default())
    }

    async fn incr_rate(&self, key: &str, window_secs: u64) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.rates.get_mut(key) {
            Some(entry) if entry.is_live() => {
                entry.value += 1;
                Ok(entry.value)
            }
            _ => {
                inner
                    .rates
                    .insert(key.to_owned(), Expiring::new(1, window_secs));
                Ok(1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn create_session_rejects_collision_while_live() {
        let store = InMemoryStore::new();
        assert!(store.create_session("ABCDEFGH", 60, "t0").await.unwrap());
        assert!(!store.create_session("ABCDEFGH", 60, "t1").await.unwrap());
    }

    #[tokio::test]
    async fn session_expires_after_ttl() {
        let store = InMemoryStore::new();
        store.create_session("ABCDEFGH", 1, "t0").await.unwrap();
        assert!(store.get_session("ABCDEFGH").await.unwrap().is_some());
        tokio::time::pause();
        tokio::time::advance(Duration::from_millis(1100)).await;
        assert!(store.get_session("ABCDEFGH").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn drain_requests_empties_queue_in_fifo_order() {
        let store = InMemoryStore::new();
        store.push_request("ABCDEFGH", "a", 60).await.unwrap();
        store.push_request("ABCDEFGH", "b", 60).await.unwrap();
        let drained = store.drain_requests("ABCDEFGH").await.unwrap();
        assert_eq!(drained, vec!["a".to_owned(), "b".to_owned()]);
        assert!(store.drain_requests("ABCDEFGH").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_requests_is_non_destructive_and_leaves_drain_intact() {
        let store = InMemoryStore::new();
        store.push_request("ABCDEFGH", "a", 60).await.unwrap();
        assert_eq!(store.list_requests("ABCDEFGH").await.unwrap().len(), 1);
        assert_eq!(store.list_requests("ABCDEFGH").await.unwrap().len(), 1);
        assert_eq!(store.drain_requests("ABCDEFGH").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_responses_is_non_destructive() {
        let store = InMemoryStore::new();
        store.push_response("ABCDEFGH", "r1", 60).await.unwrap();
        assert_eq!(store.list_responses("ABCDEFGH").await.unwrap().len(), 1);
        assert_eq!(store.list_responses("ABCDEFGH").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn incr_rate_counts_within_window_and_resets_after() {
        let store = InMemoryStore::new();
        assert_eq!(store.incr_rate("k", 1).await.unwrap(), 1);
        assert_eq!(store.incr_rate("k", 1).await.unwrap(), 2);
        tokio::time::pause();
        tokio::time::advance(Duration::from_millis(1100)).await;
        assert_eq!(store.incr_rate("k", 1).await.unwrap(), 1);
    }
}
