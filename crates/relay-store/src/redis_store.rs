//! Redis-backed [`Store`] implementation.
//!
//! Uses a single auto-reconnecting [`redis::aio::ConnectionManager`] shared
//! across the process; `redis` handles pipelining and reconnection, so no
//! connection pool is needed for the relay's request-scoped workload.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::{SessionRecord, Store, StoreError};

pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url).map_err(to_store_err)?;
        let conn = client.get_connection_manager().await.map_err(to_store_err)?;
        Ok(Self { conn })
    }

    fn session_key(code: &str) -> String {
        format!("session:{code}")
    }

    fn request_key(code: &str) -> String {
        format!("req:{code}")
    }

    fn response_key(code: &str) -> String {
        format!("res:{code}")
    }

    fn rate_key(key: &str) -> String {
        format!("ratelimit:{key}")
    }
}

fn to_store_err(e: redis::RedisError) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn encode_session(created_at: &str, ttl_secs: u64) -> String {
    format!("{ttl_secs}|{created_at}")
}

fn decode_session(code: &str, raw: &str) -> Option<SessionRecord> {
    let (ttl_str, created_at) = raw.split_once('|')?;
    let ttl_secs = ttl_str.parse().ok()?;
    Some(SessionRecord {
        code: code.to_owned(),
        created_at: created_at.to_owned(),
        ttl_secs,
    })
}

#[async_trait]
impl Store for RedisStore {
    async fn create_session(
        &self,
        code: &str,
        ttl_secs: u64,
        created_at: &str,
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let value = encode_session(created_at, ttl_secs);
        let set: Option<String> = redis::cmd("SET")
            .arg(Self::session_key(code))
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs)
            .query_async(&mut conn)
            .await
            .map_err(to_store_err)?;
        Ok(set.is_some())
    }

    async fn get_session(&self, code: &str) -> Result<Option<SessionRecord>, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(Self::session_key(code)).await.map_err(to_store_err)?;
        Ok(raw.and_then(|r| decode_session(code, &r)))
    }

    async fn push_request(
        &self,
        code: &str,
        payload: &str,
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let key = Self::request_key(code);
        redis::pipe()
            .atomic()
            .rpush(&key, payload)
            .expire(&key, ttl_secs as i64)
            .query_async::<()>(&mut conn)
            .await
            .map_err(to_store_err)?;
        Ok(())
    }

    async fn drain_requests(&self, code: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        let live = Self::request_key(code);
        let draining = format!("{live}:draining");

        let renamed: Result<(), redis::RedisError> = redis::cmd("RENAME")
            .arg(&live)
            .arg(&draining)
            .query_async(&mut conn)
            .await;

        match renamed {
            Ok(()) => {}
            Err(e) if e.to_string().contains("no such key") => return Ok(Vec::new()),
            Err(e) => return Err(to_store_err(e)),
        }

        let (items, ()): (Vec<String>, ()) = redis::pipe()
            .atomic()
            .lrange(&draining, 0, -1)
            .del(&draining)
            .query_async(&mut conn)
            .await
            .map_err(to_store_err)?;
        Ok(items)
    }

    async fn list_requests(&self, code: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        let items: Vec<String> = conn
            .lrange(Self::request_key(code), 0, -1)
            .await
            .map_err(to_store_err)?;
        Ok(items)
    }

    async fn push_response(
        &self,
        code: &str,
        payload: &str,
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let key = Self::response_key(code);
        redis::pipe()
            .atomic()
            .rpush(&key, payload)
            .expire(&key, ttl_secs as i64)
            .query_async::<()>(&mut conn)
            .await
            .map_err(to_store_err)?;
        Ok(())
    }

    async fn list_responses(&self, code: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        let items: Vec<String> = conn
            .lrange(Self::response_key(code), 0, -1)
            .await
            .map_err(to_store_err)?;
        Ok(items)
    }

    async fn incr_rate(&self, key: &str, window_secs: u64) -> Result<u64, StoreError> {
        let mut conn = self.conn.clone();
        let rate_key = Self::rate_key(key);
        let value: u64 = conn.incr(&rate_key, 1u64).await.map_err(to_store_err)?;
        if value == 1 {
            let _: () = conn
                .expire(&rate_key, window_secs as i64)
                .await
                .map_err(to_store_err)?;
        }
        Ok(value)
    }
}
