use std::sync::Arc;

use relay_store::Store;

/// Tunable defaults, overridable via environment in [`crate::config`].
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub session_ttl_secs: u64,
    pub queue_ttl_secs: u64,
    pub rate_limit_window_secs: u64,
    pub sessions_cap: u64,
    pub request_cap: u64,
    pub response_cap: u64,
    pub heartbeat_interval_secs: u64,
    pub stream_drain_interval_secs: u64,
    pub stream_deadline_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: relay_protocol::DEFAULT_SESSION_TTL_SECS,
            queue_ttl_secs: relay_protocol::QUEUE_TTL_SECS,
            rate_limit_window_secs: 60,
            sessions_cap: 30,
            request_cap: 60,
            response_cap: 60,
            heartbeat_interval_secs: relay_protocol::HEARTBEAT_INTERVAL_SECS,
            stream_drain_interval_secs: relay_protocol::STREAM_DRAIN_INTERVAL_SECS,
            stream_deadline_secs: relay_protocol::STREAM_DEADLINE_SECS,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: RelayConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: RelayConfig) -> Self {
        Self { store, config }
    }
}
