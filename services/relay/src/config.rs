//! Environment-driven bootstrap configuration.
//!
//! Unlike the forwarder's TOML file, the relay is meant to run as a
//! stateless container behind a load balancer, so everything comes from
//! the environment with sane defaults for local development.

use std::env;

use rand::rngs::ThreadRng;

use crate::state::RelayConfig;

pub struct BootstrapConfig {
    pub bind_addr: String,
    pub redis_url: Option<String>,
    pub log_level: String,
    pub relay: RelayConfig,
}

impl BootstrapConfig {
    pub fn from_env() -> Self {
        let mut relay = RelayConfig::default();

        if let Some(v) = env_u64("SESSION_TTL_SECS") {
            relay.session_ttl_secs = v;
        }
        if let Some(v) = env_u64("QUEUE_TTL_SECS") {
            relay.queue_ttl_secs = v;
        }
        if let Some(v) = env_u64("RATE_LIMIT_WINDOW_SECS") {
            relay.rate_limit_window_secs = v;
        }
        if let Some(v) = env_u64("SESSIONS_RATE_CAP") {
            relay.sessions_cap = v;
        }
        if let Some(v) = env_u64("REQUEST_RATE_CAP") {
            relay.request_cap = v;
        }
        if let Some(v) = env_u64("RESPONSE_RATE_CAP") {
            relay.response_cap = v;
        }

        Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned()),
            redis_url: env::var("REDIS_URL").ok(),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_owned()),
            relay,
        }
    }
}

fn env_u64(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

pub fn rng() -> ThreadRng {
    rand::thread_rng()
}
