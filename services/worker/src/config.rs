//! Environment-driven worker configuration, mirroring the "Configuration
//! surface (worker)" table 1:1.

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    pub base: Duration,
    pub factor: f64,
    pub cap: Duration,
    pub max_attempts: u32,
    pub jitter: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(500),
            factor: 2.0,
            cap: Duration::from_secs(30),
            max_attempts: 5,
            jitter: 0.2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub invocation_timeout: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            invocation_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PosterConfig {
    pub max_attempts: u32,
    pub rate_cap_per_min: u32,
    pub batch_size: usize,
    pub batch_window: Duration,
}

impl Default for PosterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            rate_cap_per_min: 60,
            batch_size: 10,
            batch_window: Duration::from_millis(50),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub relay_base_url: String,
    pub session_code: String,
    pub polling_interval: Duration,
    pub heartbeat_timeout: Duration,
    pub reconnect: ReconnectConfig,
    pub executor: ExecutorConfig,
    pub poster: PosterConfig,
    pub debug: bool,
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self, String> {
        let relay_base_url =
            env::var("RELAY_BASE_URL").map_err(|_| "RELAY_BASE_URL must be set".to_owned())?;
        let session_code =
            env::var("SESSION_CODE").map_err(|_| "SESSION_CODE must be set".to_owned())?;

        let mut reconnect = ReconnectConfig::default();
        if let Some(v) = env_u64("RECONNECT_BASE_MS") {
            reconnect.base = Duration::from_millis(v);
        }
        if let Some(v) = env_f64("RECONNECT_FACTOR") {
            reconnect.factor = v;
        }
        if let Some(v) = env_u64("RECONNECT_CAP_MS") {
            reconnect.cap = Duration::from_millis(v);
        }
        if let Some(v) = env_u32("RECONNECT_MAX_ATTEMPTS") {
            reconnect.max_attempts = v;
        }
        if let Some(v) = env_f64("RECONNECT_JITTER") {
            reconnect.jitter = v;
        }

        let mut executor = ExecutorConfig::default();
        if let Some(v) = env_u64("EXECUTOR_INVOCATION_TIMEOUT_MS") {
            executor.invocation_timeout = Duration::from_millis(v);
        }

        let mut poster = PosterConfig::default();
        if let Some(v) = env_u32("POSTER_MAX_ATTEMPTS") {
            poster.max_attempts = v;
        }
        if let Some(v) = env_u32("POSTER_RATE_CAP_PER_MIN") {
            poster.rate_cap_per_min = v;
        }
        if let Some(v) = env_u32("POSTER_BATCH_SIZE") {
            poster.batch_size = v as usize;
        }
        if let Some(v) = env_u64("POSTER_BATCH_WINDOW_MS") {
            poster.batch_window = Duration::from_millis(v);
        }

        Ok(Self {
            relay_base_url,
            session_code,
            polling_interval: Duration::from_millis(
                env_u64("POLLING_INTERVAL_MS").unwrap_or(1000),
            ),
            heartbeat_timeout: Duration::from_millis(
                env_u64("HEARTBEAT_TIMEOUT_MS").unwrap_or(60_000),
            ),
            reconnect,
            executor,
            poster,
            debug: env::var("DEBUG").map(|v| v == "1" || v == "true").unwrap_or(false),
        })
    }
}

fn env_u64(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

fn env_u32(name: &str) -> Option<u32> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

fn env_f64(name: &str) -> Option<f64> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
