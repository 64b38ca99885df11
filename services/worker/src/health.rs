//! Shared per-actor health shape for the Executor and Poster (§4.2.4's
//! "each sub-actor exposes `{alive, lastProgressAt, errorCount}`").
//!
//! The Subscriber's health is richer (it also reports `state`/`kind` for
//! the stream/polling failover) so it keeps its own `SubscriberHealth`
//! type in `subscriber.rs`; this one covers the two actors that have no
//! connection state of their own to report, just liveness and a running
//! error tally.

#[derive(Debug, Clone)]
pub struct ActorHealth {
    pub alive: bool,
    pub last_progress_at: Option<String>,
    pub error_count: u64,
}

impl Default for ActorHealth {
    fn default() -> Self {
        Self {
            alive: true,
            last_progress_at: None,
            error_count: 0,
        }
    }
}
