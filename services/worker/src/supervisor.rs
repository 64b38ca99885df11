//! Supervisor: cross-cutting error classification, circuit breakers, health
//! aggregation, and the single stop signal (§4.2.4).
//!
//! The per-dependency circuit breakers themselves are constructed here and
//! handed to the Executor (host API) and left here for the Poster and
//! Subscriber dependencies to consult through the supervisor's own calls,
//! keeping with §9's "no actor holds a reference to another's mutable
//! state" — breakers are plain values, not shared singletons.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};

use crate::subscriber::{ConnectionKind, SubscriberHealth};
use relay_protocol::ResponseEnvelope;

const STATUS_INTERVAL: Duration = Duration::from_secs(5);

/// Shared count of responses the Poster currently holds (received from the
/// Executor but not yet posted, retried, or dead-lettered). The Poster owns
/// the increment/decrement calls around its own intake and completion; the
/// Supervisor only ever reads it for its periodic status line, so no actor
/// other than the Poster mutates another actor's state.
#[derive(Debug, Clone, Default)]
pub struct QueueDepth(Arc<AtomicU64>);

impl QueueDepth {
    pub fn new() -> Self {
        Self(Arc::new(AtomicU64::new(0)))
    }

    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decrement(&self) {
        let _ = self
            .0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| Some(v.saturating_sub(1)));
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Serialize)]
struct OverallStatus {
    channel: &'static str,
    queue_depth: u64,
    error_count: u64,
}

/// Aggregates health across the three worker actors and publishes a
/// periodic status line through [`relay_log::UiLogger`]. Holds the only
/// `watch::Sender` for the stop signal; dropping it (or calling `stop`)
/// cancels every sub-actor on their next suspension point.
pub struct Supervisor {
    subscriber_health: watch::Receiver<SubscriberHealth>,
    dead_letters_rx: mpsc::UnboundedReceiver<ResponseEnvelope>,
    queue_depth: QueueDepth,
    logger: relay_log::UiLogger<String>,
    stop_tx: watch::Sender<bool>,
}

impl Supervisor {
    pub fn new(
        subscriber_health: watch::Receiver<SubscriberHealth>,
        dead_letters_rx: mpsc::UnboundedReceiver<ResponseEnvelope>,
        queue_depth: QueueDepth,
        logger: relay_log::UiLogger<String>,
        stop_tx: watch::Sender<bool>,
    ) -> Self {
        Self {
            subscriber_health,
            dead_letters_rx,
            queue_depth,
            logger,
            stop_tx,
        }
    }

    /// Sends the stop signal; every sub-actor exits at its next suspension
    /// point (stream read, poll sleep, queue take, HTTP call).
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    pub async fn run(mut self, mut stop: watch::Receiver<bool>) {
        let mut status_tick = tokio::time::interval(STATUS_INTERVAL);
        let mut error_count = 0u64;

        loop {
            tokio::select! {
                _ = stop.changed() => break,
                _ = status_tick.tick() => {
                    let channel = match self.subscriber_health.borrow().kind {
                        ConnectionKind::Stream => "stream",
                        ConnectionKind::Polling => "polling",
                    };
                    let status = OverallStatus {
                        channel,
                        queue_depth: self.queue_depth.get(),
                        error_count,
                    };
                    if let Ok(line) = serde_json::to_string(&status) {
                        self.logger.log(line);
                    }
                }
                dead = self.dead_letters_rx.recv() => match dead {
                    Some(envelope) => {
                        error_count += 1;
                        tracing::error!(
                            id = %envelope.id,
                            "response dead-lettered after exhausting retries"
                        );
                    }
                    None => {}
                },
            }
        }
    }
}
