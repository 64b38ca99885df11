//! Poster: delivers `ResponseEnvelope`s to `POST /response` with retry,
//! client-side rate compliance, and optional micro-batching (§4.2.3).

use std::time::{Duration, Instant};

use chrono::Utc;
use reqwest::Client;
use tokio::sync::{mpsc, watch};

use crate::backoff;
use crate::circuit::CircuitBreaker;
use crate::config::{PosterConfig, WorkerConfig};
use crate::errors::{classify_http, ErrorCategory};
use crate::health::ActorHealth;
use crate::supervisor::QueueDepth;
use relay_protocol::ResponseEnvelope;

pub struct Poster {
    client: Client,
    config: WorkerConfig,
    responses_rx: mpsc::UnboundedReceiver<ResponseEnvelope>,
    dead_letters_tx: mpsc::UnboundedSender<ResponseEnvelope>,
    queue_depth: QueueDepth,
    health_tx: watch::Sender<ActorHealth>,
}

impl Poster {
    pub fn new(
        config: WorkerConfig,
        responses_rx: mpsc::UnboundedReceiver<ResponseEnvelope>,
        dead_letters_tx: mpsc::UnboundedSender<ResponseEnvelope>,
        queue_depth: QueueDepth,
        health_tx: watch::Sender<ActorHealth>,
    ) -> Self {
        Self {
            client: Client::new(),
            config,
            responses_rx,
            dead_letters_tx,
            queue_depth,
            health_tx,
        }
    }

    fn record_progress(&self, is_error: bool) {
        self.health_tx.send_modify(|h| {
            h.alive = true;
            h.last_progress_at = Some(Utc::now().to_rfc3339());
            if is_error {
                h.error_count += 1;
            }
        });
    }

    pub async fn run(mut self, mut stop: watch::Receiver<bool>, mut circuit: CircuitBreaker) {
        let mut bucket = TokenBucket::new(self.config.poster.rate_cap_per_min);

        loop {
            let batch = tokio::select! {
                _ = stop.changed() => break,
                batch = self.collect_batch(&mut stop) => match batch {
                    Some(b) if !b.is_empty() => b,
                    Some(_) => continue,
                    None => break,
                },
            };
            for _ in &batch {
                self.queue_depth.increment();
            }

            // The relay accepts single items only; batching here just
            // bounds how much queues before a post, posting still happens
            // per item, serialized, preserving order.
            for envelope in batch {
                if !circuit.allow() {
                    tracing::warn!(id = %envelope.id, "response endpoint circuit is open");
                    self.record_progress(true);
                    self.dead_letters_tx.send(envelope).ok();
                    self.queue_depth.decrement();
                    continue;
                }
                bucket.wait_for_slot().await;
                if self.post_with_retry(envelope.clone(), &mut bucket).await {
                    circuit.record_success();
                    self.record_progress(false);
                } else {
                    circuit.record_failure();
                    self.record_progress(true);
                    self.dead_letters_tx.send(envelope).ok();
                }
                self.queue_depth.decrement();
            }
        }
        self.health_tx.send_modify(|h| h.alive = false);
    }

    /// Waits up to `batch_window` collecting up to `batch_size` queued
    /// responses. Always returns at least one item if the channel has any
    /// available immediately.
    async fn collect_batch(
        &mut self,
        stop: &mut watch::Receiver<bool>,
    ) -> Option<Vec<ResponseEnvelope>> {
        let first = tokio::select! {
            _ = stop.changed() => return None,
            item = self.responses_rx.recv() => item?,
        };

        let mut batch = vec![first];
        let deadline = tokio::time::Instant::now() + self.config.poster.batch_window;

        while batch.len() < self.config.poster.batch_size {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(remaining) => break,
                item = self.responses_rx.recv() => match item {
                    Some(envelope) => batch.push(envelope),
                    None => break,
                },
            }
        }

        Some(batch)
    }

    /// Posts one envelope, retrying transient failures with backoff up to
    /// `poster.max_attempts`. Returns `false` if the item should be
    /// dead-lettered (permanent failure, or attempts exhausted).
    async fn post_with_retry(&self, envelope: ResponseEnvelope, bucket: &mut TokenBucket) -> bool {
        let url = format!("{}/response", self.config.relay_base_url);
        let mut attempt = 0u32;

        loop {
            let result = self.client.post(&url).json(&envelope).send().await;

            let (status, transport_err) = match &result {
                Ok(resp) => (Some(resp.status().as_u16()), false),
                Err(_) => (None, true),
            };

            if let Ok(resp) = &result {
                if resp.status().is_success() {
                    return true;
                }
            }

            if status == Some(429) {
                bucket.on_rate_limited(self.config.reconnect.cap);
            }

            let classified = classify_http(status, transport_err);
            if classified.category() != ErrorCategory::Transient {
                tracing::warn!(id = %envelope.id, "response post failed permanently");
                return false;
            }

            attempt += 1;
            if attempt >= self.config.poster.max_attempts {
                tracing::warn!(id = %envelope.id, attempt, "response post exhausted retries");
                return false;
            }

            let retry_after = status
                .filter(|s| *s == 429)
                .and_then(|_| result.ok())
                .and_then(|resp| retry_after_secs(&resp));

            // `attempt` is 1-indexed here (incremented just above), and
            // `delay_for` expects a 0-indexed attempt count, so the first
            // retry still uses `base` rather than `base * factor`.
            let pause = match retry_after {
                Some(secs) => Duration::from_secs(secs).min(self.config.reconnect.cap),
                None => backoff::delay_for(&self.config.reconnect, attempt - 1),
            };

            tokio::time::sleep(pause).await;
        }
    }
}

fn retry_after_secs(resp: &reqwest::Response) -> Option<u64> {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

/// A client-side leaky bucket honoring the server's per-minute cap: posts
/// are spaced no closer than `60s / cap` apart.
struct TokenBucket {
    min_interval: Duration,
    last_send: Option<Instant>,
}

impl TokenBucket {
    fn new(cap_per_min: u32) -> Self {
        let cap_per_min = cap_per_min.max(1);
        Self {
            min_interval: Duration::from_millis(60_000 / cap_per_min as u64),
            last_send: None,
        }
    }

    async fn wait_for_slot(&mut self) {
        if let Some(last) = self.last_send {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        self.last_send = Some(Instant::now());
    }

    /// Doubles the pacing interval (up to `cap`) after the server returns a
    /// `429`, per the Poster's rate-compliance policy — slows down future
    /// posts rather than just retrying the one that tripped the limit.
    fn on_rate_limited(&mut self, cap: Duration) {
        self.min_interval = backoff::double(self.min_interval, cap);
    }
}
