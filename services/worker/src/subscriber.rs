//! Subscriber: owns the inbound event channel and hands `QueuedRequest`s to
//! the Executor in delivery order (§4.2.1).
//!
//! Built on the same layered-timeout `tokio::select!` shape used for
//! streaming HTTP clients elsewhere in this codebase: a connect/headers
//! timeout around the initial request, then a per-event wait that races the
//! next SSE frame against a heartbeat deadline and the stop signal.

use std::time::Duration;

use chrono::Utc;
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::{mpsc, watch};

use crate::backoff;
use crate::config::WorkerConfig;
use crate::dedup::SeenIds;
use relay_protocol::QueuedRequest;

const DEDUP_CAPACITY: usize = 512;
const MAX_STREAM_FAILURES: u32 = 5;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Degraded,
    Reconnecting,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    Stream,
    Polling,
}

#[derive(Debug, Clone)]
pub struct SubscriberHealth {
    pub state: ConnectionState,
    pub kind: ConnectionKind,
    pub alive: bool,
    pub last_progress_at: Option<String>,
    pub error_count: u64,
}

impl Default for SubscriberHealth {
    fn default() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            kind: ConnectionKind::Stream,
            alive: true,
            last_progress_at: None,
            error_count: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct QueuedRequestsPage {
    requests: Vec<QueuedRequest>,
}

pub struct Subscriber {
    client: Client,
    config: WorkerConfig,
    requests_tx: mpsc::UnboundedSender<QueuedRequest>,
    health_tx: watch::Sender<SubscriberHealth>,
}

impl Subscriber {
    pub fn new(
        config: WorkerConfig,
        requests_tx: mpsc::UnboundedSender<QueuedRequest>,
        health_tx: watch::Sender<SubscriberHealth>,
    ) -> Self {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .expect("failed to build reqwest client");
        Self {
            client,
            config,
            requests_tx,
            health_tx,
        }
    }

    /// Drives the subscriber until `stop` fires. Owns the full stream ⇄
    /// polling failover state machine.
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) {
        let mut kind = ConnectionKind::Stream;
        let mut seen = SeenIds::new(DEDUP_CAPACITY);
        let mut consecutive_failures = 0u32;
        let mut attempt = 0u32;

        'outer: loop {
            if *stop.borrow() {
                break;
            }

            match kind {
                ConnectionKind::Stream => {
                    self.set_health(ConnectionState::Connecting, kind);
                    match self.run_stream_session(&mut seen, &mut stop).await {
                        StreamOutcome::Stopped => break,
                        StreamOutcome::GracefulClose => {
                            consecutive_failures = 0;
                            attempt = 0;
                            // Reconnect immediately after a clean server-initiated close
                            // (10-minute deadline or `error` event), no backoff needed.
                        }
                        StreamOutcome::Failed => {
                            consecutive_failures += 1;
                            if consecutive_failures >= MAX_STREAM_FAILURES {
                                tracing::warn!(
                                    failures = consecutive_failures,
                                    "stream channel failed repeatedly, falling back to polling"
                                );
                                self.set_health(ConnectionState::Degraded, kind);
                                kind = ConnectionKind::Polling;
                                attempt = 0;
                                continue;
                            }
                            self.set_health(ConnectionState::Reconnecting, kind);
                            let delay = backoff::delay_for(&self.config.reconnect, attempt);
                            attempt += 1;
                            if wait_or_stop(delay, &mut stop).await {
                                break;
                            }
                        }
                    }
                }
                ConnectionKind::Polling => {
                    self.set_health(ConnectionState::Connected, kind);
                    let mut ticks_since_stream_probe = 0u32;
                    loop {
                        if *stop.borrow() {
                            break 'outer;
                        }
                        if wait_or_stop(self.config.polling_interval, &mut stop).await {
                            break 'outer;
                        }
                        match self.poll_once(&mut seen).await {
                            Ok(()) => self.record_progress(false),
                            Err(err) => {
                                tracing::debug!(%err, "polling fetch failed");
                                self.record_progress(true);
                            }
                        }
                        ticks_since_stream_probe += 1;
                        // Retry the primary channel roughly once every 10 polls.
                        if ticks_since_stream_probe >= 10 {
                            tracing::debug!("retrying stream channel from polling mode");
                            kind = ConnectionKind::Stream;
                            attempt = 0;
                            break;
                        }
                    }
                }
            }
        }
        self.health_tx.send_modify(|h| h.alive = false);
    }

    fn set_health(&self, state: ConnectionState, kind: ConnectionKind) {
        self.health_tx.send_modify(|h| {
            h.state = state;
            h.kind = kind;
        });
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

    async fn poll_once(&self, seen: &mut SeenIds) -> Result<(), reqwest::Error> {
        let url = format!(
            "{}/request?code={}",
            self.config.relay_base_url, self.config.session_code
        );
        let page: QueuedRequestsPage = self.client.get(url).send().await?.json().await?;
        for request in page.requests {
            if seen.insert_if_new(&request.id) {
                let _ = self.requests_tx.send(request);
            }
        }
        Ok(())
    }

    async fn run_stream_session(
        &self,
        seen: &mut SeenIds,
        stop: &mut watch::Receiver<bool>,
    ) -> StreamOutcome {
        let url = format!(
            "{}/stream?code={}",
            self.config.relay_base_url, self.config.session_code
        );

        let response = tokio::select! {
            resp = self.client.get(url).send() => resp,
            _ = stop.changed() => return StreamOutcome::Stopped,
        };

        let response = match response {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                tracing::warn!(status = %resp.status(), "stream endpoint returned an error status");
                return StreamOutcome::Failed;
            }
            Err(err) => {
                tracing::warn!(%err, "failed to open stream connection");
                return StreamOutcome::Failed;
            }
        };

        self.set_health(ConnectionState::Connected, ConnectionKind::Stream);

        let mut stream = response.bytes_stream().eventsource();
        let heartbeat_timeout = self.config.heartbeat_timeout;

        loop {
            let deadline = tokio::time::sleep(heartbeat_timeout);
            tokio::pin!(deadline);

            tokio::select! {
                _ = stop.changed() => return StreamOutcome::Stopped,
                _ = &mut deadline => {
                    tracing::warn!("no heartbeat within the configured timeout, reconnecting");
                    return StreamOutcome::Failed;
                }
                event = stream.next() => match event {
                    Some(Ok(ev)) => {
                        match ev.event.as_str() {
                            "connected" => self.record_progress(false),
                            "heartbeat" => self.record_progress(false),
                            "tool-request" => {
                                self.record_progress(false);
                                if let Ok(request) = serde_json::from_str::<QueuedRequest>(&ev.data) {
                                    if seen.insert_if_new(&request.id) {
                                        let _ = self.requests_tx.send(request);
                                    }
                                } else {
                                    tracing::warn!("dropping malformed tool-request frame");
                                }
                            }
                            "timeout" => return StreamOutcome::GracefulClose,
                            "error" => {
                                tracing::warn!(data = %ev.data, "stream reported a drain error");
                            }
                            other => {
                                tracing::debug!(event = other, "ignoring unknown SSE event");
                            }
                        }
                    }
                    Some(Err(err)) => {
                        tracing::warn!(%err, "stream closed abruptly");
                        return StreamOutcome::Failed;
                    }
                    None => return StreamOutcome::Failed,
                },
            }
        }
    }
}

enum StreamOutcome {
    Stopped,
    GracefulClose,
    Failed,
}

/// Sleeps for `delay` unless `stop` fires first. Returns `true` if the stop
/// signal fired (caller should exit).
async fn wait_or_stop(delay: Duration, stop: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(delay) => false,
        _ = stop.changed() => true,
    }
}
