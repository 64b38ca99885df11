pub mod backoff;
pub mod circuit;
pub mod config;
pub mod dedup;
pub mod errors;
pub mod executor;
pub mod health;
pub mod poster;
pub mod subscriber;
pub mod supervisor;
pub mod tools;

use std::future::Future;

use tokio::sync::{mpsc, watch};

use circuit::{CircuitBreaker, CircuitConfig};
use config::WorkerConfig;
use executor::Executor;
use health::ActorHealth;
use poster::Poster;
use subscriber::{Subscriber, SubscriberHealth};
use supervisor::{QueueDepth, Supervisor};
use tools::ToolRegistry;

/// Wires the Subscriber, Executor, Poster, and Supervisor together and runs
/// them until `shutdown` resolves. Each actor is an independent task
/// connected only by channels, per §9's "explicit channels, no shared
/// service singleton" guidance.
pub async fn run(config: WorkerConfig, registry: ToolRegistry, shutdown: impl Future<Output = ()>) {
    let (requests_tx, requests_rx) = mpsc::unbounded_channel();
    let (responses_tx, responses_rx) = mpsc::unbounded_channel();
    let (dead_letters_tx, dead_letters_rx) = mpsc::unbounded_channel();
    let (health_tx, health_rx) = watch::channel(SubscriberHealth::default());
    let (executor_health_tx, _executor_health_rx) = watch::channel(ActorHealth::default());
    let (poster_health_tx, _poster_health_rx) = watch::channel(ActorHealth::default());
    let (stop_tx, stop_rx) = watch::channel(false);
    let queue_depth = QueueDepth::new();

    let (log_tx, _log_rx) = tokio::sync::broadcast::channel(256);
    let logger = relay_log::UiLogger::with_buffer(log_tx, |entry| entry, 200);

    let subscriber = Subscriber::new(config.clone(), requests_tx, health_tx);
    let executor = Executor::new(
        config.executor.clone(),
        registry,
        requests_rx,
        responses_tx,
        executor_health_tx,
    );
    let poster = Poster::new(
        config.clone(),
        responses_rx,
        dead_letters_tx,
        queue_depth.clone(),
        poster_health_tx,
    );
    let supervisor = Supervisor::new(
        health_rx,
        dead_letters_rx,
        queue_depth,
        logger,
        stop_tx.clone(),
    );

    let host_circuit = CircuitBreaker::new(CircuitConfig::default());
    let response_circuit = CircuitBreaker::new(CircuitConfig::default());

    tokio::pin!(shutdown);

    tokio::join!(
        subscriber.run(stop_rx.clone()),
        executor.run(stop_rx.clone(), host_circuit),
        poster.run(stop_rx.clone(), response_circuit),
        supervisor.run(stop_rx.clone()),
        async {
            shutdown.await;
            tracing::info!("shutdown signal received, stopping worker actors");
            let _ = stop_tx.send(true);
        },
    );
}
