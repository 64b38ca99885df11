use std::net::SocketAddr;
use std::sync::Arc;

use relay::config::BootstrapConfig;
use relay::state::AppState;
use relay_store::{InMemoryStore, RedisStore, Store};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let config = BootstrapConfig::from_env();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .init();

    let store: Arc<dyn Store> = match &config.redis_url {
        Some(redis_url) => {
            info!("connecting to redis...");
            let store = RedisStore::connect(redis_url)
                .await
                .expect("failed to connect to redis");
            Arc::new(store)
        }
        None => {
            tracing::warn!("REDIS_URL not set, falling back to in-memory store (single-process only)");
            Arc::new(InMemoryStore::new())
        }
    };

    let state = AppState::new(store, config.relay);
    let router = relay::build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("failed to bind");
    info!(addr = %config.bind_addr, "relay listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("server error");
    info!("relay shut down gracefully");
}

/// Waits for SIGTERM or Ctrl-C (SIGINT) and returns to trigger graceful shutdown.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { info!("received Ctrl+C, shutting down"); },
        _ = terminate => { info!("received SIGTERM, shutting down"); },
    }
}
