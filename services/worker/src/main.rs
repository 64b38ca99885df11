use tracing::info;
use tracing_subscriber::EnvFilter;

use worker::config::WorkerConfig;
use worker::tools::{EchoTool, ToolRegistry};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = WorkerConfig::from_env().expect("invalid worker configuration");
    info!(
        relay_base_url = %config.relay_base_url,
        session_code = %config.session_code,
        "starting browser worker"
    );

    // The host application's own tool API is out of scope; `EchoTool` stands
    // in as the one baseline tool so the binary is runnable standalone. A
    // real embedding replaces this registry with host-backed tools.
    let mut registry = ToolRegistry::new();
    registry.register("echo", Box::new(EchoTool));

    worker::run(config, registry, shutdown_signal()).await;
    info!("worker shut down gracefully");
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
