mod actor;
mod config;
mod expiry;
mod transport;


use anyhow::Result;
use rater::{DecisionEngine, LimitCatalog, MemoryStore};
use tokio::signal;

use crate::actor::EngineActor;
use crate::config::Config;
use crate::transport::{Transport, line::LineTransport};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse configuration from environment variables and CLI arguments
    let config = Config::from_env_and_args()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("rater={}", config.log_level).parse()?),
        )
        .init();

    // Load limit classes; any configuration problem is fatal here, before
    // a socket is bound
    let classes = config::load_limits(&config.limits_path)?;
    let catalog = LimitCatalog::builder()
        .max_class_name_len(config.max_class_name_len)
        .build(classes)?;

    for class in catalog.classes() {
        tracing::info!(
            class = class.name(),
            keys = class.keys().len(),
            "loaded limit class"
        );
    }

    // Counting over a window wider than the retention horizon undercounts;
    // that is a configuration responsibility, so warn rather than fail
    if let Some(max_window) = catalog.max_window() {
        if max_window > config.retention {
            tracing::warn!(
                "retention horizon {}s is shorter than the largest configured window {}s; counts over wide windows will be incomplete",
                config.retention.as_secs(),
                max_window.as_secs()
            );
        }
    }

    let store = MemoryStore::with_capacity(config.store_capacity);
    let engine = DecisionEngine::new(catalog, store);
    let handle = EngineActor::spawn(config.buffer_size, engine, config.retention);

    let expiry_task = expiry::spawn(handle.clone(), config.expiry_interval);
    tracing::info!(
        "expiring marks every {}s, retention horizon {}s",
        config.expiry_interval.as_secs(),
        config.retention.as_secs()
    );

    let transport = LineTransport::new(&config.host, config.port);

    tokio::select! {
        result = transport.start(handle) => result?,
        _ = shutdown_signal() => {
            tracing::info!("shutting down");
        }
    }

    // The mark collection is volatile by design; teardown is dropping the
    // actor and scheduler after the listener stops
    expiry_task.abort();
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
