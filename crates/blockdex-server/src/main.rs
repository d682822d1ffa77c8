//! Blockdex Server - Main entry point

use anyhow::Result;
use blockdex_common::logging::{init_logging, LogConfig};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tracing::info;

use blockdex_server::{
    api,
    config::Config,
    db,
    features::{indexing_jobs::PgJobRegistry, FeatureState},
    pipeline::IndexingProcessor,
    provider::{DirectDeliveryProvider, HeliusProvider, WebhookProvider},
    queue::{ApalisTaskQueue, WorkerPool},
    sink::PgSinkConnector,
};

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::builder()
        .log_file_prefix("blockdex-server")
        .filter_directives("blockdex_server=debug,tower_http=debug,sqlx=warn,apalis=info")
        .build();

    // Environment variables take precedence
    let log_config = LogConfig::from_env().unwrap_or(log_config);

    let _log_guard = init_logging(&log_config)?;

    info!("Starting Blockdex Server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let db_pool = db::create_pool(&config.database).await?;
    db::run_migrations(&db_pool).await?;

    let queue = Arc::new(ApalisTaskQueue::setup(&db_pool).await?);

    let provider: Arc<dyn WebhookProvider> = match HeliusProvider::from_config(&config.provider)? {
        Some(helius) => {
            info!("Using Helius webhook provider");
            Arc::new(helius)
        },
        None => {
            info!("No provider API key configured, expecting direct webhook delivery");
            Arc::new(DirectDeliveryProvider)
        },
    };

    let connector = Arc::new(PgSinkConnector::new(
        Duration::from_secs(config.sink.connect_timeout_secs),
        config.sink.batch_size,
    ));

    let registry = Arc::new(PgJobRegistry::new(db_pool.clone()));
    let processor = Arc::new(IndexingProcessor::new(
        registry,
        provider.clone(),
        connector.clone(),
    ));

    let _workers = WorkerPool::new(queue.storage(), processor, config.queue.workers).start();
    info!(workers = config.queue.workers, "Indexing workers started");

    let state = FeatureState {
        db: db_pool,
        queue,
        provider,
        connector,
    };

    let app = api::create_router(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    info!("Server shut down gracefully");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
