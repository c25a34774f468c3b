//! Server entry point
//!
//! Loads configuration, opens the store and serves the HTTP API until
//! SIGINT or SIGTERM.

use std::sync::Arc;

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use urlshortener::allocator::RandomAllocator;
use urlshortener::config::Config;
use urlshortener::route::{create_app, AppState};
use urlshortener::service::Shortener;
use urlshortener::store::Store;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // .env is optional
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("urlshortener=debug,tower_http=debug")),
        )
        .init();

    let config = Config::from_env()?;

    let store = if config.is_in_memory() {
        tracing::warn!("using in-memory database, mappings are lost on shutdown");
        Store::in_memory()?
    } else {
        Store::open(&config.database_url)?
    };

    let allocator = RandomAllocator::new(config.code_length)?;
    let shortener =
        Shortener::new(Arc::new(store), allocator).with_max_attempts(config.max_attempts);

    let state = AppState::new(shortener, config.base_url.clone());
    let app = create_app(state).layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!(
        %addr,
        base_url = %config.base_url,
        database = %config.database_url,
        code_length = config.code_length,
        "server listening"
    );

    // in-flight requests finish and redb commits before the process exits
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on Unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received, stopping server");
}
