use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use stockart_core::{ServerConfig, WebhookRelay};
use stockart_gateway::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Logging Setup
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "stockart_gateway=info,stockart_core=info,tower_http=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    info!("StockArt Gateway Initializing...");

    // 2. Configuration (.env + process environment)
    let config = ServerConfig::from_env().context("Invalid configuration")?;

    // 3. The Relay (one pooled HTTP client for the webhook)
    let relay =
        WebhookRelay::new(config.relay.clone()).context("Failed to initialize webhook relay")?;
    let state = AppState::new(relay, config.mode);

    // 4. Routes + middleware
    let app = build_router(&config, state);

    // 5. Start Server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("StockArt server is running on port {}", config.port);
    info!("Visit: http://localhost:{}", config.port);
    info!("Health check: http://localhost:{}/health", config.port);
    info!(
        "API endpoint: http://localhost:{}/api/stocks/search?q=apple",
        config.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("StockArt server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
