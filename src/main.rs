// Main entry point - Dependency injection and server setup
use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use field_telemetry::application::chart_service::ChartService;
use field_telemetry::application::live_session::{LiveSessionHandle, SessionSettings};
use field_telemetry::infrastructure::config::load_app_config;
use field_telemetry::infrastructure::http_log_source::HttpLogSource;
use field_telemetry::presentation::app_state::AppState;
use field_telemetry::presentation::handlers::router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_app_config()?;

    // Log source (infrastructure layer)
    let source = Arc::new(HttpLogSource::new(&config.source).context("building HTTP client")?);
    tracing::info!("Polling {} log endpoint(s): {}", config.source.endpoints.len(), config.source.endpoints.join(", "));

    // Live session (application layer)
    let session = LiveSessionHandle::spawn(
        source,
        ChartService::new(config.chart.clone()),
        config.thresholds,
        SessionSettings::from_config(&config),
    );

    let state = Arc::new(AppState { session });
    let app = router(state);

    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {}", config.server.bind))?;
    tracing::info!("Starting field-telemetry service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    tracing::info!("Shutting down");
    Ok(())
}
