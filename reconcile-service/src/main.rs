use reconcile_service::config::ReconcileConfig;
use reconcile_service::services::init_metrics;
use reconcile_service::startup::Application;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Must run before any metric is recorded.
    init_metrics().map_err(|e| std::io::Error::other(e.to_string()))?;

    let config = ReconcileConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    init_tracing(
        "reconcile-service",
        &config.common.log_level,
        config.common.otlp_endpoint.as_deref(),
    );

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    tracing::info!(port = app.port(), "reconcile-service started");

    app.run_until_stopped().await
}
