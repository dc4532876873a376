//! HTTP server binary for the dating-suggestion quote service.
//!
//! Reads configuration from the environment (and `.env` when present),
//! installs the default daily schedule and serves until Ctrl-C or SIGTERM.

use datenote::ServiceConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("datenote-server starting");

    let config = ServiceConfig::from_env().map_err(|e| {
        tracing::error!(error = %e, "invalid configuration");
        anyhow::anyhow!("invalid configuration: {e}")
    })?;

    datenote::app::run(config).await.map_err(|e| {
        tracing::error!(error = %e, "datenote-server exited with error");
        anyhow::anyhow!("datenote-server failed: {e}")
    })?;

    tracing::info!("datenote-server shut down cleanly");
    Ok(())
}
