mod api;
mod health;

use std::sync::Arc;

use anyhow::{Context, Result};
use wrh_quote_core::artifacts::DocumentRenderer;
use wrh_quote_core::config::{AppConfig, LoadOptions};
use wrh_quote_core::errors::ApplicationError;

fn init_logging(config: &AppConfig) {
    use tracing::Level;
    use wrh_quote_core::config::LogFormat::*;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Logging first so catalog and renderer detection are visible.
    let config = AppConfig::load(LoadOptions::default()).map_err(ApplicationError::from)?;
    init_logging(&config);

    let catalog = config.load_catalog().map_err(ApplicationError::from)?;
    let catalog = Arc::new(catalog);
    let renderer: Arc<dyn DocumentRenderer> = Arc::from(config.document.renderer());
    let api_state = api::ApiState::new(catalog.clone(), config.studio.clone(), renderer.clone())
        .context("could not prepare the quote document generator")?;

    let app = health::router(health::HealthState::new(catalog, renderer))
        .merge(api::router(api_state));

    let address = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("could not bind {address}"))?;

    tracing::info!(
        event_name = "system.server.started",
        bind_address = %address,
        currency = %config.studio.currency,
        "wrh-quote-server started"
    );
    axum::serve(listener, app).with_graceful_shutdown(wait_for_shutdown()).await?;
    tracing::info!(event_name = "system.server.stopping", "wrh-quote-server stopping");

    Ok(())
}

async fn wait_for_shutdown() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(
            event_name = "system.server.signal_error",
            error = %error,
            "could not listen for shutdown signal"
        );
        std::future::pending::<()>().await;
    }
}
