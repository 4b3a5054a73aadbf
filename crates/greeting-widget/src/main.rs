//! Greeting widget binary.
//!
//! Shows a time-of-day greeting in a display slot, refreshed hourly with a
//! short fade, and serves the slot to browsers through the observer.
//!
//! # Startup Sequence
//!
//! 1. Load configuration (`greeting-config.yaml`, or the path given as the
//!    first argument) and apply environment overrides
//! 2. Initialize structured logging (tracing)
//! 3. Register the display slot, start the observer, start the refresh
//!    schedule, and fire the readiness event
//! 4. Run until Ctrl-C, then shut everything down

mod app;
mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use greeting_core::LocalClock;
use greeting_core::config::{DEFAULT_CONFIG_FILE, WidgetConfig};
use tracing::info;

use crate::app::App;

/// Application entry point.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from);
    let config = WidgetConfig::load_or_default(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;

    logging::init(&config.logging)?;
    info!(
        config_path = %config_path.display(),
        slot_id = config.widget.slot_id,
        refresh_interval_ms = config.widget.refresh_interval_ms,
        transition_delay_ms = config.widget.transition_delay_ms,
        observer_enabled = config.observer.enabled,
        "greeting-widget starting"
    );

    let app = App::start(&config, Arc::new(LocalClock)).await?;
    if let Some(addr) = app.observer_addr() {
        info!(%addr, "Greeting page available");
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("Shutdown requested");

    app.shutdown().await
}
