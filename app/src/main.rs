//! Pantry demo.
//!
//! Runs a scripted session against the in-memory store and logs what the
//! list screens and the animator do.

use pantry_app::config::{Config, DEFAULT_LOG_FILTER};
use pantry_app::session;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Pantry demo session");

    // Load configuration
    let config = Config::from_env();
    config.validate()?;
    info!(
        undo_window_ms = config.undo_window.as_millis(),
        animation_ms = config.animation.duration.as_millis(),
        interpolator = %config.animation.interpolator,
        default_sort = ?config.default_sort,
        seed_demo = config.seed_demo,
        "Configuration loaded"
    );

    pantry_runtime::metrics::register_metrics();

    let report = session::run(&config).await?;
    info!(
        frames = report.frames,
        replayed = report.replayed,
        undone = report.undone,
        checked_out = report.checked_out,
        shopping_rows = report.shopping_rows,
        inventory_rows = report.inventory_rows,
        "Session finished"
    );

    Ok(())
}
