//! BandUP API Server
//!
//! Run with: cargo run --bin bandup-api
//!
//! # Configuration
//!
//! Read from `BANDUP_CONFIG` if set, otherwise from the default
//! locations (`~/.config/bandup/config.toml`, `/etc/bandup/config.toml`,
//! `./config.toml`). `BANDUP_*` environment variables override file
//! values; `RUST_LOG` overrides the log level.

use bandup::api::{serve, AppState};
use bandup::config::Config;
use bandup::listing::Catalog;
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::var("BANDUP_CONFIG") {
        Ok(path) => Config::load_with_env(&PathBuf::from(path))?,
        Err(_) => Config::load_default(),
    };
    config.logging.init();

    tracing::info!("Starting BandUP API server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Free checks per visitor: {}, timer: {} min",
        config.session.trial_count,
        config.session.timer_minutes
    );

    let scorer = config.scoring.build_scorer()?;
    let state = AppState::new(
        scorer,
        Catalog::seeded(),
        config.api.clone(),
        config.session.clone(),
        Arc::new(mockable::DefaultClock),
    );

    tracing::info!("Starting server on {}", config.api.addr());
    serve(state).await?;

    tracing::info!("BandUP API server stopped");
    Ok(())
}
