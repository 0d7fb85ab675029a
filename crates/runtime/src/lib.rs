//! Process bootstrap: tracing, configuration and the one-time artifact load.

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;
use uf_artifacts::ArtifactBundle;
use uf_pipeline::UnitForecaster;

pub mod config;
pub mod metrics;

pub use config::ServiceConfig;

/// Install the fmt subscriber. `RUST_LOG` selects levels; INFO when unset.
pub fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Load every artifact and build the forecaster. Any failure here is fatal:
/// the caller must not start serving.
pub fn start_forecaster(cfg: &ServiceConfig) -> Result<UnitForecaster> {
    info!(dataset = %cfg.artifacts.dataset.display(), model = %cfg.artifacts.model.display(), "loading artifacts");
    let bundle = ArtifactBundle::load(&cfg.artifacts, cfg.pipeline.window_size)
        .context("startup artifacts unavailable")?;
    let forecaster = bundle
        .forecaster(cfg.pipeline.clone())
        .context("failed to assemble prediction pipeline")?;
    info!(units = forecaster.list_units().len(), "forecaster started");
    Ok(forecaster)
}
