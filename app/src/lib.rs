//! Hubswap routing server
//!
//! Reads configuration from the file named by `HUBSWAP_CONFIG` and pool,
//! price and bridge data from the file named by `HUBSWAP_FIXTURES`, then
//! serves the routing API.

pub mod fixtures;
pub mod wiring;

use anyhow::Context;
use hubswap_core::AppConfig;

pub use fixtures::Fixtures;
pub use wiring::build_state;

fn init_tracing() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("hubswap=debug".parse()?)
        .add_directive("hubswap_lib=debug".parse()?)
        .add_directive("cross_chain=debug".parse()?)
        .add_directive("info".parse()?);
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn load_config() -> anyhow::Result<AppConfig> {
    match std::env::var("HUBSWAP_CONFIG") {
        Ok(path) => AppConfig::from_file(&path).with_context(|| format!("loading config {}", path)),
        Err(_) => {
            tracing::info!("HUBSWAP_CONFIG not set, using defaults");
            Ok(AppConfig::default())
        }
    }
}

fn load_fixtures() -> anyhow::Result<Fixtures> {
    match std::env::var("HUBSWAP_FIXTURES") {
        Ok(path) => Fixtures::from_file(&path),
        Err(_) => {
            tracing::warn!("HUBSWAP_FIXTURES not set, starting without pools");
            Ok(Fixtures::default())
        }
    }
}

/// Run the routing server
pub async fn run() -> anyhow::Result<()> {
    init_tracing()?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting Hubswap");

    let config = load_config()?;
    let fixtures = load_fixtures()?;
    let port = config.api_port;

    let state = build_state(config, fixtures).await?;
    hubswap_api::start_server(state, port)
        .await
        .context("API server stopped")?;
    Ok(())
}
