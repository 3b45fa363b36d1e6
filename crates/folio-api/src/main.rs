//! Folio API Server entry point
//!
//! Run with:
//! ```bash
//! cargo run -p folio-api
//! ```
//!
//! Configuration is loaded from environment variables (and `.env`).

use anyhow::Context;
use folio_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "Server failed to start");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("Failed to load configuration")?;

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {}", e);
    }

    info!(
        env = ?config.app.env,
        port = config.api.port,
        postgres = config.database.is_some(),
        redis = config.redis.is_some(),
        "Starting Folio API Server..."
    );

    folio_api::run(config).await?;

    Ok(())
}
