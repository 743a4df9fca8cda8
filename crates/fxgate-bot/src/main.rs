//! FX guard-chain trading bot - entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// FX guard-chain trading bot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via FXGATE_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    fxgate_telemetry::init_logging()?;

    info!("Starting fxgate bot v{}", env!("CARGO_PKG_VERSION"));

    // Config path: CLI arg > FXGATE_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("FXGATE_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = fxgate_bot::AppConfig::load(&config_path)?;
    info!(
        environment = %config.environment,
        bot_id = %config.bot_id,
        instruments = config.instruments.len(),
        "Configuration loaded"
    );

    let mut app = fxgate_bot::Application::new(config)?;
    app.init().await?;
    app.start();
    app.run().await?;

    Ok(())
}
