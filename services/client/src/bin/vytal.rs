//! services/client/src/bin/vytal.rs

use clap::Parser;
use client_lib::{
    adapters::ConsolePaymentSheet,
    cli::{self, Cli},
    config::Config,
    error::ClientError,
    state::AppState,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let args = Cli::parse();
    if let Err(e) = run(args).await {
        error!(error = ?e, "Command failed");
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: Cli) -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!("Configuration loaded.");

    // --- 2. Open the Store, Build Adapters & Restore the Session ---
    let state = AppState::build(config, Arc::new(ConsolePaymentSheet::stdio())).await?;

    // --- 3. Dispatch ---
    cli::run(args.command, &state).await
}
