//! Keystone operator CLI.
//!
//! One-shot maintenance tasks against the prioritization and budget store.

mod cli;

use anyhow::Context;
use clap::Parser;
use keystone_shared::config::LoggingConfig;
use keystone_shared::AppConfig;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = cli::Cli::parse();
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.logging);

    cli::run(args, config).await
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.json {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}
