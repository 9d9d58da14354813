mod cli;
mod config;
mod converter;
mod error;
mod ffmpeg;
mod resolver;
mod signals;
mod stats;
mod status;
mod types;
mod walker;

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> Result<()> {
  // Initialize logging
  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(std::io::stderr))
    .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
    .init();

  cli::handle_cli().await?;

  Ok(())
}
