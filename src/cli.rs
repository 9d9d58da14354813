use crate::config::Config;
use crate::converter::Converter;
use crate::signals::Interrupts;
use crate::status::StatusMarker;
use crate::types::{OutputFormat, Quality};
use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use std::io;
use std::path::PathBuf;
use tracing::{info, warn};

/// BAtch Music Converter: mirrors a music library and re-encodes it
#[derive(Parser, Debug, Clone)]
#[command(name = "bam-converter")]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
pub struct Args {
  #[command(subcommand)]
  pub command: Option<Commands>,

  /// Location to read the library from (defaults to the current directory)
  #[arg(short = 'i', long, value_name = "DIR")]
  pub input_location: Option<PathBuf>,

  /// Location to write the new library to (defaults to ../extracted)
  #[arg(short = 'o', long, value_name = "DIR")]
  pub output_location: Option<PathBuf>,

  /// Extension of the source files to convert
  #[arg(short = 'F', long, default_value = "flac", value_name = "EXT")]
  pub input_format: String,

  /// Max folder depth, 0 for infinite
  #[arg(short, long, default_value_t = 0, value_name = "N")]
  pub max_depth: usize,

  /// Only print what would be done
  #[arg(short = 'n', long)]
  pub dry_run: bool,

  /// Show encoder output
  #[arg(short, long)]
  pub verbose: bool,

  /// Output format: 'mp3' or 'alac'
  #[arg(short = 'f', long, default_value = "mp3", value_name = "FORMAT")]
  pub output_format: OutputFormat,

  /// MP3 bitrate in kbps: 128, 196, 256 or 320
  #[arg(short = 'q', long, default_value = "320", value_name = "KBPS")]
  pub output_quality: Quality,

  /// Let the encoder overwrite existing files
  #[arg(short = 'w', long)]
  pub overwrite: bool,

  /// Embed the cover file if available (ALAC requires AtomicParsley)
  #[arg(short, long)]
  pub embed_covers: bool,

  /// Filename of the cover art
  #[arg(short, long, default_value = "folder.jpg", value_name = "NAME")]
  pub cover_name: String,

  /// Path to ffmpeg or avconv
  #[arg(short = 'a', long, alias = "avconv", value_name = "PATH")]
  pub ffmpeg: Option<PathBuf>,

  /// Path to AtomicParsley
  #[arg(short = 'p', long, value_name = "PATH")]
  pub atomicparsley: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
  /// Generate shell completion scripts
  Completion {
    #[arg(value_enum)]
    shell: Shell,
  },
}

/// Parses arguments and runs the appropriate application logic.
pub async fn handle_cli() -> Result<()> {
  let args = Args::parse();

  if let Some(Commands::Completion { shell }) = args.command {
    let mut cmd = Args::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut io::stdout());
    return Ok(());
  }

  let config = Config::from_args(args)?;

  // Registered before the marker exists so a failure cannot leave it behind.
  let mut interrupts = Interrupts::register()?;

  let marker = if config.dry_run {
    None
  } else {
    match StatusMarker::acquire(&config.status_path()).await? {
      Some(marker) => Some(marker),
      None => {
        println!(
          "{}",
          "The input location is already being used by an active instance, exiting..."
            .yellow()
        );
        return Ok(());
      }
    }
  };

  let converter = Converter::new(config, marker);

  let outcome = tokio::select! {
    result = converter.run() => Ok(result),
    signal = interrupts.recv() => Err(signal),
  };

  match outcome {
    Ok(result) => {
      if result.is_ok() {
        converter.stats().print_summary();
      }
      converter.finish().await?;
      result
    }
    Err(signal) => shut_down(converter, signal).await,
  }
}

/// Cleans up after an interruption. An interrupted run still exits with 0.
async fn shut_down(converter: Converter, signal: &str) -> Result<()> {
  warn!("Received {signal}, exiting");
  println!("{}", "Exiting, initiating cleanup".yellow());
  converter.abort().await?;
  info!("Cleanup finished");
  println!("{}", "Done cleaning up, exit.".yellow());
  Ok(())
}
