//! Per-file conversion errors.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConversionError {
  /// The external tool could not be spawned at all.
  #[error("failed to run {}: {source}", .tool.display())]
  Spawn {
    tool: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The external tool ran and reported failure.
  #[error("{} exited with {status}", .tool.display())]
  Failed { tool: PathBuf, status: ExitStatus },

  /// Covers go into ALAC files but no embedder was resolved.
  #[error("no cover embedder configured")]
  NoEmbedder,

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
}
