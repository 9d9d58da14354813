//! Status marker: single-instance guard and crash-recovery breadcrumb.
//!
//! The marker lives under the input root. While a file is being encoded it
//! holds the destination path, so an interrupted run can remove the partial
//! output and its `.tmp` sibling.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

pub const STATUS_FILE: &str = ".bam-converter.status";

/// Temporary sibling used while a cover is muxed into `path`.
pub fn temp_path(path: &Path) -> PathBuf {
  let mut name = OsString::from(path.as_os_str());
  name.push(".tmp");
  PathBuf::from(name)
}

#[derive(Debug)]
pub struct StatusMarker {
  path: PathBuf,
}

impl StatusMarker {
  /// Creates the marker. Returns `None` when another instance already holds it.
  pub async fn acquire(path: &Path) -> Result<Option<Self>> {
    let created = fs::OpenOptions::new()
      .write(true)
      .create_new(true)
      .open(path)
      .await;

    match created {
      Ok(_) => {
        debug!("Created status marker {}", path.display());
        Ok(Some(Self {
          path: path.to_path_buf(),
        }))
      }
      Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(None),
      Err(e) => {
        Err(e).with_context(|| format!("Failed to create status file: {}", path.display()))
      }
    }
  }

  /// Records `output` as the file currently being produced.
  pub async fn record(&self, output: &Path) -> Result<()> {
    fs::write(&self.path, output.as_os_str().as_encoded_bytes())
      .await
      .with_context(|| format!("Failed to write status file: {}", self.path.display()))
  }

  /// Marks the pending file as complete.
  pub async fn clear(&self) -> Result<()> {
    fs::write(&self.path, b"")
      .await
      .with_context(|| format!("Failed to clear status file: {}", self.path.display()))
  }

  /// Path of the file being produced, if any.
  pub async fn pending(&self) -> Result<Option<PathBuf>> {
    let content = match fs::read(&self.path).await {
      Ok(content) => content,
      Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
      Err(e) => {
        return Err(e)
          .with_context(|| format!("Failed to read status file: {}", self.path.display()));
      }
    };

    let line = content.split(|b| *b == b'\n').next().unwrap_or_default();
    if line.is_empty() {
      return Ok(None);
    }

    let text = String::from_utf8_lossy(line).into_owned();
    Ok(Some(PathBuf::from(text)))
  }

  /// Removes the marker after a completed run.
  pub async fn release(self) -> Result<()> {
    remove_if_exists(&self.path).await?;
    debug!("Removed status marker {}", self.path.display());
    Ok(())
  }

  /// Deletes the partially written output recorded in the marker, its
  /// temporary sibling, and the marker itself.
  pub async fn cleanup(self) -> Result<()> {
    info!("Initiating cleanup");

    if let Some(pending) = self.pending().await? {
      for path in [temp_path(&pending), pending] {
        if remove_if_exists(&path).await? {
          warn!("Removed incomplete file {}", path.display());
        }
      }
    }

    remove_if_exists(&self.path).await?;
    info!("Done cleaning up");
    Ok(())
  }
}

async fn remove_if_exists(path: &Path) -> Result<bool> {
  match fs::remove_file(path).await {
    Ok(()) => Ok(true),
    Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
    Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
  }
}
