//! Locating the external tools on disk.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONVERTER: &str = "ffmpeg";
pub const ALT_CONVERTER: &str = "avconv";
pub const EMBEDDER: &str = "AtomicParsley";

/// Returns `configured` when it is a regular file, otherwise the first file
/// with the same name found on `PATH`.
pub fn resolve(configured: &Path) -> Option<PathBuf> {
  resolve_in(configured, std::env::var_os("PATH"))
}

pub fn resolve_in(configured: &Path, search_path: Option<OsString>) -> Option<PathBuf> {
  if configured.is_file() {
    return Some(configured.to_path_buf());
  }

  let name = configured.file_name()?;
  let cwd = std::env::current_dir().ok()?;
  match which::which_in(name, search_path, cwd) {
    Ok(found) => {
      debug!("Resolved {} to {}", configured.display(), found.display());
      Some(found)
    }
    Err(_) => None,
  }
}

/// Resolves the converter, falling back to the alternate encoder name.
pub fn resolve_converter(configured: &Path) -> Option<PathBuf> {
  resolve_converter_in(configured, std::env::var_os("PATH"))
}

pub fn resolve_converter_in(configured: &Path, search_path: Option<OsString>) -> Option<PathBuf> {
  resolve_in(configured, search_path.clone())
    .or_else(|| resolve_in(Path::new(ALT_CONVERTER), search_path))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::TempDir;

  fn make_executable(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
    #[cfg(unix)]
    {
      use std::os::unix::fs::PermissionsExt;
      fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }
    path
  }

  #[test]
  fn test_configured_file_is_used_as_is() {
    let dir = TempDir::new().unwrap();
    let tool = make_executable(dir.path(), "myffmpeg");

    assert_eq!(resolve_in(&tool, None), Some(tool.clone()));
  }

  #[test]
  #[cfg(unix)]
  fn test_search_path_lookup() {
    let dir = TempDir::new().unwrap();
    let tool = make_executable(dir.path(), "AtomicParsley");

    let found = resolve_in(
      Path::new("AtomicParsley"),
      Some(dir.path().as_os_str().to_os_string()),
    );
    assert_eq!(found, Some(tool));
  }

  #[test]
  #[cfg(unix)]
  fn test_converter_falls_back_to_avconv() {
    let dir = TempDir::new().unwrap();
    let avconv = make_executable(dir.path(), ALT_CONVERTER);

    let found = resolve_converter_in(
      Path::new(CONVERTER),
      Some(dir.path().as_os_str().to_os_string()),
    );
    assert_eq!(found, Some(avconv));
  }

  #[test]
  #[cfg(unix)]
  fn test_converter_prefers_primary_name() {
    let dir = TempDir::new().unwrap();
    let ffmpeg = make_executable(dir.path(), CONVERTER);
    make_executable(dir.path(), ALT_CONVERTER);

    let found = resolve_converter_in(
      Path::new(CONVERTER),
      Some(dir.path().as_os_str().to_os_string()),
    );
    assert_eq!(found, Some(ffmpeg));
  }

  #[test]
  fn test_missing_tool() {
    let dir = TempDir::new().unwrap();

    let found = resolve_in(
      Path::new("definitely-not-an-encoder"),
      Some(dir.path().as_os_str().to_os_string()),
    );
    assert!(found.is_none());
  }
}
