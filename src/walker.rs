use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// A directory reached by the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
  pub path: PathBuf,
  pub depth: usize,
}

/// Pre-order, depth-first directory walk.
///
/// With a non-zero `max_depth`, directories at that depth are yielded but not
/// descended into. Each directory is yielded at most once, even through
/// symlink loops. Siblings come in lexical order.
pub struct TreeWalker {
  stack: Vec<WalkEntry>,
  visited: HashSet<PathBuf>,
  max_depth: usize,
  exclude: Option<PathBuf>,
}

impl TreeWalker {
  pub fn new(root: &Path, max_depth: usize) -> Self {
    Self {
      stack: vec![WalkEntry {
        path: root.to_path_buf(),
        depth: 0,
      }],
      visited: HashSet::new(),
      max_depth,
      exclude: None,
    }
  }

  /// Never yield `dir` or anything below it.
  pub fn exclude(mut self, dir: &Path) -> Self {
    self.exclude = std::fs::canonicalize(dir).ok();
    self
  }

  pub async fn next(&mut self) -> Option<WalkEntry> {
    while let Some(entry) = self.stack.pop() {
      let canonical = match fs::canonicalize(&entry.path).await {
        Ok(canonical) => canonical,
        Err(e) => {
          warn!("Failed to access directory {}: {e}", entry.path.display());
          continue;
        }
      };

      if self.exclude.as_ref() == Some(&canonical) {
        debug!("Skipping output directory: {}", entry.path.display());
        continue;
      }

      if !self.visited.insert(canonical) {
        warn!("Directory already visited, skipping: {}", entry.path.display());
        continue;
      }

      if self.max_depth == 0 || entry.depth < self.max_depth {
        let children = match Self::subdirectories(&entry.path).await {
          Ok(children) => children,
          Err(e) => {
            warn!("{e:#}");
            Vec::new()
          }
        };

        self.stack.extend(children.into_iter().rev().map(|path| WalkEntry {
          path,
          depth: entry.depth + 1,
        }));
      }

      return Some(entry);
    }

    None
  }

  async fn subdirectories(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    let mut entries = fs::read_dir(dir)
      .await
      .with_context(|| format!("Failed to read directory: {}", dir.display()))?;

    while let Some(entry) = entries.next_entry().await? {
      let path = entry.path();
      // Follows symlinks, matching a plain `is_dir` check.
      if fs::metadata(&path).await.is_ok_and(|m| m.is_dir()) {
        dirs.push(path);
      }
    }

    dirs.sort();
    Ok(dirs)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::TempDir;

  async fn collect(mut walker: TreeWalker, root: &Path) -> Vec<(String, usize)> {
    let mut seen = Vec::new();
    while let Some(entry) = walker.next().await {
      let rel = entry.path.strip_prefix(root).unwrap();
      seen.push((rel.to_string_lossy().into_owned(), entry.depth));
    }
    seen
  }

  fn tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("b/deep/deeper")).unwrap();
    fs::create_dir_all(dir.path().join("a/inner")).unwrap();
    fs::write(dir.path().join("a/track.flac"), "x").unwrap();
    dir
  }

  #[tokio::test]
  async fn test_unlimited_depth_preorder() {
    let dir = tree();
    let seen = collect(TreeWalker::new(dir.path(), 0), dir.path()).await;

    assert_eq!(
      seen,
      vec![
        (String::new(), 0),
        ("a".to_string(), 1),
        ("a/inner".to_string(), 2),
        ("b".to_string(), 1),
        ("b/deep".to_string(), 2),
        ("b/deep/deeper".to_string(), 3),
      ]
    );
  }

  #[tokio::test]
  async fn test_max_depth_one_stops_after_two_levels() {
    let dir = tree();
    let seen = collect(TreeWalker::new(dir.path(), 1), dir.path()).await;

    assert_eq!(
      seen,
      vec![(String::new(), 0), ("a".to_string(), 1), ("b".to_string(), 1)]
    );
  }

  #[tokio::test]
  async fn test_excluded_directory() {
    let dir = tree();
    let walker = TreeWalker::new(dir.path(), 0).exclude(&dir.path().join("b"));
    let seen = collect(walker, dir.path()).await;

    assert!(seen.iter().all(|(p, _)| !p.starts_with('b')));
    assert_eq!(seen.len(), 3);
  }

  #[tokio::test]
  #[cfg(unix)]
  async fn test_symlink_loop_visited_once() {
    let dir = tree();
    std::os::unix::fs::symlink(dir.path(), dir.path().join("a/loop")).unwrap();

    let seen = collect(TreeWalker::new(dir.path(), 0), dir.path()).await;

    assert!(!seen.iter().any(|(p, _)| p.contains("loop")));
    assert_eq!(seen.len(), 6);
  }
}
