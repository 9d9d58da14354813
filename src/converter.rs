use crate::config::Config;
use crate::error::ConversionError;
use crate::ffmpeg::FFmpeg;
use crate::stats::Stats;
use crate::status::{StatusMarker, temp_path};
use crate::types::{Action, OutputFormat};
use crate::walker::TreeWalker;
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info, warn};

pub struct Converter {
  config: Config,
  ffmpeg: FFmpeg,
  marker: Option<StatusMarker>,
  stats: Stats,
}

impl Converter {
  /// `marker` is `None` for dry runs, which never touch the filesystem.
  pub fn new(config: Config, marker: Option<StatusMarker>) -> Self {
    Self {
      ffmpeg: FFmpeg::new(&config),
      config,
      marker,
      stats: Stats::new(),
    }
  }

  pub const fn stats(&self) -> &Stats {
    &self.stats
  }

  pub async fn run(&self) -> Result<()> {
    self.config.print_header();

    if !self.config.dry_run {
      fs::create_dir_all(&self.config.output).await.with_context(|| {
        format!(
          "Failed to create output directory: {}",
          self.config.output.display()
        )
      })?;
    }

    debug!("Encoder options: {:?}", self.ffmpeg.options().args());

    let mut walker = TreeWalker::new(&self.config.input, self.config.max_depth);
    if Self::is_same_dir(&self.config.input, &self.config.output).await {
      debug!("Converting in place under {}", self.config.input.display());
    } else {
      walker = walker.exclude(&self.config.output);
    }

    while let Some(entry) = walker.next().await {
      self.stats.inc_directories();

      if let Err(e) = self.process_directory(&entry.path).await {
        error!("Failed to process {}: {e:#}", entry.path.display());
        eprintln!("{} {}: {e:#}", "✗ Error:".red(), entry.path.display());
      }
    }

    Ok(())
  }

  async fn is_same_dir(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a).await, fs::canonicalize(b).await) {
      (Ok(a), Ok(b)) => a == b,
      _ => false,
    }
  }

  /// Removes the status marker after a completed run.
  pub async fn finish(self) -> Result<()> {
    match self.marker {
      Some(marker) => marker.release().await,
      None => Ok(()),
    }
  }

  /// Removes the partially written file and the status marker after an
  /// interrupted run.
  pub async fn abort(self) -> Result<()> {
    match self.marker {
      Some(marker) => marker.cleanup().await,
      None => Ok(()),
    }
  }

  async fn process_directory(&self, dir: &Path) -> Result<()> {
    let relative = dir.strip_prefix(&self.config.input).unwrap_or(Path::new(""));
    let target = self.config.output.join(relative);

    println!("{} {}", "📁".cyan(), target.display());

    let sources = Self::source_files(dir, &self.config.input_format).await?;

    if self.config.dry_run {
      for source in &sources {
        let (output, action) = self.plan(source, &target).await;
        match action {
          Action::Convert => println!("{} {}", "🔍 Would convert:".cyan(), output.display()),
          Action::Skip => println!("{} {}", "✓ Exists:".green(), output.display()),
        }
      }
      return Ok(());
    }

    fs::create_dir_all(&target)
      .await
      .with_context(|| format!("Failed to create directory: {}", target.display()))?;

    let cover = self.copy_cover(dir, &target).await?;

    for source in &sources {
      let (output, action) = self.plan(source, &target).await;

      if action == Action::Skip {
        debug!("Output exists, skipping: {}", output.display());
        self.stats.inc_skipped();
        continue;
      }

      self.process_file(source, &output, cover.as_deref()).await?;
    }

    println!("{}", "   done!".green());
    Ok(())
  }

  async fn source_files(dir: &Path, input_format: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut entries = fs::read_dir(dir)
      .await
      .with_context(|| format!("Failed to read directory: {}", dir.display()))?;

    while let Some(entry) = entries.next_entry().await? {
      let path = entry.path();
      if Self::matches_format(&path, input_format)
        && fs::metadata(&path).await.is_ok_and(|m| m.is_file())
      {
        files.push(path);
      }
    }

    files.sort();
    Ok(files)
  }

  fn matches_format(path: &Path, input_format: &str) -> bool {
    path
      .extension()
      .and_then(|ext| ext.to_str())
      .is_some_and(|ext| ext.eq_ignore_ascii_case(input_format))
  }

  async fn plan(&self, source: &Path, target: &Path) -> (PathBuf, Action) {
    let output = Self::output_path(source, target, self.ffmpeg.options().extension());

    let action = if fs::metadata(&output).await.is_ok() {
      Action::Skip
    } else {
      Action::Convert
    };

    (output, action)
  }

  fn output_path(source: &Path, target: &Path, extension: &str) -> PathBuf {
    let mut name = source.file_stem().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(extension);
    target.join(name)
  }

  /// Copies the cover file into `target`. Returns the source cover, if any.
  async fn copy_cover(&self, dir: &Path, target: &Path) -> Result<Option<PathBuf>> {
    let cover = dir.join(&self.config.cover_name);
    if !fs::metadata(&cover).await.is_ok_and(|m| m.is_file()) {
      return Ok(None);
    }

    fs::copy(&cover, target.join(&self.config.cover_name))
      .await
      .with_context(|| format!("Failed to copy cover {}", cover.display()))?;

    Ok(Some(cover))
  }

  async fn process_file(&self, source: &Path, output: &Path, cover: Option<&Path>) -> Result<()> {
    let file_name = source.file_name().unwrap_or_default().to_string_lossy();

    if let Some(marker) = &self.marker {
      marker.record(output).await?;
    }

    println!("{} {}", "→ Processing:".cyan(), file_name);
    let result = self.encode(source, output, cover).await;

    if let Some(marker) = &self.marker {
      marker.clear().await?;
    }

    match result {
      Ok(()) => {
        self.stats.inc_converted();
        info!("Converted {}", output.display());
      }
      Err(e) => {
        self.stats.inc_failed();
        error!("Failed to convert {}: {}", source.display(), e);
        eprintln!("{} {}: {}", "✗ Error:".red(), file_name, e);
      }
    }

    Ok(())
  }

  async fn encode(
    &self,
    source: &Path,
    output: &Path,
    cover: Option<&Path>,
  ) -> Result<(), ConversionError> {
    if let Err(e) = self.ffmpeg.convert(source, output).await {
      if fs::remove_file(output).await.is_ok() {
        debug!("Removed partial output {}", output.display());
      }
      return Err(e);
    }

    if self.config.embed_covers {
      match cover {
        Some(cover) => self.embed_cover(output, cover).await,
        None => debug!("No cover to embed for {}", output.display()),
      }
    }

    Ok(())
  }

  async fn embed_cover(&self, output: &Path, cover: &Path) {
    println!("{} {}", "🖼  Embedding artwork:".cyan(), output.display());

    let result = match self.config.output_format {
      OutputFormat::Mp3 => self.attach_cover(output, cover).await,
      OutputFormat::Alac => self.ffmpeg.embed_artwork(output, cover).await,
    };

    if let Err(e) = result {
      warn!("Failed to embed cover into {}: {}", output.display(), e);
      eprintln!("{} {}: {}", "⚠️  Cover not embedded:".yellow(), output.display(), e);
    }
  }

  /// Re-muxes `output` with the cover. On failure the audio-only file is put
  /// back in place.
  async fn attach_cover(&self, output: &Path, cover: &Path) -> Result<(), ConversionError> {
    let temp = temp_path(output);
    fs::rename(output, &temp).await?;

    match self.ffmpeg.attach_cover(&temp, cover, output).await {
      Ok(()) => {
        fs::remove_file(&temp).await?;
        Ok(())
      }
      Err(e) => {
        let _ = fs::remove_file(output).await;
        fs::rename(&temp, output).await?;
        Err(e)
      }
    }
  }
}
