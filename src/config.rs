use crate::cli::Args;
use crate::resolver;
use crate::status::STATUS_FILE;
use crate::types::{OutputFormat, Quality};
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};

const DEFAULT_OUTPUT: &str = "../extracted";

#[derive(Debug, Clone)]
pub struct Config {
  pub input: PathBuf,
  pub output: PathBuf,
  pub converter: PathBuf,
  pub embedder: Option<PathBuf>,
  pub input_format: String,
  pub output_format: OutputFormat,
  pub output_quality: Quality,
  pub overwrite: bool,
  pub embed_covers: bool,
  pub cover_name: String,
  pub max_depth: usize,
  pub dry_run: bool,
  pub verbose: bool,
}

impl Config {
  pub fn from_args(args: Args) -> Result<Self> {
    let input = match args.input_location {
      Some(path) => existing_dir(path, "input_location")?,
      None => std::env::current_dir().context("Failed to read current directory")?,
    };

    let output = match args.output_location {
      Some(path) => existing_dir(path, "output_location")?,
      None => PathBuf::from(DEFAULT_OUTPUT),
    };

    let converter = match args.ffmpeg {
      Some(path) => existing_file(path, "ffmpeg")?,
      None => PathBuf::from(resolver::CONVERTER),
    };

    let embedder = match args.atomicparsley {
      Some(path) => existing_file(path, "atomicparsley")?,
      None => PathBuf::from(resolver::EMBEDDER),
    };

    let config = Self {
      input,
      output,
      converter,
      embedder: None,
      input_format: args.input_format.trim_start_matches('.').to_lowercase(),
      output_format: args.output_format,
      output_quality: args.output_quality,
      overwrite: args.overwrite,
      embed_covers: args.embed_covers,
      cover_name: args.cover_name,
      max_depth: args.max_depth,
      dry_run: args.dry_run,
      verbose: args.verbose,
    };

    config.resolve_tools(&embedder)
  }

  /// Replaces the configured converter name with its resolved path and
  /// resolves `embedder` when covers go into ALAC files.
  fn resolve_tools(mut self, embedder: &Path) -> Result<Self> {
    self.converter = resolver::resolve_converter(&self.converter).with_context(|| {
      format!(
        "{} {} or {} seems not to be present. Please install ffmpeg.",
        "✗".red(),
        self.converter.display(),
        resolver::ALT_CONVERTER
      )
    })?;

    self.embedder = if self.needs_embedder() {
      let found = resolver::resolve(embedder).with_context(|| {
        format!(
          "{} {} seems not to be present, it is required to embed covers into ALAC files.",
          "✗".red(),
          embedder.display()
        )
      })?;
      Some(found)
    } else {
      None
    };

    Ok(self)
  }

  pub fn needs_embedder(&self) -> bool {
    self.embed_covers && self.output_format == OutputFormat::Alac
  }

  pub fn status_path(&self) -> PathBuf {
    self.input.join(STATUS_FILE)
  }

  pub fn print_header(&self) {
    println!("{}", "========================================".cyan());
    println!("{}", "  BAtch Music Converter".cyan().bold());
    println!("{}", "========================================".cyan());

    println!("{} {}", "Input:".yellow(), self.input.display());
    println!("{} {}", "Output:".yellow(), self.output.display());

    match self.output_format {
      OutputFormat::Mp3 => {
        println!(
          "{} {} -> {} | {} {}",
          "Format:".yellow(),
          self.input_format,
          "mp3".bold(),
          "Quality:".yellow(),
          self.output_quality
        );
      }
      OutputFormat::Alac => {
        println!(
          "{} {} -> {}",
          "Format:".yellow(),
          self.input_format,
          "alac".bold()
        );
      }
    }

    if self.max_depth > 0 {
      println!("{} {}", "Max depth:".yellow(), self.max_depth);
    }

    if self.embed_covers {
      println!("{} {}", "Embedding covers from:".yellow(), self.cover_name);
    }

    if self.dry_run {
      println!(
        "{}",
        "🔍 DRY RUN MODE - No files will be converted"
          .yellow()
          .bold()
      );
    }

    if self.overwrite {
      println!(
        "{}",
        "⚠️  Overwrite enabled - the encoder may replace existing files".yellow()
      );
    }

    println!("{}", "----------------------------------------".cyan());
  }
}

fn expand_home(path: PathBuf) -> PathBuf {
  match path.strip_prefix("~") {
    Ok(rest) => std::env::var_os("HOME")
      .map(|home| Path::new(&home).join(rest))
      .unwrap_or(path),
    Err(_) => path,
  }
}

fn existing_dir(path: PathBuf, what: &str) -> Result<PathBuf> {
  let path = expand_home(path);
  if !path.is_dir() {
    anyhow::bail!("{what} is not a valid path: {}", path.display());
  }
  Ok(path)
}

fn existing_file(path: PathBuf, what: &str) -> Result<PathBuf> {
  let path = expand_home(path);
  if !path.is_file() {
    anyhow::bail!("{what} is not a valid path: {}", path.display());
  }
  Ok(path)
}

#[cfg(test)]
pub mod tests {
  use super::*;

  pub fn test_config() -> Config {
    Config {
      input: PathBuf::from("/music/in"),
      output: PathBuf::from("/music/out"),
      converter: PathBuf::from("/usr/bin/ffmpeg"),
      embedder: None,
      input_format: "flac".to_string(),
      output_format: OutputFormat::Mp3,
      output_quality: Quality::Kbps320,
      overwrite: false,
      embed_covers: false,
      cover_name: "folder.jpg".to_string(),
      max_depth: 0,
      dry_run: false,
      verbose: false,
    }
  }

  #[test]
  fn test_needs_embedder_only_for_alac_covers() {
    let mut config = test_config();
    config.embed_covers = true;
    assert!(!config.needs_embedder());

    config.output_format = OutputFormat::Alac;
    assert!(config.needs_embedder());

    config.embed_covers = false;
    assert!(!config.needs_embedder());
  }

  #[test]
  fn test_status_path_under_input() {
    let config = test_config();
    assert_eq!(config.status_path(), Path::new("/music/in").join(STATUS_FILE));
  }

  #[test]
  fn test_embedder_resolved_only_when_needed() {
    let dir = tempfile::TempDir::new().unwrap();
    let ffmpeg = dir.path().join("ffmpeg");
    let parsley = dir.path().join("AtomicParsley");
    std::fs::write(&ffmpeg, "").unwrap();
    std::fs::write(&parsley, "").unwrap();

    let mut config = test_config();
    config.converter = ffmpeg.clone();
    config.embed_covers = true;

    let mp3 = config.clone().resolve_tools(&parsley).unwrap();
    assert_eq!(mp3.converter, ffmpeg);
    assert_eq!(mp3.embedder, None);

    config.output_format = OutputFormat::Alac;
    let alac = config.clone().resolve_tools(&parsley).unwrap();
    assert_eq!(alac.embedder, Some(parsley));

    let missing = config.resolve_tools(&dir.path().join("no-such-embedder"));
    assert!(missing.is_err());
  }

  #[test]
  fn test_invalid_directory_rejected() {
    let err = existing_dir(PathBuf::from("/no/such/dir/anywhere"), "input_location").unwrap_err();
    assert!(err.to_string().contains("input_location is not a valid path"));
  }
}
