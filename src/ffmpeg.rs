use crate::config::Config;
use crate::error::ConversionError;
use crate::types::OutputFormat;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, trace};

/// Encoder options shared by every file of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderOptions {
  args: Vec<String>,
  extension: &'static str,
}

impl EncoderOptions {
  pub fn compile(config: &Config) -> Self {
    let mut args = Vec::new();

    args.push(if config.overwrite { "-y" } else { "-n" }.to_string());

    match config.output_format {
      OutputFormat::Mp3 => {
        args.extend([
          "-ab".to_string(),
          config.output_quality.to_string(),
          "-acodec".to_string(),
          "mp3".to_string(),
        ]);
      }
      OutputFormat::Alac => {
        args.extend(["-acodec".to_string(), "alac".to_string()]);
      }
    }

    Self {
      args,
      extension: config.output_format.extension(),
    }
  }

  pub fn args(&self) -> &[String] {
    &self.args
  }

  pub const fn extension(&self) -> &'static str {
    self.extension
  }
}

/// Runs the converter and the cover embedder for single files.
pub struct FFmpeg {
  converter: PathBuf,
  embedder: Option<PathBuf>,
  options: EncoderOptions,
  verbose: bool,
}

impl FFmpeg {
  pub fn new(config: &Config) -> Self {
    Self {
      converter: config.converter.clone(),
      embedder: config.embedder.clone(),
      options: EncoderOptions::compile(config),
      verbose: config.verbose,
    }
  }

  pub const fn options(&self) -> &EncoderOptions {
    &self.options
  }

  pub async fn convert(&self, input: &Path, output: &Path) -> Result<(), ConversionError> {
    let mut cmd = Command::new(&self.converter);
    cmd
      .arg("-i")
      .arg(input)
      .args(self.options.args())
      .arg(output);

    debug!("Converting {} -> {}", input.display(), output.display());
    self.run(&self.converter, cmd).await
  }

  /// Muxes `cover` into `output` as the front cover, reading audio from `audio`.
  pub async fn attach_cover(
    &self,
    audio: &Path,
    cover: &Path,
    output: &Path,
  ) -> Result<(), ConversionError> {
    let mut cmd = Command::new(&self.converter);
    cmd
      .arg("-i")
      .arg(audio)
      .arg("-i")
      .arg(cover)
      .args([
        "-c",
        "copy",
        "-map",
        "0",
        "-map",
        "1",
        "-metadata:s:v",
        "title=Album cover",
        "-metadata:s:v",
        "comment=Cover (Front)",
      ])
      .arg(output);

    debug!("Attaching cover {} to {}", cover.display(), output.display());
    self.run(&self.converter, cmd).await
  }

  /// Writes `cover` into an existing m4a file in place.
  pub async fn embed_artwork(&self, target: &Path, cover: &Path) -> Result<(), ConversionError> {
    let Some(embedder) = self.embedder.as_ref() else {
      return Err(ConversionError::NoEmbedder);
    };

    let mut cmd = Command::new(embedder);
    cmd
      .arg(target)
      .arg("--artwork")
      .arg(cover)
      .arg("--overWrite");

    debug!("Embedding artwork {} into {}", cover.display(), target.display());
    self.run(embedder, cmd).await
  }

  async fn run(&self, tool: &Path, mut cmd: Command) -> Result<(), ConversionError> {
    cmd.stdin(Stdio::null()).kill_on_drop(true);

    if !self.verbose {
      cmd.stdout(Stdio::null());
      cmd.stderr(Stdio::null());
    }

    trace!("Running {:?}", cmd.as_std());
    let status = cmd.status().await.map_err(|source| ConversionError::Spawn {
      tool: tool.to_path_buf(),
      source,
    })?;

    if !status.success() {
      return Err(ConversionError::Failed {
        tool: tool.to_path_buf(),
        status,
      });
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::tests::test_config;
  use crate::types::Quality;

  #[test]
  fn test_compile_mp3() {
    let mut config = test_config();
    config.output_quality = Quality::Kbps196;

    let options = EncoderOptions::compile(&config);

    assert_eq!(options.args(), ["-n", "-ab", "196k", "-acodec", "mp3"]);
    assert_eq!(options.extension(), "mp3");
  }

  #[test]
  fn test_compile_alac_ignores_quality() {
    let mut config = test_config();
    config.output_format = OutputFormat::Alac;

    let options = EncoderOptions::compile(&config);

    assert_eq!(options.args(), ["-n", "-acodec", "alac"]);
    assert_eq!(options.extension(), "m4a");
  }

  #[tokio::test]
  async fn test_embed_artwork_without_embedder_fails() {
    let ffmpeg = FFmpeg::new(&test_config());

    let result = ffmpeg
      .embed_artwork(Path::new("/out/track1.m4a"), Path::new("/in/folder.jpg"))
      .await;

    assert!(matches!(result, Err(ConversionError::NoEmbedder)));
  }

  #[test]
  fn test_compile_overwrite() {
    let mut config = test_config();
    config.overwrite = true;

    let options = EncoderOptions::compile(&config);

    assert_eq!(options.args()[0], "-y");
    assert!(!options.args().contains(&"-n".to_string()));
  }
}
