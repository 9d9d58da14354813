use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
  Mp3,
  Alac,
}

impl OutputFormat {
  /// Extension of the files produced for this format.
  pub const fn extension(self) -> &'static str {
    match self {
      Self::Mp3 => "mp3",
      Self::Alac => "m4a",
    }
  }
}

impl std::str::FromStr for OutputFormat {
  type Err = anyhow::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "mp3" => Ok(Self::Mp3),
      "alac" => Ok(Self::Alac),
      _ => Err(anyhow::anyhow!(
        "Invalid output format '{s}'. Use 'mp3' or 'alac'"
      )),
    }
  }
}

impl fmt::Display for OutputFormat {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match *self {
      Self::Mp3 => write!(f, "mp3"),
      Self::Alac => write!(f, "alac"),
    }
  }
}

/// MP3 bitrate in kbps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
  Kbps128,
  Kbps196,
  Kbps256,
  Kbps320,
}

impl Quality {
  pub const fn kbps(self) -> u32 {
    match self {
      Self::Kbps128 => 128,
      Self::Kbps196 => 196,
      Self::Kbps256 => 256,
      Self::Kbps320 => 320,
    }
  }
}

impl std::str::FromStr for Quality {
  type Err = anyhow::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim_end_matches(['k', 'K']) {
      "128" => Ok(Self::Kbps128),
      "196" => Ok(Self::Kbps196),
      "256" => Ok(Self::Kbps256),
      "320" => Ok(Self::Kbps320),
      _ => Err(anyhow::anyhow!(
        "Invalid quality '{s}'. Use 128, 196, 256 or 320"
      )),
    }
  }
}

impl fmt::Display for Quality {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}k", self.kbps())
  }
}

/// What happens to a single source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  Skip,
  Convert,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_output_format_parse() {
    assert_eq!("mp3".parse::<OutputFormat>().unwrap(), OutputFormat::Mp3);
    assert_eq!("ALAC".parse::<OutputFormat>().unwrap(), OutputFormat::Alac);
    assert!("ogg".parse::<OutputFormat>().is_err());
  }

  #[test]
  fn test_output_format_extension() {
    assert_eq!(OutputFormat::Mp3.extension(), "mp3");
    assert_eq!(OutputFormat::Alac.extension(), "m4a");
  }

  #[test]
  fn test_quality_parse() {
    assert_eq!("320".parse::<Quality>().unwrap().kbps(), 320);
    assert_eq!("196k".parse::<Quality>().unwrap(), Quality::Kbps196);
    assert!("192".parse::<Quality>().is_err());
    assert_eq!(Quality::Kbps128.to_string(), "128k");
  }
}
