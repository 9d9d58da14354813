//! Interruption signals that trigger cleanup of the in-progress file.

use anyhow::{Context, Result};

#[cfg(unix)]
pub struct Interrupts {
  terminate: tokio::signal::unix::Signal,
  interrupt: tokio::signal::unix::Signal,
  hangup: tokio::signal::unix::Signal,
  quit: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Interrupts {
  pub fn register() -> Result<Self> {
    use tokio::signal::unix::{SignalKind, signal};

    Ok(Self {
      terminate: signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?,
      interrupt: signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?,
      hangup: signal(SignalKind::hangup()).context("Failed to install SIGHUP handler")?,
      quit: signal(SignalKind::quit()).context("Failed to install SIGQUIT handler")?,
    })
  }

  /// Waits for the first signal and returns its name.
  pub async fn recv(&mut self) -> &'static str {
    tokio::select! {
      _ = self.terminate.recv() => "SIGTERM",
      _ = self.interrupt.recv() => "SIGINT",
      _ = self.hangup.recv() => "SIGHUP",
      _ = self.quit.recv() => "SIGQUIT",
    }
  }
}

#[cfg(not(unix))]
pub struct Interrupts;

#[cfg(not(unix))]
impl Interrupts {
  pub fn register() -> Result<Self> {
    Ok(Self)
  }

  pub async fn recv(&mut self) -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
      tracing::error!("Failed to listen for Ctrl+C: {e}");
      std::future::pending::<()>().await;
    }
    "Ctrl+C"
  }
}

#[cfg(all(test, unix))]
mod tests {
  use super::*;
  use serial_test::serial;

  #[tokio::test]
  #[serial]
  async fn test_hangup_is_reported() {
    let mut interrupts = Interrupts::register().unwrap();

    let status = std::process::Command::new("kill")
      .args(["-HUP", &std::process::id().to_string()])
      .status()
      .unwrap();
    assert!(status.success());

    let signal = tokio::time::timeout(std::time::Duration::from_secs(5), interrupts.recv())
      .await
      .unwrap();
    assert_eq!(signal, "SIGHUP");
  }
}
