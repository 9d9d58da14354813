use colored::Colorize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
  pub directories: usize,
  pub converted: usize,
  pub skipped: usize,
  pub failed: usize,
}

pub struct Stats {
  directories: AtomicUsize,
  converted: AtomicUsize,
  skipped: AtomicUsize,
  failed: AtomicUsize,
  start_time: Instant,
}

impl Stats {
  pub fn new() -> Self {
    Self {
      directories: AtomicUsize::new(0),
      converted: AtomicUsize::new(0),
      skipped: AtomicUsize::new(0),
      failed: AtomicUsize::new(0),
      start_time: Instant::now(),
    }
  }

  pub fn inc_directories(&self) {
    self.directories.fetch_add(1, Ordering::Relaxed);
  }

  pub fn inc_converted(&self) {
    self.converted.fetch_add(1, Ordering::Relaxed);
  }

  pub fn inc_skipped(&self) {
    self.skipped.fetch_add(1, Ordering::Relaxed);
  }

  pub fn inc_failed(&self) {
    self.failed.fetch_add(1, Ordering::Relaxed);
  }

  pub fn counts(&self) -> Counts {
    Counts {
      directories: self.directories.load(Ordering::Relaxed),
      converted: self.converted.load(Ordering::Relaxed),
      skipped: self.skipped.load(Ordering::Relaxed),
      failed: self.failed.load(Ordering::Relaxed),
    }
  }

  pub fn print_summary(&self) {
    let elapsed = self.start_time.elapsed();
    let counts = self.counts();

    println!("\n{}", "========================================".cyan());
    println!("{} {:.1?}", "✓ Completed in".green().bold(), elapsed);
    println!(
      "{} {} | {} {} | {} {} | {} {}",
      "Directories:".cyan(),
      counts.directories,
      "Converted:".green(),
      counts.converted,
      "Skipped:".yellow(),
      counts.skipped,
      "Failed:".red(),
      counts.failed
    );
    println!("{}", "========================================".cyan());
  }
}
