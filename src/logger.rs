//! Diagnostic sinks consumed by the allocator.
//!
//! The allocator never reads anything back from its logger: swapping in
//! [`NoopLogger`] changes what gets printed and nothing else.

use std::{fmt, str::FromStr};

use crate::error::ParseLogLevelError;

const ANSI_COLOR_RED: &str = "\x1b[31m";
const ANSI_COLOR_RESET: &str = "\x1b[0m";

/// Severity of a diagnostic, ordered `None < Error < Warn < Info`.
///
/// A logger configured at some level emits every message at that level or
/// below it, so `Info` is the most verbose and `None` silences everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LogLevel {
  None,
  #[default]
  Error,
  Warn,
  Info,
}

impl LogLevel {
  pub const fn as_str(self) -> &'static str {
    match self {
      LogLevel::None => "NONE",
      LogLevel::Error => "ERROR",
      LogLevel::Warn => "WARN",
      LogLevel::Info => "INFO",
    }
  }
}

impl fmt::Display for LogLevel {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for LogLevel {
  type Err = ParseLogLevelError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "none" | "off" => Ok(LogLevel::None),
      "error" => Ok(LogLevel::Error),
      "warn" | "warning" => Ok(LogLevel::Warn),
      "info" => Ok(LogLevel::Info),
      _ => Err(ParseLogLevelError(s.to_owned())),
    }
  }
}

/// Renders `bits` as a 64 digit binary string, most significant bit first.
pub fn bit_string(bits: u64) -> String {
  format!("{bits:064b}")
}

/// One-way diagnostic channel.
pub trait Logger {
  /// Returns `true` when messages at `level` would be emitted.
  fn enabled(
    &self,
    level: LogLevel,
  ) -> bool;

  fn log(
    &self,
    level: LogLevel,
    args: fmt::Arguments<'_>,
  );

  /// Logs `message` followed by `bits` rendered as a binary string.
  fn log_bits(
    &self,
    level: LogLevel,
    message: &str,
    bits: u64,
  ) {
    if self.enabled(level) {
      self.log(level, format_args!("{}{}", message, bit_string(bits)));
    }
  }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
  fn enabled(
    &self,
    _level: LogLevel,
  ) -> bool {
    false
  }

  fn log(
    &self,
    _level: LogLevel,
    _args: fmt::Arguments<'_>,
  ) {
  }
}

/// Prints to stdout, errors in red.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleLogger {
  level: LogLevel,
}

impl ConsoleLogger {
  pub fn new(level: LogLevel) -> Self {
    Self { level }
  }

  pub fn level(&self) -> LogLevel {
    self.level
  }
}

impl Logger for ConsoleLogger {
  fn enabled(
    &self,
    level: LogLevel,
  ) -> bool {
    level != LogLevel::None && level <= self.level
  }

  fn log(
    &self,
    level: LogLevel,
    args: fmt::Arguments<'_>,
  ) {
    if !self.enabled(level) {
      return;
    }

    if level == LogLevel::Error {
      println!("{ANSI_COLOR_RED}{args}{ANSI_COLOR_RESET}");
    } else {
      println!("{args}");
    }
  }
}

/// Forwards to the [`log`] crate so the embedding application picks the backend.
///
/// `level` is an additional ceiling applied before the `log` crate's own
/// max-level filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFacade {
  level: LogLevel,
}

impl LogFacade {
  pub fn new(level: LogLevel) -> Self {
    Self { level }
  }

  fn target_level(level: LogLevel) -> Option<log::Level> {
    match level {
      LogLevel::None => None,
      LogLevel::Error => Some(log::Level::Error),
      LogLevel::Warn => Some(log::Level::Warn),
      LogLevel::Info => Some(log::Level::Info),
    }
  }
}

impl Logger for LogFacade {
  fn enabled(
    &self,
    level: LogLevel,
  ) -> bool {
    match Self::target_level(level) {
      Some(target) => level <= self.level && log::log_enabled!(target),
      None => false,
    }
  }

  fn log(
    &self,
    level: LogLevel,
    args: fmt::Arguments<'_>,
  ) {
    if level > self.level {
      return;
    }

    match level {
      LogLevel::None => {}
      LogLevel::Error => log::error!("{args}"),
      LogLevel::Warn => log::warn!("{args}"),
      LogLevel::Info => log::info!("{args}"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_level_ordering() {
    assert!(LogLevel::None < LogLevel::Error);
    assert!(LogLevel::Error < LogLevel::Warn);
    assert!(LogLevel::Warn < LogLevel::Info);
  }

  #[test]
  fn test_level_parsing() {
    assert_eq!("INFO".parse::<LogLevel>(), Ok(LogLevel::Info));
    assert_eq!(" warn ".parse::<LogLevel>(), Ok(LogLevel::Warn));
    assert_eq!("off".parse::<LogLevel>(), Ok(LogLevel::None));

    let err = "verbose".parse::<LogLevel>().unwrap_err();
    assert_eq!(err, ParseLogLevelError("verbose".to_owned()));
    assert_eq!(err.to_string(), "unknown log level `verbose`");

    for level in [LogLevel::None, LogLevel::Error, LogLevel::Warn, LogLevel::Info] {
      assert_eq!(level.to_string().parse::<LogLevel>(), Ok(level));
    }
  }

  #[test]
  fn test_bit_string() {
    let rendered = bit_string(0b1011);

    assert_eq!(rendered.len(), 64);
    assert!(rendered.ends_with("1011"));
    assert!(rendered[..60].chars().all(|c| c == '0'));
    assert_eq!(bit_string(u64::MAX), "1".repeat(64));
  }

  #[test]
  fn test_console_filtering() {
    let logger = ConsoleLogger::new(LogLevel::Warn);

    assert!(logger.enabled(LogLevel::Error));
    assert!(logger.enabled(LogLevel::Warn));
    assert!(!logger.enabled(LogLevel::Info));
    assert!(!logger.enabled(LogLevel::None));

    assert!(!ConsoleLogger::new(LogLevel::None).enabled(LogLevel::Error));
    assert!(!NoopLogger.enabled(LogLevel::Error));
  }
}
