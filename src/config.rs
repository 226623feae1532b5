//! Configuration.
//!
//! Everything has a sensible default; the environment can override the poll
//! interval and switch on the debug log:
//! - `CONKIT_DEBUG_LOG`: path of a file to write diagnostic logs to. Unset or
//!   blank disables logging.
//! - `CONKIT_POLL_MS`: how long the key listener waits for input per poll, in
//!   milliseconds.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;
use crate::error::Result;
use crate::term::colors;
use crate::term::Color;

/// Environment variable naming the debug log file.
pub const DEBUG_LOG_VAR: &str = "CONKIT_DEBUG_LOG";

/// Environment variable overriding [`Config::poll_interval`].
pub const POLL_MS_VAR: &str = "CONKIT_POLL_MS";

/// Console-wide settings.
#[derive(Clone, Debug)]
pub struct Config {
  /// How long the key listener waits for input before polling again. This
  /// bounds both idle CPU use and added input latency.
  pub poll_interval: Duration,
  /// Where to write diagnostic logs, if anywhere.
  pub debug_log: Option<PathBuf>,
  /// Color for key labels, headers, and progress fill.
  pub accent: Color,
  /// Color for disabled and otherwise de-emphasized text.
  pub dim: Color,
  /// Glyph drawn between status bar items.
  pub divider: char,
  /// Glyph drawn between the chords of one status bar item.
  pub chord_separator: char,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      poll_interval: Duration::from_millis(10),
      debug_log: None,
      accent: colors::CYAN.into(),
      dim: colors::GRAY.into(),
      divider: '│',
      chord_separator: '/',
    }
  }
}

impl Config {
  /// Loads the defaults, overridden by the process environment.
  pub fn from_env() -> Result<Self> {
    Self::from_lookup(|var| std::env::var(var).ok())
  }

  /// Loads the defaults, overridden by whatever `lookup` returns for each
  /// variable.
  ///
  /// Blank values are treated as unset.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get = |var: &str| {
      lookup(var)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
    };

    let mut config = Self::default();
    config.debug_log = get(DEBUG_LOG_VAR).map(PathBuf::from);
    if let Some(ms) = get(POLL_MS_VAR) {
      let ms = ms
        .parse::<u64>()
        .ok()
        .filter(|&ms| ms > 0)
        .ok_or_else(|| Error::InvalidConfig {
          var: POLL_MS_VAR.to_string(),
          message: format!("expected a positive integer, got `{}`", ms),
        })?;
      config.poll_interval = Duration::from_millis(ms);
    }
    Ok(config)
  }
}
