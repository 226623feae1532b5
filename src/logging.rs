//! Diagnostic logging.
//!
//! The terminal is in raw mode while a console is up, so logs never go to
//! stdout or stderr. When [`Config::debug_log`] names a file, [`init()`]
//! routes `tracing` events there through a background writer; otherwise
//! logging stays off.
//!
//! Filtering follows `RUST_LOG`, defaulting to `conkit=debug`.

use std::path::Path;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Keeps the background log writer alive; logs written after this is dropped
/// may be lost.
pub struct LogGuard {
  _guard: WorkerGuard,
  path: PathBuf,
}

impl LogGuard {
  /// Returns the file being logged to.
  pub fn path(&self) -> &Path {
    &self.path
  }
}

/// Installs the global `tracing` subscriber, if `config` asks for a debug
/// log.
///
/// Returns `None` if logging is disabled, the log file's directory cannot be
/// created, or another subscriber is already installed.
pub fn init(config: &Config) -> Option<LogGuard> {
  let path = config.debug_log.clone()?;
  let dir = match path.parent() {
    Some(d) if !d.as_os_str().is_empty() => d.to_path_buf(),
    _ => PathBuf::from("."),
  };
  let file = path.file_name()?.to_owned();
  std::fs::create_dir_all(&dir).ok()?;

  let appender = tracing_appender::rolling::never(&dir, file);
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new("conkit=debug"));

  let subscriber = tracing_subscriber::registry().with(filter).with(
    tracing_subscriber::fmt::layer()
      .with_writer(writer)
      .with_ansi(false)
      .with_target(true)
      .with_thread_names(true),
  );
  if subscriber.try_init().is_err() {
    return None;
  }

  tracing::info!(path = %path.display(), "debug log opened");
  Some(LogGuard {
    _guard: guard,
    path,
  })
}
