//! Error types.

use std::io;

/// A boxed error, as returned by menu entry actions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced by `conkit`.
///
/// Conditions that a caller is expected to recover from routinely, such as
/// binding an already-bound chord, are reported through `bool` returns instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// Writing to or reading from the terminal failed.
  #[error("terminal I/O failed: {0}")]
  Io(#[from] io::Error),

  /// `show()` was called on a widget that is already being shown.
  #[error("widget is already shown")]
  AlreadyShown,

  /// A line read was requested while another one was still in progress.
  #[error("another line input is already in progress")]
  LineInputBusy,

  /// A menu was built with no entry that could ever be selected.
  #[error("menu has no selectable entries")]
  NoSelectableEntries,

  /// The action attached to a menu entry failed.
  #[error("menu action failed: {0}")]
  Action(#[source] BoxError),

  /// A key chord could not be parsed.
  #[error("invalid key chord `{0}`")]
  InvalidChord(String),

  /// A configuration value could not be used.
  #[error("invalid value for {var}: {message}")]
  InvalidConfig {
    /// The variable that held the value.
    var: String,
    /// What was wrong with it.
    message: String,
  },

  /// A component that spawns tasks was started outside a tokio runtime.
  #[error("no tokio runtime is running")]
  NoRuntime,
}

/// A `Result` whose error is [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
