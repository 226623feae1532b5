//! Single-assignment results for interactive widgets.
//!
//! Showing a widget hands the caller a [`PendingResult`], and the widget keeps
//! the matching [`Resolver`]. Key handlers resolve it when the user confirms or
//! cancels; an external [`CancellationToken`] can cancel it too, through a
//! watchdog task. Whichever comes first wins, and everything after that is a
//! no-op.

use std::future::Future;
use std::pin::Pin;
use std::task::Context;
use std::task::Poll;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tokio_util::sync::DropGuard;

use crate::console::Console;
use crate::error::Error;
use crate::error::Result;
use crate::ui::StatusItem;

/// Creates a connected [`Resolver`] and [`PendingResult`] pair.
pub fn pending<T>() -> (Resolver<T>, PendingResult<T>) {
  let (tx, rx) = oneshot::channel();
  (Resolver { tx: Some(tx) }, PendingResult { rx })
}

/// The writing half of [`pending()`].
#[derive(Debug)]
pub struct Resolver<T> {
  tx: Option<oneshot::Sender<Result<Option<T>>>>,
}

impl<T> Resolver<T> {
  /// Delivers `outcome`: `Ok(Some(_))` for a result, `Ok(None)` for a
  /// cancellation, or an error.
  ///
  /// Only the first call has any effect; it returns `true`, and every later
  /// call returns `false`.
  pub fn resolve(&mut self, outcome: Result<Option<T>>) -> bool {
    match self.tx.take() {
      Some(tx) => {
        // The caller may have stopped waiting; that is not our problem.
        let _ = tx.send(outcome);
        true
      }
      None => false,
    }
  }

  /// Returns whether [`Resolver::resolve()`] has been called.
  pub fn is_resolved(&self) -> bool {
    self.tx.is_none()
  }
}

/// The reading half of [`pending()`].
///
/// Resolves to whatever the [`Resolver`] delivers. If the resolver is dropped
/// without delivering anything, that counts as a cancellation.
#[derive(Debug)]
#[must_use = "a pending result does nothing unless awaited"]
pub struct PendingResult<T> {
  rx: oneshot::Receiver<Result<Option<T>>>,
}

impl<T> Future for PendingResult<T> {
  type Output = Result<Option<T>>;

  fn poll(
    mut self: Pin<&mut Self>,
    cx: &mut Context<'_>,
  ) -> Poll<Self::Output> {
    Pin::new(&mut self.rx)
      .poll(cx)
      .map(|r| r.unwrap_or(Ok(None)))
  }
}

/// Runs `abort` if `cancel` fires before the returned guard is dropped.
///
/// Requires a tokio runtime to host the watchdog task.
pub fn watchdog(
  cancel: &CancellationToken,
  abort: impl FnOnce() + Send + 'static,
) -> Result<DropGuard> {
  let runtime =
    tokio::runtime::Handle::try_current().map_err(|_| Error::NoRuntime)?;

  let done = CancellationToken::new();
  let stop = done.clone();
  let cancel = cancel.clone();
  runtime.spawn(async move {
    tokio::select! {
      biased;
      _ = stop.cancelled() => {}
      _ = cancel.cancelled() => {
        tracing::debug!("cancellation requested; aborting");
        abort();
      }
    }
  });
  Ok(done.drop_guard())
}

/// The bookkeeping of one `show()` of an interactive widget: the result to
/// deliver, the status bar page to put back, and the watchdog to disarm.
pub(crate) struct Session<T> {
  resolver: Resolver<T>,
  previous: Vec<StatusItem>,
  _watchdog: DropGuard,
}

impl<T> Session<T> {
  /// Arms the watchdog and swaps `page` onto the status bar.
  pub fn begin(
    console: &Console,
    page: Vec<StatusItem>,
    cancel: &CancellationToken,
    abort: impl FnOnce() + Send + 'static,
  ) -> Result<(Self, PendingResult<T>)> {
    let watchdog = watchdog(cancel, abort)?;

    let bar = console.status_bar();
    let previous = bar.take_items();
    match bar.show_items(page) {
      Ok(rejected) if !rejected.is_empty() => {
        tracing::warn!(?rejected, "some widget keys were already bound");
      }
      Ok(_) => {}
      Err(e) => {
        let _ = bar.show_items(previous);
        return Err(e.into());
      }
    }

    let (resolver, pending) = pending();
    let session = Self {
      resolver,
      previous,
      _watchdog: watchdog,
    };
    Ok((session, pending))
  }

  /// Delivers `outcome`, puts the previous status bar page back, and disarms
  /// the watchdog.
  pub fn finish(
    mut self,
    console: &Console,
    outcome: Result<Option<T>>,
  ) -> bool {
    let delivered = self.resolver.resolve(outcome);
    if let Err(e) = console.status_bar().show_items(self.previous) {
      tracing::warn!(error = %e, "failed to restore status bar");
    }
    delivered
  }
}

/// Runs an abort action when dropped, unless disarmed first. `show()` holds
/// one while it waits, so dropping its future closes the widget.
pub(crate) struct AbortOnDrop<F: FnOnce()> {
  abort: Option<F>,
}

impl<F: FnOnce()> AbortOnDrop<F> {
  pub fn new(abort: F) -> Self {
    Self { abort: Some(abort) }
  }

  pub fn disarm(mut self) {
    self.abort = None;
  }
}

impl<F: FnOnce()> Drop for AbortOnDrop<F> {
  fn drop(&mut self) {
    if let Some(abort) = self.abort.take() {
      abort();
    }
  }
}
