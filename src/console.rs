//! The console context.
//!
//! A [`Console`] bundles everything the widgets share: the [`Screen`] they draw
//! on, the [`BindingRegistry`] their key handlers live in, the status bar, and
//! line input. It is a cheap handle; clones refer to the same console, which is
//! how key handlers get at it.
//!
//! Nothing stops two interactive widgets from being shown on the same console
//! at once, but they would fight over the status bar and the cursor. Show one
//! at a time.

use std::io;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::Result;
use crate::geo::Region;
use crate::geo::ScreenPoint;
use crate::input::line::LineEffect;
use crate::input::line::LineInput;
use crate::input::line::ReadId;
use crate::input::listener;
use crate::input::BindingRegistry;
use crate::input::Handler;
use crate::input::KeyChord;
use crate::input::KeyListener;
use crate::term::KeyEvent;
use crate::term::KeySource;
use crate::term::Screen;
use crate::ui::status::StatusState;
use crate::ui::StatusBar;

/// A shared handle to a terminal and its key bindings.
#[derive(Clone)]
pub struct Console {
  inner: Arc<Inner>,
}

struct Inner {
  screen: Mutex<Box<dyn Screen>>,
  registry: BindingRegistry,
  line: LineInput,
  status: Mutex<StatusState>,
  config: Config,
}

impl Console {
  /// Creates a new `Console` drawing on `screen`, with the status bar on the
  /// bottom row.
  pub fn new(
    screen: impl Screen + 'static,
    config: Config,
  ) -> io::Result<Self> {
    let (cols, rows) = screen.size()?;
    let bar = Region::line(ScreenPoint::new(0, rows.saturating_sub(1)), cols);
    Ok(Self::with_status_region(screen, config, bar))
  }

  /// Creates a new `Console` drawing on `screen`, with the status bar in
  /// `bar`.
  pub fn with_status_region(
    screen: impl Screen + 'static,
    config: Config,
    bar: Region,
  ) -> Self {
    Self {
      inner: Arc::new(Inner {
        screen: Mutex::new(Box::new(screen)),
        registry: BindingRegistry::new(),
        line: LineInput::new(),
        status: Mutex::new(StatusState::new(bar)),
        config,
      }),
    }
  }

  /// Locks the screen for drawing.
  ///
  /// Hold the lock only for as long as it takes to draw; the key listener
  /// needs it to echo line input.
  pub fn screen(&self) -> MutexGuard<'_, Box<dyn Screen>> {
    self
      .inner
      .screen
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
  }

  /// Returns the key binding table.
  pub fn registry(&self) -> &BindingRegistry {
    &self.inner.registry
  }

  /// Returns a handle to the status bar.
  pub fn status_bar(&self) -> StatusBar {
    StatusBar::new(self.clone())
  }

  pub(crate) fn status_state(&self) -> MutexGuard<'_, StatusState> {
    self
      .inner
      .status
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
  }

  /// Returns the configuration this console was created with.
  pub fn config(&self) -> &Config {
    &self.inner.config
  }

  /// Creates a stopped [`KeyListener`] feeding this console from `keys`.
  pub fn listener(&self, keys: impl KeySource + 'static) -> KeyListener {
    KeyListener::new(self.clone(), keys)
  }

  /// Reads a line of text at the current cursor position.
  ///
  /// Until Enter is pressed, every key without Ctrl goes to the line (typed
  /// characters are echoed, Backspace deletes); Ctrl chords are still
  /// dispatched. Returns `None` if Esc is pressed or `cancel` fires first.
  /// Dropping the future ends the read as if it had been canceled.
  ///
  /// Requires a running [`KeyListener`] (or keys fed through
  /// [`Console::press()`]) to make progress.
  pub async fn read_line(
    &self,
    cancel: &CancellationToken,
  ) -> Result<Option<String>> {
    let (id, rx) = self.begin_line(None)?;
    let _read = EndRead { console: self, id };
    tokio::select! {
      line = rx => Ok(line.unwrap_or(None)),
      _ = cancel.cancelled() => Ok(None),
    }
  }

  /// Starts reading a line of at most `max` characters, for widgets that
  /// manage the read themselves.
  pub(crate) fn begin_line(
    &self,
    max: Option<usize>,
  ) -> Result<(ReadId, oneshot::Receiver<Option<String>>)> {
    let (id, rx) = self.inner.line.begin(max)?;
    tracing::trace!(id, ?max, "line input started");
    Ok((id, rx))
  }

  /// Ends read `id` with no line. Returns `false` if it already ended.
  pub(crate) fn end_line(&self, id: ReadId) -> bool {
    self.inner.line.cancel(id)
  }

  /// Returns whether a [`Console::read_line()`] is waiting for input.
  pub fn is_reading_line(&self) -> bool {
    self.inner.line.is_active()
  }

  /// Routes one key press: to the line being read if it takes the key,
  /// otherwise to the handler bound to its chord, which is returned for
  /// dispatch.
  pub(crate) fn route(&self, event: KeyEvent) -> Option<(KeyChord, Handler)> {
    if self.feed_line(event) {
      return None;
    }
    self.lookup(event)
  }

  /// Feeds `event` to line input, echoing it. Returns whether the line took
  /// the key.
  fn feed_line(&self, event: KeyEvent) -> bool {
    match self.inner.line.feed(event) {
      LineEffect::Inactive => false,
      effect => {
        if let Err(e) = self.echo(effect) {
          tracing::warn!(error = %e, "line echo failed");
        }
        true
      }
    }
  }

  fn lookup(&self, event: KeyEvent) -> Option<(KeyChord, Handler)> {
    let chord = KeyChord::from(event);
    match self.inner.registry.handler(chord) {
      Some(handler) => {
        tracing::debug!(%chord, "dispatching");
        Some((chord, handler))
      }
      None => {
        tracing::trace!(%chord, "unbound; ignored");
        None
      }
    }
  }

  fn echo(&self, effect: LineEffect) -> io::Result<()> {
    let mut screen = self.screen();
    match effect {
      LineEffect::Echo(c) => screen.print(c.encode_utf8(&mut [0; 4]))?,
      LineEffect::Erase => {
        let back = screen.cursor().offset(-1, 0);
        screen.print_at(back, " ")?;
        screen.move_to(back)?;
      }
      _ => return Ok(()),
    }
    screen.flush()
  }

  /// Handles a key press inline, as if the listener had read it, and waits for
  /// its handler to finish.
  ///
  /// Returns `false` if the key was neither taken by line input nor bound.
  pub async fn press(&self, event: KeyEvent) -> bool {
    if self.feed_line(event) {
      return true;
    }
    match self.lookup(event) {
      Some((chord, handler)) => {
        listener::invoke(chord, &handler).await;
        true
      }
      None => false,
    }
  }

  /// Presses `chord`; see [`Console::press()`].
  pub async fn dispatch(&self, chord: KeyChord) -> bool {
    self.press(chord.to_event()).await
  }
}

/// Ends a [`Console::read_line()`] whose future goes away before the line
/// is done.
struct EndRead<'a> {
  console: &'a Console,
  id: ReadId,
}

impl Drop for EndRead<'_> {
  fn drop(&mut self) {
    if self.console.end_line(self.id) {
      tracing::debug!(id = self.id, "line read dropped");
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::AtomicUsize;
  use std::sync::atomic::Ordering;
  use std::time::Duration;

  use pretty_assertions::assert_eq;

  use super::*;
  use crate::error::Error;
  use crate::input::sync_handler;
  use crate::term::headless::MemScreen;

  #[test]
  fn status_bar_defaults_to_bottom_row() {
    let console =
      Console::new(MemScreen::new(30, 8), Config::default()).unwrap();
    assert_eq!(
      console.status_bar().region(),
      Region::line(ScreenPoint::new(0, 7), 30)
    );
  }

  #[tokio::test]
  async fn dispatch_runs_bound_handler() {
    let console =
      Console::new(MemScreen::new(10, 2), Config::default()).unwrap();
    let hit = Arc::new(Mutex::new(None));
    {
      let hit = Arc::clone(&hit);
      console.registry().register(
        KeyChord::ctrl('k'),
        sync_handler(move |c| *hit.lock().unwrap() = Some(c)),
      );
    }
    assert!(console.dispatch(KeyChord::ctrl('k')).await);
    assert!(!console.dispatch(KeyChord::ctrl('j')).await);
    assert_eq!(*hit.lock().unwrap(), Some(KeyChord::ctrl('k')));
  }

  #[tokio::test]
  async fn read_line_echoes_and_erases() {
    let screen = MemScreen::new(20, 2);
    let console = Console::new(screen.clone(), Config::default()).unwrap();
    console.screen().move_to(ScreenPoint::new(2, 0)).unwrap();

    let reader = {
      let console = console.clone();
      tokio::spawn(async move {
        console.read_line(&CancellationToken::new()).await
      })
    };
    while !console.is_reading_line() {
      tokio::task::yield_now().await;
    }
    for c in "hey".chars() {
      console.dispatch(KeyChord::char(c)).await;
    }
    console.dispatch(KeyChord::BACKSPACE).await;
    assert_eq!(screen.row_text(0).trim_end(), "  he");
    console.dispatch(KeyChord::ENTER).await;

    let line = reader.await.unwrap().unwrap();
    assert_eq!(line.as_deref(), Some("he"));
  }

  #[tokio::test]
  async fn read_line_cancels() {
    let console =
      Console::new(MemScreen::new(20, 2), Config::default()).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();
    assert_eq!(console.read_line(&cancel).await.unwrap(), None);
    assert!(!console.is_reading_line());
  }

  fn counter(console: &Console, chord: KeyChord) -> Arc<AtomicUsize> {
    let hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&hits);
    console.registry().register(
      chord,
      sync_handler(move |_| {
        h.fetch_add(1, Ordering::SeqCst);
      }),
    );
    hits
  }

  #[tokio::test]
  async fn dropped_read_line_releases_keys() {
    let console =
      Console::new(MemScreen::new(20, 2), Config::default()).unwrap();
    let hits = counter(&console, KeyChord::char('q'));

    let token = CancellationToken::new();
    let read = console.read_line(&token);
    let timed_out = tokio::time::timeout(Duration::from_millis(20), read)
      .await
      .is_err();
    assert!(timed_out);
    assert!(!console.is_reading_line());

    assert!(console.dispatch(KeyChord::char('q')).await);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    let cancel = CancellationToken::new();
    cancel.cancel();
    assert!(!matches!(
      console.read_line(&cancel).await,
      Err(Error::LineInputBusy)
    ));
  }

  #[tokio::test]
  async fn ctrl_chords_dispatch_while_reading() {
    let screen = MemScreen::new(20, 2);
    let console = Console::new(screen.clone(), Config::default()).unwrap();
    let hits = counter(&console, KeyChord::ctrl('k'));
    let plain = counter(&console, KeyChord::char('a'));

    let reader = {
      let console = console.clone();
      tokio::spawn(async move {
        console.read_line(&CancellationToken::new()).await
      })
    };
    while !console.is_reading_line() {
      tokio::task::yield_now().await;
    }
    assert!(console.dispatch(KeyChord::char('a')).await);
    assert!(console.dispatch(KeyChord::ctrl('k')).await);
    assert!(!console.dispatch(KeyChord::ctrl('j')).await);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(plain.load(Ordering::SeqCst), 0);
    assert_eq!(screen.row_text(0).trim_end(), "a");

    console.dispatch(KeyChord::ENTER).await;
    let line = reader.await.unwrap().unwrap();
    assert_eq!(line.as_deref(), Some("a"));
  }
}
