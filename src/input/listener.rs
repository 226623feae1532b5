//! The key listener loop.

use std::io;
use std::panic::AssertUnwindSafe;
use std::thread;

use futures::FutureExt as _;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::console::Console;
use crate::error::Error;
use crate::error::Result;
use crate::input::Handler;
use crate::input::KeyChord;
use crate::term::KeySource;

type Dispatch = (KeyChord, Handler);

/// A background loop turning key presses into handler invocations.
///
/// The listener owns a [`KeySource`] and polls it on a dedicated thread. Each
/// key is offered to the console's line input first; if no line is being read,
/// it is resolved to a [`KeyChord`] and looked up in the
/// [`crate::input::BindingRegistry`]. Keys with no binding are discarded.
///
/// Handlers are not run on the polling thread. They are queued, in arrival
/// order, for a single dispatcher task that awaits each one before starting
/// the next, so no two handlers ever overlap. Because of this, a handler must
/// not await an interactive widget's result itself (the keys that would
/// resolve it could never be dispatched); spawn a task for that instead.
///
/// A handler that panics is logged and skipped; the loop keeps running.
pub struct KeyListener {
  console: Console,
  source: Option<Box<dyn KeySource>>,
  running: Option<Running>,
}

struct Running {
  cancel: CancellationToken,
  thread: thread::JoinHandle<Box<dyn KeySource>>,
}

impl KeyListener {
  /// Creates a new, stopped `KeyListener` reading from `source`.
  pub fn new(console: Console, source: impl KeySource + 'static) -> Self {
    Self {
      console,
      source: Some(Box::new(source)),
      running: None,
    }
  }

  /// Returns whether the polling loop is running.
  pub fn is_running(&self) -> bool {
    self.running.is_some()
  }

  /// Starts the polling loop and its dispatcher task.
  ///
  /// Does nothing if the loop is already running. Must be called from within
  /// a tokio runtime, which will host the dispatcher.
  pub fn start(&mut self) -> Result<()> {
    if self.running.is_some() {
      return Ok(());
    }

    let runtime =
      tokio::runtime::Handle::try_current().map_err(|_| Error::NoRuntime)?;
    let source = self.source.take().ok_or_else(|| {
      io::Error::new(io::ErrorKind::Other, "key source was lost")
    })?;

    let (tx, rx) = mpsc::unbounded_channel();
    runtime.spawn(dispatch(rx));

    let cancel = CancellationToken::new();
    let thread = thread::Builder::new().name("conkit-keys".into()).spawn({
      let console = self.console.clone();
      let cancel = cancel.clone();
      move || listen(source, console, cancel, tx)
    })?;

    self.running = Some(Running { cancel, thread });
    Ok(())
  }

  /// Stops the polling loop, blocking until the thread has exited.
  ///
  /// The wait is bounded by one poll interval. Handlers already queued still
  /// run. Does nothing if the loop is not running.
  pub fn stop(&mut self) {
    let running = match self.running.take() {
      Some(r) => r,
      None => return,
    };

    running.cancel.cancel();
    match running.thread.join() {
      Ok(source) => self.source = Some(source),
      Err(_) => tracing::error!("key listener thread panicked"),
    }
  }
}

impl Drop for KeyListener {
  fn drop(&mut self) {
    self.stop();
  }
}

fn listen(
  mut source: Box<dyn KeySource>,
  console: Console,
  cancel: CancellationToken,
  tx: mpsc::UnboundedSender<Dispatch>,
) -> Box<dyn KeySource> {
  let poll = console.config().poll_interval;
  tracing::debug!(?poll, "key listener started");

  while !cancel.is_cancelled() {
    // `poll_key()` waits out the interval itself when nothing is pending.
    let event = match source.poll_key(poll) {
      Ok(Some(e)) => e,
      Ok(None) => continue,
      Err(e) => {
        tracing::warn!(error = %e, "key poll failed");
        thread::sleep(poll);
        continue;
      }
    };

    tracing::trace!(code = ?event.code, mods = ?event.modifiers, "raw key");
    if let Some(d) = console.route(event) {
      if tx.send(d).is_err() {
        tracing::warn!("key dispatcher is gone; dropping key");
      }
    }
  }

  tracing::debug!("key listener stopped");
  source
}

async fn dispatch(mut rx: mpsc::UnboundedReceiver<Dispatch>) {
  while let Some((chord, handler)) = rx.recv().await {
    invoke(chord, &handler).await;
  }
}

/// Runs `handler` for `chord`, containing any panic.
pub(crate) async fn invoke(chord: KeyChord, handler: &Handler) {
  let run = AssertUnwindSafe(async { handler(chord).await }).catch_unwind();
  if run.await.is_err() {
    tracing::error!(%chord, "key handler panicked");
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::AtomicUsize;
  use std::sync::atomic::Ordering;
  use std::sync::Arc;
  use std::time::Duration;

  use tokio::sync::Notify;

  use super::*;
  use crate::input::sync_handler;
  use crate::term::headless;
  use crate::term::headless::MemScreen;
  use crate::Config;

  fn console() -> Console {
    Console::new(MemScreen::new(40, 10), Config::default()).unwrap()
  }

  #[tokio::test]
  async fn stop_before_start_is_a_noop() {
    let (_feed, keys) = headless::scripted();
    let mut listener = KeyListener::new(console(), keys);
    listener.stop();
    assert!(!listener.is_running());
  }

  #[tokio::test]
  async fn start_is_idempotent_and_restartable() {
    let (_feed, keys) = headless::scripted();
    let mut listener = KeyListener::new(console(), keys);
    listener.start().unwrap();
    listener.start().unwrap();
    assert!(listener.is_running());
    listener.stop();
    assert!(!listener.is_running());
    listener.start().unwrap();
    assert!(listener.is_running());
    listener.stop();
  }

  #[test]
  fn start_needs_a_runtime() {
    let (_feed, keys) = headless::scripted();
    let mut listener = KeyListener::new(console(), keys);
    assert!(matches!(listener.start(), Err(Error::NoRuntime)));
  }

  #[tokio::test]
  async fn dispatches_in_order_and_survives_panics() {
    let console = console();
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let done = Arc::new(Notify::new());

    console.registry().register(
      KeyChord::char('p'),
      sync_handler(|_| panic!("handler failure")),
    );
    for c in "abc".chars() {
      let seen = Arc::clone(&seen);
      let done = Arc::clone(&done);
      console.registry().register(
        KeyChord::char(c),
        sync_handler(move |chord| {
          seen.lock().unwrap().push(chord);
          if chord == KeyChord::char('c') {
            done.notify_one();
          }
        }),
      );
    }

    let (feed, keys) = headless::scripted();
    let mut listener = console.listener(keys);
    listener.start().unwrap();
    // Unbound keys are dropped silently.
    feed.type_str("zpabc");

    tokio::time::timeout(Duration::from_secs(5), done.notified())
      .await
      .expect("handlers never ran");
    listener.stop();

    assert_eq!(
      *seen.lock().unwrap(),
      vec![KeyChord::char('a'), KeyChord::char('b'), KeyChord::char('c')]
    );
  }

  #[tokio::test]
  async fn line_input_captures_keys() {
    let console = console();
    let hits = Arc::new(AtomicUsize::new(0));
    {
      let hits = Arc::clone(&hits);
      console.registry().register(
        KeyChord::char('a'),
        sync_handler(move |_| {
          hits.fetch_add(1, Ordering::SeqCst);
        }),
      );
    }

    let (feed, keys) = headless::scripted();
    let mut listener = console.listener(keys);
    listener.start().unwrap();

    let reader = {
      let console = console.clone();
      tokio::spawn(async move {
        console.read_line(&CancellationToken::new()).await
      })
    };
    while !console.is_reading_line() {
      tokio::task::yield_now().await;
    }
    feed.type_str("abc");
    feed.press(KeyChord::ENTER);

    let line = tokio::time::timeout(Duration::from_secs(5), reader)
      .await
      .expect("line never completed")
      .unwrap()
      .unwrap();
    listener.stop();

    assert_eq!(line.as_deref(), Some("abc"));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
  }
}
