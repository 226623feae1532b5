//! Line-input buffering.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use tokio::sync::oneshot;

use crate::error::Error;
use crate::error::Result;
use crate::input::Key;
use crate::input::Mods;
use crate::term::KeyEvent;

/// What the screen should do in response to a key fed to a [`LineInput`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum LineEffect {
  /// No line is being read, or the key is a Ctrl chord; it should be
  /// dispatched as a chord instead.
  Inactive,
  /// The character was appended and should be echoed.
  Echo(char),
  /// The last character was deleted and should be erased.
  Erase,
  /// The line was completed or canceled.
  Done,
  /// The key meant nothing to the line buffer, or the buffer is full.
  Ignored,
}

/// Identifies one read, so that a stale owner cannot end a newer one.
pub(crate) type ReadId = u64;

struct Reading {
  id: ReadId,
  buf: String,
  max: Option<usize>,
  done: oneshot::Sender<Option<String>>,
}

/// The buffer behind [`crate::Console::read_line()`].
///
/// At most one line can be read at a time. Keys with Ctrl held are never
/// captured, so Ctrl bindings keep working while a line is read.
pub(crate) struct LineInput {
  reading: Mutex<Option<Reading>>,
  next_id: AtomicU64,
}

impl LineInput {
  pub fn new() -> Self {
    Self {
      reading: Mutex::new(None),
      next_id: AtomicU64::new(1),
    }
  }

  fn reading(&self) -> MutexGuard<'_, Option<Reading>> {
    self.reading.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Starts reading a line of at most `max` characters; the receiver yields
  /// `Some(line)` on Enter and `None` on cancellation.
  pub fn begin(
    &self,
    max: Option<usize>,
  ) -> Result<(ReadId, oneshot::Receiver<Option<String>>)> {
    let mut reading = self.reading();
    if reading.is_some() {
      return Err(Error::LineInputBusy);
    }
    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
    let (done, rx) = oneshot::channel();
    *reading = Some(Reading {
      id,
      buf: String::new(),
      max,
      done,
    });
    Ok((id, rx))
  }

  pub fn is_active(&self) -> bool {
    self.reading().is_some()
  }

  /// Cancels read `id` if it is still going.
  pub fn cancel(&self, id: ReadId) -> bool {
    let mut slot = self.reading();
    match slot.take() {
      Some(r) if r.id == id => {
        let _ = r.done.send(None);
        true
      }
      other => {
        *slot = other;
        false
      }
    }
  }

  /// Feeds a key press to the current read.
  pub fn feed(&self, event: KeyEvent) -> LineEffect {
    let mut slot = self.reading();
    let reading = match slot.as_mut() {
      Some(r) => r,
      None => return LineEffect::Inactive,
    };

    let mods = Mods::from(event.modifiers);
    if mods.contains(Mods::CTRL) {
      return LineEffect::Inactive;
    }
    match event.code {
      Key::Enter => {
        if let Some(r) = slot.take() {
          let _ = r.done.send(Some(r.buf));
        }
        LineEffect::Done
      }
      Key::Esc => {
        if let Some(r) = slot.take() {
          let _ = r.done.send(None);
        }
        LineEffect::Done
      }
      Key::Backspace => match reading.buf.pop() {
        Some(_) => LineEffect::Erase,
        None => LineEffect::Ignored,
      },
      Key::Char(c) if !mods.contains(Mods::ALT) => {
        let full = reading
          .max
          .map_or(false, |max| reading.buf.chars().count() >= max);
        if full {
          return LineEffect::Ignored;
        }
        reading.buf.push(c);
        LineEffect::Echo(c)
      }
      _ => LineEffect::Ignored,
    }
  }
}

#[cfg(test)]
mod tests {
  use crossterm::event::KeyModifiers;

  use super::*;

  fn key(code: Key) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::empty())
  }

  #[test]
  fn inactive_until_begun() {
    let line = LineInput::new();
    assert_eq!(line.feed(key(Key::Char('a'))), LineEffect::Inactive);
    assert!(!line.is_active());
    assert!(!line.cancel(1));
  }

  #[tokio::test]
  async fn buffers_until_enter() {
    let line = LineInput::new();
    let (_, rx) = line.begin(None).unwrap();
    assert_eq!(line.feed(key(Key::Char('h'))), LineEffect::Echo('h'));
    assert_eq!(line.feed(key(Key::Char('x'))), LineEffect::Echo('x'));
    assert_eq!(line.feed(key(Key::Backspace)), LineEffect::Erase);
    assert_eq!(line.feed(key(Key::Char('i'))), LineEffect::Echo('i'));
    assert_eq!(
      line.feed(KeyEvent::new(Key::Char('c'), KeyModifiers::CONTROL)),
      LineEffect::Inactive
    );
    assert_eq!(
      line.feed(KeyEvent::new(Key::Char('x'), KeyModifiers::ALT)),
      LineEffect::Ignored
    );
    assert_eq!(line.feed(key(Key::Enter)), LineEffect::Done);
    assert_eq!(rx.await.unwrap(), Some("hi".to_string()));
    assert!(!line.is_active());
  }

  #[tokio::test]
  async fn backspace_on_empty_and_empty_line() {
    let line = LineInput::new();
    let (_, rx) = line.begin(None).unwrap();
    assert_eq!(line.feed(key(Key::Backspace)), LineEffect::Ignored);
    line.feed(key(Key::Enter));
    assert_eq!(rx.await.unwrap(), Some(String::new()));
  }

  #[tokio::test]
  async fn escape_and_cancel_yield_none() {
    let line = LineInput::new();
    let (_, rx) = line.begin(None).unwrap();
    line.feed(key(Key::Char('a')));
    assert_eq!(line.feed(key(Key::Esc)), LineEffect::Done);
    assert_eq!(rx.await.unwrap(), None);

    let (id, rx) = line.begin(None).unwrap();
    assert!(line.cancel(id));
    assert!(!line.cancel(id));
    assert_eq!(rx.await.unwrap(), None);
  }

  #[test]
  fn one_read_at_a_time() {
    let line = LineInput::new();
    let _read = line.begin(None).unwrap();
    assert!(matches!(line.begin(None), Err(Error::LineInputBusy)));
  }

  #[tokio::test]
  async fn stale_cancel_leaves_newer_read() {
    let line = LineInput::new();
    let (old, rx) = line.begin(None).unwrap();
    line.feed(key(Key::Enter));
    assert_eq!(rx.await.unwrap(), Some(String::new()));

    let (_, rx) = line.begin(None).unwrap();
    assert!(!line.cancel(old));
    assert!(line.is_active());
    line.feed(key(Key::Char('z')));
    line.feed(key(Key::Enter));
    assert_eq!(rx.await.unwrap(), Some("z".to_string()));
  }

  #[tokio::test]
  async fn full_buffer_ignores_characters() {
    let line = LineInput::new();
    let (_, rx) = line.begin(Some(2)).unwrap();
    assert_eq!(line.feed(key(Key::Char('a'))), LineEffect::Echo('a'));
    assert_eq!(line.feed(key(Key::Char('b'))), LineEffect::Echo('b'));
    assert_eq!(line.feed(key(Key::Char('c'))), LineEffect::Ignored);
    assert_eq!(line.feed(key(Key::Backspace)), LineEffect::Erase);
    assert_eq!(line.feed(key(Key::Char('d'))), LineEffect::Echo('d'));
    line.feed(key(Key::Enter));
    assert_eq!(rx.await.unwrap(), Some("ad".to_string()));
  }
}
