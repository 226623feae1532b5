//! The chord → handler table.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chashmap::CHashMap;
use futures::future;
use futures::future::BoxFuture;
use futures::FutureExt as _;

use crate::input::KeyChord;

/// An asynchronous key handler.
///
/// Handlers receive the chord that triggered them, so one handler can serve
/// several chords (e.g. both arrow keys of a "Move" action).
pub type Handler =
  Arc<dyn Fn(KeyChord) -> BoxFuture<'static, ()> + Send + Sync>;

/// Wraps an async closure into a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
  F: Fn(KeyChord) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = ()> + Send + 'static,
{
  Arc::new(move |chord| f(chord).boxed())
}

/// Wraps a plain closure into a [`Handler`].
///
/// The closure runs when the dispatcher invokes the handler.
pub fn sync_handler<F>(f: F) -> Handler
where
  F: Fn(KeyChord) + Send + Sync + 'static,
{
  let f = Arc::new(f);
  Arc::new(move |chord| {
    let f = Arc::clone(&f);
    async move { f(chord) }.boxed()
  })
}

/// The single source of truth mapping key chords to handlers.
///
/// A chord has at most one handler. Binding an already-bound chord is refused
/// rather than overwriting the existing handler; callers learn about it through
/// the `bool` returned by [`BindingRegistry::register()`].
///
/// The table is a concurrent map so that the listener thread can look chords
/// up while widgets swap bindings in and out from the dispatcher.
pub struct BindingRegistry {
  table: CHashMap<KeyChord, Handler>,
}

impl BindingRegistry {
  /// Creates a new, empty `BindingRegistry`.
  pub fn new() -> Self {
    Self {
      table: CHashMap::new(),
    }
  }

  /// Binds `chord` to `handler`.
  ///
  /// Returns `false`, leaving the existing binding untouched, if `chord` was
  /// already bound.
  pub fn register(&self, chord: KeyChord, handler: Handler) -> bool {
    let mut inserted = false;
    self.table.alter(chord, |old| match old {
      Some(old) => Some(old),
      None => {
        inserted = true;
        Some(handler)
      }
    });

    if inserted {
      tracing::debug!(%chord, "bound");
    } else {
      tracing::debug!(%chord, "already bound; registration refused");
    }
    inserted
  }

  /// Removes the binding for `chord`.
  ///
  /// Returns `false` if `chord` was not bound.
  pub fn unregister(&self, chord: KeyChord) -> bool {
    let removed = self.table.remove(&chord).is_some();
    if removed {
      tracing::debug!(%chord, "unbound");
    }
    removed
  }

  /// Removes every binding.
  pub fn clear(&self) {
    let old = self.table.clear();
    tracing::debug!(count = old.len(), "cleared all bindings");
  }

  /// Returns the handler bound to `chord`, if any.
  pub fn handler(&self, chord: KeyChord) -> Option<Handler> {
    self.table.get(&chord).map(|h| Arc::clone(&h))
  }

  /// Returns whether `chord` is bound.
  pub fn contains(&self, chord: KeyChord) -> bool {
    self.table.contains_key(&chord)
  }

  /// Returns the number of bound chords.
  pub fn len(&self) -> usize {
    self.table.len()
  }

  /// Returns whether no chord is bound.
  pub fn is_empty(&self) -> bool {
    self.table.is_empty()
  }
}

impl Default for BindingRegistry {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for BindingRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BindingRegistry")
      .field("len", &self.len())
      .finish()
  }
}

/// A handler that does nothing, for tests and placeholders.
pub fn noop() -> Handler {
  Arc::new(|_| future::ready(()).boxed())
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::AtomicUsize;
  use std::sync::atomic::Ordering;

  use super::*;
  use crate::input::Key;
  use crate::input::Mods;

  fn counter(n: &Arc<AtomicUsize>, by: usize) -> Handler {
    let n = Arc::clone(n);
    sync_handler(move |_| {
      n.fetch_add(by, Ordering::SeqCst);
    })
  }

  #[tokio::test]
  async fn duplicate_registration_keeps_first_handler() {
    let reg = BindingRegistry::new();
    let n = Arc::new(AtomicUsize::new(0));
    assert!(reg.register(KeyChord::ENTER, counter(&n, 1)));
    assert!(!reg.register(KeyChord::ENTER, counter(&n, 100)));
    assert_eq!(reg.len(), 1);

    let h = reg.handler(KeyChord::ENTER).unwrap();
    h(KeyChord::ENTER).await;
    assert_eq!(n.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn equal_chords_share_a_binding() {
    let reg = BindingRegistry::new();
    assert!(reg.register(KeyChord::new(Key::Char('x'), Mods::CTRL), noop()));
    assert!(reg.contains(KeyChord::ctrl('x')));
    assert!(!reg.register(KeyChord::ctrl('x'), noop()));
    assert!(reg.unregister(KeyChord::new(Key::Char('x'), Mods::CTRL)));
    assert!(reg.is_empty());
  }

  #[test]
  fn unregister_missing_is_false() {
    let reg = BindingRegistry::new();
    assert!(!reg.unregister(KeyChord::ESC));
    assert!(reg.register(KeyChord::ESC, noop()));
    assert!(reg.unregister(KeyChord::ESC));
    assert!(!reg.unregister(KeyChord::ESC));
  }

  #[test]
  fn clear_removes_everything() {
    let reg = BindingRegistry::new();
    reg.register(KeyChord::ESC, noop());
    reg.register(KeyChord::char('q'), noop());
    reg.clear();
    assert!(reg.is_empty());
    assert!(reg.handler(KeyChord::ESC).is_none());
    assert!(reg.register(KeyChord::ESC, noop()));
  }

  #[test]
  fn never_two_handlers_per_chord() {
    let reg = BindingRegistry::new();
    let chords = [KeyChord::ESC, KeyChord::ENTER, KeyChord::char('q')];
    // A fixed interleaving of register/unregister calls; the registry must
    // agree with a simple set model at every step.
    let mut model = std::collections::HashSet::new();
    for step in 0..60usize {
      let chord = chords[step * 7 % chords.len()];
      if step % 3 == 0 {
        assert_eq!(reg.unregister(chord), model.remove(&chord));
      } else {
        assert_eq!(reg.register(chord, noop()), model.insert(chord));
      }
      assert_eq!(reg.len(), model.len());
    }
  }
}
