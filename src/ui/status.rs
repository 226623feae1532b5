//! The status bar.
//!
//! The status bar is a one-row strip listing the actions currently available
//! and the keys that trigger them:
//! ```text
//!  ↑/↓ Move │ Enter Select │ Esc Cancel
//! ```
//! It also owns those keys. Items are installed as a *page*: showing a new
//! page unregisters every chord the previous page bound before binding the new
//! ones, so whichever context is active only ever sees its own bindings.

use std::fmt;
use std::io;
use std::sync::Arc;

use crate::config::Config;
use crate::console::Console;
use crate::geo::Region;
use crate::input::Handler;
use crate::input::KeyChord;
use crate::term::Color;
use crate::term::Screen;

/// One action on the status bar.
#[derive(Clone)]
pub struct StatusItem {
  name: String,
  chords: Vec<KeyChord>,
  handler: Handler,
  show_in_bar: bool,
  registered: Vec<KeyChord>,
}

impl StatusItem {
  /// Creates a new `StatusItem` running `handler` for any of `chords`.
  ///
  /// # Panics
  ///
  /// Panics if `chords` is empty.
  pub fn new(
    name: impl Into<String>,
    chords: impl IntoIterator<Item = KeyChord>,
    handler: Handler,
  ) -> Self {
    let name = name.into();
    let chords = chords.into_iter().collect::<Vec<_>>();
    assert!(!chords.is_empty(), "status item `{}` has no chords", name);
    Self {
      name,
      chords,
      handler,
      show_in_bar: true,
      registered: Vec::new(),
    }
  }

  /// Keeps this item's chords bound without listing it on the bar.
  pub fn hidden(mut self) -> Self {
    self.show_in_bar = false;
    self
  }

  /// Returns the display name.
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Returns the chords that trigger this item.
  pub fn chords(&self) -> &[KeyChord] {
    &self.chords
  }

  /// Returns whether this item is listed on the bar.
  pub fn shows_in_bar(&self) -> bool {
    self.show_in_bar
  }

  /// Returns the chords this item actually bound when its page was shown.
  ///
  /// This is a subset of [`StatusItem::chords()`]; chords that were already
  /// bound elsewhere are missing.
  pub fn registered(&self) -> &[KeyChord] {
    &self.registered
  }

  fn label(&self, sep: char) -> String {
    let mut label = String::new();
    for (i, chord) in self.chords.iter().enumerate() {
      if i > 0 {
        label.push(sep);
      }
      label.push_str(&chord.to_string());
    }
    label
  }
}

impl fmt::Debug for StatusItem {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("StatusItem")
      .field("name", &self.name)
      .field("chords", &self.chords)
      .field("show_in_bar", &self.show_in_bar)
      .field("registered", &self.registered)
      .finish()
  }
}

/// The page currently on the bar, kept by the [`Console`].
pub(crate) struct StatusState {
  region: Region,
  items: Vec<StatusItem>,
}

impl StatusState {
  pub fn new(region: Region) -> Self {
    Self {
      region,
      items: Vec::new(),
    }
  }
}

/// A handle to a console's status bar.
///
/// Obtained from [`Console::status_bar()`]; all handles to the same console
/// share one bar.
#[derive(Clone)]
pub struct StatusBar {
  console: Console,
}

impl StatusBar {
  pub(crate) fn new(console: Console) -> Self {
    Self { console }
  }

  /// Returns the row the bar is drawn on.
  pub fn region(&self) -> Region {
    self.console.status_state().region
  }

  /// Replaces the current page with `items`, binding their chords, and
  /// redraws the bar.
  ///
  /// Chords are bound in order. A chord that is already bound, including by an
  /// earlier item of the same page, stays with its existing handler; every
  /// such chord is returned.
  pub fn show_items(
    &self,
    items: Vec<StatusItem>,
  ) -> io::Result<Vec<KeyChord>> {
    let mut state = self.console.status_state();
    let registry = self.console.registry();

    for old in state.items.drain(..) {
      for &chord in &old.registered {
        registry.unregister(chord);
      }
    }

    let mut items = items;
    let mut rejected = Vec::new();
    for item in &mut items {
      item.registered.clear();
      for &chord in &item.chords {
        if registry.register(chord, Arc::clone(&item.handler)) {
          item.registered.push(chord);
        } else {
          tracing::warn!(%chord, item = %item.name, "chord already bound");
          rejected.push(chord);
        }
      }
    }
    state.items = items;

    self.draw(&state)?;
    Ok(rejected)
  }

  /// Unbinds and returns the current page, leaving the bar empty.
  ///
  /// The bar is not redrawn; follow up with [`StatusBar::show_items()`] or
  /// [`StatusBar::redraw()`].
  pub fn take_items(&self) -> Vec<StatusItem> {
    let mut state = self.console.status_state();
    let registry = self.console.registry();

    let mut items = std::mem::take(&mut state.items);
    for item in &mut items {
      for chord in item.registered.drain(..) {
        registry.unregister(chord);
      }
    }
    items
  }

  /// Returns a copy of the current page.
  pub fn items(&self) -> Vec<StatusItem> {
    self.console.status_state().items.clone()
  }

  /// Removes the first item named `name`, compared case-insensitively, and
  /// unbinds its chords.
  ///
  /// Returns `false` if there is no such item.
  pub fn remove_item_by_name(&self, name: &str) -> io::Result<bool> {
    let mut state = self.console.status_state();
    let name = name.to_lowercase();
    let idx = match state
      .items
      .iter()
      .position(|item| item.name.to_lowercase() == name)
    {
      Some(i) => i,
      None => return Ok(false),
    };

    let item = state.items.remove(idx);
    for &chord in &item.registered {
      self.console.registry().unregister(chord);
    }
    tracing::debug!(item = %item.name, "removed status item");

    self.draw(&state)?;
    Ok(true)
  }

  /// Redraws the bar.
  pub fn redraw(&self) -> io::Result<()> {
    let state = self.console.status_state();
    self.draw(&state)
  }

  /// Unbinds the current page and blanks the bar.
  pub fn clear(&self) -> io::Result<()> {
    self.take_items();
    self.redraw()
  }

  fn draw(&self, state: &StatusState) -> io::Result<()> {
    let mut screen = self.console.screen();
    let mut s = state.region.top_left().scoped_move(&mut **screen)?;
    for i in 0..state.region.height() {
      let runs = if i == 0 {
        segments(&state.items, self.console.config())
      } else {
        Vec::new()
      };
      s.move_to(state.region.row(i))?;
      print_clipped(&mut *s, &runs, state.region.width() as usize)?;
    }
    Ok(())
  }
}

/// Lays out a page as runs of text, with the color of each run.
fn segments(
  items: &[StatusItem],
  config: &Config,
) -> Vec<(String, Option<Color>)> {
  let mut out = Vec::new();
  for (i, item) in items.iter().filter(|i| i.show_in_bar).enumerate() {
    if i > 0 {
      out.push((config.divider.to_string(), None));
    }
    out.push((" ".into(), None));
    out.push((item.label(config.chord_separator), Some(config.accent)));
    out.push((format!(" {} ", item.name), None));
  }
  out
}

/// Prints `segments` clipped to `width` characters, padding the rest of the
/// width with spaces.
fn print_clipped(
  screen: &mut dyn Screen,
  segments: &[(String, Option<Color>)],
  width: usize,
) -> io::Result<()> {
  let mut left = width;
  for (text, color) in segments {
    if left == 0 {
      break;
    }
    let text = text.chars().take(left).collect::<String>();
    left -= text.chars().count();
    match color {
      Some(c) => screen.print_colored(&text, *c)?,
      None => screen.print(&text)?,
    }
  }
  screen.print(&" ".repeat(left))
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::AtomicUsize;
  use std::sync::atomic::Ordering;

  use pretty_assertions::assert_eq;

  use super::*;
  use crate::geo::ScreenPoint;
  use crate::input::registry::noop;
  use crate::input::sync_handler;
  use crate::term::headless::MemScreen;

  fn setup(cols: u16) -> (MemScreen, Console) {
    let screen = MemScreen::new(cols, 4);
    let console = Console::new(screen.clone(), Config::default()).unwrap();
    (screen, console)
  }

  fn counting(n: &Arc<AtomicUsize>) -> Handler {
    let n = Arc::clone(n);
    sync_handler(move |_| {
      n.fetch_add(1, Ordering::SeqCst);
    })
  }

  #[test]
  fn renders_items_with_dividers() {
    let (screen, console) = setup(40);
    let bar = console.status_bar();
    let rejected = bar
      .show_items(vec![
        StatusItem::new("Move", vec![KeyChord::UP, KeyChord::DOWN], noop()),
        StatusItem::new("Select", vec![KeyChord::ENTER], noop()),
        StatusItem::new("Secret", vec![KeyChord::char('x')], noop()).hidden(),
      ])
      .unwrap();
    assert!(rejected.is_empty());

    assert_eq!(
      screen.row_text(3),
      format!("{:40}", " ↑/↓ Move │ Enter Select ")
    );
    assert_eq!(
      screen.cell(ScreenPoint::new(1, 3)).unwrap().fg(),
      Config::default().accent
    );
    assert_eq!(screen.cell(ScreenPoint::new(5, 3)).unwrap().fg(), Color::Reset);
    // Hidden items are still bound.
    assert!(console.registry().contains(KeyChord::char('x')));
  }

  #[test]
  fn shorter_page_overwrites_longer_one() {
    let (screen, console) = setup(30);
    let bar = console.status_bar();
    bar
      .show_items(vec![StatusItem::new(
        "A very long action name",
        vec![KeyChord::ctrl('a')],
        noop(),
      )])
      .unwrap();
    assert_eq!(screen.row_text(3), " Ctrl+A A very long action nam");

    bar
      .show_items(vec![StatusItem::new("Go", vec![KeyChord::ENTER], noop())])
      .unwrap();
    assert_eq!(screen.row_text(3), format!("{:30}", " Enter Go "));
  }

  #[tokio::test]
  async fn page_replacement_rebinds_chords() {
    let (_screen, console) = setup(40);
    let bar = console.status_bar();
    let page1 = Arc::new(AtomicUsize::new(0));
    let page2 = Arc::new(AtomicUsize::new(0));

    bar
      .show_items(vec![
        StatusItem::new("Quit", vec![KeyChord::char('q')], counting(&page1)),
        StatusItem::new("Go", vec![KeyChord::ENTER], counting(&page1)),
      ])
      .unwrap();
    bar
      .show_items(vec![
        StatusItem::new("Go", vec![KeyChord::ENTER], counting(&page2)),
        StatusItem::new("Back", vec![KeyChord::ESC], counting(&page2)),
      ])
      .unwrap();

    assert!(!console.registry().contains(KeyChord::char('q')));
    assert!(console.registry().contains(KeyChord::ESC));
    assert!(console.dispatch(KeyChord::ENTER).await);
    assert_eq!(page1.load(Ordering::SeqCst), 0);
    assert_eq!(page2.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn duplicate_chords_in_a_page_are_reported() {
    let (_screen, console) = setup(40);
    let bar = console.status_bar();
    let rejected = bar
      .show_items(vec![
        StatusItem::new("One", vec![KeyChord::ENTER], noop()),
        StatusItem::new("Two", vec![KeyChord::ESC, KeyChord::ENTER], noop()),
      ])
      .unwrap();
    assert_eq!(rejected, vec![KeyChord::ENTER]);

    let items = bar.items();
    assert_eq!(items[1].registered(), &[KeyChord::ESC]);

    // Tearing the page down must not unbind the first item's chord twice.
    bar.take_items();
    assert!(console.registry().is_empty());
  }

  #[test]
  fn remove_item_by_name_ignores_case() {
    let (screen, console) = setup(30);
    let bar = console.status_bar();
    bar
      .show_items(vec![
        StatusItem::new("Quit", vec![KeyChord::char('q')], noop()),
        StatusItem::new("Go", vec![KeyChord::ENTER], noop()),
      ])
      .unwrap();

    assert!(bar.remove_item_by_name("QUIT").unwrap());
    assert!(!bar.remove_item_by_name("quit").unwrap());
    assert!(!console.registry().contains(KeyChord::char('q')));
    assert!(console.registry().contains(KeyChord::ENTER));
    assert_eq!(screen.row_text(3), format!("{:30}", " Enter Go "));
  }

  #[test]
  fn clear_unbinds_and_blanks() {
    let (screen, console) = setup(20);
    let bar = console.status_bar();
    bar
      .show_items(vec![StatusItem::new("Go", vec![KeyChord::ENTER], noop())])
      .unwrap();
    bar.clear().unwrap();
    assert!(console.registry().is_empty());
    assert!(bar.items().is_empty());
    assert_eq!(screen.row_text(3), " ".repeat(20));
  }

  #[test]
  #[should_panic]
  fn item_needs_a_chord() {
    StatusItem::new("Nothing", Vec::new(), noop());
  }
}
