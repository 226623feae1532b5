//! Menus.
//!
//! A [`Menu`] is a list of entries drawn one per row inside its region, with a
//! cursor that the arrow keys move. Header and disabled entries are shown but
//! can never hold the cursor or be selected. When there are more entries than
//! rows, the list scrolls to keep the cursor in view.
//!
//! In [`SelectMode::Single`] the selection follows the cursor, so exactly one
//! entry is selected at all times. In [`SelectMode::Multi`] every entry has its
//! own check box, toggled with Space.

use std::fmt;
use std::io;
use std::panic;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use tokio_util::sync::CancellationToken;

use crate::console::Console;
use crate::error::BoxError;
use crate::error::Error;
use crate::error::Result;
use crate::geo::Region;
use crate::input::sync_handler;
use crate::input::Key;
use crate::input::KeyChord;
use crate::term::fit;
use crate::term::Screen;
use crate::ui::element::draw_in;
use crate::ui::pending::AbortOnDrop;
use crate::ui::pending::Session;
use crate::ui::Element;
use crate::ui::PendingResult;
use crate::ui::StatusItem;

/// How many entries a [`Menu`] lets the user pick.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SelectMode {
  /// Exactly one entry, the one under the cursor.
  Single,
  /// Any number of entries, toggled independently.
  Multi,
}

/// The key that closes a [`Menu`] without a result.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Dismiss {
  /// Esc, labeled "Cancel".
  Cancel,
  /// Q, labeled "Quit".
  Quit,
}

impl Dismiss {
  fn chord(self) -> KeyChord {
    match self {
      Self::Cancel => KeyChord::ESC,
      Self::Quit => KeyChord::char('q'),
    }
  }

  fn name(self) -> &'static str {
    match self {
      Self::Cancel => "Cancel",
      Self::Quit => "Quit",
    }
  }
}

/// Behavior switches for a [`Menu`].
#[derive(Copy, Clone, Debug)]
pub struct MenuOptions {
  /// Single or multiple selection.
  pub mode: SelectMode,
  /// The key that closes the menu without a result.
  pub dismiss: Dismiss,
}

impl Default for MenuOptions {
  fn default() -> Self {
    Self {
      mode: SelectMode::Single,
      dismiss: Dismiss::Cancel,
    }
  }
}

type Action<T> =
  Arc<dyn Fn(&T) -> std::result::Result<(), BoxError> + Send + Sync>;

/// One row of a [`Menu`].
pub struct MenuEntry<T> {
  label: String,
  value: Option<T>,
  header: bool,
  disabled: bool,
  selected: bool,
  action: Option<Action<T>>,
}

impl<T> MenuEntry<T> {
  /// Creates a new selectable entry.
  pub fn new(label: impl Into<String>, value: T) -> Self {
    Self {
      label: label.into(),
      value: Some(value),
      header: false,
      disabled: false,
      selected: false,
      action: None,
    }
  }

  /// Creates a header row, which is drawn in the accent color and can never be
  /// selected.
  pub fn header(label: impl Into<String>) -> Self {
    Self {
      label: label.into(),
      value: None,
      header: true,
      disabled: false,
      selected: false,
      action: None,
    }
  }

  /// Marks this entry as disabled: drawn dimmed and never selectable.
  pub fn disabled(mut self) -> Self {
    self.disabled = true;
    self
  }

  /// Marks this entry as selected initially.
  pub fn selected(mut self) -> Self {
    self.selected = true;
    self
  }

  /// Attaches an action, run on this entry's value when the menu is confirmed
  /// with it selected. If the action fails, so does the menu's result.
  pub fn with_action(
    mut self,
    action: impl Fn(&T) -> std::result::Result<(), BoxError>
      + Send
      + Sync
      + 'static,
  ) -> Self {
    self.action = Some(Arc::new(action));
    self
  }

  /// Returns the label.
  pub fn label(&self) -> &str {
    &self.label
  }

  /// Returns the value, or `None` for a header.
  pub fn value(&self) -> Option<&T> {
    self.value.as_ref()
  }

  /// Returns whether this entry can hold the cursor and be selected.
  pub fn is_selectable(&self) -> bool {
    !self.header && !self.disabled
  }
}

impl<T: fmt::Debug> fmt::Debug for MenuEntry<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MenuEntry")
      .field("label", &self.label)
      .field("value", &self.value)
      .field("header", &self.header)
      .field("disabled", &self.disabled)
      .field("selected", &self.selected)
      .finish()
  }
}

/// A selection menu.
///
/// `Menu` is a handle; clones share the same menu, which is how its key
/// handlers reach it.
pub struct Menu<T> {
  inner: Arc<Inner<T>>,
}

impl<T> Clone for Menu<T> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
    }
  }
}

struct Inner<T> {
  console: Console,
  region: Region,
  options: MenuOptions,
  state: Mutex<State<T>>,
}

struct State<T> {
  entries: Vec<MenuEntry<T>>,
  cursor: usize,
  offset: usize,
  session: Option<Session<Vec<T>>>,
}

impl<T> State<T> {
  /// Finds the next selectable entry from the cursor, wrapping around.
  fn step(&self, down: bool) -> usize {
    let n = self.entries.len();
    let mut i = self.cursor;
    for _ in 0..n {
      i = if down { (i + 1) % n } else { (i + n - 1) % n };
      if self.entries[i].is_selectable() {
        return i;
      }
    }
    self.cursor
  }

  /// Adjusts the scroll offset so that the cursor is among the `rows` visible
  /// entries; returns whether it changed.
  fn scroll_to_cursor(&mut self, rows: usize) -> bool {
    let old = self.offset;
    if self.cursor < self.offset {
      self.offset = self.cursor;
    } else if self.cursor >= self.offset + rows {
      self.offset = self.cursor + 1 - rows;
    }
    // Keep leading headers in view when the cursor is at the top.
    let leading = self.entries[..self.cursor]
      .iter()
      .all(|e| !e.is_selectable());
    if leading && self.cursor < rows {
      self.offset = 0;
    }
    self.offset != old
  }
}

impl<T: Clone + Send + 'static> Menu<T> {
  /// Creates a new `Menu` drawn inside `region` of `console`.
  ///
  /// In single-select mode, the first pre-selected entry stays selected and
  /// any others are cleared; with none, the first selectable entry is
  /// selected. Header and disabled entries are never selected.
  ///
  /// The menu is not drawn until it is shown.
  ///
  /// # Errors
  ///
  /// Returns [`Error::NoSelectableEntries`] if every entry is a header or
  /// disabled.
  ///
  /// # Panics
  ///
  /// Panics if `region` is empty.
  pub fn new(
    console: &Console,
    region: Region,
    entries: Vec<MenuEntry<T>>,
    options: MenuOptions,
  ) -> Result<Self> {
    assert!(!region.is_empty(), "menu region is empty");
    let first = entries
      .iter()
      .position(MenuEntry::is_selectable)
      .ok_or(Error::NoSelectableEntries)?;

    let mut entries = entries;
    for e in &mut entries {
      e.selected &= e.is_selectable();
    }
    let cursor = match options.mode {
      SelectMode::Single => {
        let pick = entries.iter().position(|e| e.selected).unwrap_or(first);
        for (i, e) in entries.iter_mut().enumerate() {
          e.selected = i == pick;
        }
        pick
      }
      SelectMode::Multi => first,
    };

    let mut state = State {
      entries,
      cursor,
      offset: 0,
      session: None,
    };
    state.scroll_to_cursor(region.height() as usize);

    Ok(Self {
      inner: Arc::new(Inner {
        console: console.clone(),
        region,
        options,
        state: Mutex::new(state),
      }),
    })
  }

  fn state(&self) -> MutexGuard<'_, State<T>> {
    self
      .inner
      .state
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
  }

  fn rows(&self) -> usize {
    self.inner.region.height() as usize
  }

  /// Returns the index of the entry under the cursor.
  pub fn cursor(&self) -> usize {
    self.state().cursor
  }

  /// Returns the values of the selected entries, in entry order.
  pub fn selected_values(&self) -> Vec<T> {
    self
      .state()
      .entries
      .iter()
      .filter(|e| e.selected)
      .filter_map(|e| e.value.clone())
      .collect()
  }

  /// Returns whether the menu is currently shown.
  pub fn is_shown(&self) -> bool {
    self.state().session.is_some()
  }

  /// Moves the cursor to the previous selectable entry, wrapping around.
  pub fn move_up(&self) -> io::Result<()> {
    self.step(false)
  }

  /// Moves the cursor to the next selectable entry, wrapping around.
  pub fn move_down(&self) -> io::Result<()> {
    self.step(true)
  }

  fn step(&self, down: bool) -> io::Result<()> {
    let mut st = self.state();
    let to = st.step(down);
    self.move_cursor(&mut st, to)
  }

  fn move_cursor(&self, st: &mut State<T>, to: usize) -> io::Result<()> {
    let from = st.cursor;
    if from == to {
      return Ok(());
    }
    st.cursor = to;
    if self.inner.options.mode == SelectMode::Single {
      st.entries[from].selected = false;
      st.entries[to].selected = true;
    }

    let scrolled = st.scroll_to_cursor(self.rows());
    if st.session.is_none() {
      return Ok(());
    }
    if scrolled {
      self.draw_all(st)
    } else {
      self.draw_rows(st, &[from, to])
    }
  }

  /// Toggles entry `i`, returning whether it is selected afterwards.
  ///
  /// In single-select mode this selects `i` and moves the cursor there.
  /// Headers and disabled entries are left alone.
  ///
  /// # Panics
  ///
  /// Panics if `i` is out of range.
  pub fn toggle(&self, i: usize) -> io::Result<bool> {
    let mut st = self.state();
    assert!(
      i < st.entries.len(),
      "entry index {} out of range for a menu of {}",
      i,
      st.entries.len()
    );
    if !st.entries[i].is_selectable() {
      return Ok(false);
    }

    match self.inner.options.mode {
      SelectMode::Single => {
        self.move_cursor(&mut st, i)?;
        Ok(true)
      }
      SelectMode::Multi => {
        st.entries[i].selected ^= true;
        if st.session.is_some() {
          self.draw_rows(&st, &[i])?;
        }
        Ok(st.entries[i].selected)
      }
    }
  }

  fn toggle_cursor(&self) -> io::Result<bool> {
    let cursor = self.cursor();
    self.toggle(cursor)
  }

  /// Shows the menu and waits for the user to confirm or dismiss it.
  ///
  /// Returns the selected values, or `None` if the menu was dismissed or
  /// `cancel` fired.
  pub async fn show(
    &self,
    cancel: &CancellationToken,
  ) -> Result<Option<Vec<T>>> {
    let pending = self.open(cancel)?;
    let guard = AbortOnDrop::new(|| {
      self.abort();
    });
    let outcome = pending.await;
    guard.disarm();
    outcome
  }

  /// Shows a menu and waits for a single value; see [`Menu::show()`].
  pub async fn show_one(
    &self,
    cancel: &CancellationToken,
  ) -> Result<Option<T>> {
    Ok(self.show(cancel).await?.and_then(|v| v.into_iter().next()))
  }

  /// Draws the menu and installs its keys, returning the result to await.
  ///
  /// # Errors
  ///
  /// Returns [`Error::AlreadyShown`] if the menu is already shown.
  pub fn open(
    &self,
    cancel: &CancellationToken,
  ) -> Result<PendingResult<Vec<T>>> {
    let mut st = self.state();
    if st.session.is_some() {
      return Err(Error::AlreadyShown);
    }

    self.draw_all(&st)?;
    let abort = {
      let menu = self.clone();
      move || {
        menu.abort();
      }
    };
    let (session, pending) =
      Session::begin(&self.inner.console, self.page(), cancel, abort)?;
    st.session = Some(session);

    tracing::debug!(
      entries = st.entries.len(),
      cursor = st.cursor,
      "menu shown"
    );
    Ok(pending)
  }

  /// Confirms the menu with its current selection.
  ///
  /// Selected entries' actions run first, in order; the first failure becomes
  /// the result. Returns `false` if the menu was not shown.
  pub fn confirm(&self) -> bool {
    let (session, chosen) = {
      let mut st = self.state();
      let session = match st.session.take() {
        Some(s) => s,
        None => return false,
      };
      let chosen = match self.inner.options.mode {
        SelectMode::Single => vec![st.cursor],
        SelectMode::Multi => (0..st.entries.len())
          .filter(|&i| st.entries[i].selected)
          .collect(),
      };
      let chosen = chosen
        .into_iter()
        .filter_map(|i| {
          let e = &st.entries[i];
          Some((e.value.clone()?, e.action.clone()))
        })
        .collect::<Vec<_>>();
      (session, chosen)
    };

    let outcome = run_actions(&chosen).map(|()| {
      Some(chosen.into_iter().map(|(v, _)| v).collect::<Vec<_>>())
    });
    if let Err(e) = &outcome {
      tracing::warn!(error = %e, "menu action failed");
    }
    session.finish(&self.inner.console, outcome)
  }

  /// Closes the menu without a result.
  ///
  /// Returns `false`, doing nothing, if the menu was not shown; aborting twice,
  /// or after the menu was confirmed, is harmless.
  pub fn abort(&self) -> bool {
    let session = self.state().session.take();
    match session {
      Some(s) => {
        tracing::debug!("menu dismissed");
        s.finish(&self.inner.console, Ok(None))
      }
      None => false,
    }
  }

  fn page(&self) -> Vec<StatusItem> {
    let menu = self.clone();
    let step = sync_handler(move |chord| {
      let down = matches!(chord.key(), Key::Down | Key::Char('j'));
      if let Err(e) = menu.step(down) {
        tracing::warn!(error = %e, "menu redraw failed");
      }
    });

    let vi = vec![KeyChord::char('k'), KeyChord::char('j')];
    let mut page = vec![
      StatusItem::new(
        "Move",
        vec![KeyChord::UP, KeyChord::DOWN],
        step.clone(),
      ),
      StatusItem::new("Vi Move", vi, step).hidden(),
    ];
    if self.inner.options.mode == SelectMode::Multi {
      let menu = self.clone();
      page.push(StatusItem::new(
        "Toggle",
        vec![KeyChord::SPACE],
        sync_handler(move |_| {
          if let Err(e) = menu.toggle_cursor() {
            tracing::warn!(error = %e, "menu redraw failed");
          }
        }),
      ));
    }

    let menu = self.clone();
    page.push(StatusItem::new(
      "Select",
      vec![KeyChord::ENTER],
      sync_handler(move |_| {
        menu.confirm();
      }),
    ));
    let menu = self.clone();
    let dismiss = self.inner.options.dismiss;
    page.push(StatusItem::new(
      dismiss.name(),
      vec![dismiss.chord()],
      sync_handler(move |_| {
        menu.abort();
      }),
    ));
    page
  }

  fn draw_all(&self, st: &State<T>) -> io::Result<()> {
    let rows = self.rows();
    draw_in(&self.inner.console, self.inner.region, |s| {
      for row in 0..rows {
        self.draw_row(s, st, row)?;
      }
      Ok(())
    })
  }

  fn draw_rows(&self, st: &State<T>, entries: &[usize]) -> io::Result<()> {
    let rows = self.rows();
    draw_in(&self.inner.console, self.inner.region, |s| {
      for &i in entries {
        if i >= st.offset && i < st.offset + rows {
          self.draw_row(s, st, i - st.offset)?;
        }
      }
      Ok(())
    })
  }

  fn draw_row(
    &self,
    s: &mut dyn Screen,
    st: &State<T>,
    row: usize,
  ) -> io::Result<()> {
    let width = self.inner.region.width() as usize;
    let config = self.inner.console.config();
    s.move_to(self.inner.region.row(row as u16))?;

    let i = st.offset + row;
    let e = match st.entries.get(i) {
      Some(e) => e,
      None => return s.print(&fit("", width)),
    };
    if e.header {
      return s.print_colored(&fit(&e.label, width), config.accent);
    }

    let cursor = if i == st.cursor { '>' } else { ' ' };
    let text = match self.inner.options.mode {
      SelectMode::Single => format!("{} {}", cursor, e.label),
      SelectMode::Multi => {
        let mark = if e.selected { 'x' } else { ' ' };
        format!("{} [{}] {}", cursor, mark, e.label)
      }
    };
    if e.disabled {
      s.print_colored(&fit(&text, width), config.dim)
    } else {
      s.print(&fit(&text, width))
    }
  }
}

fn run_actions<T>(chosen: &[(T, Option<Action<T>>)]) -> Result<()> {
  for (value, action) in chosen {
    let action = match action {
      Some(a) => a,
      None => continue,
    };
    match panic::catch_unwind(AssertUnwindSafe(|| action(value))) {
      Ok(Ok(())) => {}
      Ok(Err(e)) => return Err(Error::Action(e)),
      Err(_) => return Err(Error::Action("menu action panicked".into())),
    }
  }
  Ok(())
}

impl<T: Clone + Send + 'static> Element for Menu<T> {
  fn console(&self) -> &Console {
    &self.inner.console
  }

  fn bounds(&self) -> Region {
    self.inner.region
  }

  fn redraw(&self) -> io::Result<()> {
    let st = self.state();
    self.draw_all(&st)
  }
}
