//! A paged text viewer.

use std::io;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use num::integer::div_ceil;
use tokio_util::sync::CancellationToken;

use crate::console::Console;
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

/// Scrollable text filling a region, with a footer row showing the position:
/// ```text
/// lines 11-20 of 42               page 2/5
/// ```
#[derive(Clone)]
pub struct Pager {
  inner: Arc<Inner>,
}

struct Inner {
  console: Console,
  region: Region,
  state: Mutex<State>,
}

struct State {
  lines: Vec<String>,
  top: usize,
  session: Option<Session<()>>,
}

impl Pager {
  /// Creates a new `Pager` showing `text` inside `region`. The last row of the
  /// region is the footer.
  ///
  /// # Panics
  ///
  /// Panics if `region` has fewer than two rows.
  pub fn new(console: &Console, region: Region, text: &str) -> Self {
    assert!(
      region.height() >= 2,
      "a pager needs at least two rows, got {}",
      region.height()
    );
    Self {
      inner: Arc::new(Inner {
        console: console.clone(),
        region,
        state: Mutex::new(State {
          lines: text.lines().map(String::from).collect(),
          top: 0,
          session: None,
        }),
      }),
    }
  }

  fn state(&self) -> MutexGuard<'_, State> {
    self
      .inner
      .state
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
  }

  fn body_rows(&self) -> usize {
    self.inner.region.height() as usize - 1
  }

  /// Returns the index of the first line in view.
  pub fn top(&self) -> usize {
    self.state().top
  }

  /// Replaces the text, scrolling back to the top.
  pub fn set_text(&self, text: &str) -> io::Result<()> {
    let mut st = self.state();
    st.lines = text.lines().map(String::from).collect();
    st.top = 0;
    self.draw(&st)
  }

  /// Scrolls by `delta` lines, staying within the text.
  pub fn scroll(&self, delta: isize) -> io::Result<()> {
    let mut st = self.state();
    let max_top = st.lines.len().saturating_sub(self.body_rows());
    let top = if delta < 0 {
      st.top.saturating_sub(delta.unsigned_abs())
    } else {
      st.top.saturating_add(delta as usize).min(max_top)
    };
    if top == st.top {
      return Ok(());
    }
    st.top = top;
    self.draw(&st)
  }

  /// Scrolls by `pages` screenfuls.
  pub fn page(&self, pages: isize) -> io::Result<()> {
    self.scroll(pages.saturating_mul(self.body_rows() as isize))
  }

  /// Scrolls to the first line.
  pub fn home(&self) -> io::Result<()> {
    self.scroll(isize::MIN)
  }

  /// Scrolls so that the last line is at the bottom.
  pub fn end(&self) -> io::Result<()> {
    self.scroll(isize::MAX)
  }

  /// Returns whether the pager is currently shown.
  pub fn is_shown(&self) -> bool {
    self.state().session.is_some()
  }

  /// Shows the pager and waits until it is closed.
  ///
  /// Returns `true` if the user closed it, or `false` if `cancel` fired.
  pub async fn show(&self, cancel: &CancellationToken) -> Result<bool> {
    let pending = self.open(cancel)?;
    let guard = AbortOnDrop::new(|| {
      self.abort();
    });
    let outcome = pending.await;
    guard.disarm();
    Ok(outcome?.is_some())
  }

  /// Draws the pager and installs its keys.
  ///
  /// # Errors
  ///
  /// Returns [`Error::AlreadyShown`] if the pager is already shown.
  pub fn open(&self, cancel: &CancellationToken) -> Result<PendingResult<()>> {
    let mut st = self.state();
    if st.session.is_some() {
      return Err(Error::AlreadyShown);
    }

    self.draw(&st)?;
    let abort = {
      let pager = self.clone();
      move || {
        pager.abort();
      }
    };
    let (session, pending) =
      Session::begin(&self.inner.console, self.keys(), cancel, abort)?;
    st.session = Some(session);
    Ok(pending)
  }

  /// Closes the pager, as if the user had. Returns `false` if it was not
  /// shown.
  pub fn close(&self) -> bool {
    self.finish(Some(()))
  }

  /// Closes the pager as canceled. Returns `false` if it was not shown.
  pub fn abort(&self) -> bool {
    self.finish(None)
  }

  fn finish(&self, outcome: Option<()>) -> bool {
    let session = self.state().session.take();
    match session {
      Some(s) => s.finish(&self.inner.console, Ok(outcome)),
      None => false,
    }
  }

  fn keys(&self) -> Vec<StatusItem> {
    let pager = self.clone();
    let scroll = sync_handler(move |chord| {
      let moved = match chord.key() {
        Key::Up => pager.scroll(-1),
        Key::Down => pager.scroll(1),
        Key::PageUp => pager.page(-1),
        Key::Home => pager.home(),
        Key::End => pager.end(),
        _ => pager.page(1),
      };
      if let Err(e) = moved {
        tracing::warn!(error = %e, "pager redraw failed");
      }
    });

    let pager = self.clone();
    vec![
      StatusItem::new(
        "Scroll",
        vec![KeyChord::UP, KeyChord::DOWN],
        scroll.clone(),
      ),
      StatusItem::new(
        "Page",
        vec![KeyChord::PAGE_UP, KeyChord::PAGE_DOWN, KeyChord::SPACE],
        scroll.clone(),
      ),
      StatusItem::new("Jump", vec![KeyChord::HOME, KeyChord::END], scroll)
        .hidden(),
      StatusItem::new(
        "Close",
        vec![KeyChord::char('q'), KeyChord::ESC],
        sync_handler(move |_| {
          pager.close();
        }),
      ),
    ]
  }

  fn draw(&self, st: &State) -> io::Result<()> {
    let region = self.inner.region;
    let width = region.width() as usize;
    let rows = self.body_rows();
    let dim = self.inner.console.config().dim;

    draw_in(&self.inner.console, region, |s: &mut dyn Screen| {
      for row in 0..rows {
        let line = st.lines.get(st.top + row).map_or("", String::as_str);
        s.print_at(region.row(row as u16), &fit(line, width))?;
      }
      s.move_to(region.row(rows as u16))?;
      s.print_colored(&footer(st.lines.len(), st.top, rows, width), dim)
    })
  }
}

/// Formats the position line: the range of lines in view on the left, the
/// page number on the right.
fn footer(total: usize, top: usize, rows: usize, width: usize) -> String {
  let last = (top + rows).min(total);
  let first = if total == 0 { 0 } else { top + 1 };
  let pages = div_ceil(total, rows).max(1);
  let page = (top / rows + 1).min(pages);

  let left = format!("lines {}-{} of {}", first, last, total);
  let right = format!("page {}/{}", page, pages);
  let gap = width.saturating_sub(left.len() + right.len()).max(1);
  fit(&format!("{}{:gap$}{}", left, "", right, gap = gap), width)
}

impl Element for Pager {
  fn console(&self) -> &Console {
    &self.inner.console
  }

  fn bounds(&self) -> Region {
    self.inner.region
  }

  fn redraw(&self) -> io::Result<()> {
    let st = self.state();
    self.draw(&st)
  }
}
