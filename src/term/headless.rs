//! An in-memory terminal.
//!
//! [`MemScreen`] keeps a grid of [`Texel`]s instead of talking to a real
//! terminal, and [`ScriptedKeys`] replays key presses pushed through a
//! [`KeyFeed`]. Together they let widgets run, and be inspected, without a tty.

use std::io;
use std::sync::mpsc;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::thread;
use std::time::Duration;

use crossterm::event::KeyCode;
use crossterm::event::KeyModifiers;

use crate::geo::ScreenPoint;
use crate::input::KeyChord;
use crate::term::Color;
use crate::term::KeyEvent;
use crate::term::KeySource;
use crate::term::Screen;
use crate::term::Texel;

struct Grid {
  cols: u16,
  rows: u16,
  cells: Box<[Texel]>,
  cursor: ScreenPoint,
  fg: Color,
  bg: Color,
  cursor_visible: bool,
}

impl Grid {
  fn index(&self, p: ScreenPoint) -> Option<usize> {
    if p.col() >= self.cols || p.row() >= self.rows {
      return None;
    }
    Some(p.row() as usize * self.cols as usize + p.col() as usize)
  }
}

/// A screen that draws into memory.
///
/// Cloning a `MemScreen` produces another handle onto the same grid, so a test
/// can keep one handle while a [`crate::Console`] owns the other.
///
/// Writes past the right edge are clipped; the cursor still advances.
#[derive(Clone)]
pub struct MemScreen {
  grid: Arc<Mutex<Grid>>,
}

impl MemScreen {
  /// Creates a new blank `MemScreen` of the given size.
  pub fn new(cols: u16, rows: u16) -> Self {
    let cells = vec![Texel::empty(); cols as usize * rows as usize];
    Self {
      grid: Arc::new(Mutex::new(Grid {
        cols,
        rows,
        cells: cells.into_boxed_slice(),
        cursor: ScreenPoint::zero(),
        fg: Color::Reset,
        bg: Color::Reset,
        cursor_visible: true,
      })),
    }
  }

  fn grid(&self) -> MutexGuard<'_, Grid> {
    self.grid.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Returns the texel at `p`, if `p` is on the screen.
  pub fn cell(&self, p: ScreenPoint) -> Option<Texel> {
    let grid = self.grid();
    grid.index(p).map(|i| grid.cells[i])
  }

  /// Returns the glyphs of row `row`, including trailing blanks.
  ///
  /// # Panics
  ///
  /// Panics if `row` is off the screen.
  pub fn row_text(&self, row: u16) -> String {
    let grid = self.grid();
    assert!(row < grid.rows, "row {} is off the screen", row);
    let start = row as usize * grid.cols as usize;
    grid.cells[start..start + grid.cols as usize]
      .iter()
      .map(|t| t.glyph())
      .collect()
  }

  /// Returns `len` glyphs starting at `p`, clipped to the screen.
  pub fn text_at(&self, p: ScreenPoint, len: usize) -> String {
    (0..len)
      .filter_map(|i| self.cell(p.right(i as u16)))
      .map(|t| t.glyph())
      .collect()
  }

  /// Returns whether the cursor is currently shown.
  pub fn cursor_visible(&self) -> bool {
    self.grid().cursor_visible
  }
}

impl Screen for MemScreen {
  fn size(&self) -> io::Result<(u16, u16)> {
    let grid = self.grid();
    Ok((grid.cols, grid.rows))
  }

  fn cursor(&self) -> ScreenPoint {
    self.grid().cursor
  }

  fn move_to(&mut self, p: ScreenPoint) -> io::Result<()> {
    self.grid().cursor = p;
    Ok(())
  }

  fn colors(&self) -> (Color, Color) {
    let grid = self.grid();
    (grid.fg, grid.bg)
  }

  fn set_fg(&mut self, color: Color) -> io::Result<()> {
    self.grid().fg = color;
    Ok(())
  }

  fn set_bg(&mut self, color: Color) -> io::Result<()> {
    self.grid().bg = color;
    Ok(())
  }

  fn print(&mut self, text: &str) -> io::Result<()> {
    let mut grid = self.grid();
    for c in text.chars() {
      let cursor = grid.cursor;
      if let Some(i) = grid.index(cursor) {
        let texel = Texel::new(c).with_fg(grid.fg).with_bg(grid.bg);
        grid.cells[i] = texel;
      }
      grid.cursor = cursor.right(1);
    }
    Ok(())
  }

  fn set_cursor_visible(&mut self, visible: bool) -> io::Result<()> {
    self.grid().cursor_visible = visible;
    Ok(())
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}

/// Creates a connected [`KeyFeed`] and [`ScriptedKeys`] pair.
pub fn scripted() -> (KeyFeed, ScriptedKeys) {
  let (tx, rx) = mpsc::channel();
  (KeyFeed { tx }, ScriptedKeys { rx })
}

/// The sending half of [`scripted()`].
#[derive(Clone, Debug)]
pub struct KeyFeed {
  tx: mpsc::Sender<KeyEvent>,
}

impl KeyFeed {
  /// Queues a raw key event.
  ///
  /// Returns `false` if the [`ScriptedKeys`] side has been dropped.
  pub fn push(&self, event: KeyEvent) -> bool {
    self.tx.send(event).is_ok()
  }

  /// Queues a press of `chord`.
  pub fn press(&self, chord: KeyChord) -> bool {
    self.push(chord.to_event())
  }

  /// Queues one unmodified key press per character of `text`.
  pub fn type_str(&self, text: &str) -> bool {
    text.chars().all(|c| {
      let mods = if c.is_uppercase() {
        KeyModifiers::SHIFT
      } else {
        KeyModifiers::empty()
      };
      self.push(KeyEvent::new(KeyCode::Char(c), mods))
    })
  }
}

/// A [`KeySource`] that replays events queued through a [`KeyFeed`].
///
/// Once every feed is dropped, polling just waits out its timeout.
#[derive(Debug)]
pub struct ScriptedKeys {
  rx: mpsc::Receiver<KeyEvent>,
}

impl KeySource for ScriptedKeys {
  fn poll_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>> {
    match self.rx.recv_timeout(timeout) {
      Ok(e) => Ok(Some(e)),
      Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
      Err(mpsc::RecvTimeoutError::Disconnected) => {
        thread::sleep(timeout);
        Ok(None)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::term::colors;

  #[test]
  fn print_clips_at_right_edge() {
    let mut screen = MemScreen::new(5, 2);
    screen.print_at(ScreenPoint::new(3, 1), "abcd").unwrap();
    assert_eq!(screen.row_text(1), "   ab");
    assert_eq!(screen.cursor(), ScreenPoint::new(7, 1));
  }

  #[test]
  fn print_records_colors() {
    let mut screen = MemScreen::new(5, 1);
    screen.print_colored("x", colors::RED.into()).unwrap();
    screen.print("y").unwrap();
    let x = screen.cell(ScreenPoint::new(0, 0)).unwrap();
    let y = screen.cell(ScreenPoint::new(1, 0)).unwrap();
    assert_eq!(x.fg(), Color::Rgb(colors::RED));
    assert_eq!(y.fg(), Color::Reset);
  }

  #[test]
  fn scripted_keys_replay_in_order() {
    let (feed, mut keys) = scripted();
    feed.type_str("aB");
    let t = Duration::from_millis(10);
    let a = keys.poll_key(t).unwrap().unwrap();
    let b = keys.poll_key(t).unwrap().unwrap();
    assert_eq!(a.code, KeyCode::Char('a'));
    assert_eq!(b.code, KeyCode::Char('B'));
    assert_eq!(b.modifiers, KeyModifiers::SHIFT);
    assert!(keys.poll_key(t).unwrap().is_none());
  }
}
