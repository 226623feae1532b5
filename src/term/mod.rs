//! The terminal I/O boundary.
//!
//! Widgets never talk to a terminal directly; they write through a [`Screen`]
//! and the key listener reads through a [`KeySource`]. Output and input are
//! separate traits so that the listener thread can own the input side while
//! widgets share the output side behind the [`crate::Console`].
//!
//! Two implementations ship with the crate:
//! - [`curses`], backed by crossterm, for real terminals.
//! - [`headless`], an in-memory screen and a channel-fed key source, for tests
//!   and for driving widgets programmatically.

use std::io;
use std::time::Duration;

use crate::geo::ScreenPoint;

pub mod curses;
pub mod headless;
pub mod texel;

pub use crossterm::event::KeyEvent;
pub use texel::colors;
pub use texel::Color;
pub use texel::Texel;

/// The output side of a character-cell terminal.
///
/// Implementations are free to buffer writes until [`Screen::flush()`].
pub trait Screen: Send {
  /// Returns the size of the screen, as `(columns, rows)`.
  fn size(&self) -> io::Result<(u16, u16)>;

  /// Returns the current cursor position.
  fn cursor(&self) -> ScreenPoint;

  /// Moves the cursor to `p`.
  fn move_to(&mut self, p: ScreenPoint) -> io::Result<()>;

  /// Returns the current `(foreground, background)` colors.
  fn colors(&self) -> (Color, Color);

  /// Sets the foreground color for subsequent writes.
  fn set_fg(&mut self, color: Color) -> io::Result<()>;

  /// Sets the background color for subsequent writes.
  fn set_bg(&mut self, color: Color) -> io::Result<()>;

  /// Writes `text` at the cursor, advancing it one column per character.
  fn print(&mut self, text: &str) -> io::Result<()>;

  /// Shows or hides the cursor.
  fn set_cursor_visible(&mut self, visible: bool) -> io::Result<()>;

  /// Flushes any buffered output.
  fn flush(&mut self) -> io::Result<()>;

  /// Writes `text` in the foreground color `fg`, then restores the previous
  /// foreground color.
  fn print_colored(&mut self, text: &str, fg: Color) -> io::Result<()> {
    let (old, _) = self.colors();
    self.set_fg(fg)?;
    self.print(text)?;
    self.set_fg(old)
  }

  /// Moves the cursor to `p` and writes `text` there.
  fn print_at(&mut self, p: ScreenPoint, text: &str) -> io::Result<()> {
    self.move_to(p)?;
    self.print(text)
  }

  /// Writes each texel in its own colors, then restores the previous colors.
  fn print_texels(&mut self, texels: &[Texel]) -> io::Result<()> {
    let (fg, bg) = self.colors();
    let mut buf = [0; 4];
    for tx in texels {
      if self.colors() != (tx.fg(), tx.bg()) {
        self.set_fg(tx.fg())?;
        self.set_bg(tx.bg())?;
      }
      self.print(tx.glyph().encode_utf8(&mut buf))?;
    }
    self.set_fg(fg)?;
    self.set_bg(bg)
  }
}

/// The input side of a terminal.
pub trait KeySource: Send {
  /// Waits up to `timeout` for a key press.
  ///
  /// Returns `Ok(None)` if nothing arrived in time; non-key events are
  /// swallowed.
  fn poll_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>>;

  /// Blocks until a key is pressed.
  fn read_key(&mut self) -> io::Result<KeyEvent> {
    loop {
      if let Some(key) = self.poll_key(Duration::from_millis(100))? {
        return Ok(key);
      }
    }
  }
}

/// Truncates or pads `text` with spaces so that it is exactly `width`
/// characters long.
pub fn fit(text: &str, width: usize) -> String {
  let mut out = text.chars().take(width).collect::<String>();
  let len = out.chars().count();
  out.extend(std::iter::repeat(' ').take(width - len));
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fit_pads_and_truncates() {
    assert_eq!(fit("abc", 5), "abc  ");
    assert_eq!(fit("abcdef", 4), "abcd");
    assert_eq!(fit("", 2), "  ");
    assert_eq!(fit("↑↓", 3), "↑↓ ");
  }
}
