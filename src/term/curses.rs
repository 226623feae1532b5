//! `curses` helper library.
//!
//! Note that this module doesn't *actually* use `libcurses`, and merely
//! emulates the handful of primitives the widgets need in terms of crossterm.
//!
//! Errors from crossterm are converted into [`io::Error`]s at this boundary.

use std::io;
use std::time::Duration;

use crate::geo::ScreenPoint;
use crate::term::Color;
use crate::term::KeyEvent;
use crate::term::KeySource;
use crate::term::Screen;

fn io_err(e: crossterm::ErrorKind) -> io::Error {
  match e {
    crossterm::ErrorKind::IoError(e) => e,
    e => io::Error::new(io::ErrorKind::Other, e.to_string()),
  }
}

fn to_crossterm(color: Color) -> crossterm::style::Color {
  match color {
    Color::Rgb(rgb) => crossterm::style::Color::Rgb {
      r: rgb.red,
      g: rgb.green,
      b: rgb.blue,
    },
    Color::Reset => crossterm::style::Color::Reset,
  }
}

/// A low-level curses context.
///
/// Puts the terminal into raw mode for as long as it lives. The cursor position
/// is tracked locally rather than queried from the terminal, so it is only
/// accurate as long as all output goes through this value.
pub struct Curses<W: io::Write + Send = io::Stdout> {
  w: W,
  cursor: ScreenPoint,
  fg: Color,
  bg: Color,
  fullscreen: bool,
}

impl Curses {
  /// Initializes the `curses` environment on `stdout`, drawing over whatever
  /// is already on the screen.
  pub fn init() -> io::Result<Curses> {
    Curses::with(io::stdout(), false)
  }

  /// Initializes the `curses` environment on `stdout`, on a cleared alternate
  /// screen.
  pub fn fullscreen() -> io::Result<Curses> {
    Curses::with(io::stdout(), true)
  }
}

impl<W: io::Write + Send> Curses<W> {
  /// Initializes the `curses` environment for `w`.
  pub fn with(mut w: W, fullscreen: bool) -> io::Result<Curses<W>> {
    if fullscreen {
      crossterm::execute!(
        w,
        crossterm::terminal::EnterAlternateScreen,
        crossterm::terminal::Clear(crossterm::terminal::ClearType::All),
      )
      .map_err(io_err)?;
    }
    crossterm::execute!(
      w,
      crossterm::cursor::Hide,
      crossterm::terminal::DisableLineWrap,
    )
    .map_err(io_err)?;
    crossterm::terminal::enable_raw_mode().map_err(io_err)?;

    Ok(Curses {
      w,
      cursor: ScreenPoint::zero(),
      fg: Color::Reset,
      bg: Color::Reset,
      fullscreen,
    })
  }

  /// Clean up whatever mess the terminal made.
  fn cleanup(&mut self) -> io::Result<()> {
    crossterm::execute!(
      self.w,
      crossterm::style::ResetColor,
      crossterm::cursor::Show,
      crossterm::terminal::EnableLineWrap,
    )
    .map_err(io_err)?;
    if self.fullscreen {
      crossterm::execute!(self.w, crossterm::terminal::LeaveAlternateScreen)
        .map_err(io_err)?;
    }
    crossterm::terminal::disable_raw_mode().map_err(io_err)?;
    self.w.flush()
  }
}

impl<W: io::Write + Send> Screen for Curses<W> {
  fn size(&self) -> io::Result<(u16, u16)> {
    crossterm::terminal::size().map_err(io_err)
  }

  fn cursor(&self) -> ScreenPoint {
    self.cursor
  }

  fn move_to(&mut self, p: ScreenPoint) -> io::Result<()> {
    crossterm::queue!(self.w, crossterm::cursor::MoveTo(p.col(), p.row()))
      .map_err(io_err)?;
    self.cursor = p;
    Ok(())
  }

  fn colors(&self) -> (Color, Color) {
    (self.fg, self.bg)
  }

  fn set_fg(&mut self, color: Color) -> io::Result<()> {
    crossterm::queue!(
      self.w,
      crossterm::style::SetForegroundColor(to_crossterm(color))
    )
    .map_err(io_err)?;
    self.fg = color;
    Ok(())
  }

  fn set_bg(&mut self, color: Color) -> io::Result<()> {
    crossterm::queue!(
      self.w,
      crossterm::style::SetBackgroundColor(to_crossterm(color))
    )
    .map_err(io_err)?;
    self.bg = color;
    Ok(())
  }

  fn print(&mut self, text: &str) -> io::Result<()> {
    crossterm::queue!(self.w, crossterm::style::Print(text)).map_err(io_err)?;
    let n = text.chars().count().min(u16::MAX as usize) as u16;
    self.cursor = self.cursor.right(n);
    Ok(())
  }

  fn set_cursor_visible(&mut self, visible: bool) -> io::Result<()> {
    if visible {
      crossterm::queue!(self.w, crossterm::cursor::Show).map_err(io_err)
    } else {
      crossterm::queue!(self.w, crossterm::cursor::Hide).map_err(io_err)
    }
  }

  fn flush(&mut self) -> io::Result<()> {
    self.w.flush()
  }
}

impl<W: io::Write + Send> Drop for Curses<W> {
  fn drop(&mut self) {
    let _ = self.cleanup();
  }
}

/// Reads key presses from the terminal through crossterm's event queue.
///
/// Only meaningful while a [`Curses`] holds the terminal in raw mode.
#[derive(Debug, Default)]
pub struct CursesKeys;

impl KeySource for CursesKeys {
  fn poll_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>> {
    use crossterm::event;

    if !event::poll(timeout).map_err(io_err)? {
      return Ok(None);
    }
    match event::read().map_err(io_err)? {
      event::Event::Key(e) => Ok(Some(e)),
      _ => Ok(None),
    }
  }
}
