//! The capability every on-screen element shares.

use std::io;

use crate::console::Console;
use crate::geo::Region;
use crate::term::Screen;

/// Something drawn inside a fixed [`Region`] of a console's screen.
///
/// Elements never repaint the whole terminal. They draw only inside
/// [`Element::bounds()`], and only when asked to; placing elements so that
/// they do not overlap is up to the caller. Every draw leaves the cursor where
/// it found it.
pub trait Element {
  /// Returns the console this element draws on.
  fn console(&self) -> &Console;

  /// Returns the region this element draws in. It is fixed for the life of
  /// the element.
  fn bounds(&self) -> Region;

  /// Returns whether the element should currently be drawn.
  fn visible(&self) -> bool {
    true
  }

  /// Draws the whole element.
  fn redraw(&self) -> io::Result<()>;

  /// Blanks the element's region.
  fn erase(&self) -> io::Result<()> {
    let bounds = self.bounds();
    draw_in(self.console(), bounds, |s| erase_region(s, bounds))
  }

  /// Redraws the element if it is visible, or erases it if not.
  fn refresh(&self) -> io::Result<()> {
    if self.visible() {
      self.redraw()
    } else {
      self.erase()
    }
  }
}

/// Locks `console`'s screen and runs `draw` with the cursor parked at the top
/// left of `region`, restoring the cursor afterwards.
pub fn draw_in<R>(
  console: &Console,
  region: Region,
  draw: impl FnOnce(&mut dyn Screen) -> io::Result<R>,
) -> io::Result<R> {
  let mut screen = console.screen();
  let mut s = region.top_left().scoped_move(&mut **screen)?;
  draw(&mut *s)
}

/// Overwrites every cell of `region` with a space.
pub fn erase_region(screen: &mut dyn Screen, region: Region) -> io::Result<()> {
  let blank = " ".repeat(region.width() as usize);
  for i in 0..region.height() {
    screen.print_at(region.row(i), &blank)?;
  }
  Ok(())
}
