//! Screen geometry.
//!
//! We use the following convention for coordinates: columns increase to the
//! right, and rows increase downwards, both starting at zero in the upper-left
//! corner of the terminal.

use std::io;
use std::ops::Deref;
use std::ops::DerefMut;

use crate::term::Screen;

/// A cell on the terminal, addressed by column and row.
///
/// `ScreenPoint`s are plain values; offsetting one produces a new point.
/// Moving the cursor is a side effect performed against a [`Screen`].
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Default)]
pub struct ScreenPoint([u16; 2]);

impl ScreenPoint {
  /// Creates a new `ScreenPoint` with the given coordinates.
  #[inline]
  pub const fn new(col: u16, row: u16) -> Self {
    Self([col, row])
  }

  /// Creates a new `ScreenPoint` at the upper-left corner of the screen.
  #[inline]
  pub const fn zero() -> Self {
    Self([0, 0])
  }

  /// Returns the column.
  #[inline]
  pub fn col(self) -> u16 {
    self.0[0]
  }

  /// Returns the row.
  #[inline]
  pub fn row(self) -> u16 {
    self.0[1]
  }

  /// Returns a copy of this point moved by the given deltas.
  ///
  /// Coordinates saturate at the edges of the `u16` range rather than
  /// wrapping, so a point can never leave the top-left corner.
  pub fn offset(self, dcol: i32, drow: i32) -> Self {
    fn clamp(x: u16, dx: i32) -> u16 {
      (i32::from(x) + dx).max(0).min(i32::from(u16::MAX)) as u16
    }
    Self::new(clamp(self.col(), dcol), clamp(self.row(), drow))
  }

  /// Returns a copy of this point `n` columns to the right.
  #[inline]
  pub fn right(self, n: u16) -> Self {
    Self::new(self.col().saturating_add(n), self.row())
  }

  /// Returns a copy of this point `n` rows down.
  #[inline]
  pub fn down(self, n: u16) -> Self {
    Self::new(self.col(), self.row().saturating_add(n))
  }

  /// Moves the terminal cursor to this point.
  pub fn move_to(self, screen: &mut dyn Screen) -> io::Result<()> {
    screen.move_to(self)
  }

  /// Moves the terminal cursor to this point, returning a guard that moves it
  /// back to where it was when dropped.
  ///
  /// The guard dereferences to the screen, so writes can go through it:
  /// ```ignore
  /// let mut s = point.scoped_move(&mut screen)?;
  /// s.print("hello")?;
  /// // The cursor is restored here.
  /// ```
  pub fn scoped_move<'a>(
    self,
    screen: &'a mut dyn Screen,
  ) -> io::Result<CursorGuard<'a>> {
    let saved = screen.cursor();
    screen.move_to(self)?;
    Ok(CursorGuard { screen, saved })
  }
}

impl From<(u16, u16)> for ScreenPoint {
  fn from((col, row): (u16, u16)) -> Self {
    Self::new(col, row)
  }
}

/// A guard for a [`ScreenPoint::scoped_move()`] call.
///
/// Restores the cursor position, and flushes the screen, when dropped.
pub struct CursorGuard<'a> {
  screen: &'a mut dyn Screen,
  saved: ScreenPoint,
}

impl CursorGuard<'_> {
  /// Returns the cursor position that will be restored.
  pub fn saved(&self) -> ScreenPoint {
    self.saved
  }

  /// Restores the cursor early.
  pub fn finish(self) {}
}

impl<'a> Deref for CursorGuard<'a> {
  type Target = dyn Screen + 'a;
  fn deref(&self) -> &Self::Target {
    self.screen
  }
}

impl<'a> DerefMut for CursorGuard<'a> {
  fn deref_mut(&mut self) -> &mut Self::Target {
    self.screen
  }
}

impl Drop for CursorGuard<'_> {
  fn drop(&mut self) {
    // Errors here have nowhere to go; the next draw will surface them.
    let _ = self.screen.move_to(self.saved);
    let _ = self.screen.flush();
  }
}

/// A rectangle of cells owned by a UI element.
///
/// A `Region` is anchored at its upper-left corner and spans `width` columns
/// and `height` rows. A one-row region is a "line".
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct Region {
  origin: ScreenPoint,
  width: u16,
  height: u16,
}

impl Region {
  /// Creates a new `Region` with the given upper-left corner and dimensions.
  #[inline]
  pub const fn new(origin: ScreenPoint, width: u16, height: u16) -> Self {
    Self {
      origin,
      width,
      height,
    }
  }

  /// Creates a new one-row `Region`.
  #[inline]
  pub const fn line(origin: ScreenPoint, width: u16) -> Self {
    Self::new(origin, width, 1)
  }

  /// Returns the width of this `Region`.
  #[inline]
  pub fn width(self) -> u16 {
    self.width
  }

  /// Returns the height of this `Region`.
  #[inline]
  pub fn height(self) -> u16 {
    self.height
  }

  /// Returns whether this `Region` covers no cells at all.
  #[inline]
  pub fn is_empty(self) -> bool {
    self.width == 0 || self.height == 0
  }

  /// Returns the upper-left corner.
  #[inline]
  pub fn top_left(self) -> ScreenPoint {
    self.origin
  }

  /// Returns the upper-right corner, i.e., the last cell of the first row.
  #[inline]
  pub fn top_right(self) -> ScreenPoint {
    self.origin.right(self.width.saturating_sub(1))
  }

  /// Returns the lower-left corner, i.e., the first cell of the last row.
  #[inline]
  pub fn bottom_left(self) -> ScreenPoint {
    self.origin.down(self.height.saturating_sub(1))
  }

  /// Returns the lower-right corner.
  #[inline]
  pub fn bottom_right(self) -> ScreenPoint {
    self.bottom_left().right(self.width.saturating_sub(1))
  }

  /// Returns the first cell of row `i` of this `Region`.
  ///
  /// # Panics
  ///
  /// Panics if `i` is not less than the height.
  pub fn row(self, i: u16) -> ScreenPoint {
    assert!(
      i < self.height,
      "row {} out of range for region of height {}",
      i,
      self.height
    );
    self.origin.down(i)
  }

  /// Returns whether `p` lies inside this `Region`.
  pub fn contains(self, p: ScreenPoint) -> bool {
    let (c, r) = (self.origin.col(), self.origin.row());
    (c..c.saturating_add(self.width)).contains(&p.col())
      && (r..r.saturating_add(self.height)).contains(&p.row())
  }
}
