//! Texels, terminal elements.
//!
//! A *texel* is a single terminal cell: a glyph plus the colors it was drawn
//! with. The [`headless`](super::headless) screen stores one per cell, which is
//! what lets tests check colors as well as text.

pub use palette::named as colors;

/// An RGB value used by a [`Color`].
pub type Rgb = palette::Srgb<u8>;

/// A foreground or background color.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Color {
  /// A solid RGB value.
  Rgb(Rgb),

  /// Whatever the terminal uses when no color is set.
  Reset,
}

impl From<Rgb> for Color {
  fn from(rgb: Rgb) -> Self {
    Self::Rgb(rgb)
  }
}

impl Default for Color {
  fn default() -> Self {
    Self::Reset
  }
}

/// One character cell as drawn: the glyph and both of its colors.
///
/// Widgets that color individual cells, like [`crate::ui::ProgressBar`], lay
/// their output out as texels and hand it to [`super::Screen::print_texels()`].
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Texel {
  glyph: char,
  fg: Color,
  bg: Color,
}

impl Texel {
  /// Creates a new blank texel in the default colors.
  #[inline]
  pub fn empty() -> Self {
    Self::new(' ')
  }

  /// Creates a new texel in the default colors with the given glyph.
  #[inline]
  pub fn new(glyph: char) -> Self {
    Self {
      glyph,
      fg: Color::Reset,
      bg: Color::Reset,
    }
  }

  /// Returns this texel's glyph.
  #[inline]
  pub fn glyph(self) -> char {
    self.glyph
  }

  /// Replaces the glyph, keeping the colors.
  #[inline]
  pub fn with_glyph(mut self, glyph: char) -> Self {
    self.glyph = glyph;
    self
  }

  /// Returns this texel's foreground color.
  #[inline]
  pub fn fg(self) -> Color {
    self.fg
  }

  /// Returns a copy of this texel with the given foreground color.
  #[inline]
  pub fn with_fg(mut self, color: impl Into<Color>) -> Self {
    self.fg = color.into();
    self
  }

  /// Returns this texel's background color.
  #[inline]
  pub fn bg(self) -> Color {
    self.bg
  }

  /// Returns a copy of this texel with the given background color.
  #[inline]
  pub fn with_bg(mut self, color: impl Into<Color>) -> Self {
    self.bg = color.into();
    self
  }
}

impl Default for Texel {
  fn default() -> Self {
    Self::empty()
  }
}
