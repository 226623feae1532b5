//! Progress bars.
//!
//! A progress bar depicts a fraction as a label, a bar, and optionally the
//! exact values:
//! ```text
//! Copying[||||||||    5/10]
//! ```
//! The digits are drawn over the bar itself, in the bar's colors, so a bar
//! always fills the whole width of its region.

use std::io;
use std::sync::Mutex;
use std::sync::PoisonError;

use crate::console::Console;
use crate::geo::Region;
use crate::term::Texel;
use crate::ui::element::draw_in;
use crate::ui::Element;

/// A one-line progress bar.
pub struct ProgressBar {
  console: Console,
  region: Region,
  label: String,
  brackets: (Texel, Texel),
  active: Texel,
  inactive: Texel,
  include_digits: bool,
  value: Mutex<(u64, u64)>,
}

impl ProgressBar {
  /// Creates a new `ProgressBar` at zero out of `max`, drawn on the first row
  /// of `region`.
  pub fn new(
    console: &Console,
    region: Region,
    label: impl Into<String>,
    max: u64,
  ) -> Self {
    let accent = console.config().accent;
    Self {
      console: console.clone(),
      region,
      label: label.into(),
      brackets: (Texel::new('['), Texel::new(']')),
      active: Texel::new('|').with_fg(accent),
      inactive: Texel::new(' '),
      include_digits: true,
      value: Mutex::new((0, max)),
    }
  }

  /// Sets whether to draw the exact values over the bar.
  pub fn with_digits(mut self, include_digits: bool) -> Self {
    self.include_digits = include_digits;
    self
  }

  /// Sets the glyphs of the bar's filled and empty parts.
  pub fn with_fill(mut self, active: Texel, inactive: Texel) -> Self {
    self.active = active;
    self.inactive = inactive;
    self
  }

  /// Returns the current value and the maximum.
  pub fn value(&self) -> (u64, u64) {
    *self.value.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Sets the current value, clamped to the maximum, and redraws the bar.
  pub fn set(&self, cur: u64) -> io::Result<()> {
    {
      let mut value = self.value.lock().unwrap_or_else(PoisonError::into_inner);
      value.0 = cur.min(value.1);
    }
    self.redraw()
  }

  /// Adds `n` to the current value and redraws the bar.
  pub fn advance(&self, n: u64) -> io::Result<()> {
    let (cur, _) = self.value();
    self.set(cur.saturating_add(n))
  }

  /// Lays the bar out into exactly `width` texels.
  fn texels(&self, width: usize) -> Vec<Texel> {
    let (cur, max) = self.value();
    let digits = format!("{}/{}", cur, max);
    let bar_nums = if self.include_digits {
      digits.chars().count()
    } else {
      0
    };

    // 2 is the brackets.
    let label_len = self.label.chars().count();
    let minimum = label_len + 2 + bar_nums;
    let extra = width.saturating_sub(minimum);
    let mut filled = if max == 0 {
      0
    } else {
      ((bar_nums + extra) as u128 * cur as u128 / max as u128) as usize
    };
    let mut fill = || {
      if filled > 0 {
        filled -= 1;
        self.active
      } else {
        self.inactive
      }
    };

    let mut out = Vec::with_capacity(width.max(minimum));
    out.extend(self.label.chars().map(Texel::new));
    out.push(self.brackets.0);
    for _ in 0..extra {
      out.push(fill());
    }
    if self.include_digits {
      for c in digits.chars() {
        out.push(fill().with_glyph(c));
      }
    }
    out.push(self.brackets.1);

    out.resize(width, Texel::empty());
    out
  }
}

impl Element for ProgressBar {
  fn console(&self) -> &Console {
    &self.console
  }

  fn bounds(&self) -> Region {
    self.region
  }

  fn redraw(&self) -> io::Result<()> {
    let texels = self.texels(self.region.width() as usize);
    draw_in(&self.console, self.region, |s| s.print_texels(&texels))
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::geo::ScreenPoint;
  use crate::term::headless::MemScreen;
  use crate::term::Color;
  use crate::Config;

  fn bar(width: u16) -> (MemScreen, ProgressBar) {
    let screen = MemScreen::new(30, 3);
    let console = Console::new(screen.clone(), Config::default()).unwrap();
    let region = Region::line(ScreenPoint::new(1, 0), width);
    (screen, ProgressBar::new(&console, region, "HP", 10))
  }

  #[test]
  fn draws_fill_and_digits() {
    let (screen, bar) = bar(20);
    bar.set(5).unwrap();
    assert_eq!(
      screen.text_at(ScreenPoint::new(1, 0), 20),
      "HP[||||||||    5/10]"
    );
    assert_eq!(
      screen.cell(ScreenPoint::new(4, 0)).unwrap().fg(),
      Config::default().accent
    );
    let digit = screen.cell(ScreenPoint::new(16, 0)).unwrap();
    assert_eq!(digit.fg(), Color::Reset);

    bar.set(0).unwrap();
    assert_eq!(
      screen.text_at(ScreenPoint::new(1, 0), 20),
      "HP[            0/10]"
    );
  }

  #[test]
  fn clamps_to_max() {
    let (screen, bar) = bar(12);
    bar.advance(7).unwrap();
    bar.advance(7).unwrap();
    assert_eq!(bar.value(), (10, 10));
    assert_eq!(screen.text_at(ScreenPoint::new(1, 0), 12), "HP[|||10/10]");
  }

  #[test]
  fn without_digits() {
    let (screen, bar) = bar(10);
    let bar = bar.with_digits(false);
    bar.set(5).unwrap();
    assert_eq!(screen.text_at(ScreenPoint::new(1, 0), 10), "HP[|||   ]");
  }

  #[test]
  fn too_narrow_is_clipped() {
    let (screen, bar) = bar(5);
    bar.set(3).unwrap();
    assert_eq!(screen.text_at(ScreenPoint::new(1, 0), 6), "HP[3/ ");
  }
}
