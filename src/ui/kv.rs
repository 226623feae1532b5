//! Key-value displays.

use std::io;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use crate::console::Console;
use crate::geo::Region;
use crate::term::fit;
use crate::term::Screen;
use crate::ui::element::draw_in;
use crate::ui::Element;

/// A two-column table of labeled values, one per row, in insertion order:
/// ```text
/// Host:     example.org
/// Status:   connected
/// ```
/// Keys are padded to a fixed column width; values are clipped to whatever is
/// left of the region. Rows past the bottom of the region are kept but not
/// drawn.
pub struct KeyValueView {
  console: Console,
  region: Region,
  pad: usize,
  rows: Mutex<Vec<(String, String)>>,
}

impl KeyValueView {
  /// Creates a new, empty `KeyValueView` whose key column is `pad` characters
  /// wide.
  ///
  /// # Panics
  ///
  /// Panics if `pad` is zero or leaves no room for values.
  pub fn new(console: &Console, region: Region, pad: usize) -> Self {
    assert!(
      pad > 0 && pad < region.width() as usize,
      "key column of {} does not fit in a width of {}",
      pad,
      region.width()
    );
    Self {
      console: console.clone(),
      region,
      pad,
      rows: Mutex::new(Vec::new()),
    }
  }

  fn rows(&self) -> MutexGuard<'_, Vec<(String, String)>> {
    self.rows.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Returns the value shown for `key`.
  pub fn get(&self, key: &str) -> Option<String> {
    let rows = self.rows();
    rows.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
  }

  /// Returns the number of rows.
  pub fn len(&self) -> usize {
    self.rows().len()
  }

  /// Returns whether there are no rows.
  pub fn is_empty(&self) -> bool {
    self.rows().is_empty()
  }

  /// Shows `value` for `key`, adding a row at the bottom if `key` is new.
  ///
  /// Only the affected row is redrawn.
  pub fn set(
    &self,
    key: impl Into<String>,
    value: impl Into<String>,
  ) -> io::Result<()> {
    let (key, value) = (key.into(), value.into());
    let mut rows = self.rows();
    let i = match rows.iter().position(|(k, _)| *k == key) {
      Some(i) => {
        rows[i].1 = value;
        i
      }
      None => {
        rows.push((key, value));
        rows.len() - 1
      }
    };
    self.draw_from(&rows, i, i + 1)
  }

  /// Removes the row for `key`, moving the rows below it up. Returns whether
  /// there was such a row.
  pub fn remove(&self, key: &str) -> io::Result<bool> {
    let mut rows = self.rows();
    let i = match rows.iter().position(|(k, _)| k == key) {
      Some(i) => i,
      None => return Ok(false),
    };
    rows.remove(i);
    // One extra row to blank out the old last line.
    self.draw_from(&rows, i, rows.len() + 1)?;
    Ok(true)
  }

  /// Draws rows `start..end`, blanking rows with no entry.
  fn draw_from(
    &self,
    rows: &[(String, String)],
    start: usize,
    end: usize,
  ) -> io::Result<()> {
    let height = self.region.height() as usize;
    let end = end.min(height);
    if start >= end {
      return Ok(());
    }

    let accent = self.console.config().accent;
    let value_width = self.region.width() as usize - self.pad;
    draw_in(&self.console, self.region, |s: &mut dyn Screen| {
      for i in start..end {
        s.move_to(self.region.row(i as u16))?;
        match rows.get(i) {
          Some((k, v)) => {
            s.print_colored(&fit(&format!("{}:", k), self.pad), accent)?;
            s.print(&fit(v, value_width))?;
          }
          None => s.print(&fit("", self.region.width() as usize))?,
        }
      }
      Ok(())
    })
  }
}

impl Element for KeyValueView {
  fn console(&self) -> &Console {
    &self.console
  }

  fn bounds(&self) -> Region {
    self.region
  }

  fn redraw(&self) -> io::Result<()> {
    let rows = self.rows();
    self.draw_from(&rows, 0, self.region.height() as usize)
  }
}
