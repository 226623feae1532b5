//! Key chords.
//!
//! A [`KeyChord`] is a base key plus a set of held modifiers, treated as a
//! single addressable input. Chords are canonicalized on construction, so two
//! chords built from the same key and modifiers are always equal and hash the
//! same; that is what lets the [`super::BindingRegistry`] find, replace, and
//! remove bindings by value.

use std::fmt;
use std::str::FromStr;

use crossterm::event::KeyModifiers;

use crate::error::Error;
use crate::term::KeyEvent;

/// A base key, as reported by the terminal.
pub use crossterm::event::KeyCode as Key;

bitflags::bitflags! {
  /// Modifier keys held during a chord.
  pub struct Mods: u8 {
    /// Shift.
    const SHIFT = 1 << 0;
    /// Control.
    const CTRL = 1 << 1;
    /// Alt, or Option.
    const ALT = 1 << 2;
  }
}

impl From<KeyModifiers> for Mods {
  fn from(m: KeyModifiers) -> Self {
    let mut mods = Mods::empty();
    mods.set(Mods::SHIFT, m.contains(KeyModifiers::SHIFT));
    mods.set(Mods::CTRL, m.contains(KeyModifiers::CONTROL));
    mods.set(Mods::ALT, m.contains(KeyModifiers::ALT));
    mods
  }
}

impl From<Mods> for KeyModifiers {
  fn from(m: Mods) -> Self {
    let mut mods = KeyModifiers::empty();
    mods.set(KeyModifiers::SHIFT, m.contains(Mods::SHIFT));
    mods.set(KeyModifiers::CONTROL, m.contains(Mods::CTRL));
    mods.set(KeyModifiers::ALT, m.contains(Mods::ALT));
    mods
  }
}

/// A key plus modifiers.
///
/// Construction canonicalizes the pair:
/// - A character key carries SHIFT if and only if the character is upper-case,
///   and is stored lower-case; `'Q'` and `Shift+q` are the same chord, and
///   `'?'` is the same chord whether or not the terminal reported SHIFT.
/// - `BackTab` is stored as `Shift+Tab`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct KeyChord {
  key: Key,
  mods: Mods,
}

#[allow(missing_docs)]
impl KeyChord {
  pub const ENTER: KeyChord = KeyChord::raw(Key::Enter);
  pub const ESC: KeyChord = KeyChord::raw(Key::Esc);
  pub const UP: KeyChord = KeyChord::raw(Key::Up);
  pub const DOWN: KeyChord = KeyChord::raw(Key::Down);
  pub const LEFT: KeyChord = KeyChord::raw(Key::Left);
  pub const RIGHT: KeyChord = KeyChord::raw(Key::Right);
  pub const PAGE_UP: KeyChord = KeyChord::raw(Key::PageUp);
  pub const PAGE_DOWN: KeyChord = KeyChord::raw(Key::PageDown);
  pub const HOME: KeyChord = KeyChord::raw(Key::Home);
  pub const END: KeyChord = KeyChord::raw(Key::End);
  pub const TAB: KeyChord = KeyChord::raw(Key::Tab);
  pub const BACKSPACE: KeyChord = KeyChord::raw(Key::Backspace);
  pub const SPACE: KeyChord = KeyChord::raw(Key::Char(' '));
}

impl KeyChord {
  const fn raw(key: Key) -> Self {
    Self {
      key,
      mods: Mods::empty(),
    }
  }

  /// Creates a new, canonical `KeyChord`.
  pub fn new(key: Key, mods: Mods) -> Self {
    match key {
      Key::Char(c) => {
        let mut mods = mods;
        mods.set(Mods::SHIFT, c.is_uppercase());
        let c = c.to_lowercase().next().unwrap_or(c);
        Self {
          key: Key::Char(c),
          mods,
        }
      }
      Key::BackTab => Self {
        key: Key::Tab,
        mods: mods | Mods::SHIFT,
      },
      key => Self { key, mods },
    }
  }

  /// Creates a chord for an unmodified key.
  pub fn plain(key: Key) -> Self {
    Self::new(key, Mods::empty())
  }

  /// Creates a chord for typing `c`.
  ///
  /// Upper-case characters imply SHIFT.
  pub fn char(c: char) -> Self {
    Self::new(Key::Char(c), Mods::empty())
  }

  /// Creates a chord for `Ctrl` plus `c`.
  pub fn ctrl(c: char) -> Self {
    Self::new(Key::Char(c), Mods::CTRL)
  }

  /// Creates a chord for `Alt` plus `c`.
  pub fn alt(c: char) -> Self {
    Self::new(Key::Char(c), Mods::ALT)
  }

  /// Returns the base key.
  #[inline]
  pub fn key(self) -> Key {
    self.key
  }

  /// Returns the modifiers.
  #[inline]
  pub fn mods(self) -> Mods {
    self.mods
  }

  /// Converts this chord back into a key event, as a terminal would have
  /// reported it.
  pub fn to_event(self) -> KeyEvent {
    let key = match self.key {
      Key::Char(c) if self.mods.contains(Mods::SHIFT) => {
        Key::Char(c.to_uppercase().next().unwrap_or(c))
      }
      Key::Tab if self.mods.contains(Mods::SHIFT) => Key::BackTab,
      k => k,
    };
    KeyEvent::new(key, self.mods.into())
  }
}

impl From<KeyEvent> for KeyChord {
  fn from(e: KeyEvent) -> Self {
    Self::new(e.code, e.modifiers.into())
  }
}

impl fmt::Display for KeyChord {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.mods.contains(Mods::CTRL) {
      f.write_str("Ctrl+")?;
    }
    if self.mods.contains(Mods::ALT) {
      f.write_str("Alt+")?;
    }
    if self.mods.contains(Mods::SHIFT) {
      f.write_str("Shift+")?;
    }
    match self.key {
      Key::Char(' ') => f.write_str("Space"),
      Key::Char(c) => write!(f, "{}", c.to_uppercase()),
      Key::F(n) => write!(f, "F{}", n),
      Key::Backspace => f.write_str("Backspace"),
      Key::Enter => f.write_str("Enter"),
      Key::Left => f.write_str("←"),
      Key::Right => f.write_str("→"),
      Key::Up => f.write_str("↑"),
      Key::Down => f.write_str("↓"),
      Key::Home => f.write_str("Home"),
      Key::End => f.write_str("End"),
      Key::PageUp => f.write_str("PgUp"),
      Key::PageDown => f.write_str("PgDn"),
      Key::Tab => f.write_str("Tab"),
      Key::BackTab => f.write_str("BackTab"),
      Key::Delete => f.write_str("Del"),
      Key::Insert => f.write_str("Ins"),
      Key::Null => f.write_str("Null"),
      Key::Esc => f.write_str("Esc"),
    }
  }
}

/// Parses strings like `"q"`, `"Ctrl+x"`, `"shift+tab"`, `"F5"`, or `"PgDn"`.
///
/// Modifier and key names are case-insensitive; a single character key keeps
/// its case, so `"Q"` parses as `Shift+q` and `"Ctrl+X"` as `Ctrl+Shift+x`.
impl FromStr for KeyChord {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let invalid = || Error::InvalidChord(s.to_string());
    let s = s.trim();

    // A lone "+" is the plus key, not a separator.
    if s == "+" {
      return Ok(Self::char('+'));
    }

    let mut mods = Mods::empty();
    let mut name = None;
    for part in s.split('+').map(str::trim) {
      match part.to_ascii_lowercase().as_str() {
        "ctrl" | "control" => mods |= Mods::CTRL,
        "alt" | "option" => mods |= Mods::ALT,
        "shift" => mods |= Mods::SHIFT,
        _ if name.is_none() && !part.is_empty() => name = Some(part),
        _ => return Err(invalid()),
      }
    }
    let name = name.ok_or_else(invalid)?;

    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
      let c = if mods.contains(Mods::SHIFT) {
        c.to_uppercase().next().unwrap_or(c)
      } else {
        c
      };
      return Ok(Self::new(Key::Char(c), mods));
    }

    let key = match name.to_ascii_lowercase().as_str() {
      "enter" | "return" => Key::Enter,
      "esc" | "escape" => Key::Esc,
      "space" => Key::Char(' '),
      "tab" => Key::Tab,
      "backtab" => Key::BackTab,
      "backspace" => Key::Backspace,
      "delete" | "del" => Key::Delete,
      "insert" | "ins" => Key::Insert,
      "home" => Key::Home,
      "end" => Key::End,
      "pageup" | "pgup" => Key::PageUp,
      "pagedown" | "pgdn" => Key::PageDown,
      "up" => Key::Up,
      "down" => Key::Down,
      "left" => Key::Left,
      "right" => Key::Right,
      other => match other.strip_prefix('f').map(str::parse::<u8>) {
        Some(Ok(n)) if (1..=24).contains(&n) => Key::F(n),
        _ => return Err(invalid()),
      },
    };
    Ok(Self::new(key, mods))
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use super::*;

  #[test]
  fn equal_chords_are_the_same_map_key() {
    let a = KeyChord::new(Key::Char('x'), Mods::CTRL);
    let b = KeyChord::new(Key::Char('x'), Mods::CTRL);
    assert_eq!(a, b);

    let mut map = HashMap::new();
    map.insert(a, 1);
    map.insert(b, 2);
    assert_eq!(map.len(), 1);
    assert_eq!(map[&KeyChord::ctrl('x')], 2);
  }

  #[test]
  fn upper_case_means_shift() {
    assert_eq!(KeyChord::char('Q'), KeyChord::new(Key::Char('q'), Mods::SHIFT));
    assert_eq!(
      KeyChord::from(KeyEvent::new(Key::Char('Q'), KeyModifiers::SHIFT)),
      KeyChord::char('Q')
    );
    // Symbols never carry SHIFT, whatever the terminal reports.
    assert_eq!(
      KeyChord::from(KeyEvent::new(Key::Char('?'), KeyModifiers::SHIFT)),
      KeyChord::char('?')
    );
    assert_eq!(
      KeyChord::plain(Key::BackTab),
      KeyChord::new(Key::Tab, Mods::SHIFT)
    );
  }

  #[test]
  fn event_round_trip_keeps_case() {
    let e = KeyChord::char('Q').to_event();
    assert_eq!(e.code, Key::Char('Q'));
    assert_eq!(KeyChord::from(e), KeyChord::char('Q'));
  }

  #[test]
  fn display() {
    assert_eq!(KeyChord::ctrl('q').to_string(), "Ctrl+Q");
    assert_eq!(KeyChord::char('q').to_string(), "Q");
    assert_eq!(KeyChord::ENTER.to_string(), "Enter");
    assert_eq!(KeyChord::UP.to_string(), "↑");
    assert_eq!(KeyChord::SPACE.to_string(), "Space");
    assert_eq!(KeyChord::plain(Key::F(5)).to_string(), "F5");
  }

  #[test]
  fn parse() {
    assert_eq!("ctrl+q".parse::<KeyChord>().unwrap(), KeyChord::ctrl('q'));
    assert_eq!("Ctrl + x".parse::<KeyChord>().unwrap(), KeyChord::ctrl('x'));
    assert_eq!("Q".parse::<KeyChord>().unwrap(), KeyChord::char('Q'));
    assert_eq!("shift+q".parse::<KeyChord>().unwrap(), KeyChord::char('Q'));
    assert_eq!(
      "Shift+Tab".parse::<KeyChord>().unwrap(),
      KeyChord::plain(Key::BackTab)
    );
    assert_eq!("PgDn".parse::<KeyChord>().unwrap(), KeyChord::PAGE_DOWN);
    assert_eq!("f12".parse::<KeyChord>().unwrap(), KeyChord::plain(Key::F(12)));
    assert_eq!("+".parse::<KeyChord>().unwrap(), KeyChord::char('+'));

    for bad in &["", "ctrl+", "ctrl+a+b", "f99", "banana"] {
      assert!(bad.parse::<KeyChord>().is_err(), "{:?} parsed", bad);
    }
  }
}
