//! Keyboard input.
//!
//! Due to the nature of teletype terminals, the only inputs we can really
//! capture are key presses as recorded by the terminal emulator. This module
//! turns those into [`KeyChord`]s and routes each chord to whatever
//! [`Handler`] the [`BindingRegistry`] holds for it.
//!
//! Routing is done by a [`KeyListener`]: a background thread that polls the
//! [`crate::term::KeySource`] and queues the handlers it finds for a single
//! dispatcher task, which runs them strictly one after another. While a line
//! is being read (see [`crate::Console::read_line()`]) the listener feeds keys
//! to the line buffer instead; only chords with Ctrl held are dispatched.

pub mod chord;
pub(crate) mod line;
pub mod listener;
pub mod registry;

pub use chord::Key;
pub use chord::KeyChord;
pub use chord::Mods;
pub use listener::KeyListener;
pub use registry::handler;
pub use registry::sync_handler;
pub use registry::BindingRegistry;
pub use registry::Handler;
