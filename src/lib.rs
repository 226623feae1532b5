//! Console-screen widgets drawn at fixed terminal coordinates.
//!
//! `conkit` lets a program place simple text-mode elements (menus, prompts,
//! pagers, progress bars, key/value tables, and a status bar) at fixed
//! positions on a terminal and update them in place. Nothing is ever repainted
//! wholesale: every element owns a [`geo::Region`] and redraws only the rows
//! inside it, parking the cursor back where it found it afterwards.
//!
//! The moving parts are:
//! - A [`Console`], the context object holding the screen, the
//!   [`input::BindingRegistry`], the [`ui::StatusBar`] state, and line input.
//! - A [`input::KeyListener`], a background thread turning raw key presses
//!   into [`input::KeyChord`]s and handing their handlers to a single
//!   dispatcher task, one at a time.
//! - Interactive widgets, whose `show()` installs a status-bar page of key
//!   bindings and then awaits a single result.

#![warn(missing_docs)]
#![warn(unused)]

pub mod config;
pub mod console;
pub mod error;
pub mod geo;
pub mod input;
pub mod logging;
pub mod term;
pub mod ui;

pub use config::Config;
pub use console::Console;
pub use error::Error;
pub use error::Result;
