//! Widgets.
//!
//! Every widget draws inside a fixed [`crate::geo::Region`] through the
//! [`Element`] trait. The interactive ones ([`Menu`], [`YesNo`],
//! [`TextPrompt`], [`Pager`]) follow one pattern: `open()` draws the widget,
//! swaps its keys onto the [`StatusBar`], and returns a [`PendingResult`];
//! `show()` is `open()` followed by awaiting that result. The result is
//! delivered exactly once, when the user confirms, dismisses, or the caller's
//! cancellation token fires, after which the previous status bar page is put
//! back. A finished widget can be shown again. Dropping a `show()` future
//! before it completes aborts the widget.

pub mod element;
pub mod kv;
pub mod menu;
pub mod pager;
pub mod pending;
pub mod progress;
pub mod prompt;
pub mod status;

pub use element::Element;
pub use kv::KeyValueView;
pub use menu::Dismiss;
pub use menu::Menu;
pub use menu::MenuEntry;
pub use menu::MenuOptions;
pub use menu::SelectMode;
pub use pager::Pager;
pub use pending::PendingResult;
pub use pending::Resolver;
pub use progress::ProgressBar;
pub use prompt::TextPrompt;
pub use prompt::YesNo;
pub use status::StatusBar;
pub use status::StatusItem;
