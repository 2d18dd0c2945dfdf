//! Reaction-driven message widgets for Twilight bots.
//!
//! A [`Widget`] owns one embed message and dispatches reactions on it to
//! per-emoji handlers. A [`Paginator`] builds page navigation on top.

/// Page embed builders and footer formatting.
pub mod embed;
/// Error taxonomy for widget operations.
pub mod error;
/// Emoji handler table.
pub mod handlers;
/// In-memory transport for tests.
#[cfg(any(test, feature = "mock"))]
pub mod mock;
/// Multi-page embeds navigated with reaction buttons.
pub mod paginator;
/// Pure parser helpers.
pub mod parse;
/// Transport port and event fan-out.
pub mod transport;
/// Twilight-backed transport.
pub mod twilight;
/// Reaction widget event loop.
pub mod widget;

/// Single source of truth for the message-command prefix.
pub const COMMAND_PREFIX: char = '!';

pub use error::{Result, WidgetError};
pub use handlers::{WidgetHandler, handler};
pub use paginator::{DoneBehavior, Paginator};
pub use transport::{MessageEvent, MessageHandle, ReactionEvent, Subscription, Transport};
pub use twilight::TwilightTransport;
pub use widget::Widget;
