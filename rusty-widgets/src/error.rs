//! Error taxonomy shared by widgets and paginators.

use thiserror::Error;

/// Result type alias for widget operations.
pub type Result<T> = std::result::Result<T, WidgetError>;

/// Errors returned by widget and paginator operations.
///
/// Every variant except `Transport` is a precondition failure returned to the
/// caller as-is. `Transport` carries the underlying Discord failure of a
/// primary action (initial send, edit).
#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("widget already running")]
    AlreadyRunning,

    #[error("index is out of bounds")]
    IndexOutOfBounds,

    #[error("message is nil")]
    NilMessage,

    #[error("content is nil")]
    NilContent,

    #[error("widget not running")]
    NotRunning,

    #[error("invalid user id")]
    InvalidId,

    #[error("timed out waiting for input")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(#[from] anyhow::Error),
}
