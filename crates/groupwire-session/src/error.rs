//! Session error types.

use thiserror::Error;

/// Errors raised while feeding frames into a game session.
///
/// None of these are fatal: the offending frame is dropped and the
/// session state is left unchanged.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The frame's sender matches neither player ticket.
    #[error("unknown sender {sender:?}")]
    UnknownSender { sender: String },

    /// The payload is not a recognizable choice.
    #[error("invalid choice {payload:?}")]
    InvalidChoice { payload: String },

    /// A choice arrived for a round that has already been resolved.
    #[error("round already resolved")]
    AlreadyResolved,
}
