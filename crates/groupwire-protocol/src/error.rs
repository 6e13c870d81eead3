//! Frame error types.

use thiserror::Error;

/// Result type for framing operations.
pub type FrameResult<T> = Result<T, FrameError>;

/// Errors that can occur while encoding or decoding frames.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Sender identity does not fit the fixed header field.
    #[error("sender identity too long: {len} chars (max: {max})")]
    IdentityTooLong { len: usize, max: usize },

    /// Payload does not fit the frame.
    #[error("payload too large: {len} chars (max: {max})")]
    PayloadTooLarge { len: usize, max: usize },

    /// Input is not exactly one frame long.
    #[error("bad frame length: {len} chars (expected {expected})")]
    BadFrameLength { len: usize, expected: usize },

    /// The length field is not a zero-padded decimal number.
    #[error("unparseable length field {field:?}")]
    BadLengthField { field: String },

    /// The declared payload length exceeds the frame capacity.
    #[error("truncated frame: declares {declared} payload chars, {available} available")]
    Truncated { declared: usize, available: usize },
}
