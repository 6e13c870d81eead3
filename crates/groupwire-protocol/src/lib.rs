//! Fixed-layout text framing for relay-borne messages.
//!
//! A frame embeds a sender identity and a length-delimited payload in a
//! fixed-length text blob that rides inside an ordinary chat message:
//!
//! ```text
//! +---------------------------+---------+------------------+----------+
//! | sender id (left-pad 'A')  | len 3d  | payload          | pad 'A'  |
//! |         32 chars          | 0-padded| len chars        | to 500   |
//! +---------------------------+---------+------------------+----------+
//! ```
//!
//! The payload may itself contain the filler character; only the decimal
//! length field determines where it ends.
//!
//! # Example
//!
//! ```rust
//! use groupwire_protocol::{decode, encode, FRAME_LEN};
//!
//! let wire = encode("abc123", "hello").unwrap();
//! assert_eq!(wire.chars().count(), FRAME_LEN);
//!
//! let frame = decode(&wire).unwrap();
//! assert_eq!(frame.sender, "abc123");
//! assert_eq!(frame.payload, "hello");
//! ```

mod error;
mod framing;

pub use error::{FrameError, FrameResult};
pub use framing::{decode, encode, encode_with, Frame};

/// Total encoded frame length, in characters.
pub const FRAME_LEN: usize = 500;

/// Width of the sender-identity header field, in characters.
pub const SENDER_WIDTH: usize = 32;

/// Width of the decimal payload-length header field, in characters.
pub const LEN_WIDTH: usize = 3;

/// Total header length, in characters.
pub const HEADER_LEN: usize = SENDER_WIDTH + LEN_WIDTH;

/// Maximum payload length, in characters.
///
/// The three-digit length field could describe up to 999 characters, so
/// the frame capacity of 465 is the binding limit.
pub const MAX_PAYLOAD: usize = FRAME_LEN - HEADER_LEN;

/// Padding character for the sender field and the frame tail.
///
/// Never valid inside a sender identity; payloads may contain it freely.
pub const FILLER: char = 'A';
