//! Relay backends for frame transport.
//!
//! A [`Relay`] is a group-messaging service acting as a passive
//! transport: peers post opaque text frames into a shared conversation
//! and poll its ordered history to receive them. [`GroupMeRelay`] talks
//! to the hosted GroupMe service; [`MemoryRelay`] keeps everything in
//! process memory for tests and offline play.

pub mod config;
pub mod error;
pub mod groupme;
pub mod memory;
pub mod relay;

pub use config::RelayConfig;
pub use error::{RelayError, RelayErrorCode, RelayResult};
pub use groupme::GroupMeRelay;
pub use memory::MemoryRelay;
pub use relay::{
    BoxFuture, Conversation, ErrorRelay, MessageBatch, RawMessage, Relay, UserIdentity,
};
