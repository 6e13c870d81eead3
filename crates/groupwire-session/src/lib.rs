//! Session layer: history polling, frame dispatch and match state.
//!
//! Everything downstream of the relay flows one way:
//!
//! ```text
//! Relay  ->  HistoryCursor  ->  Poller  ->  frame decode  ->  FrameHandler
//! (wire)     (watermark)        (sweeps)                      (MatchRunner)
//! ```
//!
//! The [`Poller`] reads conversation history through per-conversation
//! [`HistoryCursor`]s, decodes each new message and feeds the frames to
//! a [`FrameHandler`]. [`MatchRunner`] is the handler that drives a
//! rock-paper-scissors [`GameSession`] and keeps the match score.

mod cursor;
mod error;
mod game;
mod poller;
mod runner;
mod setup;

pub use cursor::HistoryCursor;
pub use error::SessionError;
pub use game::{Choice, GameSession, PlayerSlot, RoundWinner, SessionEvent, SessionPhase};
pub use poller::{
    FrameHandler, InboundFrame, Poller, PollerCommand, PollerConfig, PollerHandle, PollerStats,
    SharedPollerStats,
};
pub use runner::{GameEvent, MatchPolicy, MatchRunner, MatchScore};
pub use setup::{InviteCodeError, MatchSetup, mint_ticket};
