//! Match orchestration over a frame stream.

use groupwire_protocol::FrameError;
use groupwire_relay::RawMessage;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

use crate::error::SessionError;
use crate::game::{GameSession, PlayerSlot, RoundWinner, SessionEvent};
use crate::poller::{FrameHandler, InboundFrame};

/// When a match ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Rounds continue until a player walks away.
    OpenEnded,
    /// First player to reach this many round wins takes the match.
    FirstTo(u32),
}

impl MatchPolicy {
    fn is_match_over(&self, score: MatchScore) -> bool {
        match self {
            MatchPolicy::OpenEnded => false,
            MatchPolicy::FirstTo(target) => {
                score.player_one >= *target || score.player_two >= *target
            }
        }
    }
}

/// Round wins per player, ties counted separately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchScore {
    pub player_one: u32,
    pub player_two: u32,
    pub ties: u32,
}

impl MatchScore {
    fn record(&mut self, winner: RoundWinner) {
        match winner {
            RoundWinner::PlayerOne => self.player_one += 1,
            RoundWinner::PlayerTwo => self.player_two += 1,
            RoundWinner::Tie => self.ties += 1,
        }
    }
}

/// What a match reports as it progresses, for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    ChoiceRecorded { player: PlayerSlot },
    RoundResolved { winner: RoundWinner, score: MatchScore },
    MatchOver { score: MatchScore },
    FrameRejected { reason: String },
}

/// Drives a [`GameSession`] from inbound frames.
///
/// The runner keeps score across rounds, reopens the session after each
/// resolution, and closes the match once the policy says it is decided.
/// Progress is reported on an unbounded event channel.
pub struct MatchRunner {
    session: GameSession,
    policy: MatchPolicy,
    score: MatchScore,
    events: UnboundedSender<GameEvent>,
}

impl MatchRunner {
    pub fn new(session: GameSession, policy: MatchPolicy) -> (Self, UnboundedReceiver<GameEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        (
            Self {
                session,
                policy,
                score: MatchScore::default(),
                events,
            },
            receiver,
        )
    }

    pub fn score(&self) -> MatchScore {
        self.score
    }

    fn emit(&self, event: GameEvent) {
        // The receiver going away just means nobody is rendering
        // events any more.
        let _ = self.events.send(event);
    }
}

impl FrameHandler for MatchRunner {
    fn on_frame(&mut self, frame: InboundFrame) {
        if frame.conversation_id != self.session.conversation_id() {
            return;
        }

        match self.session.receive(&frame.sender, &frame.payload) {
            Ok(SessionEvent::ChoiceRecorded { player }) => {
                self.emit(GameEvent::ChoiceRecorded { player });
            }
            Ok(SessionEvent::RoundResolved { winner }) => {
                self.score.record(winner);
                info!(?winner, score = ?self.score, "round resolved");
                self.emit(GameEvent::RoundResolved {
                    winner,
                    score: self.score,
                });
                if self.policy.is_match_over(self.score) {
                    self.session.close();
                    self.emit(GameEvent::MatchOver { score: self.score });
                } else {
                    self.session.begin_next_round();
                }
            }
            // Not ours; another session may share the conversation.
            Err(SessionError::UnknownSender { .. }) => {}
            Err(err @ (SessionError::InvalidChoice { .. } | SessionError::AlreadyResolved)) => {
                debug!(error = %err, "frame rejected");
                self.emit(GameEvent::FrameRejected {
                    reason: err.to_string(),
                });
            }
        }
    }

    fn on_undecodable(&mut self, conversation_id: &str, message: &RawMessage, error: &FrameError) {
        debug!(
            conversation_id,
            message_id = %message.id,
            error = %error,
            "ignoring undecodable message"
        );
    }
}
