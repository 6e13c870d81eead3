//! Rock-paper-scissors session state.

use tracing::debug;

use crate::error::SessionError;

/// A player's move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Rock,
    Paper,
    Scissors,
}

impl Choice {
    /// Parses a choice leniently: surrounding whitespace and letter
    /// case are ignored.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "rock" => Some(Choice::Rock),
            "paper" => Some(Choice::Paper),
            "scissors" => Some(Choice::Scissors),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Choice::Rock => "rock",
            Choice::Paper => "paper",
            Choice::Scissors => "scissors",
        }
    }

    /// The fixed cycle: rock beats scissors, scissors beats paper,
    /// paper beats rock.
    pub fn beats(&self, other: Choice) -> bool {
        matches!(
            (self, other),
            (Choice::Rock, Choice::Scissors)
                | (Choice::Scissors, Choice::Paper)
                | (Choice::Paper, Choice::Rock)
        )
    }
}

impl std::fmt::Display for Choice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a resolved round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundWinner {
    PlayerOne,
    PlayerTwo,
    Tie,
}

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Collecting choices for the current round.
    WaitingForChoices,
    /// Both choices are in and the round has an outcome.
    Resolved,
    /// The session is closed and accepts nothing further.
    Terminal,
}

/// Which seat a frame was attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerSlot {
    One,
    Two,
}

/// What a successfully applied frame did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A choice was recorded; the round is still open.
    ChoiceRecorded { player: PlayerSlot },
    /// The second choice arrived and the round resolved.
    RoundResolved { winner: RoundWinner },
}

struct Player {
    identity: String,
    choice: Option<Choice>,
}

/// One rock-paper-scissors match between two ticketed players.
///
/// The session is fed decoded frames in conversation order and moves
/// through `WaitingForChoices -> Resolved`, then either back to
/// `WaitingForChoices` via [`GameSession::begin_next_round`] or to
/// `Terminal` via [`GameSession::close`]. Senders are matched against
/// the player tickets by exact equality.
pub struct GameSession {
    conversation_id: String,
    player_one: Player,
    player_two: Player,
    phase: SessionPhase,
    last_outcome: Option<RoundWinner>,
}

impl GameSession {
    pub fn new(
        conversation_id: impl Into<String>,
        player_one_identity: impl Into<String>,
        player_two_identity: impl Into<String>,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            player_one: Player {
                identity: player_one_identity.into(),
                choice: None,
            },
            player_two: Player {
                identity: player_two_identity.into(),
                choice: None,
            },
            phase: SessionPhase::WaitingForChoices,
            last_outcome: None,
        }
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Outcome of the most recently resolved round, if any.
    pub fn last_outcome(&self) -> Option<RoundWinner> {
        self.last_outcome
    }

    /// Applies one decoded frame to the session.
    ///
    /// A player may resubmit while the round is open; the latest choice
    /// wins. Frames for an already resolved or closed session are
    /// rejected with [`SessionError::AlreadyResolved`].
    pub fn receive(&mut self, sender: &str, payload: &str) -> Result<SessionEvent, SessionError> {
        let slot = if sender == self.player_one.identity {
            PlayerSlot::One
        } else if sender == self.player_two.identity {
            PlayerSlot::Two
        } else {
            return Err(SessionError::UnknownSender {
                sender: sender.to_string(),
            });
        };

        let choice = Choice::parse(payload).ok_or_else(|| SessionError::InvalidChoice {
            payload: payload.to_string(),
        })?;

        if self.phase != SessionPhase::WaitingForChoices {
            return Err(SessionError::AlreadyResolved);
        }

        match slot {
            PlayerSlot::One => self.player_one.choice = Some(choice),
            PlayerSlot::Two => self.player_two.choice = Some(choice),
        }

        if let (Some(one), Some(two)) = (self.player_one.choice, self.player_two.choice) {
            let winner = if one == two {
                RoundWinner::Tie
            } else if one.beats(two) {
                RoundWinner::PlayerOne
            } else {
                RoundWinner::PlayerTwo
            };
            self.phase = SessionPhase::Resolved;
            self.last_outcome = Some(winner);
            debug!(
                conversation_id = %self.conversation_id,
                one = %one,
                two = %two,
                ?winner,
                "round resolved"
            );
            return Ok(SessionEvent::RoundResolved { winner });
        }

        Ok(SessionEvent::ChoiceRecorded { player: slot })
    }

    /// Clears both choices and reopens the session for the next round.
    ///
    /// Has no effect on a closed session.
    pub fn begin_next_round(&mut self) {
        if self.phase == SessionPhase::Terminal {
            return;
        }
        self.player_one.choice = None;
        self.player_two.choice = None;
        self.phase = SessionPhase::WaitingForChoices;
    }

    /// Closes the session permanently.
    pub fn close(&mut self) {
        self.phase = SessionPhase::Terminal;
    }
}
