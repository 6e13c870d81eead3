//! Host, join and cleanup commands.

use std::sync::Arc;
use std::time::Duration;

use groupwire_protocol::encode;
use groupwire_relay::{Relay, RelayConfig};
use groupwire_session::{
    Choice, GameEvent, GameSession, MatchPolicy, MatchRunner, MatchSetup, PlayerSlot, Poller,
    PollerConfig, RoundWinner,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

use crate::error::CliResult;

use super::{build_local_relay, build_relay};

const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Host a new match: provision the conversation, print the invite code
/// and play the host seat.
pub async fn host(
    config: &RelayConfig,
    name: &str,
    first_to: Option<u32>,
    local: bool,
) -> CliResult<()> {
    let relay = if local {
        build_local_relay()
    } else {
        build_relay(config)?
    };

    let conversation = relay.create_conversation(name).await?;
    let share_token = match conversation.share_token {
        Some(token) => token,
        None => relay.share_token(&conversation.id).await?,
    };
    let setup = MatchSetup::new(conversation.id, share_token);

    println!("conversation: {}", setup.conversation_id);
    println!("invite code:  {}", setup.invite_code());
    if local {
        println!("local mode: type a choice for the host seat, or `guest <choice>` for the guest seat");
    } else {
        println!("send the invite code to your opponent, then wait for their choices");
    }

    let own_ticket = setup.host_ticket.clone();
    play(relay, &setup, own_ticket, first_to, local).await
}

/// Join a hosted match from an invite code and play the guest seat.
pub async fn join(config: &RelayConfig, invite: &str, first_to: Option<u32>) -> CliResult<()> {
    let relay = build_relay(config)?;

    let setup = MatchSetup::parse_invite_code(invite)?;
    let conversation_id = relay
        .join_conversation(&setup.conversation_id, &setup.share_token)
        .await?;
    println!("joined conversation {}", conversation_id);

    let own_ticket = setup.guest_ticket.clone();
    play(relay, &setup, own_ticket, first_to, false).await
}

/// Delete a conversation left over from an earlier match.
pub async fn cleanup(config: &RelayConfig, conversation_id: &str) -> CliResult<()> {
    let relay = build_relay(config)?;
    relay.delete_conversation(conversation_id).await?;
    println!("deleted conversation {}", conversation_id);
    Ok(())
}

/// Run the interactive loop for one seat of a match.
async fn play(
    relay: Arc<dyn Relay>,
    setup: &MatchSetup,
    own_ticket: String,
    first_to: Option<u32>,
    local: bool,
) -> CliResult<()> {
    let policy = match first_to {
        Some(target) => MatchPolicy::FirstTo(target),
        None => MatchPolicy::OpenEnded,
    };

    let session = GameSession::new(
        &setup.conversation_id,
        setup.host_ticket.clone(),
        setup.guest_ticket.clone(),
    );
    let (runner, events) = MatchRunner::new(session, policy);

    let mut poller = Poller::new(Arc::clone(&relay), PollerConfig::new(POLL_INTERVAL));
    poller.register(&setup.conversation_id);
    let handle = poller.handle();
    let poller_task = tokio::spawn(poller.run(runner));
    let mut printer = tokio::spawn(render_events(events));

    println!("play with: rock, paper or scissors (ctrl-c to quit)");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    let conversation_id = setup.conversation_id.clone();
    let guest_ticket = setup.guest_ticket.clone();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        submit(
                            relay.as_ref(),
                            &conversation_id,
                            &own_ticket,
                            &guest_ticket,
                            &line,
                            local,
                        )
                        .await?;
                        // Pick the echo up promptly instead of waiting
                        // out the poll interval.
                        let _ = handle.sweep_now().await;
                    }
                    None => break,
                }
            }
            finished = &mut printer => {
                if finished.unwrap_or(false) {
                    println!("thanks for playing");
                }
                break;
            }
        }
    }

    let _ = handle.stop().await;
    let _ = poller_task.await;
    printer.abort();
    Ok(())
}

/// Render match events until the channel closes. Returns true when the
/// match completed.
async fn render_events(mut events: UnboundedReceiver<GameEvent>) -> bool {
    while let Some(event) = events.recv().await {
        match event {
            GameEvent::ChoiceRecorded { player } => {
                let who = match player {
                    PlayerSlot::One => "player one",
                    PlayerSlot::Two => "player two",
                };
                println!("{} locked in a choice", who);
            }
            GameEvent::RoundResolved { winner, score } => {
                let line = match winner {
                    RoundWinner::PlayerOne => "round goes to player one",
                    RoundWinner::PlayerTwo => "round goes to player two",
                    RoundWinner::Tie => "round is a tie",
                };
                println!(
                    "{} ({}-{}, {} ties)",
                    line, score.player_one, score.player_two, score.ties
                );
            }
            GameEvent::MatchOver { score } => {
                let verdict = if score.player_one > score.player_two {
                    "player one takes the match"
                } else if score.player_two > score.player_one {
                    "player two takes the match"
                } else {
                    "the match ends even"
                };
                println!(
                    "{} ({}-{}, {} ties)",
                    verdict, score.player_one, score.player_two, score.ties
                );
                return true;
            }
            GameEvent::FrameRejected { reason } => {
                println!("ignored: {}", reason);
            }
        }
    }
    false
}

/// Post one choice into the conversation.
///
/// The choice reaches the session through the polled echo of this
/// message, which keeps both peers on the identical ordered history.
async fn submit(
    relay: &dyn Relay,
    conversation_id: &str,
    own_ticket: &str,
    guest_ticket: &str,
    line: &str,
    local: bool,
) -> CliResult<()> {
    let mut text = line.trim();
    if text.is_empty() {
        return Ok(());
    }

    // In local mode one terminal drives both seats.
    let mut ticket = own_ticket;
    if local {
        if let Some(rest) = text.strip_prefix("guest ") {
            ticket = guest_ticket;
            text = rest.trim();
        }
    }

    if Choice::parse(text).is_none() {
        eprintln!("unknown choice {:?} (rock, paper or scissors)", text);
        return Ok(());
    }

    let frame = encode(ticket, text)?;
    let message_id = relay.post_message(conversation_id, &frame).await?;
    debug!(%message_id, "posted choice");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use groupwire_relay::MemoryRelay;

    #[tokio::test]
    async fn submit_posts_an_encoded_frame() {
        let relay = MemoryRelay::new("u1", "tester");
        let conversation = relay.create_conversation("test").await.unwrap();

        submit(
            &relay,
            &conversation.id,
            "hosttick",
            "guesttick",
            "  Rock ",
            false,
        )
        .await
        .unwrap();

        let batch = relay
            .list_messages(&conversation.id, None, 10)
            .await
            .unwrap();
        let frame = groupwire_protocol::decode(&batch.messages[0].text).unwrap();
        assert_eq!(frame.sender, "hosttick");
        assert_eq!(frame.payload, "Rock");
    }

    #[tokio::test]
    async fn local_guest_prefix_switches_seats() {
        let relay = MemoryRelay::new("u1", "tester");
        let conversation = relay.create_conversation("test").await.unwrap();

        submit(
            &relay,
            &conversation.id,
            "hosttick",
            "guesttick",
            "guest paper",
            true,
        )
        .await
        .unwrap();

        let batch = relay
            .list_messages(&conversation.id, None, 10)
            .await
            .unwrap();
        let frame = groupwire_protocol::decode(&batch.messages[0].text).unwrap();
        assert_eq!(frame.sender, "guesttick");
        assert_eq!(frame.payload, "paper");
    }

    #[tokio::test]
    async fn unknown_choices_are_not_posted() {
        let relay = MemoryRelay::new("u1", "tester");
        let conversation = relay.create_conversation("test").await.unwrap();

        submit(
            &relay,
            &conversation.id,
            "hosttick",
            "guesttick",
            "lizard",
            false,
        )
        .await
        .unwrap();
        submit(&relay, &conversation.id, "hosttick", "guesttick", "   ", false)
            .await
            .unwrap();

        let batch = relay
            .list_messages(&conversation.id, None, 10)
            .await
            .unwrap();
        assert!(batch.messages.is_empty());
        assert!(batch.not_modified);
    }
}
