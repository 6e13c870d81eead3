//! Incremental history reading.

use groupwire_relay::{RawMessage, Relay, RelayErrorCode, RelayResult};
use tracing::{debug, trace};

/// Tracks how far into a conversation's history we have read.
///
/// The watermark is the id of the newest message observed so far; each
/// poll asks the relay only for messages strictly newer than it, so a
/// message is delivered to the caller exactly once.
pub struct HistoryCursor {
    conversation_id: String,
    watermark: Option<String>,
}

impl HistoryCursor {
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            watermark: None,
        }
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn watermark(&self) -> Option<&str> {
        self.watermark.as_deref()
    }

    /// Fetches messages newer than the watermark, oldest first.
    ///
    /// Being caught up and being rate limited both come back as an
    /// empty batch; the next poll tries again from the same watermark.
    pub async fn poll(&mut self, relay: &dyn Relay, limit: usize) -> RelayResult<Vec<RawMessage>> {
        let batch = match relay
            .list_messages(&self.conversation_id, self.watermark.as_deref(), limit)
            .await
        {
            Ok(batch) => batch,
            Err(err) if err.code() == RelayErrorCode::RateLimited => {
                debug!(conversation_id = %self.conversation_id, "rate limited, backing off");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err),
        };

        if batch.not_modified || batch.messages.is_empty() {
            trace!(conversation_id = %self.conversation_id, "caught up");
            return Ok(Vec::new());
        }

        let mut messages = batch.messages;
        // The relay reports newest first; flip to chronological and
        // take the watermark from what was the head of the batch.
        messages.reverse();
        if let Some(newest) = messages.last() {
            self.watermark = Some(newest.id.clone());
        }
        debug!(
            conversation_id = %self.conversation_id,
            count = messages.len(),
            "advanced past new messages"
        );
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groupwire_relay::{ErrorRelay, MemoryRelay, RelayError};

    async fn seeded_relay(texts: &[&str]) -> (MemoryRelay, String) {
        let relay = MemoryRelay::new("u1", "tester");
        let conversation = relay.create_conversation("test").await.unwrap();
        for text in texts {
            relay.post_message(&conversation.id, text).await.unwrap();
        }
        (relay, conversation.id)
    }

    #[tokio::test]
    async fn first_poll_returns_history_oldest_first() {
        let (relay, id) = seeded_relay(&["one", "two", "three"]).await;
        let mut cursor = HistoryCursor::new(&id);

        let messages = cursor.poll(&relay, 20).await.unwrap();
        let texts: Vec<&str> = messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["one", "two", "three"]);
        assert_eq!(cursor.watermark(), Some(messages[2].id.as_str()));
    }

    #[tokio::test]
    async fn caught_up_poll_is_empty() {
        let (relay, id) = seeded_relay(&["one"]).await;
        let mut cursor = HistoryCursor::new(&id);

        cursor.poll(&relay, 20).await.unwrap();
        let again = cursor.poll(&relay, 20).await.unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn only_new_messages_are_delivered() {
        let (relay, id) = seeded_relay(&["one", "two"]).await;
        let mut cursor = HistoryCursor::new(&id);
        cursor.poll(&relay, 20).await.unwrap();

        relay.post_message(&id, "three").await.unwrap();
        let messages = cursor.poll(&relay, 20).await.unwrap();
        let texts: Vec<&str> = messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["three"]);
    }

    #[tokio::test]
    async fn rate_limiting_is_not_fatal() {
        let relay = ErrorRelay::new("slow", RelayError::rate_limited("try later"));
        let mut cursor = HistoryCursor::new("g1");

        let messages = cursor.poll(&relay, 20).await.unwrap();
        assert!(messages.is_empty());
        assert_eq!(cursor.watermark(), None);
    }

    #[tokio::test]
    async fn other_relay_errors_propagate() {
        let relay = ErrorRelay::new("down", RelayError::network("connection failed"));
        let mut cursor = HistoryCursor::new("g1");

        let err = cursor.poll(&relay, 20).await.unwrap_err();
        assert_eq!(err.code(), RelayErrorCode::NetworkError);
    }
}
