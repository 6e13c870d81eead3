//! The [`Relay`] trait and its data model.

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};

use crate::error::{RelayError, RelayResult};

/// Boxed future used by [`Relay`] methods.
///
/// The trait stays object-safe this way, so callers can hold a
/// `Box<dyn Relay>` or `Arc<dyn Relay>` and pick the backend at runtime.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A conversation hosted on a relay service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    /// Relay-assigned identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Token others can use to join, when the relay handed one out.
    pub share_token: Option<String>,
}

/// The account the relay sees us as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub user_id: String,
    pub name: String,
}

/// A single message as stored by the relay.
///
/// `text` is empty for messages that carried only attachments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub sender_name: String,
    pub text: String,
}

/// The outcome of a message listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBatch {
    /// Messages ordered newest first, as relays report them.
    pub messages: Vec<RawMessage>,
    /// True when the relay reported no messages past the watermark.
    pub not_modified: bool,
}

impl MessageBatch {
    pub fn with_messages(messages: Vec<RawMessage>) -> Self {
        Self {
            messages,
            not_modified: false,
        }
    }

    pub fn not_modified() -> Self {
        Self {
            messages: Vec::new(),
            not_modified: true,
        }
    }
}

/// A message transport backend.
///
/// # Contract
///
/// - `list_messages` returns messages **newest first**; callers that
///   need chronological order reverse the batch themselves.
/// - The `since` watermark is **exclusive**: only messages strictly
///   newer than it are returned.
/// - An empty result set is not an error; backends report it as a
///   [`MessageBatch::not_modified`] batch.
pub trait Relay: Send + Sync {
    /// Short backend name, used in logs and error origins.
    fn name(&self) -> &str;

    /// Creates a new conversation and returns it, share token included
    /// when the relay supports sharing.
    fn create_conversation(&self, name: &str) -> BoxFuture<'_, RelayResult<Conversation>>;

    /// Deletes a conversation this account owns.
    fn delete_conversation(&self, conversation_id: &str) -> BoxFuture<'_, RelayResult<()>>;

    /// Joins a conversation via its share token, returning the
    /// conversation id.
    fn join_conversation(
        &self,
        conversation_id: &str,
        share_token: &str,
    ) -> BoxFuture<'_, RelayResult<String>>;

    /// Fetches the share token of an existing conversation.
    fn share_token(&self, conversation_id: &str) -> BoxFuture<'_, RelayResult<String>>;

    /// Posts a text message and returns its relay-assigned id.
    fn post_message(&self, conversation_id: &str, text: &str) -> BoxFuture<'_, RelayResult<String>>;

    /// Lists messages newer than `since`, newest first, at most `limit`.
    fn list_messages(
        &self,
        conversation_id: &str,
        since: Option<&str>,
        limit: usize,
    ) -> BoxFuture<'_, RelayResult<MessageBatch>>;

    /// Returns the identity the relay has authenticated us as.
    fn current_user(&self) -> BoxFuture<'_, RelayResult<UserIdentity>>;
}

/// A relay that fails every operation with a fixed error.
///
/// Useful in tests for exercising failure paths.
pub struct ErrorRelay {
    name: String,
    error: RelayError,
}

impl ErrorRelay {
    pub fn new(name: impl Into<String>, error: RelayError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }

    fn fail(&self) -> RelayError {
        RelayError::new(self.error.code(), self.error.message()).with_relay(&self.name)
    }
}

impl Relay for ErrorRelay {
    fn name(&self) -> &str {
        &self.name
    }

    fn create_conversation(&self, _name: &str) -> BoxFuture<'_, RelayResult<Conversation>> {
        Box::pin(async move { Err(self.fail()) })
    }

    fn delete_conversation(&self, _conversation_id: &str) -> BoxFuture<'_, RelayResult<()>> {
        Box::pin(async move { Err(self.fail()) })
    }

    fn join_conversation(
        &self,
        _conversation_id: &str,
        _share_token: &str,
    ) -> BoxFuture<'_, RelayResult<String>> {
        Box::pin(async move { Err(self.fail()) })
    }

    fn share_token(&self, _conversation_id: &str) -> BoxFuture<'_, RelayResult<String>> {
        Box::pin(async move { Err(self.fail()) })
    }

    fn post_message(
        &self,
        _conversation_id: &str,
        _text: &str,
    ) -> BoxFuture<'_, RelayResult<String>> {
        Box::pin(async move { Err(self.fail()) })
    }

    fn list_messages(
        &self,
        _conversation_id: &str,
        _since: Option<&str>,
        _limit: usize,
    ) -> BoxFuture<'_, RelayResult<MessageBatch>> {
        Box::pin(async move { Err(self.fail()) })
    }

    fn current_user(&self) -> BoxFuture<'_, RelayResult<UserIdentity>> {
        Box::pin(async move { Err(self.fail()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn error_relay_fails_everything_with_its_name() {
        let relay = ErrorRelay::new("flaky", RelayError::server("down for maintenance"));

        let err = relay.current_user().await.unwrap_err();
        assert_eq!(err.relay(), Some("flaky"));
        assert_eq!(err.code(), crate::RelayErrorCode::ServerError);

        let err = relay.post_message("g1", "hi").await.unwrap_err();
        assert_eq!(err.message(), "down for maintenance");
    }

    #[test]
    fn batch_constructors() {
        let batch = MessageBatch::not_modified();
        assert!(batch.not_modified);
        assert!(batch.messages.is_empty());

        let batch = MessageBatch::with_messages(Vec::new());
        assert!(!batch.not_modified);
    }
}
