//! In-memory relay for tests and offline play.
//!
//! Keeps every conversation in a process-local map and mimics the wire
//! contract of the hosted backends: newest-first listings, exclusive
//! `since` watermarks, and a not-modified batch when nothing is newer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tokio::sync::Mutex;

use crate::error::{RelayError, RelayResult};
use crate::relay::{BoxFuture, Conversation, MessageBatch, RawMessage, Relay, UserIdentity};

/// Relay that stores conversations in process memory.
pub struct MemoryRelay {
    user: UserIdentity,
    next_id: AtomicU64,
    groups: Mutex<HashMap<String, MemoryGroup>>,
}

struct MemoryGroup {
    name: String,
    share_token: String,
    /// Oldest first; listings reverse into newest-first on the way out.
    messages: Vec<RawMessage>,
}

impl MemoryRelay {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            user: UserIdentity {
                user_id: user_id.into(),
                name: name.into(),
            },
            next_id: AtomicU64::new(1),
            groups: Mutex::new(HashMap::new()),
        }
    }

    /// Zero-padded so lexical order matches allocation order.
    fn allocate_id(&self) -> String {
        format!("{:020}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

impl Relay for MemoryRelay {
    fn name(&self) -> &str {
        "memory"
    }

    fn create_conversation(&self, name: &str) -> BoxFuture<'_, RelayResult<Conversation>> {
        let name = name.to_owned();
        Box::pin(async move {
            let id = self.allocate_id();
            let share_token = uuid::Uuid::new_v4().simple().to_string();
            let mut groups = self.groups.lock().await;
            groups.insert(
                id.clone(),
                MemoryGroup {
                    name: name.clone(),
                    share_token: share_token.clone(),
                    messages: Vec::new(),
                },
            );
            Ok(Conversation {
                id,
                name,
                share_token: Some(share_token),
            })
        })
    }

    fn delete_conversation(&self, conversation_id: &str) -> BoxFuture<'_, RelayResult<()>> {
        let conversation_id = conversation_id.to_owned();
        Box::pin(async move {
            let mut groups = self.groups.lock().await;
            match groups.remove(&conversation_id) {
                Some(_) => Ok(()),
                None => Err(RelayError::not_found("no such conversation").with_relay("memory")),
            }
        })
    }

    fn join_conversation(
        &self,
        conversation_id: &str,
        share_token: &str,
    ) -> BoxFuture<'_, RelayResult<String>> {
        let conversation_id = conversation_id.to_owned();
        let share_token = share_token.to_owned();
        Box::pin(async move {
            let groups = self.groups.lock().await;
            let group = groups
                .get(&conversation_id)
                .ok_or_else(|| RelayError::not_found("no such conversation").with_relay("memory"))?;
            if group.share_token != share_token {
                return Err(RelayError::invalid_token("share token rejected").with_relay("memory"));
            }
            Ok(conversation_id)
        })
    }

    fn share_token(&self, conversation_id: &str) -> BoxFuture<'_, RelayResult<String>> {
        let conversation_id = conversation_id.to_owned();
        Box::pin(async move {
            let groups = self.groups.lock().await;
            groups
                .get(&conversation_id)
                .map(|group| group.share_token.clone())
                .ok_or_else(|| RelayError::not_found("no such conversation").with_relay("memory"))
        })
    }

    fn post_message(
        &self,
        conversation_id: &str,
        text: &str,
    ) -> BoxFuture<'_, RelayResult<String>> {
        let conversation_id = conversation_id.to_owned();
        let text = text.to_owned();
        Box::pin(async move {
            let id = self.allocate_id();
            let mut groups = self.groups.lock().await;
            let group = groups
                .get_mut(&conversation_id)
                .ok_or_else(|| RelayError::not_found("no such conversation").with_relay("memory"))?;
            group.messages.push(RawMessage {
                id: id.clone(),
                created_at: Utc::now(),
                sender_name: self.user.name.clone(),
                text,
            });
            Ok(id)
        })
    }

    fn list_messages(
        &self,
        conversation_id: &str,
        since: Option<&str>,
        limit: usize,
    ) -> BoxFuture<'_, RelayResult<MessageBatch>> {
        let conversation_id = conversation_id.to_owned();
        let since = since.map(str::to_owned);
        Box::pin(async move {
            let groups = self.groups.lock().await;
            let group = groups
                .get(&conversation_id)
                .ok_or_else(|| RelayError::not_found("no such conversation").with_relay("memory"))?;

            // The watermark is exclusive; an unknown one means start over.
            let start = since
                .as_deref()
                .and_then(|watermark| {
                    group
                        .messages
                        .iter()
                        .position(|message| message.id == watermark)
                })
                .map(|position| position + 1)
                .unwrap_or(0);

            let newer = &group.messages[start..];
            if newer.is_empty() {
                return Ok(MessageBatch::not_modified());
            }
            Ok(MessageBatch::with_messages(
                newer.iter().rev().take(limit).cloned().collect(),
            ))
        })
    }

    fn current_user(&self) -> BoxFuture<'_, RelayResult<UserIdentity>> {
        Box::pin(async move { Ok(self.user.clone()) })
    }
}
