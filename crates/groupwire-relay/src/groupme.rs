//! GroupMe relay backend.
//!
//! Talks to the GroupMe v3 REST API. Every response arrives wrapped in
//! a `{"response": ..., "meta": ...}` envelope; the access token and
//! all request parameters travel as query parameters.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{header, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::error::{RelayError, RelayResult};
use crate::relay::{BoxFuture, Conversation, MessageBatch, RawMessage, Relay, UserIdentity};

const GROUPME_API_BASE: &str = "https://api.groupme.com/v3";
const RELAY_NAME: &str = "groupme";

/// Relay backed by the GroupMe group-messaging service.
pub struct GroupMeRelay {
    http_client: reqwest::Client,
    api_base: String,
    access_token: String,
}

impl GroupMeRelay {
    /// Creates a relay client authenticated with a GroupMe access token.
    pub fn new(access_token: impl Into<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to create HTTP client");
        Self {
            http_client,
            api_base: GROUPME_API_BASE.to_string(),
            access_token: access_token.into(),
        }
    }

    /// Builder: override the API base URL (for tests or proxies).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> RelayResult<reqwest::Response> {
        request.send().await.map_err(|err| {
            let message = if err.is_timeout() {
                "request timed out"
            } else if err.is_connect() {
                "connection failed"
            } else {
                "request failed"
            };
            RelayError::network(message)
                .with_relay(RELAY_NAME)
                .with_source(err)
        })
    }

    async fn map_error(&self, response: reqwest::Response) -> RelayError {
        let status = response.status();
        let err = match status {
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(header::RETRY_AFTER)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_owned);
                match retry_after {
                    Some(seconds) => {
                        RelayError::rate_limited(format!("rate limited, retry after {seconds}s"))
                    }
                    None => RelayError::rate_limited("rate limited"),
                }
            }
            StatusCode::UNAUTHORIZED => RelayError::authentication("access token rejected"),
            StatusCode::NOT_FOUND => RelayError::not_found("no such conversation"),
            StatusCode::BAD_REQUEST => {
                let body = response.text().await.unwrap_or_default();
                RelayError::bad_request(format!("bad request: {body}"))
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                RelayError::server(format!("unexpected status {status}: {body}"))
            }
        };
        err.with_relay(RELAY_NAME)
    }

    async fn parse<T>(&self, response: reqwest::Response) -> RelayResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let body = response.text().await.map_err(|err| {
            RelayError::network("failed to read response body")
                .with_relay(RELAY_NAME)
                .with_source(err)
        })?;
        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|err| {
            RelayError::invalid_response("response was not valid JSON")
                .with_relay(RELAY_NAME)
                .with_source(err)
        })?;
        envelope.response.ok_or_else(|| {
            RelayError::invalid_response("response envelope was empty").with_relay(RELAY_NAME)
        })
    }
}

impl Relay for GroupMeRelay {
    fn name(&self) -> &str {
        RELAY_NAME
    }

    fn create_conversation(&self, name: &str) -> BoxFuture<'_, RelayResult<Conversation>> {
        let name = name.to_owned();
        Box::pin(async move {
            let url = format!("{}/groups", self.api_base);
            let request = self
                .http_client
                .post(&url)
                .query(&[("token", self.access_token.as_str())])
                .query(&[("name", name.as_str()), ("share", "true")]);

            let response = self.execute(request).await?;
            if !response.status().is_success() {
                return Err(self.map_error(response).await);
            }

            let group: ApiGroup = self.parse(response).await?;
            debug!(group_id = %group.id, "created group");
            Ok(Conversation {
                id: group.id,
                name: group.name,
                share_token: group.share_url.as_deref().and_then(share_token_from_url),
            })
        })
    }

    fn delete_conversation(&self, conversation_id: &str) -> BoxFuture<'_, RelayResult<()>> {
        let conversation_id = conversation_id.to_owned();
        Box::pin(async move {
            let url = format!(
                "{}/groups/{}/destroy",
                self.api_base,
                urlencoding::encode(&conversation_id)
            );
            let request = self
                .http_client
                .post(&url)
                .query(&[("token", self.access_token.as_str())]);

            let response = self.execute(request).await?;
            if !response.status().is_success() {
                return Err(self.map_error(response).await);
            }

            debug!(group_id = %conversation_id, "destroyed group");
            Ok(())
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
            let url = format!(
                "{}/groups/{}/join/{}",
                self.api_base,
                urlencoding::encode(&conversation_id),
                urlencoding::encode(&share_token)
            );
            let request = self
                .http_client
                .post(&url)
                .query(&[("token", self.access_token.as_str())]);

            let response = self.execute(request).await?;
            let status = response.status();
            // GroupMe answers an unknown or expired share token with
            // either of these.
            if status == StatusCode::NOT_FOUND || status == StatusCode::BAD_REQUEST {
                return Err(RelayError::invalid_token("share token rejected")
                    .with_relay(RELAY_NAME));
            }
            if !status.is_success() {
                return Err(self.map_error(response).await);
            }

            let joined: ApiJoinResponse = self.parse(response).await?;
            debug!(group_id = %joined.group.id, "joined group");
            Ok(joined.group.id)
        })
    }

    fn share_token(&self, conversation_id: &str) -> BoxFuture<'_, RelayResult<String>> {
        let conversation_id = conversation_id.to_owned();
        Box::pin(async move {
            let url = format!(
                "{}/groups/{}",
                self.api_base,
                urlencoding::encode(&conversation_id)
            );
            let request = self
                .http_client
                .get(&url)
                .query(&[("token", self.access_token.as_str())]);

            let response = self.execute(request).await?;
            if !response.status().is_success() {
                return Err(self.map_error(response).await);
            }

            let group: ApiGroup = self.parse(response).await?;
            group
                .share_url
                .as_deref()
                .and_then(share_token_from_url)
                .ok_or_else(|| {
                    RelayError::invalid_response("conversation has no share link")
                        .with_relay(RELAY_NAME)
                })
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
            let url = format!(
                "{}/groups/{}/messages",
                self.api_base,
                urlencoding::encode(&conversation_id)
            );
            let source_guid = uuid::Uuid::new_v4().to_string();
            let request = self
                .http_client
                .post(&url)
                .query(&[("token", self.access_token.as_str())])
                .query(&[
                    ("source_guid", source_guid.as_str()),
                    ("text", text.as_str()),
                ]);

            let response = self.execute(request).await?;
            if !response.status().is_success() {
                return Err(self.map_error(response).await);
            }

            let posted: ApiMessagePost = self.parse(response).await?;
            debug!(message_id = %posted.message.id, "posted message");
            Ok(posted.message.id)
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
            let url = format!(
                "{}/groups/{}/messages",
                self.api_base,
                urlencoding::encode(&conversation_id)
            );
            let limit_param = limit.to_string();
            let mut request = self
                .http_client
                .get(&url)
                .query(&[("token", self.access_token.as_str())])
                .query(&[("limit", limit_param.as_str())]);
            if let Some(since_id) = &since {
                request = request.query(&[("since_id", since_id.as_str())]);
            }

            let response = self.execute(request).await?;
            // 304 is how GroupMe says "nothing newer than since_id".
            if response.status() == StatusCode::NOT_MODIFIED {
                return Ok(MessageBatch::not_modified());
            }
            if !response.status().is_success() {
                return Err(self.map_error(response).await);
            }

            let list: ApiMessageList = self.parse(response).await?;
            debug!(count = list.messages.len(), "listed messages");
            Ok(MessageBatch::with_messages(
                list.messages.into_iter().map(RawMessage::from).collect(),
            ))
        })
    }

    fn current_user(&self) -> BoxFuture<'_, RelayResult<UserIdentity>> {
        Box::pin(async move {
            let url = format!("{}/users/me", self.api_base);
            let request = self
                .http_client
                .get(&url)
                .query(&[("token", self.access_token.as_str())]);

            let response = self.execute(request).await?;
            if !response.status().is_success() {
                return Err(self.map_error(response).await);
            }

            let user: ApiUser = self.parse(response).await?;
            Ok(UserIdentity {
                user_id: user.id,
                name: user.name,
            })
        })
    }
}

/// Extracts the share token from a GroupMe share URL.
///
/// Share URLs look like `https://groupme.com/join_group/12345/SHARETOKEN`;
/// the token is the last path segment.
fn share_token_from_url(url: &str) -> Option<String> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(String::from)
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    response: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiGroup {
    id: String,
    name: String,
    share_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiJoinResponse {
    group: ApiGroup,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiMessageList {
    #[serde(default)]
    messages: Vec<ApiMessage>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    id: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    created_at: DateTime<Utc>,
    name: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiMessagePost {
    message: ApiMessage,
}

impl From<ApiMessage> for RawMessage {
    fn from(message: ApiMessage) -> Self {
        Self {
            id: message.id,
            created_at: message.created_at,
            sender_name: message.name,
            // Attachment-only messages come through with a null text.
            text: message.text.unwrap_or_default(),
        }
    }
}
