//! Error types for relay operations.
//!
//! This module defines the error types that can occur when interacting
//! with relay backends (GroupMe, in-memory, etc.).

use std::fmt;
use thiserror::Error;

/// The category of a relay error.
///
/// This enum provides a high-level classification of errors for use in
/// user-facing messages and retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelayErrorCode {
    /// Authentication failed or the access token is invalid/expired.
    AuthenticationFailed,
    /// A conversation share token was rejected.
    InvalidToken,
    /// Network error - connection failed, timeout, DNS resolution, etc.
    NetworkError,
    /// Rate limit exceeded - too many requests.
    RateLimited,
    /// Server returned an error (5xx status codes).
    ServerError,
    /// Invalid response from the server - parse error, unexpected format.
    InvalidResponse,
    /// Resource not found (404).
    NotFound,
    /// Request was invalid (400) - bad parameters, malformed request.
    BadRequest,
    /// Configuration error - missing or invalid config.
    ConfigurationError,
    /// Internal relay error - unexpected state, bug.
    InternalError,
}

impl RelayErrorCode {
    /// Returns true if this error is transient and the operation may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::RateLimited | Self::ServerError
        )
    }

    /// Returns a human-readable name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::InvalidToken => "invalid_token",
            Self::NetworkError => "network_error",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::NotFound => "not_found",
            Self::BadRequest => "bad_request",
            Self::ConfigurationError => "configuration_error",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for RelayErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error that occurred while interacting with a relay backend.
#[derive(Debug, Error)]
pub struct RelayError {
    /// The error code categorizing this error.
    code: RelayErrorCode,
    /// A human-readable message describing the error.
    message: String,
    /// The relay that generated this error (e.g., "groupme", "memory").
    relay: Option<String>,
    /// The underlying cause of this error, if any.
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl RelayError {
    /// Creates a new relay error with the given code and message.
    pub fn new(code: RelayErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            relay: None,
            source: None,
        }
    }

    /// Creates an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(RelayErrorCode::AuthenticationFailed, message)
    }

    /// Creates a share-token error.
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::new(RelayErrorCode::InvalidToken, message)
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(RelayErrorCode::NetworkError, message)
    }

    /// Creates a rate limit error.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(RelayErrorCode::RateLimited, message)
    }

    /// Creates a server error.
    pub fn server(message: impl Into<String>) -> Self {
        Self::new(RelayErrorCode::ServerError, message)
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(RelayErrorCode::InvalidResponse, message)
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RelayErrorCode::NotFound, message)
    }

    /// Creates a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(RelayErrorCode::BadRequest, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(RelayErrorCode::ConfigurationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(RelayErrorCode::InternalError, message)
    }

    /// Sets the relay name for this error.
    pub fn with_relay(mut self, relay: impl Into<String>) -> Self {
        self.relay = Some(relay.into());
        self
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> RelayErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the relay name, if set.
    pub fn relay(&self) -> Option<&str> {
        self.relay.as_deref()
    }

    /// Returns true if this error is transient and may be retried.
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref relay) = self.relay {
            write!(f, "[{}] ", relay)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_retryable() {
        assert!(RelayErrorCode::NetworkError.is_retryable());
        assert!(RelayErrorCode::RateLimited.is_retryable());
        assert!(RelayErrorCode::ServerError.is_retryable());
        assert!(!RelayErrorCode::AuthenticationFailed.is_retryable());
        assert!(!RelayErrorCode::InvalidToken.is_retryable());
    }

    #[test]
    fn error_code_display() {
        assert_eq!(
            RelayErrorCode::AuthenticationFailed.as_str(),
            "authentication_failed"
        );
        assert_eq!(RelayErrorCode::InvalidToken.as_str(), "invalid_token");
    }

    #[test]
    fn relay_error_creation() {
        let err = RelayError::authentication("token expired");
        assert_eq!(err.code(), RelayErrorCode::AuthenticationFailed);
        assert_eq!(err.message(), "token expired");
        assert!(err.relay().is_none());
        assert!(!err.is_retryable());
    }

    #[test]
    fn relay_error_with_relay() {
        let err = RelayError::network("connection timeout").with_relay("groupme");
        assert_eq!(err.code(), RelayErrorCode::NetworkError);
        assert_eq!(err.relay(), Some("groupme"));
        assert!(err.is_retryable());
    }

    #[test]
    fn relay_error_display() {
        let err = RelayError::rate_limited("too many requests").with_relay("groupme");
        let display = format!("{}", err);
        assert!(display.contains("[groupme]"));
        assert!(display.contains("rate_limited"));
        assert!(display.contains("too many requests"));
    }

    #[test]
    fn relay_error_with_source() {
        use std::error::Error;
        let io_err = std::io::Error::other("connection refused");
        let err = RelayError::network("request failed").with_source(io_err);
        assert!(err.source().is_some());
    }
}
