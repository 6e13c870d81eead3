//! CLI error types.

use std::fmt;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI.
#[derive(Debug)]
pub enum CliError {
    /// Configuration error.
    Config(String),
    /// Relay error.
    Relay(String),
    /// Frame encoding error.
    Frame(String),
    /// Invite code error.
    Invite(String),
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Relay(msg) => write!(f, "relay error: {}", msg),
            Self::Frame(msg) => write!(f, "frame error: {}", msg),
            Self::Invite(msg) => write!(f, "invite error: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<groupwire_relay::RelayError> for CliError {
    fn from(err: groupwire_relay::RelayError) -> Self {
        Self::Relay(err.to_string())
    }
}

impl From<groupwire_protocol::FrameError> for CliError {
    fn from(err: groupwire_protocol::FrameError) -> Self {
        Self::Frame(err.to_string())
    }
}

impl From<groupwire_session::InviteCodeError> for CliError {
    fn from(err: groupwire_session::InviteCodeError) -> Self {
        Self::Invite(err.to_string())
    }
}
