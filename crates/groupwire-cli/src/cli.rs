//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// groupwire - Rock-paper-scissors over a group-messaging relay
#[derive(Debug, Parser)]
#[command(name = "groupwire")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "GROUPWIRE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Relay access token (overrides the configuration file)
    #[arg(long, env = "GROUPWIRE_TOKEN")]
    pub token: Option<String>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Host a new match and print its invite code
    Host {
        /// Conversation name on the relay
        #[arg(long, default_value = "groupwire match")]
        name: String,

        /// End the match once a player has this many round wins
        #[arg(long)]
        first_to: Option<u32>,

        /// Play both seats in one terminal over an in-process relay
        #[arg(long)]
        local: bool,
    },

    /// Join a match from an invite code
    Join {
        /// Invite code handed out by the host
        invite: String,

        /// End the match once a player has this many round wins
        #[arg(long)]
        first_to: Option<u32>,
    },

    /// Delete a conversation left over from an earlier match
    Cleanup {
        /// Conversation id to delete
        conversation_id: String,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Show configuration file path
    Path,

    /// Store the relay access token in the configuration file
    SetToken {
        /// The token to store
        token: String,
    },
}
