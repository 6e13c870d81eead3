//! groupwire CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use groupwire_cli::cli::{Cli, Command, ConfigAction};
use groupwire_cli::error::{CliError, CliResult};
use groupwire_relay::RelayConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.debug {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(Level::WARN.to_string()))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Run the command
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    // Load configuration, letting --token override the file
    let mut config = if let Some(ref path) = cli.config {
        RelayConfig::load_from(path).map_err(CliError::Config)?
    } else {
        RelayConfig::load().unwrap_or_default()
    };
    if let Some(ref token) = cli.token {
        config.token = Some(token.clone());
    }

    // Handle subcommands
    match cli.command {
        Command::Host {
            name,
            first_to,
            local,
        } => groupwire_cli::commands::game::host(&config, &name, first_to, local).await,
        Command::Join { invite, first_to } => {
            groupwire_cli::commands::game::join(&config, &invite, first_to).await
        }
        Command::Cleanup { conversation_id } => {
            groupwire_cli::commands::game::cleanup(&config, &conversation_id).await
        }
        Command::Config { action } => match action {
            ConfigAction::Show => groupwire_cli::commands::config::show(&config),
            ConfigAction::Path => groupwire_cli::commands::config::path(cli.config.as_deref()),
            ConfigAction::SetToken { token } => {
                groupwire_cli::commands::config::set_token(cli.config.as_deref(), &token)
            }
        },
    }
}
