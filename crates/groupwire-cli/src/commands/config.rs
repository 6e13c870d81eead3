//! Configuration commands.

use std::path::Path;

use groupwire_relay::RelayConfig;

use crate::error::{CliError, CliResult};

/// Show the effective configuration. The token value itself is never
/// printed.
pub fn show(config: &RelayConfig) -> CliResult<()> {
    println!(
        "token: {}",
        if config.token.is_some() {
            "(set)"
        } else {
            "(not set)"
        }
    );
    println!(
        "api_base: {}",
        config.api_base.as_deref().unwrap_or("(default)")
    );
    println!("timeout_secs: {}", config.timeout_secs);
    Ok(())
}

/// Show the configuration file path.
pub fn path(override_path: Option<&Path>) -> CliResult<()> {
    let config_path = override_path
        .map(Path::to_path_buf)
        .unwrap_or_else(RelayConfig::default_path);
    println!("config: {}", config_path.display());
    Ok(())
}

/// Store the relay access token.
pub fn set_token(override_path: Option<&Path>, token: &str) -> CliResult<()> {
    let config_path = override_path
        .map(Path::to_path_buf)
        .unwrap_or_else(RelayConfig::default_path);

    let mut config = if config_path.exists() {
        RelayConfig::load_from(&config_path).map_err(CliError::Config)?
    } else {
        RelayConfig::default()
    };
    config.token = Some(token.to_string());
    config.save(&config_path).map_err(CliError::Config)?;

    println!("token saved to {}", config_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_token_creates_and_updates_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        set_token(Some(&path), "first").unwrap();
        let config = RelayConfig::load_from(&path).unwrap();
        assert_eq!(config.token.as_deref(), Some("first"));

        set_token(Some(&path), "second").unwrap();
        let config = RelayConfig::load_from(&path).unwrap();
        assert_eq!(config.token.as_deref(), Some("second"));
    }
}
