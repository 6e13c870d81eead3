//! Command implementations.

pub mod config;
pub mod game;

use std::sync::Arc;
use std::time::Duration;

use groupwire_relay::{GroupMeRelay, MemoryRelay, Relay, RelayConfig};

use crate::error::{CliError, CliResult};

/// Builds the hosted relay from the configuration.
pub fn build_relay(config: &RelayConfig) -> CliResult<Arc<dyn Relay>> {
    let Some(ref token) = config.token else {
        return Err(CliError::Config(format!(
            "no relay access token configured; set one with `groupwire config set-token <TOKEN>` \
             or the GROUPWIRE_TOKEN environment variable (config file: {})",
            RelayConfig::default_path().display()
        )));
    };

    let mut relay = GroupMeRelay::new(token.clone(), Duration::from_secs(config.timeout_secs));
    if let Some(ref api_base) = config.api_base {
        relay = relay.with_api_base(api_base.clone());
    }
    Ok(Arc::new(relay))
}

/// Builds the in-process relay used for `--local` play.
pub fn build_local_relay() -> Arc<dyn Relay> {
    Arc::new(MemoryRelay::new("local", "local player"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_token_is_a_config_error() {
        let err = build_relay(&RelayConfig::default()).err().unwrap();
        assert!(matches!(err, CliError::Config(_)));
        assert!(err.to_string().contains("set-token"));
    }

    #[test]
    fn configured_token_builds_the_relay() {
        let config = RelayConfig {
            token: Some("secret".to_string()),
            ..RelayConfig::default()
        };
        let relay = build_relay(&config).unwrap();
        assert_eq!(relay.name(), "groupme");
    }
}
