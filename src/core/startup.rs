use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::bot::ControllerSettings;
use crate::core::config::{Config, TelegramConfig};
use crate::core::state::AppState;
use crate::daemon::TransmissionClient;
use crate::indexer::TorznabClient;

pub const TOKEN_ENV_VAR: &str = "TELEGRAM_TOKEN";

/// Build the HTTP adapters and the shared state
pub fn build_state(config: Config) -> Result<AppState> {
    let indexer = TorznabClient::new(config.torznab.clone())
        .context("Failed to create Torznab client")?;
    let daemon = TransmissionClient::new(config.transmission.clone())
        .context("Failed to create Transmission client")?;

    info!(
        torznab_url = %config.torznab.url,
        transmission_endpoint = %daemon.endpoint(),
        "Adapters initialized"
    );

    Ok(AppState::new(config, Arc::new(indexer), Arc::new(daemon)))
}

/// Bot token from the command line, then the config file, then the environment
pub fn resolve_bot_token(
    flag: Option<&str>,
    telegram: &TelegramConfig,
    env_value: Option<String>,
) -> Option<String> {
    flag.map(str::to_string)
        .or_else(|| telegram.bot_token.clone())
        .or(env_value)
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Controller settings from config with command line overrides applied
pub fn controller_settings(
    config: &Config,
    telegram: &TelegramConfig,
    debug: bool,
) -> ControllerSettings {
    ControllerSettings {
        max_results: telegram.max_results,
        allowed_chat_id: telegram.chat_id,
        download_dirs: telegram.download_dirs.clone(),
        start: config.transmission.start,
        indexer_debug: debug,
    }
}
