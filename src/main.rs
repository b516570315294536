mod config;
mod error;
mod llm;
mod logging;
mod platform;
mod relay;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::Bot;
use tracing::{error, info};

use crate::config::Config;
use crate::llm::YandexGptClient;
use crate::platform::telegram;
use crate::relay::Relay;

const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Explicit path from the command line, else `config.toml` if it exists.
fn config_file() -> Option<PathBuf> {
    match std::env::args().nth(1) {
        Some(path) => Some(PathBuf::from(path)),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.exists().then_some(default)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Variables from .env are only defaults; the real environment wins
    dotenvy::dotenv().ok();

    logging::init().context("Failed to initialize logging")?;

    let config_path = config_file();
    if let Some(path) = &config_path {
        info!("Loading configuration from: {}", path.display());
    }

    let config = match Config::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("{}. Shutting down.", e);
            std::process::exit(1);
        }
    };

    info!("Configuration loaded successfully");
    info!("  Model: {}", config.llm.model);
    info!("  API URL: {}", config.llm.api_url);

    let bot = Bot::new(&config.telegram.bot_token);
    let mention = telegram::resolve_mention(&bot, config.telegram.mention.clone()).await?;

    let relay = Relay::new(YandexGptClient::new(config.llm.clone()), mention);
    info!("  Group mention: {}", relay.mention());

    info!("Bot is starting...");
    telegram::run(bot, Arc::new(relay)).await?;

    Ok(())
}
