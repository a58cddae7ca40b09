//! WG License Bot - Main Entry Point
//!
//! A Telegram bot that lets a single administrator issue, ban and unban
//! license keys kept in a GitHub repository.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use wg_license_bot::commands::CommandHandler;
use wg_license_bot::config::{BotConfig, StoreConfig};
use wg_license_bot::license::LicenseStore;
use wg_license_bot::telegram::TelegramBot;

/// Telegram bot for issuing and revoking license keys.
#[derive(Parser, Debug)]
#[command(name = "license_bot")]
#[command(about = "Issue, ban and unban license keys stored in a GitHub repository")]
#[command(version)]
struct Args {
    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Skip publishing the command menu to Telegram.
    #[arg(long)]
    no_command_menu: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level);

    // Load environment variables
    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    // Load configurations
    let bot_config =
        BotConfig::from_env().context("Failed to load bot configuration from environment")?;

    let store_config = StoreConfig::from_env()
        .context("Failed to load license store configuration from environment")?;

    info!(
        "License document: {}/{} (branch: {})",
        store_config.repo,
        store_config.file_path,
        store_config.branch.as_deref().unwrap_or("default")
    );

    let store = LicenseStore::new(&store_config).context("Failed to create license store client")?;
    let handler = CommandHandler::new(bot_config.admin_id, store);

    // Connect to Telegram
    let bot = TelegramBot::connect(&bot_config, handler)
        .await
        .context("Failed to connect to Telegram")?;

    if !args.no_command_menu
        && let Err(e) = bot.register_commands().await
    {
        warn!("Failed to register command menu: {}", e);
    }

    info!("Administrator: {}", bot_config.admin_id);
    info!("Starting license bot...");

    bot.run().await;

    info!("Shutting down...");
    Ok(())
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
