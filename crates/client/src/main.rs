//! Console chat bot entry point.
//!
//! Loads the item catalog and game settings from the content directory,
//! starts the catch runtime and plays a single chat server from stdin.
//!
//! # Examples
//!
//! ```bash
//! CATCH_ADMIN_IDS=1 cargo run -p catch-bot
//! ```
mod commands;
mod config;
mod console;
mod logging;

use std::sync::Arc;

use anyhow::{Context, Result};
use catch_content::ContentFactory;
use catch_core::UserId;
use catch_runtime::{Runtime, StaticPermissions};

use crate::config::BotConfig;
use crate::console::{Console, ConsoleTransport};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = BotConfig::from_env();
    logging::setup_logging(&config.log_dir)?;

    let content = ContentFactory::new(&config.content_dir);
    let game_config = content.load_config()?;
    let catalog = content
        .load_catalog()
        .with_context(|| format!("loading catalog from {}", config.content_dir.display()))?;

    tracing::info!(
        items = catalog.len(),
        data_dir = %config.runtime.data_dir.display(),
        admins = config.admins.len(),
        "starting catch bot"
    );

    let first_user = config.admins.first().copied().unwrap_or(UserId(1));
    let runtime = Runtime::builder()
        .config(config.runtime.clone())
        .game_config(game_config)
        .catalog(catalog)
        .transport(Arc::new(ConsoleTransport))
        .permissions(Arc::new(StaticPermissions::new(config.admins.iter().copied())))
        .build()
        .await?;

    Console::new(runtime.handle(), first_user).run().await?;

    runtime.shutdown().await?;
    tracing::info!("catch bot stopped");
    Ok(())
}
