//! Bot configuration structures and loaders.
use std::env;
use std::path::PathBuf;

use catch_core::UserId;
use catch_runtime::RuntimeConfig;
use directories::ProjectDirs;

/// Configuration required to bootstrap the console bot.
#[derive(Clone, Debug)]
pub struct BotConfig {
    /// Directory holding `items.ron` and `config.toml`.
    pub content_dir: PathBuf,
    /// Users that bypass summon cooldowns and may edit spawn rules.
    pub admins: Vec<UserId>,
    pub log_dir: PathBuf,
    pub runtime: RuntimeConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("content"),
            admins: Vec::new(),
            log_dir: default_log_dir(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl BotConfig {
    /// Construct configuration from process environment variables.
    ///
    /// - `CATCH_CONTENT_DIR`
    /// - `CATCH_ADMIN_IDS` (comma separated user ids)
    /// - `CATCH_LOG_DIR`
    /// - plus everything [`RuntimeConfig::from_env`] reads
    pub fn from_env() -> Self {
        let mut config = Self {
            runtime: RuntimeConfig::from_env(),
            ..Self::default()
        };

        if let Ok(dir) = env::var("CATCH_CONTENT_DIR") {
            config.content_dir = PathBuf::from(dir);
        }

        if let Ok(ids) = env::var("CATCH_ADMIN_IDS") {
            config.admins = parse_ids(&ids);
        }

        if let Ok(dir) = env::var("CATCH_LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }

        config
    }
}

/// Parses a comma separated id list, skipping entries that are not ids.
pub fn parse_ids(raw: &str) -> Vec<UserId> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse() {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::warn!(entry = s, "ignoring malformed admin id");
                None
            }
        })
        .collect()
}

/// Get the platform-specific log directory
fn default_log_dir() -> PathBuf {
    ProjectDirs::from("", "", "catchbot")
        .map(|dirs| dirs.cache_dir().join("logs"))
        .unwrap_or_else(|| env::temp_dir().join("catchbot").join("logs"))
}
