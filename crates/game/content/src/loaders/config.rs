//! Game configuration loader.

use std::path::Path;

use catch_core::GameConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for game configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// Missing keys take their defaults; values are checked after parsing.
    pub fn load(path: &Path) -> LoadResult<GameConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config {}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> LoadResult<GameConfig> {
        let config: GameConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;
        validate(&config)?;
        Ok(config)
    }
}

fn validate(config: &GameConfig) -> LoadResult<()> {
    if !(0.0..=1.0).contains(&config.fallback_drop_chance) {
        anyhow::bail!(
            "fallback_drop_chance must be in [0.0, 1.0], got {}",
            config.fallback_drop_chance
        );
    }
    if !(0.0..=1.0).contains(&config.fuzzy_threshold) {
        anyhow::bail!(
            "fuzzy_threshold must be in [0.0, 1.0], got {}",
            config.fuzzy_threshold
        );
    }
    if config.item_noun.trim().is_empty() {
        anyhow::bail!("item_noun must not be empty");
    }
    Ok(())
}
