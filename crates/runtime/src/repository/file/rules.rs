//! File-based RuleRepository implementation.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::repository::format::{decode_last_spawn, decode_rules, encode_last_spawn, encode_rules};
use crate::repository::{
    LastSpawnMap, RepositoryError, Result, RuleMap, RuleRepository, StoredRules,
};

/// File-based implementation of RuleRepository.
///
/// # File Format
///
/// Two JSON files in one directory:
/// - `spawn_rules.json` holds the rules
/// - `last_spawn.json` holds the last-spawn timestamps
///
/// Every save writes a sibling `.tmp` file, syncs it and renames it over the
/// target, so a crash mid-write leaves the previous file intact.
pub struct FileRuleRepository {
    rules_path: PathBuf,
    last_spawn_path: PathBuf,
}

impl FileRuleRepository {
    pub const RULES_FILE: &'static str = "spawn_rules.json";
    pub const LAST_SPAWN_FILE: &'static str = "last_spawn.json";

    /// Create a repository rooted at `base_dir`, creating the directory.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        fs::create_dir_all(base_dir).map_err(RepositoryError::Io)?;
        Ok(Self {
            rules_path: base_dir.join(Self::RULES_FILE),
            last_spawn_path: base_dir.join(Self::LAST_SPAWN_FILE),
        })
    }

    pub fn rules_path(&self) -> &Path {
        &self.rules_path
    }

    pub fn last_spawn_path(&self) -> &Path {
        &self.last_spawn_path
    }
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(RepositoryError::Io(e)),
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let temp_path = path.with_extension("json.tmp");

    let mut file = File::create(&temp_path).map_err(RepositoryError::Io)?;
    file.write_all(contents.as_bytes())
        .map_err(RepositoryError::Io)?;
    file.sync_all().map_err(RepositoryError::Io)?;
    drop(file);

    fs::rename(&temp_path, path).map_err(RepositoryError::Io)?;
    Ok(())
}

impl RuleRepository for FileRuleRepository {
    fn load(&self) -> Result<StoredRules> {
        let decoded = match read_optional(&self.rules_path)? {
            Some(text) => decode_rules(&text)?,
            None => Default::default(),
        };

        let mut last_spawn = match read_optional(&self.last_spawn_path)? {
            Some(text) => decode_last_spawn(&text).unwrap_or_else(|e| {
                tracing::warn!(
                    path = %self.last_spawn_path.display(),
                    error = %e,
                    "unreadable last-spawn file; starting without timestamps"
                );
                LastSpawnMap::new()
            }),
            None => LastSpawnMap::new(),
        };
        if last_spawn.is_empty() && !decoded.embedded_last_spawn.is_empty() {
            tracing::info!("migrating last-spawn timestamps embedded in the rules file");
            last_spawn = decoded.embedded_last_spawn;
        }

        tracing::debug!(
            rules = decoded.rules.len(),
            timestamps = last_spawn.len(),
            "loaded spawn rules from {}",
            self.rules_path.display()
        );

        Ok(StoredRules {
            rules: decoded.rules,
            last_spawn,
        })
    }

    fn save_rules(&self, rules: &RuleMap) -> Result<()> {
        write_atomic(&self.rules_path, &encode_rules(rules)?)?;
        tracing::debug!(rules = rules.len(), "saved spawn rules");
        Ok(())
    }

    fn save_last_spawn(&self, last_spawn: &LastSpawnMap) -> Result<()> {
        write_atomic(&self.last_spawn_path, &encode_last_spawn(last_spawn)?)
    }
}
