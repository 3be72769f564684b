//! In-memory RuleRepository implementation for tests and local runs.

use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::repository::{
    LastSpawnMap, RepositoryError, Result, RuleMap, RuleRepository, StoredRules,
};

/// In-memory implementation of RuleRepository.
///
/// Writes can be made to fail on demand to exercise error paths.
#[derive(Default)]
pub struct InMemoryRuleRepository {
    stored: RwLock<StoredRules>,
    fail_writes: AtomicBool,
}

impl InMemoryRuleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with pre-existing contents.
    pub fn with_contents(stored: StoredRules) -> Self {
        Self {
            stored: RwLock::new(stored),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every subsequent save fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of what is currently persisted.
    pub fn contents(&self) -> Result<StoredRules> {
        self.stored
            .read()
            .map(|stored| stored.clone())
            .map_err(|_| RepositoryError::LockPoisoned)
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("writes disabled".into()));
        }
        Ok(())
    }
}

impl RuleRepository for InMemoryRuleRepository {
    fn load(&self) -> Result<StoredRules> {
        self.contents()
    }

    fn save_rules(&self, rules: &RuleMap) -> Result<()> {
        self.check_writable()?;
        let mut stored = self
            .stored
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        stored.rules = rules.clone();
        Ok(())
    }

    fn save_last_spawn(&self, last_spawn: &LastSpawnMap) -> Result<()> {
        self.check_writable()?;
        let mut stored = self
            .stored
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        stored.last_spawn = last_spawn.clone();
        Ok(())
    }
}
