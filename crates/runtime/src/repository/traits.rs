//! Repository contract for spawn rules and last-spawn timestamps.

use std::collections::BTreeMap;

use catch_core::{ChannelId, SpawnRule};

use super::error::Result;

/// Spawn rules keyed by channel.
pub type RuleMap = BTreeMap<ChannelId, SpawnRule>;

/// Unix-second timestamp of the latest drop, keyed by channel.
pub type LastSpawnMap = BTreeMap<ChannelId, u64>;

/// Everything a rule repository persists.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StoredRules {
    pub rules: RuleMap,
    pub last_spawn: LastSpawnMap,
}

/// Durable storage behind the spawn rule store.
///
/// Rules and last-spawn timestamps are written independently: rules change
/// on admin action, timestamps on every timed drop.
pub trait RuleRepository: Send + Sync {
    /// Load everything. Absent storage loads as empty.
    fn load(&self) -> Result<StoredRules>;

    /// Replace the persisted rule set.
    fn save_rules(&self, rules: &RuleMap) -> Result<()>;

    /// Replace the persisted last-spawn timestamps.
    fn save_last_spawn(&self, last_spawn: &LastSpawnMap) -> Result<()>;
}
