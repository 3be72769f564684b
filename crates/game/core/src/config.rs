/// Game tunables shared by the engine and the scheduler.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GameConfig {
    /// Per-message drop chance for channels that have no spawn rule.
    pub fallback_drop_chance: f64,
    /// Seconds a player waits between two summons.
    pub summon_cooldown_secs: u64,
    /// Minimum similarity for a fuzzy catch.
    pub fuzzy_threshold: f64,
    /// Names and tokens must be strictly longer than this to be fuzzy-matched.
    pub fuzzy_min_len: usize,
    /// Noun used in drop announcements.
    pub item_noun: String,
}

impl GameConfig {
    // ===== runtime-tunable defaults =====
    pub const DEFAULT_FALLBACK_DROP_CHANCE: f64 = 0.02;
    pub const DEFAULT_SUMMON_COOLDOWN_SECS: u64 = 3600;
    pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.85;
    pub const DEFAULT_FUZZY_MIN_LEN: usize = 4;
    pub const DEFAULT_ITEM_NOUN: &'static str = "Math object";

    pub fn new() -> Self {
        Self {
            fallback_drop_chance: Self::DEFAULT_FALLBACK_DROP_CHANCE,
            summon_cooldown_secs: Self::DEFAULT_SUMMON_COOLDOWN_SECS,
            fuzzy_threshold: Self::DEFAULT_FUZZY_THRESHOLD,
            fuzzy_min_len: Self::DEFAULT_FUZZY_MIN_LEN,
            item_noun: Self::DEFAULT_ITEM_NOUN.to_owned(),
        }
    }

    pub fn with_fallback_drop_chance(mut self, chance: f64) -> Self {
        self.fallback_drop_chance = chance;
        self
    }

    pub fn with_summon_cooldown_secs(mut self, secs: u64) -> Self {
        self.summon_cooldown_secs = secs;
        self
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}
