//! Catch/drop state machine.
//!
//! [`GameState`] owns the per-channel active drops and the per-user summon
//! cooldowns. It performs no I/O and takes time and randomness as inputs, so
//! callers decide how it is shared and tests can drive it deterministically.
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rand::Rng;

use crate::catalog::{Catalog, Item};
use crate::config::GameConfig;
use crate::cooldown::CooldownBook;
use crate::ids::{ChannelId, ItemKey, UserId};
use crate::matching::{MatchResult, match_item};
use crate::selection;

/// What a message did to the active drop of its channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatchOutcome {
    /// The message named the active item; the drop is cleared.
    Catch {
        item: Arc<Item>,
        matched_name: String,
    },
    /// An explicit catch attempt with the wrong name; the drop stays.
    FailedCatch,
    /// Nothing to report.
    NoOp,
}

impl CatchOutcome {
    pub fn is_catch(&self) -> bool {
        matches!(self, Self::Catch { .. })
    }
}

#[derive(Debug)]
pub struct GameState {
    catalog: Arc<Catalog>,
    config: GameConfig,
    active: HashMap<ChannelId, Arc<Item>>,
    cooldowns: CooldownBook,
}

impl GameState {
    pub fn new(catalog: Arc<Catalog>, config: GameConfig) -> Self {
        let cooldowns = CooldownBook::new(config.summon_cooldown_secs);
        Self {
            catalog,
            config,
            active: HashMap::new(),
            cooldowns,
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn active_item(&self, channel: ChannelId) -> Option<&Arc<Item>> {
        self.active.get(&channel)
    }

    /// Matches `text` against the active item of `channel`.
    ///
    /// Only a successful catch clears the active drop.
    pub fn try_catch(&mut self, channel: ChannelId, text: &str) -> CatchOutcome {
        let Some(item) = self.active.get(&channel) else {
            return CatchOutcome::NoOp;
        };

        let matched = match match_item(item, text, &self.config) {
            MatchResult::Matched(name) => name.to_owned(),
            MatchResult::Attempted => return CatchOutcome::FailedCatch,
            MatchResult::Unrelated => return CatchOutcome::NoOp,
        };

        match self.active.remove(&channel) {
            Some(item) => CatchOutcome::Catch {
                item,
                matched_name: matched,
            },
            None => CatchOutcome::NoOp,
        }
    }

    /// Activates a uniformly chosen item in `channel`, replacing any drop.
    pub fn drop_random<R: Rng + ?Sized>(&mut self, channel: ChannelId, rng: &mut R) -> Arc<Item> {
        let item = selection::pick_uniform(&self.catalog, rng);
        self.active.insert(channel, Arc::clone(&item));
        item
    }

    /// Activates an item in `channel`, weighted toward keys missing from
    /// `owned`.
    pub fn drop_favoring_new<R: Rng + ?Sized>(
        &mut self,
        channel: ChannelId,
        owned: &HashSet<ItemKey>,
        rng: &mut R,
    ) -> Arc<Item> {
        let item = selection::pick_favoring_new(&self.catalog, owned, rng);
        self.active.insert(channel, Arc::clone(&item));
        item
    }

    pub fn can_summon(&self, user: UserId, now: u64) -> bool {
        self.cooldowns.is_ready(user, now)
    }

    pub fn record_summon(&mut self, user: UserId, now: u64) {
        self.cooldowns.record(user, now);
    }

    pub fn summon_cooldown_remaining(&self, user: UserId, now: u64) -> u64 {
        self.cooldowns.remaining(user, now)
    }

    /// Checks and records a summon in one step. `Err` carries the wait in
    /// seconds.
    pub fn try_begin_summon(&mut self, user: UserId, now: u64) -> Result<(), u64> {
        self.cooldowns.try_begin(user, now)
    }
}
