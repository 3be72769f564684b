//! Durable per-channel spawn rules.
//!
//! [`SpawnRuleStore`] serves reads from an in-memory snapshot and serializes
//! every mutation behind one write lock: compute the new rule set, persist
//! it, then swap the snapshot in. A failed write leaves the snapshot as it
//! was. Each committed mutation bumps a revision on a `watch` channel, which
//! the timer supervisor and the timer tasks listen to.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use catch_core::{
    ChannelId, Cleared, ConfigError, Dimension, GuildId, Interval, Probability, SpawnMode,
    SpawnRule,
};
use thiserror::Error;
use tokio::sync::watch;

use crate::repository::{LastSpawnMap, RepositoryError, RuleMap, RuleRepository};

/// Errors returned by rule mutations.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("No spawn rule exists for channel {0}.")]
    NoRule(ChannelId),

    #[error("failed to persist spawn rules: {0}")]
    Repository(#[from] RepositoryError),
}

/// What a mutation did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RuleChange {
    /// A rule now exists where there was none.
    Created(SpawnRule),
    /// An existing rule got a new mode.
    Updated { previous: SpawnMode, rule: SpawnRule },
    /// One dimension was cleared and the other remains.
    Degraded { cleared: Dimension, rule: SpawnRule },
    /// The rule was deleted.
    Removed(SpawnRule),
    /// Clearing a dimension the rule never had; nothing changed.
    DimensionNotSet { dimension: Dimension, rule: SpawnRule },
}

impl RuleChange {
    /// The rule in effect after the change, if any.
    pub fn rule(&self) -> Option<&SpawnRule> {
        match self {
            Self::Created(rule)
            | Self::Updated { rule, .. }
            | Self::Degraded { rule, .. }
            | Self::DimensionNotSet { rule, .. } => Some(rule),
            Self::Removed(_) => None,
        }
    }
}

/// Time left until the next timed drop of one channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerStatus {
    pub channel: ChannelId,
    pub guild: GuildId,
    pub interval: Interval,
    pub remaining_secs: u64,
}

impl std::fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Interval: {}\nNext spawn in: {}s",
            self.interval, self.remaining_secs
        )
    }
}

struct Mutation {
    change: RuleChange,
    next: Option<SpawnRule>,
}

pub struct SpawnRuleStore {
    repo: Arc<dyn RuleRepository>,
    snapshot: RwLock<Arc<RuleMap>>,
    last_spawn: Mutex<LastSpawnMap>,
    write_lock: Mutex<()>,
    revision: watch::Sender<u64>,
}

impl SpawnRuleStore {
    /// Loads the persisted rules. A repository that cannot be read yields an
    /// empty store; the failure is logged.
    pub fn open(repo: Arc<dyn RuleRepository>) -> Self {
        let stored = repo.load().unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to load spawn rules; starting with none");
            Default::default()
        });
        tracing::info!(
            rules = stored.rules.len(),
            timestamps = stored.last_spawn.len(),
            "spawn rules loaded"
        );

        let (revision, _) = watch::channel(0);
        Self {
            repo,
            snapshot: RwLock::new(Arc::new(stored.rules)),
            last_spawn: Mutex::new(stored.last_spawn),
            write_lock: Mutex::new(()),
            revision,
        }
    }

    fn rules(&self) -> Arc<RuleMap> {
        Arc::clone(&self.snapshot.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn get(&self, channel: ChannelId) -> Option<SpawnRule> {
        self.rules().get(&channel).copied()
    }

    pub fn list(&self) -> Vec<SpawnRule> {
        self.rules().values().copied().collect()
    }

    /// Rules of one guild, ordered by channel.
    pub fn list_for_guild(&self, guild: GuildId) -> Vec<SpawnRule> {
        self.rules()
            .values()
            .filter(|rule| rule.guild == guild)
            .copied()
            .collect()
    }

    /// Channels whose rule carries an interval.
    pub fn timed_channels(&self) -> Vec<(ChannelId, Interval)> {
        self.rules()
            .values()
            .filter_map(|rule| rule.mode.interval().map(|i| (rule.channel, i)))
            .collect()
    }

    /// Current revision; bumped by every committed mutation.
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Creates or replaces the rule of `channel`.
    pub fn set(
        &self,
        channel: ChannelId,
        guild: GuildId,
        mode: SpawnMode,
    ) -> Result<RuleChange, RuleError> {
        self.mutate(channel, |current| {
            let rule = SpawnRule::new(channel, guild, mode);
            let change = match current {
                Some(previous) => RuleChange::Updated {
                    previous: previous.mode,
                    rule,
                },
                None => RuleChange::Created(rule),
            };
            Ok(Mutation {
                change,
                next: Some(rule),
            })
        })
    }

    /// Sets the probability of `channel`; `value <= 0` clears it instead.
    ///
    /// An existing interval is kept.
    pub fn set_probability(
        &self,
        channel: ChannelId,
        guild: GuildId,
        value: f64,
    ) -> Result<RuleChange, RuleError> {
        if value <= 0.0 {
            return self.clear(channel, Dimension::Probability);
        }
        let probability = Probability::new(value)?;
        self.set_dimension(channel, guild, |current| {
            SpawnMode::with_probability(current, probability)
        })
    }

    /// Sets the interval of `channel`; `secs <= 0` clears it instead.
    ///
    /// An existing probability is kept.
    pub fn set_interval(
        &self,
        channel: ChannelId,
        guild: GuildId,
        secs: i64,
    ) -> Result<RuleChange, RuleError> {
        if secs <= 0 {
            return self.clear(channel, Dimension::Interval);
        }
        let interval = Interval::new(secs)?;
        self.set_dimension(channel, guild, |current| {
            SpawnMode::with_interval(current, interval)
        })
    }

    fn set_dimension(
        &self,
        channel: ChannelId,
        guild: GuildId,
        apply: impl FnOnce(Option<SpawnMode>) -> SpawnMode,
    ) -> Result<RuleChange, RuleError> {
        self.mutate(channel, |current| {
            let mode = apply(current.map(|rule| rule.mode));
            // Keep the guild recorded at creation unless it was unknown.
            let guild = match current {
                Some(rule) if rule.guild != GuildId(0) => rule.guild,
                _ => guild,
            };
            let rule = SpawnRule::new(channel, guild, mode);
            let change = match current {
                Some(previous) => RuleChange::Updated {
                    previous: previous.mode,
                    rule,
                },
                None => RuleChange::Created(rule),
            };
            Ok(Mutation {
                change,
                next: Some(rule),
            })
        })
    }

    /// Clears one dimension of the rule of `channel`.
    pub fn clear(&self, channel: ChannelId, dimension: Dimension) -> Result<RuleChange, RuleError> {
        self.mutate(channel, |current| {
            let rule = *current.ok_or(RuleError::NoRule(channel))?;
            Ok(match rule.mode.clear(dimension) {
                Cleared::Kept(mode) => {
                    let rule = SpawnRule { mode, ..rule };
                    Mutation {
                        change: RuleChange::Degraded {
                            cleared: dimension,
                            rule,
                        },
                        next: Some(rule),
                    }
                }
                Cleared::Emptied => Mutation {
                    change: RuleChange::Removed(rule),
                    next: None,
                },
                Cleared::NotSet => Mutation {
                    change: RuleChange::DimensionNotSet { dimension, rule },
                    next: Some(rule),
                },
            })
        })
    }

    /// Deletes the rule of `channel` and its last-spawn timestamp.
    pub fn remove(&self, channel: ChannelId) -> Result<SpawnRule, RuleError> {
        let change = self.mutate(channel, |current| {
            let rule = *current.ok_or(RuleError::NoRule(channel))?;
            Ok(Mutation {
                change: RuleChange::Removed(rule),
                next: None,
            })
        })?;
        match change {
            RuleChange::Removed(rule) => Ok(rule),
            _ => Err(RuleError::NoRule(channel)),
        }
    }

    fn mutate<F>(&self, channel: ChannelId, decide: F) -> Result<RuleChange, RuleError>
    where
        F: FnOnce(Option<&SpawnRule>) -> Result<Mutation, RuleError>,
    {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let current = self.rules();
        let previous = current.get(&channel).copied();
        let Mutation { change, next } = decide(previous.as_ref())?;

        if let RuleChange::DimensionNotSet { .. } = change {
            return Ok(change);
        }

        let mut rules = (*current).clone();
        match next {
            Some(rule) => rules.insert(channel, rule),
            None => rules.remove(&channel),
        };

        self.repo.save_rules(&rules)?;

        // `record_spawn` checks the interval under this same lock.
        let mut last_spawn = self.last_spawn.lock().unwrap_or_else(PoisonError::into_inner);
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(rules);

        let had_timer = previous.and_then(|r| r.mode.interval()).is_some();
        let has_timer = next.and_then(|r| r.mode.interval()).is_some();
        if had_timer && !has_timer {
            self.forget_last_spawn(&mut last_spawn, channel);
        }
        drop(last_spawn);

        self.revision.send_modify(|rev| *rev += 1);
        tracing::info!(%channel, ?change, "spawn rule changed");
        Ok(change)
    }

    pub fn last_spawn(&self, channel: ChannelId) -> Option<u64> {
        self.last_spawn
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&channel)
            .copied()
    }

    /// Records a drop at `now` if the channel's rule has an interval.
    ///
    /// Timestamps never move backwards. Persistence is best-effort: a failed
    /// write is logged and the in-memory value is kept. Returns whether a
    /// timestamp was recorded.
    pub fn record_spawn(&self, channel: ChannelId, now: u64) -> bool {
        let mut last_spawn = self.last_spawn.lock().unwrap_or_else(PoisonError::into_inner);
        if self.get(channel).and_then(|r| r.mode.interval()).is_none() {
            return false;
        }

        let entry = last_spawn.entry(channel).or_insert(now);
        *entry = (*entry).max(now);

        if let Err(e) = self.repo.save_last_spawn(&last_spawn) {
            tracing::warn!(%channel, error = %e, "failed to persist last-spawn timestamp");
        }
        true
    }

    fn forget_last_spawn(&self, last_spawn: &mut LastSpawnMap, channel: ChannelId) {
        if last_spawn.remove(&channel).is_some()
            && let Err(e) = self.repo.save_last_spawn(last_spawn)
        {
            tracing::warn!(%channel, error = %e, "failed to persist last-spawn removal");
        }
    }

    /// Seconds until `channel` is due for a timed drop; `None` without an
    /// interval. A channel that never dropped is due immediately.
    pub fn time_until_next(&self, channel: ChannelId, now: u64) -> Option<u64> {
        let interval = self.get(channel)?.mode.interval()?;
        Some(self.remaining(channel, interval, now))
    }

    fn remaining(&self, channel: ChannelId, interval: Interval, now: u64) -> u64 {
        self.last_spawn(channel).map_or(0, |last| {
            last.saturating_add(u64::from(interval.secs()))
                .saturating_sub(now)
        })
    }

    /// Timer status of every timed channel in `guild`.
    pub fn timer_status(&self, guild: GuildId, now: u64) -> Vec<TimerStatus> {
        self.list_for_guild(guild)
            .into_iter()
            .filter_map(|rule| {
                let interval = rule.mode.interval()?;
                Some(TimerStatus {
                    channel: rule.channel,
                    guild: rule.guild,
                    interval,
                    remaining_secs: self.remaining(rule.channel, interval, now),
                })
            })
            .collect()
    }
}
