//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing and offers async helpers for
//! feeding chat traffic, administering spawn rules and streaming events from
//! specific topics.
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};

use catch_core::{Catalog, ChannelId, Completion, GuildId, ItemKey, SpawnRule, UserId};

use super::errors::{Result, RuntimeError};
use crate::events::{EventBus, SpawnEvent, Topic};
use crate::rules::{RuleChange, TimerStatus};
use crate::scheduler::{InboundMessage, MessageOutcome, SpawnScheduler, SummonOutcome};
use crate::workers::Command;

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    scheduler: Arc<SpawnScheduler>,
}

impl RuntimeHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, scheduler: Arc<SpawnScheduler>) -> Self {
        Self {
            command_tx,
            scheduler,
        }
    }

    async fn send(&self, cmd: Command) -> Result<()> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| RuntimeError::MessageChannelClosed)
    }

    /// Queue a chat message without waiting for its outcome.
    pub async fn submit(&self, msg: InboundMessage) -> Result<()> {
        self.send(Command::Message { msg, reply: None }).await
    }

    /// Handle a chat message and wait for what it did.
    pub async fn process(&self, msg: InboundMessage) -> Result<MessageOutcome> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Message {
            msg,
            reply: Some(reply_tx),
        })
        .await?;
        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Summon a drop in `channel` on behalf of `user`.
    ///
    /// `requester` is the display name used in the announcement.
    pub async fn summon(
        &self,
        channel: ChannelId,
        user: UserId,
        requester: impl Into<String>,
    ) -> Result<SummonOutcome> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Summon {
            channel,
            user,
            requester: requester.into(),
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    pub fn is_elevated(&self, user: UserId) -> bool {
        self.scheduler.permissions().is_elevated(user)
    }

    /// Set the drop probability of `channel`; `value <= 0` clears it.
    pub fn set_probability(
        &self,
        channel: ChannelId,
        guild: GuildId,
        value: f64,
    ) -> Result<RuleChange> {
        Ok(self.scheduler.rules().set_probability(channel, guild, value)?)
    }

    /// Set the timed-drop interval of `channel`; `secs <= 0` clears it.
    pub fn set_interval(
        &self,
        channel: ChannelId,
        guild: GuildId,
        secs: i64,
    ) -> Result<RuleChange> {
        Ok(self.scheduler.rules().set_interval(channel, guild, secs)?)
    }

    /// Remove every spawn rule of `channel`.
    pub fn remove_rule(&self, channel: ChannelId) -> Result<SpawnRule> {
        Ok(self.scheduler.rules().remove(channel)?)
    }

    pub fn rule(&self, channel: ChannelId) -> Option<SpawnRule> {
        self.scheduler.rules().get(channel)
    }

    pub fn rules(&self, guild: GuildId) -> Vec<SpawnRule> {
        self.scheduler.rules().list_for_guild(guild)
    }

    /// Time left until the next timed drop, per timed channel of `guild`.
    pub fn timer_status(&self, guild: GuildId) -> Vec<TimerStatus> {
        let now = self.scheduler.clock().now();
        self.scheduler.rules().timer_status(guild, now)
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        self.scheduler.game().catalog()
    }

    /// Item counts held by `user`, ordered by key.
    pub async fn inventory(&self, user: UserId) -> Result<BTreeMap<ItemKey, u32>> {
        Ok(self.scheduler.inventory().counts(user).await?)
    }

    pub async fn completion(&self, user: UserId) -> Result<Completion> {
        let owned = self.scheduler.inventory().owned_keys(user).await?;
        Ok(self.catalog().completion(owned.iter().map(ItemKey::as_str)))
    }

    /// Catalog keys `user` does not own yet, sorted.
    pub async fn remaining(&self, user: UserId) -> Result<Vec<ItemKey>> {
        let owned = self.scheduler.inventory().owned_keys(user).await?;
        Ok(self.catalog().remaining(owned.iter().map(ItemKey::as_str)))
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Drops` - drops and failed announcements
    /// - `Topic::Catches` - catches and wrong-name attempts
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<SpawnEvent> {
        self.scheduler.events().subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<SpawnEvent>> {
        self.scheduler.events().subscribe_multiple(topics)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        self.scheduler.events()
    }
}
