//! Spawn scheduling: message-driven drops, timed drops and summons.
//!
//! [`SpawnScheduler`] turns the three per-channel events (a message arrived,
//! a timer is due, a player summoned) into catches, drops and announcements.
//! Bookkeeping (active drop, last-spawn, cooldown) is committed before any
//! transport I/O, and no lock is held while talking to the transport.

mod locks;
mod supervisor;
mod timer;

pub use locks::ChannelLocks;
pub use supervisor::TimerSupervisor;

use std::collections::HashSet;
use std::sync::Arc;

use catch_core::{CatchOutcome, ChannelId, GuildId, Item, ItemKey, UserId};

use crate::api::{Inventory, Permissions, Transport};
use crate::clock::Clock;
use crate::events::{DropCause, EventBus, SpawnEvent};
use crate::game::SharedGame;
use crate::rules::SpawnRuleStore;

/// Reply to a catch attempt with the wrong name.
pub const WRONG_NAME_REPLY: &str = "That is not the right name..";

/// An inbound chat message, as the transport saw it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    pub channel: ChannelId,
    /// `None` for direct messages.
    pub guild: Option<GuildId>,
    pub author: UserId,
    pub author_is_bot: bool,
    /// Set for prefix commands, so "!summon" never catches "sum".
    pub is_command: bool,
    pub text: String,
}

impl InboundMessage {
    pub fn new(
        channel: ChannelId,
        guild: GuildId,
        author: UserId,
        text: impl Into<String>,
    ) -> Self {
        Self {
            channel,
            guild: Some(guild),
            author,
            author_is_bot: false,
            is_command: false,
            text: text.into(),
        }
    }
}

/// What handling one message did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Bot author, direct message or command.
    Ignored,
    Caught { key: ItemKey, matched_name: String },
    Missed,
    Dropped { key: ItemKey, cause: DropCause },
    Nothing,
}

/// Result of one timer evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimerTick {
    /// The channel has no interval (any more).
    NoTimer,
    /// Dropped; the next drop is due in `next_in_secs`.
    Dropped { key: ItemKey, next_in_secs: u64 },
    NotDue { remaining_secs: u64 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SummonOutcome {
    Dropped { key: ItemKey },
    Cooldown { remaining_secs: u64 },
}

pub fn drop_announcement(noun: &str, item: &Item) -> String {
    format!(
        "A new {noun} dropped! `{}`. Catch it by saying its name!",
        item.key()
    )
}

pub fn catch_reply(item: &Item, matched_name: &str) -> String {
    format!("Caught {} -> {}", item.key(), matched_name)
}

pub fn summon_prefix(requester: &str) -> String {
    format!("{requester} used their summon!")
}

pub fn cooldown_reply(remaining_secs: u64) -> String {
    format!("You must wait {remaining_secs} seconds!")
}

pub struct SpawnScheduler {
    game: SharedGame,
    rules: Arc<SpawnRuleStore>,
    inventory: Arc<dyn Inventory>,
    transport: Arc<dyn Transport>,
    permissions: Arc<dyn Permissions>,
    clock: Arc<dyn Clock>,
    events: EventBus,
    locks: ChannelLocks,
}

impl SpawnScheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        game: SharedGame,
        rules: Arc<SpawnRuleStore>,
        inventory: Arc<dyn Inventory>,
        transport: Arc<dyn Transport>,
        permissions: Arc<dyn Permissions>,
        clock: Arc<dyn Clock>,
        events: EventBus,
    ) -> Self {
        Self {
            game,
            rules,
            inventory,
            transport,
            permissions,
            clock,
            events,
            locks: ChannelLocks::new(),
        }
    }

    pub fn game(&self) -> &SharedGame {
        &self.game
    }

    pub fn rules(&self) -> &Arc<SpawnRuleStore> {
        &self.rules
    }

    pub fn inventory(&self) -> &Arc<dyn Inventory> {
        &self.inventory
    }

    pub fn permissions(&self) -> &Arc<dyn Permissions> {
        &self.permissions
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Catch first; only a message that neither caught nor missed can drop.
    pub async fn handle_message(&self, msg: &InboundMessage) -> MessageOutcome {
        if msg.author_is_bot || msg.guild.is_none() || msg.is_command {
            return MessageOutcome::Ignored;
        }
        let channel = msg.channel;

        match self.game.try_catch(channel, &msg.text) {
            CatchOutcome::Catch { item, matched_name } => {
                return self.on_catch(msg, item, matched_name).await;
            }
            CatchOutcome::FailedCatch => {
                self.events.publish(SpawnEvent::CatchMissed {
                    channel,
                    user: msg.author,
                });
                self.reply(channel, WRONG_NAME_REPLY).await;
                return MessageOutcome::Missed;
            }
            CatchOutcome::NoOp => {}
        }

        let guard = self.locks.lock(channel).await;

        let (chance, cause) = match self.rules.get(channel) {
            Some(rule) => match rule.mode.probability() {
                Some(p) => (p.get(), DropCause::Message),
                None => return MessageOutcome::Nothing,
            },
            None => (self.game.config().fallback_drop_chance, DropCause::Fallback),
        };
        if chance <= 0.0 || self.game.roll() >= chance {
            return MessageOutcome::Nothing;
        }

        let owned = self.owned_keys(msg.author).await;
        let item = self.game.drop_favoring_new(channel, &owned);
        self.rules.record_spawn(channel, self.clock.now());
        drop(guard);

        self.announce_drop(channel, &item, cause, None).await;
        MessageOutcome::Dropped {
            key: item.key().clone(),
            cause,
        }
    }

    async fn on_catch(
        &self,
        msg: &InboundMessage,
        item: Arc<Item>,
        matched_name: String,
    ) -> MessageOutcome {
        tracing::info!(
            channel = %msg.channel,
            user = %msg.author,
            key = %item.key(),
            name = %matched_name,
            "item caught"
        );
        if let Err(e) = self.inventory.add(msg.author, item.key(), 1).await {
            tracing::error!(
                user = %msg.author,
                key = %item.key(),
                error = %e,
                "failed to record catch"
            );
        }
        self.events.publish(SpawnEvent::Caught {
            channel: msg.channel,
            user: msg.author,
            key: item.key().clone(),
            matched_name: matched_name.clone(),
        });
        self.reply(msg.channel, &catch_reply(&item, &matched_name))
            .await;
        MessageOutcome::Caught {
            key: item.key().clone(),
            matched_name,
        }
    }

    /// Timed drop check for `channel`: drops when the interval has elapsed
    /// since the last drop, or when the channel never dropped.
    pub async fn evaluate_timer(&self, channel: ChannelId) -> TimerTick {
        let guard = self.locks.lock(channel).await;

        let Some(interval) = self.rules.get(channel).and_then(|r| r.mode.interval()) else {
            return TimerTick::NoTimer;
        };
        let now = self.clock.now();
        if let Some(remaining_secs) = self
            .rules
            .time_until_next(channel, now)
            .filter(|r| *r > 0)
        {
            return TimerTick::NotDue { remaining_secs };
        }

        let item = self.game.drop_random(channel);
        self.rules.record_spawn(channel, now);
        drop(guard);

        self.announce_drop(channel, &item, DropCause::Timer, None)
            .await;
        TimerTick::Dropped {
            key: item.key().clone(),
            next_in_secs: u64::from(interval.secs()),
        }
    }

    /// Manual summon by `user`. Elevated users skip the cooldown.
    pub async fn summon(
        &self,
        channel: ChannelId,
        user: UserId,
        requester: &str,
    ) -> SummonOutcome {
        let now = self.clock.now();
        if !self.permissions.is_elevated(user)
            && let Err(remaining_secs) = self.game.try_begin_summon(user, now)
        {
            self.reply(channel, &cooldown_reply(remaining_secs)).await;
            return SummonOutcome::Cooldown { remaining_secs };
        }

        let guard = self.locks.lock(channel).await;
        let owned = self.owned_keys(user).await;
        let item = self.game.drop_favoring_new(channel, &owned);
        self.rules.record_spawn(channel, now);
        drop(guard);

        self.announce_drop(channel, &item, DropCause::Summon, Some(requester))
            .await;
        SummonOutcome::Dropped {
            key: item.key().clone(),
        }
    }

    async fn owned_keys(&self, user: UserId) -> HashSet<ItemKey> {
        self.inventory.owned_keys(user).await.unwrap_or_else(|e| {
            tracing::warn!(%user, error = %e, "inventory lookup failed; dropping without weights");
            HashSet::new()
        })
    }

    async fn announce_drop(
        &self,
        channel: ChannelId,
        item: &Item,
        cause: DropCause,
        requester: Option<&str>,
    ) {
        tracing::info!(%channel, key = %item.key(), %cause, "item dropped");
        self.events.publish(SpawnEvent::Dropped {
            channel,
            key: item.key().clone(),
            cause,
        });

        let announcement = drop_announcement(&self.game.config().item_noun, item);
        let text = match requester {
            Some(requester) => format!("{}\n{announcement}", summon_prefix(requester)),
            None => announcement,
        };
        self.announce(channel, &text).await;
    }

    /// Resolves the channel, then posts. Failures are logged and published;
    /// they never undo bookkeeping already committed.
    async fn announce(&self, channel: ChannelId, text: &str) {
        let result = match self.transport.fetch_channel(channel).await {
            Ok(info) => self.transport.send(info.id, text).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::warn!(%channel, error = %e, "announcement failed");
            self.events.publish(SpawnEvent::AnnounceFailed {
                channel,
                reason: e.to_string(),
            });
        }
    }

    async fn reply(&self, channel: ChannelId, text: &str) {
        if let Err(e) = self.transport.send(channel, text).await {
            tracing::warn!(%channel, error = %e, "reply failed");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::{ChannelInfo, InMemoryInventory, StaticPermissions, TransportError};
    use crate::clock::ManualClock;
    use crate::repository::InMemoryRuleRepository;
    use async_trait::async_trait;
    use catch_core::{Catalog, GameConfig, ItemCategory, SpawnMode};
    use std::sync::Mutex;

    pub(crate) const GUILD: GuildId = GuildId(1);
    pub(crate) const CH: ChannelId = ChannelId(10);
    pub(crate) const ADMIN: UserId = UserId(99);

    #[derive(Default)]
    pub(crate) struct RecordingTransport {
        pub sent: Mutex<Vec<(ChannelId, String)>>,
        pub fail: std::sync::atomic::AtomicBool,
    }

    impl RecordingTransport {
        pub fn messages(&self) -> Vec<(ChannelId, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(&self, channel: ChannelId, text: &str) -> Result<(), TransportError> {
            self.sent.lock().unwrap().push((channel, text.to_owned()));
            Ok(())
        }

        async fn fetch_channel(&self, channel: ChannelId) -> Result<ChannelInfo, TransportError> {
            if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(TransportError::UnknownChannel(channel));
            }
            Ok(ChannelInfo {
                id: channel,
                guild: Some(GUILD),
                name: format!("ch-{channel}"),
            })
        }
    }

    pub(crate) fn catalog() -> Arc<Catalog> {
        Arc::new(
            Catalog::from_items([
                Item::new(
                    "cos",
                    ItemCategory::Functions,
                    [("en", "cosine"), ("fr", "cosinus")],
                )
                .unwrap(),
                Item::new(
                    "sin",
                    ItemCategory::Functions,
                    [("en", "sine"), ("fr", "sinus")],
                )
                .unwrap(),
                Item::new(
                    "tan",
                    ItemCategory::Functions,
                    [("en", "tangent"), ("fr", "tangente")],
                )
                .unwrap(),
            ])
            .unwrap(),
        )
    }

    pub(crate) struct Fixture {
        pub scheduler: Arc<SpawnScheduler>,
        pub transport: Arc<RecordingTransport>,
        pub inventory: Arc<InMemoryInventory>,
        pub clock: Arc<ManualClock>,
    }

    fn assemble(
        config: GameConfig,
        clock: Arc<dyn Clock>,
        inventory: Arc<InMemoryInventory>,
    ) -> (Arc<SpawnScheduler>, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::default());
        let rules = Arc::new(SpawnRuleStore::open(Arc::new(InMemoryRuleRepository::new())));
        let scheduler = Arc::new(SpawnScheduler::new(
            SharedGame::new(catalog(), config, Some(7)),
            rules,
            inventory,
            transport.clone(),
            Arc::new(StaticPermissions::new([ADMIN])),
            clock,
            EventBus::new(),
        ));
        (scheduler, transport)
    }

    pub(crate) fn build(
        config: GameConfig,
        clock: Arc<dyn Clock>,
    ) -> (Arc<SpawnScheduler>, Arc<RecordingTransport>) {
        assemble(config, clock, Arc::new(InMemoryInventory::new()))
    }

    pub(crate) fn fixture(config: GameConfig) -> Fixture {
        let inventory = Arc::new(InMemoryInventory::new());
        let clock = Arc::new(ManualClock::new(1_000_000));
        let (scheduler, transport) = assemble(config, clock.clone(), inventory.clone());
        Fixture {
            scheduler,
            transport,
            inventory,
            clock,
        }
    }

    fn quiet() -> GameConfig {
        GameConfig::default().with_fallback_drop_chance(0.0)
    }

    fn msg(text: &str) -> InboundMessage {
        InboundMessage::new(CH, GUILD, UserId(1), text)
    }

    #[tokio::test]
    async fn ignores_bots_dms_and_commands() {
        let f = fixture(GameConfig::default().with_fallback_drop_chance(1.0));
        let s = &f.scheduler;

        let mut bot = msg("hello");
        bot.author_is_bot = true;
        assert_eq!(s.handle_message(&bot).await, MessageOutcome::Ignored);

        let mut dm = msg("hello");
        dm.guild = None;
        assert_eq!(s.handle_message(&dm).await, MessageOutcome::Ignored);

        let mut cmd = msg("!summon");
        cmd.is_command = true;
        assert_eq!(s.handle_message(&cmd).await, MessageOutcome::Ignored);
        assert!(f.transport.messages().is_empty());
    }

    #[tokio::test]
    async fn fallback_drop_then_catch() {
        let f = fixture(GameConfig::default().with_fallback_drop_chance(1.0));
        let s = &f.scheduler;

        let MessageOutcome::Dropped { key, cause } = s.handle_message(&msg("hi")).await else {
            panic!("expected a drop");
        };
        assert_eq!(cause, DropCause::Fallback);
        let item = Arc::clone(s.game().catalog().get(key.as_str()).unwrap());
        assert_eq!(
            f.transport.messages().last().unwrap().1,
            format!("A new Math object dropped! `{key}`. Catch it by saying its name!")
        );

        let name = item.display_name().to_owned();
        let outcome = s.handle_message(&msg(&name)).await;
        assert_eq!(
            outcome,
            MessageOutcome::Caught {
                key: key.clone(),
                matched_name: name.clone()
            }
        );
        assert_eq!(
            f.transport.messages().last().unwrap().1,
            format!("Caught {key} -> {name}")
        );
        assert_eq!(f.inventory.counts(UserId(1)).await.unwrap()[&key], 1);
        assert!(s.game().active_item(CH).is_none());
    }

    #[tokio::test]
    async fn wrong_name_with_catch_word_keeps_drop() {
        let f = fixture(quiet());
        let s = &f.scheduler;
        let item = s.game().drop_random(CH);

        let outcome = s.handle_message(&msg("let me catch zzzzzz")).await;
        assert_eq!(outcome, MessageOutcome::Missed);
        assert_eq!(f.transport.messages().last().unwrap().1, WRONG_NAME_REPLY);
        assert!(s.game().active_item(CH).is_some());

        let outcome = s.handle_message(&msg(item.display_name())).await;
        assert_eq!(
            outcome,
            MessageOutcome::Caught {
                key: item.key().clone(),
                matched_name: item.display_name().to_owned(),
            }
        );
        assert!(s.game().active_item(CH).is_none());
    }

    #[tokio::test]
    async fn interval_only_channels_never_drop_on_messages() {
        let f = fixture(GameConfig::default().with_fallback_drop_chance(1.0));
        let s = &f.scheduler;
        s.rules()
            .set(
                CH,
                GUILD,
                SpawnMode::Interval(catch_core::Interval::new(60).unwrap()),
            )
            .unwrap();

        for _ in 0..100 {
            assert_eq!(s.handle_message(&msg("chatter")).await, MessageOutcome::Nothing);
        }
    }

    #[tokio::test]
    async fn timer_drops_when_due() {
        let f = fixture(quiet());
        let s = &f.scheduler;
        assert_eq!(s.evaluate_timer(CH).await, TimerTick::NoTimer);

        s.rules().set_interval(CH, GUILD, 60).unwrap();
        assert!(matches!(
            s.evaluate_timer(CH).await,
            TimerTick::Dropped { next_in_secs: 60, .. }
        ));
        assert_eq!(s.rules().last_spawn(CH), Some(1_000_000));

        f.clock.advance(59);
        assert_eq!(
            s.evaluate_timer(CH).await,
            TimerTick::NotDue { remaining_secs: 1 }
        );
        f.clock.advance(1);
        assert!(matches!(s.evaluate_timer(CH).await, TimerTick::Dropped { .. }));
    }

    #[tokio::test]
    async fn summon_respects_cooldown_unless_elevated() {
        let f = fixture(quiet());
        let s = &f.scheduler;
        let user = UserId(5);

        assert!(matches!(
            s.summon(CH, user, "alice").await,
            SummonOutcome::Dropped { .. }
        ));
        let last = f.transport.messages().last().unwrap().1.clone();
        assert!(last.starts_with("alice used their summon!\nA new Math object dropped!"));

        f.clock.advance(100);
        assert_eq!(
            s.summon(CH, user, "alice").await,
            SummonOutcome::Cooldown {
                remaining_secs: 3500
            }
        );
        assert_eq!(
            f.transport.messages().last().unwrap().1,
            "You must wait 3500 seconds!"
        );

        for _ in 0..3 {
            assert!(matches!(
                s.summon(CH, ADMIN, "admin").await,
                SummonOutcome::Dropped { .. }
            ));
        }
    }

    #[tokio::test]
    async fn announce_failure_keeps_bookkeeping() {
        let f = fixture(quiet());
        let s = &f.scheduler;
        let mut drops = s.events().subscribe(crate::events::Topic::Drops);
        f.transport
            .fail
            .store(true, std::sync::atomic::Ordering::SeqCst);
        s.rules().set_interval(CH, GUILD, 60).unwrap();

        assert!(matches!(s.evaluate_timer(CH).await, TimerTick::Dropped { .. }));
        assert!(s.game().active_item(CH).is_some());
        assert_eq!(s.rules().last_spawn(CH), Some(1_000_000));

        assert!(matches!(
            drops.recv().await.unwrap(),
            SpawnEvent::Dropped { .. }
        ));
        assert!(matches!(
            drops.recv().await.unwrap(),
            SpawnEvent::AnnounceFailed { .. }
        ));
    }
}
