//! End-to-end drop scheduling through the public runtime API.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use catch_core::{
    Catalog, ChannelId, GameConfig, GuildId, Interval, Item, ItemCategory, Probability, SpawnMode,
    UserId,
};
use catch_runtime::{
    ChannelInfo, Clock, EventBus, InMemoryInventory, InMemoryRuleRepository, InboundMessage,
    ManualClock, MessageOutcome, RuleChange, Runtime, RuntimeConfig, SharedGame, SpawnEvent,
    SpawnRuleStore, SpawnScheduler, StaticPermissions, SummonOutcome, SystemClock, TimerTick,
    Topic, Transport, TransportError,
};

const GUILD: GuildId = GuildId(1);
const CH: ChannelId = ChannelId(10);
const START: u64 = 1_700_000_000;

#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<(ChannelId, String)>>,
    unreachable: AtomicBool,
}

impl RecordingTransport {
    fn drops(&self) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, text)| text.contains("dropped!"))
            .count()
    }

    fn last(&self) -> Option<String> {
        self.sent.lock().unwrap().last().map(|(_, t)| t.clone())
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, channel: ChannelId, text: &str) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push((channel, text.to_owned()));
        Ok(())
    }

    async fn fetch_channel(&self, channel: ChannelId) -> Result<ChannelInfo, TransportError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(TransportError::UnknownChannel(channel));
        }
        Ok(ChannelInfo {
            id: channel,
            guild: Some(GUILD),
            name: "math".into(),
        })
    }
}

fn catalog() -> Catalog {
    Catalog::from_items([
        Item::new("pi", ItemCategory::Constants, [("en", "pi"), ("fr", "pi")]).unwrap(),
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
            "e",
            ItemCategory::Constants,
            [("en", "euler's number"), ("fr", "nombre d'euler")],
        )
        .unwrap(),
    ])
    .unwrap()
}

fn quiet() -> GameConfig {
    GameConfig::default().with_fallback_drop_chance(0.0)
}

fn scheduler(
    config: GameConfig,
    clock: Arc<dyn Clock>,
) -> (Arc<SpawnScheduler>, Arc<RecordingTransport>) {
    let transport = Arc::new(RecordingTransport::default());
    let scheduler = Arc::new(SpawnScheduler::new(
        SharedGame::new(Arc::new(catalog()), config, Some(2024)),
        Arc::new(SpawnRuleStore::open(Arc::new(InMemoryRuleRepository::new()))),
        Arc::new(InMemoryInventory::new()),
        transport.clone(),
        Arc::new(StaticPermissions::default()),
        clock,
        EventBus::new(),
    ));
    (scheduler, transport)
}

fn chatter(author: u64) -> InboundMessage {
    InboundMessage::new(CH, GUILD, UserId(author), "lorem ipsum")
}

#[tokio::test]
async fn probability_rate_matches_configuration() {
    let (scheduler, _) = scheduler(quiet(), Arc::new(ManualClock::new(START)));
    scheduler
        .rules()
        .set(
            CH,
            GUILD,
            SpawnMode::Probability(Probability::new(0.3).unwrap()),
        )
        .unwrap();

    let mut drops = 0;
    for i in 0..10_000 {
        if let MessageOutcome::Dropped { .. } = scheduler.handle_message(&chatter(i % 7)).await {
            drops += 1;
        }
    }
    assert!((2_800..=3_200).contains(&drops), "drops = {drops}");
}

#[tokio::test]
async fn unconfigured_channels_use_fallback_rate() {
    let config = GameConfig::default().with_fallback_drop_chance(0.05);
    let (scheduler, _) = scheduler(config, Arc::new(ManualClock::new(START)));

    let mut drops = 0;
    for i in 0..10_000 {
        match scheduler.handle_message(&chatter(i % 3)).await {
            MessageOutcome::Dropped { cause, .. } => {
                assert_eq!(cause, catch_runtime::DropCause::Fallback);
                drops += 1;
            }
            MessageOutcome::Nothing => {}
            other => panic!("unexpected {other:?}"),
        }
    }
    assert!((380..=620).contains(&drops), "drops = {drops}");
}

#[tokio::test]
async fn interval_drops_exactly_on_schedule() {
    let clock = Arc::new(ManualClock::new(START));
    let (scheduler, transport) = scheduler(quiet(), clock.clone());
    scheduler.rules().set_interval(CH, GUILD, 60).unwrap();

    assert!(matches!(
        scheduler.evaluate_timer(CH).await,
        TimerTick::Dropped { next_in_secs: 60, .. }
    ));

    for _ in 1..60 {
        clock.advance(1);
        for author in 0..50 {
            assert_eq!(
                scheduler.handle_message(&chatter(author)).await,
                MessageOutcome::Nothing
            );
        }
        assert!(matches!(
            scheduler.evaluate_timer(CH).await,
            TimerTick::NotDue { .. }
        ));
    }
    assert_eq!(transport.drops(), 1);

    clock.advance(1);
    assert!(matches!(
        scheduler.evaluate_timer(CH).await,
        TimerTick::Dropped { .. }
    ));
    assert_eq!(
        scheduler.evaluate_timer(CH).await,
        TimerTick::NotDue { remaining_secs: 60 }
    );
    assert_eq!(transport.drops(), 2);
}

#[tokio::test]
async fn hybrid_message_drop_pushes_back_timer() {
    let clock = Arc::new(ManualClock::new(START));
    let (scheduler, _) = scheduler(quiet(), clock.clone());
    scheduler
        .rules()
        .set(
            CH,
            GUILD,
            SpawnMode::Hybrid {
                probability: Probability::new(0.1).unwrap(),
                interval: Interval::new(3600).unwrap(),
            },
        )
        .unwrap();
    assert!(matches!(
        scheduler.evaluate_timer(CH).await,
        TimerTick::Dropped { .. }
    ));

    clock.advance(10);
    let mut dropped = false;
    for author in 0..1_000 {
        if let MessageOutcome::Dropped { cause, .. } =
            scheduler.handle_message(&chatter(author)).await
        {
            assert_eq!(cause, catch_runtime::DropCause::Message);
            dropped = true;
            break;
        }
    }
    assert!(dropped);
    assert_eq!(scheduler.rules().last_spawn(CH), Some(START + 10));

    clock.advance(3599);
    assert_eq!(
        scheduler.evaluate_timer(CH).await,
        TimerTick::NotDue { remaining_secs: 1 }
    );
    clock.advance(1);
    assert!(matches!(
        scheduler.evaluate_timer(CH).await,
        TimerTick::Dropped { .. }
    ));
}

#[tokio::test]
async fn unreachable_channel_keeps_drop_catchable() {
    let (scheduler, transport) = scheduler(quiet(), Arc::new(ManualClock::new(START)));
    let mut drops = scheduler.events().subscribe(Topic::Drops);
    transport.unreachable.store(true, Ordering::SeqCst);

    let SummonOutcome::Dropped { key } = scheduler.summon(CH, UserId(3), "bob").await else {
        panic!("summon should drop");
    };
    let dropped = drops.recv().await.unwrap();
    assert!(matches!(dropped, SpawnEvent::Dropped { .. }));
    assert_eq!(dropped.channel(), CH);
    assert!(matches!(
        drops.recv().await.unwrap(),
        SpawnEvent::AnnounceFailed { channel: CH, .. }
    ));

    let name = scheduler
        .game()
        .catalog()
        .get(key.as_str())
        .unwrap()
        .display_name()
        .to_owned();
    let outcome = scheduler
        .handle_message(&InboundMessage::new(CH, GUILD, UserId(4), name))
        .await;
    assert!(matches!(outcome, MessageOutcome::Caught { .. }));
}

#[tokio::test(start_paused = true)]
async fn runtime_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let transport = Arc::new(RecordingTransport::default());
    let admin = UserId(42);

    let runtime = Runtime::builder()
        .config(RuntimeConfig::default().with_data_dir(dir.path()).with_rng_seed(5))
        .game_config(quiet())
        .catalog(catalog())
        .transport(transport.clone())
        .permissions(Arc::new(StaticPermissions::new([admin])))
        .clock(Arc::new(SystemClock::starting_at(START)))
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();
    let mut catches = handle.subscribe(Topic::Catches);
    let mut drops = handle.event_bus().subscribe(Topic::Drops);

    assert!(handle.is_elevated(admin));
    assert!(!handle.is_elevated(UserId(1)));

    assert!(matches!(
        handle.summon(CH, UserId(1), "alice").await.unwrap(),
        SummonOutcome::Dropped { .. }
    ));
    assert!(
        transport
            .last()
            .unwrap()
            .starts_with("alice used their summon!\n")
    );
    assert!(matches!(
        handle.summon(CH, UserId(1), "alice").await.unwrap(),
        SummonOutcome::Cooldown { remaining_secs } if remaining_secs > 3500
    ));
    assert!(matches!(
        handle.summon(CH, admin, "root").await.unwrap(),
        SummonOutcome::Dropped { .. }
    ));
    let SummonOutcome::Dropped { key } = handle.summon(CH, admin, "root").await.unwrap() else {
        panic!("elevated users skip the cooldown");
    };

    let mut last_drop = None;
    while let Ok(event) = drops.try_recv() {
        last_drop = Some(event);
    }
    assert_eq!(
        last_drop,
        Some(SpawnEvent::Dropped {
            channel: CH,
            key: key.clone(),
            cause: catch_runtime::DropCause::Summon,
        })
    );

    let name = handle.catalog().get(key.as_str()).unwrap().display_name().to_owned();
    let outcome = handle
        .process(InboundMessage::new(CH, GUILD, UserId(1), name.clone()))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        MessageOutcome::Caught {
            key: key.clone(),
            matched_name: name
        }
    );
    assert!(matches!(
        catches.recv().await.unwrap(),
        SpawnEvent::Caught { user: UserId(1), .. }
    ));
    assert_eq!(handle.inventory(UserId(1)).await.unwrap()[&key], 1);
    let completion = handle.completion(UserId(1)).await.unwrap();
    assert_eq!((completion.owned, completion.total), (1, 4));
    assert_eq!(handle.remaining(UserId(1)).await.unwrap().len(), 3);

    // Hybrid rule, then clear the probability: the interval survives as is.
    handle.set_probability(CH, GUILD, 0.1).unwrap();
    handle.set_interval(CH, GUILD, 3600).unwrap();
    let change = handle.set_probability(CH, GUILD, 0.0).unwrap();
    assert!(matches!(change, RuleChange::Degraded { .. }));
    assert_eq!(
        handle.rule(CH).unwrap().mode,
        SpawnMode::Interval(Interval::new(3600).unwrap())
    );

    tokio::time::sleep(Duration::from_secs(1)).await;
    let status = handle.timer_status(GUILD);
    assert_eq!(status.len(), 1);
    assert!(status[0].remaining_secs <= 3600);

    runtime.shutdown().await.unwrap();

    // Rules survive a restart from the same directory.
    let runtime = Runtime::builder()
        .config(RuntimeConfig::default().with_data_dir(dir.path()))
        .game_config(quiet())
        .catalog(catalog())
        .transport(transport.clone())
        .build()
        .await
        .unwrap();
    assert_eq!(
        runtime.handle().rule(CH).unwrap().mode,
        SpawnMode::Interval(Interval::new(3600).unwrap())
    );
    assert!(runtime.handle().remove_rule(CH).is_ok());
    assert!(runtime.handle().remove_rule(CH).is_err());
    runtime.shutdown().await.unwrap();
}
