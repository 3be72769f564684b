//! Runtime orchestration for the spawn/catch engine.
//!
//! This crate wires the pure [`catch_core`] engine to durable spawn rules,
//! per-channel timers and the chat-platform collaborators. Consumers embed
//! [`Runtime`] to feed messages, administer rules and subscribe to events
//! through [`RuntimeHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`scheduler`] turns messages, timers and summons into drops and catches
//! - [`rules`] and [`repository`] keep spawn rules durable
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`workers`] keeps background tasks internal to the crate
pub mod api;
pub mod clock;
pub mod config;
pub mod events;
pub mod game;
pub mod repository;
pub mod rules;
pub mod runtime;
pub mod scheduler;

mod workers;

pub use api::{
    ChannelInfo, CollaboratorError, InMemoryInventory, Inventory, Permissions, Result,
    RuntimeError, RuntimeHandle, StaticPermissions, Transport, TransportError,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::RuntimeConfig;
pub use events::{DropCause, EventBus, SpawnEvent, Topic};
pub use game::SharedGame;
pub use repository::{
    FileRuleRepository, InMemoryRuleRepository, RepositoryError, RuleRepository, StoredRules,
};
pub use rules::{RuleChange, RuleError, SpawnRuleStore, TimerStatus};
pub use runtime::{Runtime, RuntimeBuilder};
pub use scheduler::{
    InboundMessage, MessageOutcome, SpawnScheduler, SummonOutcome, TimerSupervisor, TimerTick,
};
