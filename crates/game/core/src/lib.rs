//! Catch/drop rules and data types shared by the runtime and the loaders.
//!
//! `catch-core` defines the item catalog, text matching, spawn policies and
//! the [`GameState`] engine. Everything here is pure: time and randomness are
//! passed in by the caller, and nothing touches the filesystem or the network.
pub mod catalog;
pub mod config;
pub mod cooldown;
pub mod game;
pub mod ids;
pub mod matching;
pub mod selection;
pub mod spawn;

pub use catalog::{
    Catalog, CatalogError, CategoryGroup, Completion, Item, ItemCategory, LocalizedName,
};
pub use config::GameConfig;
pub use cooldown::CooldownBook;
pub use game::{CatchOutcome, GameState};
pub use ids::{ChannelId, GuildId, ItemKey, UserId};
pub use matching::{MatchResult, match_item, similarity};
pub use spawn::{
    Cleared, ConfigError, Dimension, Interval, MAX_INTERVAL_SECS, Probability, SpawnMode,
    SpawnRule,
};
