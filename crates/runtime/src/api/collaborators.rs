//! Seams to the chat platform and the player database.
//!
//! The engine never talks to a chat service or a database directly. Runtime
//! users plug in a [`Transport`], an [`Inventory`] and a [`Permissions`]
//! implementation; the in-memory ones below back tests and local runs.
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use catch_core::{ChannelId, GuildId, ItemKey, UserId};
use thiserror::Error;

/// Failures reported by a [`Transport`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("channel {0} is unknown or not accessible")]
    UnknownChannel(ChannelId),

    #[error("failed to send to channel {channel}: {reason}")]
    Send { channel: ChannelId, reason: String },

    #[error("transport is closed")]
    Closed,
}

/// Failures reported by the inventory store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("inventory store unavailable: {0}")]
    Unavailable(String),
}

/// What the transport knows about a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: ChannelId,
    /// `None` for direct messages.
    pub guild: Option<GuildId>,
    pub name: String,
}

/// Outbound side of the chat platform.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Post `text` to `channel`.
    async fn send(&self, channel: ChannelId, text: &str) -> Result<(), TransportError>;

    /// Resolve a channel before posting to it.
    async fn fetch_channel(&self, channel: ChannelId) -> Result<ChannelInfo, TransportError>;
}

/// Per-user item counts.
#[async_trait]
pub trait Inventory: Send + Sync {
    async fn add(&self, user: UserId, key: &ItemKey, qty: u32) -> Result<(), CollaboratorError>;

    /// Distinct keys the user holds at least once.
    async fn owned_keys(&self, user: UserId) -> Result<HashSet<ItemKey>, CollaboratorError>;

    /// Count per key, ordered by key.
    async fn counts(&self, user: UserId) -> Result<BTreeMap<ItemKey, u32>, CollaboratorError>;
}

/// Who may bypass summon cooldowns and administer spawn rules.
pub trait Permissions: Send + Sync {
    fn is_elevated(&self, user: UserId) -> bool;
}

/// Inventory kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryInventory {
    counts: Mutex<HashMap<UserId, BTreeMap<ItemKey, u32>>>,
}

impl InMemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Inventory for InMemoryInventory {
    async fn add(&self, user: UserId, key: &ItemKey, qty: u32) -> Result<(), CollaboratorError> {
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        let count = counts.entry(user).or_default().entry(key.clone()).or_insert(0);
        *count = count.saturating_add(qty);
        Ok(())
    }

    async fn owned_keys(&self, user: UserId) -> Result<HashSet<ItemKey>, CollaboratorError> {
        let counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(counts
            .get(&user)
            .map(|items| {
                items
                    .iter()
                    .filter(|(_, n)| **n > 0)
                    .map(|(k, _)| k.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn counts(&self, user: UserId) -> Result<BTreeMap<ItemKey, u32>, CollaboratorError> {
        let counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(counts.get(&user).cloned().unwrap_or_default())
    }
}

/// Fixed set of elevated users, typically read from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticPermissions {
    elevated: HashSet<UserId>,
}

impl StaticPermissions {
    pub fn new(elevated: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            elevated: elevated.into_iter().collect(),
        }
    }
}

impl Permissions for StaticPermissions {
    fn is_elevated(&self, user: UserId) -> bool {
        self.elevated.contains(&user)
    }
}
