//! Event payloads published by the scheduler.

use catch_core::{ChannelId, ItemKey, UserId};

/// Why an item dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum DropCause {
    /// A message won the channel's probability roll.
    Message,
    /// A message won the global roll in a channel without a rule.
    Fallback,
    /// The channel's interval elapsed.
    Timer,
    /// A player used their summon.
    Summon,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpawnEvent {
    Dropped {
        channel: ChannelId,
        key: ItemKey,
        cause: DropCause,
    },
    Caught {
        channel: ChannelId,
        user: UserId,
        key: ItemKey,
        matched_name: String,
    },
    CatchMissed {
        channel: ChannelId,
        user: UserId,
    },
    /// The drop was committed but its announcement could not be delivered.
    AnnounceFailed {
        channel: ChannelId,
        reason: String,
    },
}

impl SpawnEvent {
    pub fn channel(&self) -> ChannelId {
        match self {
            Self::Dropped { channel, .. }
            | Self::Caught { channel, .. }
            | Self::CatchMissed { channel, .. }
            | Self::AnnounceFailed { channel, .. } => *channel,
        }
    }
}
