//! Topic-based event bus implementation.

use std::collections::HashMap;

use tokio::sync::broadcast;

use super::types::SpawnEvent;

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, strum::EnumIter)]
pub enum Topic {
    /// Drops and their announcements
    Drops,
    /// Catch successes and misses
    Catches,
}

impl SpawnEvent {
    pub fn topic(&self) -> Topic {
        match self {
            SpawnEvent::Dropped { .. } | SpawnEvent::AnnounceFailed { .. } => Topic::Drops,
            SpawnEvent::Caught { .. } | SpawnEvent::CatchMissed { .. } => Topic::Catches,
        }
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Cloning shares the underlying channels.
#[derive(Clone)]
pub struct EventBus {
    drops: broadcast::Sender<SpawnEvent>,
    catches: broadcast::Sender<SpawnEvent>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            drops: broadcast::channel(capacity).0,
            catches: broadcast::channel(capacity).0,
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<SpawnEvent> {
        match topic {
            Topic::Drops => &self.drops,
            Topic::Catches => &self.catches,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: SpawnEvent) {
        let topic = event.topic();
        if self.sender(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<SpawnEvent> {
        self.sender(topic).subscribe()
    }

    /// Subscribe to multiple topics
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<SpawnEvent>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::DropCause;
    use catch_core::{ChannelId, UserId};
    use strum::IntoEnumIterator;

    #[tokio::test]
    async fn events_reach_only_their_topic() {
        let bus = EventBus::with_capacity(8);
        let mut subs = bus.subscribe_multiple(&Topic::iter().collect::<Vec<_>>());

        bus.publish(SpawnEvent::Dropped {
            channel: ChannelId(1),
            key: "pi".into(),
            cause: DropCause::Timer,
        });
        bus.publish(SpawnEvent::CatchMissed {
            channel: ChannelId(1),
            user: UserId(2),
        });

        let drops = subs.get_mut(&Topic::Drops).unwrap();
        assert!(matches!(
            drops.recv().await.unwrap(),
            SpawnEvent::Dropped { .. }
        ));
        assert!(drops.try_recv().is_err());

        let catches = subs.get_mut(&Topic::Catches).unwrap();
        assert!(matches!(
            catches.recv().await.unwrap(),
            SpawnEvent::CatchMissed { .. }
        ));
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let bus = EventBus::new();
        bus.publish(SpawnEvent::AnnounceFailed {
            channel: ChannelId(3),
            reason: "offline".into(),
        });
    }
}
