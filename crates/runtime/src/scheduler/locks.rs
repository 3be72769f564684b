use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use catch_core::ChannelId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async lock per channel.
///
/// Serializes the read-decide-write of a drop (rule lookup, last-spawn
/// check, drop, last-spawn update) between message handlers and the
/// channel's timer. Locks are created on first use and kept.
#[derive(Clone, Default)]
pub struct ChannelLocks {
    locks: Arc<Mutex<HashMap<ChannelId, Arc<AsyncMutex<()>>>>>,
}

impl ChannelLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, channel: ChannelId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(channel).or_default())
        };
        lock.lock_owned().await
    }
}
