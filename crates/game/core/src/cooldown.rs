use std::collections::HashMap;

use crate::ids::UserId;

/// Per-user summon cooldowns, as absolute unix-second expiries.
#[derive(Clone, Debug, Default)]
pub struct CooldownBook {
    cooldown_secs: u64,
    expiries: HashMap<UserId, u64>,
}

impl CooldownBook {
    pub fn new(cooldown_secs: u64) -> Self {
        Self {
            cooldown_secs,
            expiries: HashMap::new(),
        }
    }

    pub fn is_ready(&self, user: UserId, now: u64) -> bool {
        self.remaining(user, now) == 0
    }

    /// Starts a fresh cooldown for `user` at `now`.
    pub fn record(&mut self, user: UserId, now: u64) {
        self.expiries
            .insert(user, now.saturating_add(self.cooldown_secs));
    }

    /// Seconds until `user` may summon again; zero when ready.
    pub fn remaining(&self, user: UserId, now: u64) -> u64 {
        self.expiries
            .get(&user)
            .map_or(0, |expiry| expiry.saturating_sub(now))
    }

    /// Records a summon if `user` is ready, otherwise returns the wait.
    pub fn try_begin(&mut self, user: UserId, now: u64) -> Result<(), u64> {
        match self.remaining(user, now) {
            0 => {
                self.record(user, now);
                Ok(())
            }
            wait => Err(wait),
        }
    }
}
