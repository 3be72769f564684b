//! Process-wide game state and its random source.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use catch_core::{
    Catalog, CatchOutcome, ChannelId, GameConfig, GameState, Item, ItemKey, UserId,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

struct Inner {
    state: GameState,
    rng: StdRng,
}

/// [`GameState`] behind one coarse mutex.
///
/// Every method takes the lock for a single short operation; the lock is
/// never held across an `.await`.
#[derive(Clone)]
pub struct SharedGame {
    inner: Arc<Mutex<Inner>>,
    catalog: Arc<Catalog>,
    config: Arc<GameConfig>,
}

impl SharedGame {
    /// `seed` makes every roll and pick reproducible.
    pub fn new(catalog: Arc<Catalog>, config: GameConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let state = GameState::new(Arc::clone(&catalog), config.clone());
        Self {
            inner: Arc::new(Mutex::new(Inner { state, rng })),
            catalog,
            config: Arc::new(config),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut inner)
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn try_catch(&self, channel: ChannelId, text: &str) -> CatchOutcome {
        self.with(|g| g.state.try_catch(channel, text))
    }

    pub fn active_item(&self, channel: ChannelId) -> Option<Arc<Item>> {
        self.with(|g| g.state.active_item(channel).cloned())
    }

    /// Uniform draw in `[0, 1)`.
    pub fn roll(&self) -> f64 {
        self.with(|g| g.rng.r#gen::<f64>())
    }

    pub fn drop_random(&self, channel: ChannelId) -> Arc<Item> {
        self.with(|g| g.state.drop_random(channel, &mut g.rng))
    }

    pub fn drop_favoring_new(&self, channel: ChannelId, owned: &HashSet<ItemKey>) -> Arc<Item> {
        self.with(|g| g.state.drop_favoring_new(channel, owned, &mut g.rng))
    }

    pub fn try_begin_summon(&self, user: UserId, now: u64) -> Result<(), u64> {
        self.with(|g| g.state.try_begin_summon(user, now))
    }
}
