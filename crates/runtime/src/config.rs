//! Runtime configuration structures and loaders.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;

/// Seconds between timer-supervisor reconciles.
pub const DEFAULT_TIMER_RETRY_SECS: u64 = 30;

/// Configuration shared across the orchestrator and workers.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Directory holding `spawn_rules.json` and `last_spawn.json`.
    pub data_dir: PathBuf,
    pub message_buffer: usize,
    pub event_buffer: usize,
    /// Fixed seed for drop rolls and picks; entropy when `None`.
    pub rng_seed: Option<u64>,
    /// Upper bound on how long an exited timer task stays down.
    pub timer_retry: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            message_buffer: 256,
            event_buffer: 100,
            rng_seed: None,
            timer_retry: Duration::from_secs(DEFAULT_TIMER_RETRY_SECS),
        }
    }
}

impl RuntimeConfig {
    /// Construct configuration from process environment variables.
    ///
    /// - `CATCH_DATA_DIR`
    /// - `CATCH_MESSAGE_BUFFER` / `CATCH_EVENT_BUFFER`
    /// - `CATCH_RNG_SEED`
    /// - `CATCH_TIMER_RETRY_SECS`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(dir) = read_env::<PathBuf>("CATCH_DATA_DIR") {
            config.data_dir = dir;
        }

        if let Some(capacity) = read_env::<usize>("CATCH_MESSAGE_BUFFER") {
            config.message_buffer = capacity.max(1);
        }

        if let Some(capacity) = read_env::<usize>("CATCH_EVENT_BUFFER") {
            config.event_buffer = capacity.max(1);
        }

        config.rng_seed = read_env::<u64>("CATCH_RNG_SEED");

        if let Some(secs) = read_env::<u64>("CATCH_TIMER_RETRY_SECS") {
            config.timer_retry = Duration::from_secs(secs.max(1));
        }

        config
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }
}

/// Platform data directory, or `./data` when none can be determined.
pub fn default_data_dir() -> PathBuf {
    ProjectDirs::from("", "", "catchbot")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("data"))
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
