//! Topic-based event bus for spawn and catch events.
//!
//! Observers (logging, tests, the console) subscribe to the topics they
//! care about. Publishing never blocks and never fails; events without
//! subscribers are dropped.

mod bus;
mod types;

pub use bus::{EventBus, Topic};
pub use types::{DropCause, SpawnEvent};
