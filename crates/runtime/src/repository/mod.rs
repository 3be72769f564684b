//! Repository layer for spawn rules.
//!
//! Rules and last-spawn timestamps are the only state that survives a
//! restart. Active drops and summon cooldowns live in memory only.

mod error;
mod file;
mod format;
mod memory;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::FileRuleRepository;
pub use format::{DecodedRules, decode_last_spawn, decode_rules, encode_last_spawn, encode_rules};
pub use memory::InMemoryRuleRepository;
pub use traits::{LastSpawnMap, RuleMap, RuleRepository, StoredRules};
