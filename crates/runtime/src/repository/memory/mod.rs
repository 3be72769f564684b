//! In-memory repository implementations for testing and development.

mod rules;

pub use rules::InMemoryRuleRepository;
