//! File-based repository implementations.

mod rules;

pub use rules::FileRuleRepository;
