//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, repositories, rule mutations and
//! collaborators so clients can bubble them up with consistent context.
use thiserror::Error;

pub use crate::repository::RepositoryError;
use crate::rules::RuleError;

use super::collaborators::CollaboratorError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("message worker channel closed")]
    MessageChannelClosed,

    #[error("message worker dropped the reply")]
    ReplyChannelClosed(#[source] tokio::sync::oneshot::error::RecvError),

    #[error("runtime worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error("runtime requires an item catalog before building")]
    MissingCatalog,

    #[error("runtime requires a transport before building")]
    MissingTransport,
}
