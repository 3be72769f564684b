//! Worker tasks that back the runtime orchestration.
//!
//! The message worker feeds chat traffic to the scheduler; timer tasks are
//! owned by the [`TimerSupervisor`](crate::scheduler::TimerSupervisor).

mod message;

pub use message::{Command, MessageWorker};
