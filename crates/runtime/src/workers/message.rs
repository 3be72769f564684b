//! Message worker: fans inbound messages and summons out to the scheduler.
//!
//! Each command runs in its own task so a slow transport in one channel
//! never holds up another. Per-channel ordering is enforced by the
//! scheduler's channel locks, not by this worker.

use std::sync::Arc;

use catch_core::{ChannelId, UserId};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::scheduler::{InboundMessage, MessageOutcome, SpawnScheduler, SummonOutcome};

/// Commands accepted by the message worker.
pub enum Command {
    /// Handle one chat message. `reply` is `None` for fire-and-forget
    /// submissions.
    Message {
        msg: InboundMessage,
        reply: Option<oneshot::Sender<MessageOutcome>>,
    },
    Summon {
        channel: ChannelId,
        user: UserId,
        requester: String,
        reply: oneshot::Sender<SummonOutcome>,
    },
}

pub struct MessageWorker {
    scheduler: Arc<SpawnScheduler>,
    command_rx: mpsc::Receiver<Command>,
    shutdown: watch::Receiver<bool>,
    in_flight: JoinSet<()>,
}

impl MessageWorker {
    pub fn new(
        scheduler: Arc<SpawnScheduler>,
        command_rx: mpsc::Receiver<Command>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            scheduler,
            command_rx,
            shutdown,
            in_flight: JoinSet::new(),
        }
    }

    /// Runs until shutdown or until every handle is dropped, then waits for
    /// in-flight commands to finish.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(cmd) => self.dispatch(cmd),
                    None => break,
                },
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
                Some(joined) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                    if let Err(e) = joined {
                        warn!(error = %e, "message task failed");
                    }
                }
            }
        }

        while let Some(joined) = self.in_flight.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "message task failed during shutdown");
            }
        }
        debug!("message worker stopped");
    }

    fn dispatch(&mut self, cmd: Command) {
        let scheduler = Arc::clone(&self.scheduler);
        match cmd {
            Command::Message { msg, reply } => {
                self.in_flight.spawn(async move {
                    let outcome = scheduler.handle_message(&msg).await;
                    if let Some(reply) = reply
                        && reply.send(outcome).is_err()
                    {
                        debug!("message reply channel closed (caller dropped)");
                    }
                });
            }
            Command::Summon {
                channel,
                user,
                requester,
                reply,
            } => {
                self.in_flight.spawn(async move {
                    let outcome = scheduler.summon(channel, user, &requester).await;
                    if reply.send(outcome).is_err() {
                        debug!("summon reply channel closed (caller dropped)");
                    }
                });
            }
        }
    }
}
