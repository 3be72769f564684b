//! Keeps exactly one timer task per channel with an interval.
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use catch_core::ChannelId;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{SpawnScheduler, timer};

struct TimerTask {
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Starts, stops and restarts per-channel timer tasks.
///
/// The supervisor reconciles whenever the rule set changes and on every
/// retry tick. A timer task that exited while its channel still has an
/// interval is restarted on the next reconcile.
pub struct TimerSupervisor {
    scheduler: Arc<SpawnScheduler>,
    retry: Duration,
    tasks: HashMap<ChannelId, TimerTask>,
}

impl TimerSupervisor {
    pub fn new(scheduler: Arc<SpawnScheduler>, retry: Duration) -> Self {
        Self {
            scheduler,
            retry,
            tasks: HashMap::new(),
        }
    }

    /// Channels with a live timer task.
    pub fn running(&self) -> BTreeSet<ChannelId> {
        self.tasks
            .iter()
            .filter(|(_, task)| !task.handle.is_finished())
            .map(|(channel, _)| *channel)
            .collect()
    }

    /// Brings the task set in line with the current rules. Returns how many
    /// tasks were started.
    pub fn reconcile(&mut self) -> usize {
        let desired: BTreeSet<ChannelId> = self
            .scheduler
            .rules()
            .timed_channels()
            .into_iter()
            .map(|(channel, _)| channel)
            .collect();

        self.tasks.retain(|channel, task| {
            if !desired.contains(channel) {
                let _ = task.cancel.send(true);
                return false;
            }
            if task.handle.is_finished() {
                tracing::warn!(%channel, "timer task exited; restarting");
                return false;
            }
            true
        });

        let mut started = 0;
        for channel in desired {
            if self.tasks.contains_key(&channel) {
                continue;
            }
            let (cancel, cancelled) = watch::channel(false);
            let handle = tokio::spawn(timer::run(
                Arc::clone(&self.scheduler),
                channel,
                cancelled,
            ));
            self.tasks.insert(channel, TimerTask { cancel, handle });
            started += 1;
        }

        if started > 0 {
            tracing::info!(started, total = self.tasks.len(), "timer tasks reconciled");
        }
        started
    }

    /// Runs until `shutdown` turns true or its sender is dropped, then stops
    /// every timer task.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut revisions = self.scheduler.rules().subscribe();
        let mut tick = tokio::time::interval(self.retry);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    self.reconcile();
                }
                changed = revisions.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.reconcile();
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        self.stop_all().await;
    }

    async fn stop_all(&mut self) {
        for (channel, task) in self.tasks.drain() {
            let _ = task.cancel.send(true);
            if let Err(e) = task.handle.await {
                tracing::warn!(%channel, error = %e, "timer task failed during shutdown");
            }
        }
        tracing::info!("timer supervisor stopped");
    }
}
