use std::sync::Arc;
use std::time::Duration;

use catch_core::ChannelId;
use tokio::sync::watch;

use super::{SpawnScheduler, TimerTick};

/// Drives the timed drops of one channel until cancelled or until the
/// channel loses its interval.
///
/// Rule changes wake the loop early so a new interval applies right away.
/// Drops from other causes share the channel's last-spawn time, so a wake-up
/// that finds the channel not yet due just sleeps again.
pub(super) async fn run(
    scheduler: Arc<SpawnScheduler>,
    channel: ChannelId,
    mut cancel: watch::Receiver<bool>,
) {
    let mut revisions = scheduler.rules().subscribe();
    tracing::debug!(%channel, "timer started");

    loop {
        if *cancel.borrow_and_update() {
            break;
        }
        revisions.borrow_and_update();
        let wait = match scheduler.evaluate_timer(channel).await {
            TimerTick::NoTimer => break,
            TimerTick::Dropped { next_in_secs, .. } => next_in_secs,
            TimerTick::NotDue { remaining_secs } => remaining_secs,
        };

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(wait.max(1))) => {}
            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow() {
                    break;
                }
            }
            changed = revisions.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    tracing::debug!(%channel, "timer stopped");
}
