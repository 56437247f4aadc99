//! Background task that evicts players who never logged in.

use std::time::SystemTime;

use gatekeep_tick::{TickConfig, TickScheduler};
use gatekeep_transport::PlayerLink;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::Gatekeeper;

/// Handle to a running sweeper. Dropping it stops the sweeper too.
pub struct SweeperHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stops the sweeper and waits for it to finish its current sweep.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            tracing::error!(error = %e, "sweeper task panicked");
        }
    }

    /// Whether the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

pub(crate) fn spawn<L: PlayerLink>(gate: Gatekeeper<L>, config: TickConfig) -> SweeperHandle {
    let (tx, mut rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let mut scheduler = TickScheduler::new(config);
        tracing::info!(period_ms = scheduler.period().map(|p| p.as_millis() as u64), "sweeper started");

        loop {
            tokio::select! {
                // Fires on shutdown() and when the handle is dropped.
                _ = &mut rx => break,
                info = scheduler.wait_for_tick() => {
                    let evicted = gate.sweep(SystemTime::now()).await;
                    if !evicted.is_empty() || info.missed > 0 {
                        tracing::debug!(
                            tick = info.tick,
                            missed = info.missed,
                            count = evicted.len(),
                            "sweep terminated pending sessions"
                        );
                    }
                }
            }
        }

        tracing::info!(
            ticks = scheduler.tick_count(),
            missed = scheduler.total_missed(),
            "sweeper stopped"
        );
    });

    SweeperHandle {
        shutdown: Some(tx),
        task,
    }
}
