//! Periodic catalog refresh
//!
//! A single long-lived task owns the [`AggregationEngine`] cycles, so two
//! cycles never overlap. It builds the catalog once at startup, then refreshes
//! it every interval or when asked through a [`SchedulerHandle`].

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::aggregator::AggregationEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerEvent {
    ManualRefreshTriggered,
    Shutdown,
}

/// Cheap, cloneable handle for poking a running scheduler
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    event_tx: mpsc::UnboundedSender<SchedulerEvent>,
}

impl SchedulerHandle {
    /// Ask for an immediate refresh. Returns `false` if the scheduler is gone.
    pub fn trigger_refresh(&self) -> bool {
        self.event_tx
            .send(SchedulerEvent::ManualRefreshTriggered)
            .is_ok()
    }

    pub fn shutdown(&self) -> bool {
        self.event_tx.send(SchedulerEvent::Shutdown).is_ok()
    }
}

pub struct RefreshScheduler {
    engine: Arc<AggregationEngine>,
    refresh_interval: Duration,
    event_rx: mpsc::UnboundedReceiver<SchedulerEvent>,
}

impl RefreshScheduler {
    pub fn new(engine: Arc<AggregationEngine>, refresh_interval: Duration) -> (Self, SchedulerHandle) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        (
            Self {
                engine,
                refresh_interval,
                event_rx,
            },
            SchedulerHandle { event_tx },
        )
    }

    /// Run until cancelled or told to shut down
    pub async fn run(mut self, cancellation_token: CancellationToken) {
        info!(
            "Starting refresh scheduler (interval {})",
            humantime::format_duration(self.refresh_interval)
        );

        tokio::select! {
            catalog = self.engine.aggregate() => {
                info!("Initial aggregation finished with {} catalog entries", catalog.len());
            }
            _ = cancellation_token.cancelled() => {
                info!("Refresh scheduler cancelled during initial aggregation");
                return;
            }
        }

        let mut ticker = interval_at(
            Instant::now() + self.refresh_interval,
            self.refresh_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    debug!("Scheduled refresh due");
                    self.refresh().await;
                }
                Some(event) = self.event_rx.recv() => {
                    match event {
                        SchedulerEvent::ManualRefreshTriggered => {
                            info!("Manual refresh triggered");
                            self.refresh().await;
                            ticker.reset();
                        }
                        SchedulerEvent::Shutdown => {
                            info!("Refresh scheduler received shutdown event");
                            break;
                        }
                    }
                }
                _ = cancellation_token.cancelled() => {
                    info!("Refresh scheduler received cancellation signal, shutting down");
                    break;
                }
            }
        }

        info!("Refresh scheduler stopped");
    }

    async fn refresh(&self) {
        let catalog = self.engine.refresh().await;
        if catalog.is_empty() {
            warn!("Refresh finished with an empty catalog");
        } else {
            info!("Refresh finished with {} catalog entries", catalog.len());
        }
    }
}
