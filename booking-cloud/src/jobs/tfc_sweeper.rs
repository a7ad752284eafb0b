//! TFC auto-cancel and reminder sweep
//!
//! Runs once at startup, then every interval. Both passes use conditional
//! updates, so overlapping runs on several instances are harmless.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::SWEEP_BATCH;
use crate::services;
use crate::state::AppState;

pub struct TfcSweeper {
    state: AppState,
    interval: Duration,
    shutdown: CancellationToken,
}

impl TfcSweeper {
    pub fn new(state: AppState, interval: Duration, shutdown: CancellationToken) -> Self {
        Self {
            state,
            interval,
            shutdown,
        }
    }

    pub async fn run(self) {
        tracing::info!(interval_secs = self.interval.as_secs(), "TFC sweeper started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep_once().await;
                }
                _ = self.shutdown.cancelled() => {
                    tracing::info!("TFC sweeper received shutdown signal");
                    break;
                }
            }
        }

        tracing::info!("TFC sweeper stopped");
    }

    async fn sweep_once(&self) {
        let now = shared::util::now_millis();

        match services::tfc::auto_cancel_overdue(&self.state, now, SWEEP_BATCH).await {
            Ok(0) => tracing::debug!("No overdue TFC payments"),
            Ok(n) => tracing::info!(cancelled = n, "Auto-cancelled overdue TFC bookings"),
            Err(e) => {
                let err: shared::error::AppError = e.into();
                tracing::error!(code = %err.code, "TFC auto-cancel sweep failed: {}", err.message);
            }
        }

        match services::tfc::send_reminders(&self.state, now, SWEEP_BATCH).await {
            Ok(0) => tracing::debug!("No TFC reminders due"),
            Ok(n) => tracing::info!(reminders = n, "Queued TFC payment reminders"),
            Err(e) => {
                let err: shared::error::AppError = e.into();
                tracing::error!(code = %err.code, "TFC reminder sweep failed: {}", err.message);
            }
        }
    }
}
