//! Wallet credit expiry sweep

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::SWEEP_BATCH;
use crate::services;
use crate::state::AppState;

pub struct CreditExpiryScheduler {
    state: AppState,
    interval: Duration,
    shutdown: CancellationToken,
}

impl CreditExpiryScheduler {
    pub fn new(state: AppState, interval: Duration, shutdown: CancellationToken) -> Self {
        Self {
            state,
            interval,
            shutdown,
        }
    }

    pub async fn run(self) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Credit expiry scheduler started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.expire_due().await;
                }
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Credit expiry scheduler received shutdown signal");
                    break;
                }
            }
        }

        tracing::info!("Credit expiry scheduler stopped");
    }

    /// Drain expired credits batch by batch
    async fn expire_due(&self) {
        let now = shared::util::now_millis();
        let mut total = 0;
        loop {
            if self.shutdown.is_cancelled() {
                break;
            }
            match services::wallet::expire_credits(&self.state, now, SWEEP_BATCH).await {
                Ok(0) => break,
                Ok(n) => {
                    total += n;
                    if (n as i64) < SWEEP_BATCH {
                        break;
                    }
                }
                Err(e) => {
                    let err: shared::error::AppError = e.into();
                    tracing::error!(code = %err.code, "Credit expiry sweep failed: {}", err.message);
                    break;
                }
            }
        }
        if total > 0 {
            tracing::info!(expired = total, "Expired wallet credits");
        }
    }
}
