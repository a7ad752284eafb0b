//! Background sweeps
//!
//! Each job is a long-lived task that wakes on an interval and stops when
//! the shared `CancellationToken` is cancelled.

pub mod credit_expiry;
pub mod tfc_sweeper;

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::state::AppState;

/// Rows handled per sweep iteration
pub const SWEEP_BATCH: i64 = 500;

/// Start every background job
pub fn spawn_all(
    state: &AppState,
    config: &Config,
    shutdown: &CancellationToken,
) -> Vec<JoinHandle<()>> {
    let tfc = tfc_sweeper::TfcSweeper::new(
        state.clone(),
        Duration::from_secs(config.tfc_sweep_interval_secs),
        shutdown.clone(),
    );
    let credits = credit_expiry::CreditExpiryScheduler::new(
        state.clone(),
        Duration::from_secs(config.credit_sweep_interval_secs),
        shutdown.clone(),
    );
    vec![tokio::spawn(tfc.run()), tokio::spawn(credits.run())]
}
