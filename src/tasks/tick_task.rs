//! Once-a-second tick background task

use std::{sync::Arc, time::Duration};

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::state::AppState;

/// Gap between ticks after which we assume the machine slept.
const WAKE_UP_GAP_SECS: i64 = 5;

/// Background task that drives the tick engine once a second
///
/// Timers are computed from wall-clock time, so a late or skipped tick only
/// delays the readout; nothing drifts.
pub async fn tick_task(state: Arc<AppState>) {
    info!("Starting tick task");

    let mut interval = interval(Duration::from_secs(1));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_tick = state.now();

    loop {
        interval.tick().await;

        let now = state.now();
        let gap = now.signed_duration_since(last_tick).num_seconds();
        if gap > WAKE_UP_GAP_SECS {
            info!("Clock jumped {}s since last tick, catching up", gap);
        }
        last_tick = now;

        match state.tick_at(now) {
            Ok(report) => {
                if !report.skipped.is_empty() {
                    warn!("{} timers could not be evaluated", report.skipped.len());
                }
                if !report.expired.is_empty() {
                    debug!("Timers finished this tick: {:?}", report.expired);
                }
            }
            Err(e) => {
                error!("Tick failed: {}", e);
            }
        }
    }
}
