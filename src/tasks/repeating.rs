//! A cancellable repeating background task

use std::{sync::Mutex, time::Duration};

use tokio::{
    runtime::Handle,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, warn};

/// Runs a callback every `period` until stopped.
///
/// Starting again cancels the previous run first, so at most one run is
/// ever alive.
#[derive(Debug, Default)]
pub struct RepeatingTask {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RepeatingTask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `action` every `period`, first call one period from now.
    pub fn start<F>(&self, period: Duration, action: F)
    where
        F: Fn() + Send + 'static,
    {
        let Ok(mut slot) = self.handle.lock() else {
            warn!("Repeating task lock poisoned, not starting");
            return;
        };
        if let Some(previous) = slot.take() {
            previous.abort();
        }

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("No async runtime for repeating task: {}", e);
                return;
            }
        };

        debug!("Starting repeating task every {:?}", period);
        *slot = Some(runtime.spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                action();
            }
        }));
    }

    pub fn stop(&self) {
        if let Ok(mut slot) = self.handle.lock() {
            if let Some(handle) = slot.take() {
                debug!("Stopping repeating task");
                handle.abort();
            }
        }
    }

}

impl Drop for RepeatingTask {
    fn drop(&mut self) {
        self.stop();
    }
}
