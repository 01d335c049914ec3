//! Tick engine
//!
//! One tick evaluates every live timer against the current instant:
//!
//! ```text
//! pending -> (warning)* -> ended
//! ```
//!
//! Expired timers are flipped to ended exactly once and then ignored by
//! later ticks. Timers inside their warning band get an urgency level, and
//! the most urgent of them decides the repeat interval of the tick sound.
//! The engine only remembers which interval it last asked for so it can
//! tell the sound channel about changes, never about repeats.
//!
//! Nothing here sleeps or spawns; `tasks::tick_task` drives it once a
//! second and tests call `tick` directly.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::{
    error::TickError,
    events::{RenderEvent, Remaining},
    state::{Timer, TimerId, TimerStore},
    urgency::{in_warning_band, tick_interval_millis, visual_intensity},
    utils::format_hms,
};

/// What the repeating tick sound should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopChange {
    Unchanged,
    /// (Re)start at this interval, replacing whatever was running.
    Start(u64),
    Stop,
}

/// Outcome of a single tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub renders: Vec<RenderEvent>,
    /// Timers that ended on this tick.
    pub expired: Vec<TimerId>,
    /// Timers that could not be evaluated and got no update this tick.
    pub skipped: Vec<TickError>,
    pub sound: LoopChange,
}

/// Result of evaluating one timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Evaluation {
    Expired,
    Pending { seconds_remaining: u64, warning: bool },
}

/// Drives timers from pending through warning to ended.
#[derive(Debug, Default)]
pub struct TickEngine {
    loop_interval: Option<u64>,
}

impl TickEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interval of the tick sound the engine last requested.
    pub fn loop_interval(&self) -> Option<u64> {
        self.loop_interval
    }

    /// Evaluate every timer in `store` at `now`.
    pub fn tick(&mut self, store: &mut TimerStore, now: DateTime<Utc>) -> TickReport {
        let mut renders = Vec::new();
        let mut expired = Vec::new();
        let mut skipped = Vec::new();
        let mut min_warning: Option<u64> = None;

        for timer in store.iter_mut().filter(|t| !t.is_ended()) {
            match evaluate(timer, now) {
                Ok(Evaluation::Expired) => {
                    if timer.mark_ended() {
                        info!("Timer {} finished", timer.id);
                        expired.push(timer.id);
                        renders.push(RenderEvent {
                            timer_id: timer.id,
                            remaining: Remaining::Expired,
                            urgency: None,
                        });
                    }
                }
                Ok(Evaluation::Pending {
                    seconds_remaining,
                    warning,
                }) => {
                    let urgency = warning.then(|| visual_intensity(seconds_remaining));
                    if warning {
                        min_warning = Some(match min_warning {
                            Some(current) => current.min(seconds_remaining),
                            None => seconds_remaining,
                        });
                    }
                    renders.push(RenderEvent {
                        timer_id: timer.id,
                        remaining: Remaining::Left(format_hms(seconds_remaining)),
                        urgency,
                    });
                }
                Err(e) => {
                    warn!("Skipping timer {} this tick: {}", timer.id, e);
                    skipped.push(e);
                }
            }
        }

        let sound = self.update_loop(min_warning);
        TickReport {
            renders,
            expired,
            skipped,
            sound,
        }
    }

    fn update_loop(&mut self, min_warning: Option<u64>) -> LoopChange {
        match min_warning {
            Some(seconds) => {
                let interval = tick_interval_millis(seconds);
                if self.loop_interval == Some(interval) {
                    LoopChange::Unchanged
                } else {
                    debug!("Tick sound interval now {}ms", interval);
                    self.loop_interval = Some(interval);
                    LoopChange::Start(interval)
                }
            }
            None => match self.loop_interval.take() {
                Some(_) => {
                    debug!("No timer in warning, stopping tick sound");
                    LoopChange::Stop
                }
                None => LoopChange::Unchanged,
            },
        }
    }
}

/// Whole seconds left until `end`, rounded toward negative infinity.
pub fn seconds_remaining(end: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    end.signed_duration_since(now)
        .num_milliseconds()
        .div_euclid(1000)
}

fn evaluate(timer: &Timer, now: DateTime<Utc>) -> Result<Evaluation, TickError> {
    let left = seconds_remaining(timer.end_time(), now);
    if left <= 0 {
        return Ok(Evaluation::Expired);
    }

    let seconds_remaining = left as u64;
    let warning = in_warning_band(seconds_remaining, timer.min_before_warning()).ok_or(
        TickError::WarningWindowOverflow {
            id: timer.id,
            min_before: timer.min_before_warning(),
        },
    )?;

    Ok(Evaluation::Pending {
        seconds_remaining,
        warning,
    })
}
