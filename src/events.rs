//! Events flowing from the core to the presentation adapter

use crate::state::{Timer, TimerId};

/// What a timer's countdown readout should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Remaining {
    /// `HH:MM:SS`, hours unbounded.
    Left(String),
    Expired,
}

/// Per-tick render update for one timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderEvent {
    pub timer_id: TimerId,
    pub remaining: Remaining,
    /// Escalation level while inside the warning band, `None` outside it.
    pub urgency: Option<u8>,
}

/// Everything the presentation adapter is told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Render(RenderEvent),
    TimerAdded(Timer),
    TimerRemoved { id: TimerId },
    TimerRenamed { id: TimerId, name: String },
}
