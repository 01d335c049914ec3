//! Timer entity

use std::fmt;

use chrono::{DateTime, Duration, Utc};

/// Stable identity of a timer within a store.
///
/// Ids are handed out in creation order, which doubles as the tie-break
/// when two timers end at the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// When a new timer should fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    /// Relative to the creation instant (a "timer").
    In(Duration),
    /// An absolute instant (an "alarm", or a rehydrated timer).
    At(DateTime<Utc>),
}

impl Deadline {
    pub fn resolve(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match *self {
            Deadline::In(duration) => now.checked_add_signed(duration),
            Deadline::At(at) => Some(at),
        }
    }
}

/// Everything needed to create a timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerSpec {
    pub deadline: Deadline,
    pub name: String,
    pub min_before_warning: u64,
}

impl TimerSpec {
    pub fn new(deadline: Deadline, name: impl Into<String>, min_before_warning: u64) -> Self {
        Self {
            deadline,
            name: name.into(),
            min_before_warning,
        }
    }
}

/// A countdown timer or alarm.
///
/// Pure data: presentation handles live with the presentation adapter,
/// keyed by `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timer {
    pub id: TimerId,
    end_time: DateTime<Utc>,
    name: String,
    min_before_warning: u64,
    ended: bool,
}

impl Timer {
    pub(crate) fn new(id: TimerId, end_time: DateTime<Utc>, name: &str, min_before_warning: u64) -> Self {
        Self {
            id,
            end_time,
            name: sanitize_name(name),
            min_before_warning,
            ended: false,
        }
    }

    /// The instant the timer fires. Fixed at creation.
    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    /// Display label, empty when unnamed.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace the label, sanitized. Returns the stored label.
    pub(crate) fn set_name(&mut self, name: &str) -> &str {
        self.name = sanitize_name(name);
        &self.name
    }

    /// Minutes before the end at which warnings start. Fixed at creation.
    pub fn min_before_warning(&self) -> u64 {
        self.min_before_warning
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Flip to ended. Returns false if the timer had already ended.
    pub(crate) fn mark_ended(&mut self) -> bool {
        !std::mem::replace(&mut self.ended, true)
    }

    pub fn has_name(&self) -> bool {
        !self.name.is_empty()
    }
}

/// Strip line breaks and surrounding whitespace from a display label.
pub fn sanitize_name(name: &str) -> String {
    name.replace(['\r', '\n'], "").trim().to_string()
}
