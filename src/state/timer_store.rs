//! In-memory collection of active timers

use chrono::{DateTime, Utc};
use tracing::debug;

use super::timer::{Timer, TimerId, TimerSpec};
use crate::error::StoreError;

/// Ordered collection of timers.
///
/// Timers are kept sorted by end time, ties broken by creation order, so
/// `list()` never has to sort.
#[derive(Debug, Default)]
pub struct TimerStore {
    timers: Vec<Timer>,
    next_id: u64,
}

impl TimerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and insert a timer.
    ///
    /// The resolved end time must be strictly after `now`.
    pub fn add(&mut self, spec: TimerSpec, now: DateTime<Utc>) -> Result<Timer, StoreError> {
        let end_time = spec
            .deadline
            .resolve(now)
            .ok_or(StoreError::DurationOutOfRange)?;
        if end_time <= now {
            return Err(StoreError::NotInFuture { end: end_time, now });
        }

        self.next_id += 1;
        let timer = Timer::new(
            TimerId(self.next_id),
            end_time,
            &spec.name,
            spec.min_before_warning,
        );

        let key = (timer.end_time(), timer.id);
        let idx = self
            .timers
            .partition_point(|t| (t.end_time(), t.id) <= key);
        self.timers.insert(idx, timer.clone());

        debug!("Added timer {} ending at {}", timer.id, end_time);
        Ok(timer)
    }

    /// Remove a timer. Returns whether anything was removed.
    pub fn remove(&mut self, id: TimerId) -> bool {
        match self.timers.iter().position(|t| t.id == id) {
            Some(idx) => {
                self.timers.remove(idx);
                debug!("Removed timer {}", id);
                true
            }
            None => false,
        }
    }

    /// Set the display name of a timer. Returns the stored name, or `None`
    /// if no such timer exists.
    pub fn rename(&mut self, id: TimerId, new_name: &str) -> Option<String> {
        let timer = self.timers.iter_mut().find(|t| t.id == id)?;
        Some(timer.set_name(new_name).to_string())
    }

    /// Drop every timer, returning how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.timers.len();
        self.timers.clear();
        removed
    }

    /// Timers in display order.
    pub fn list(&self) -> &[Timer] {
        &self.timers
    }

    pub fn get(&self, id: TimerId) -> Option<&Timer> {
        self.timers.iter().find(|t| t.id == id)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Timer> {
        self.timers.iter_mut()
    }

    /// Drop timers whose end time is at or before `instant`.
    pub fn purge_expired_before(&mut self, instant: DateTime<Utc>) -> usize {
        let before = self.timers.len();
        self.timers.retain(|t| t.end_time() > instant);
        before - self.timers.len()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}
