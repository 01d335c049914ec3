//! Error types
//!
//! Each concern gets its own enum so callers can match on what they can
//! recover from; `AppError` ties them together for the application layer.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::state::TimerId;

/// Per-field validity flags for a creation form.
///
/// `true` means the field was rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldValidity {
    pub hours: bool,
    pub minutes: bool,
    pub seconds: bool,
    pub time: bool,
    pub min_before: bool,
}

impl FieldValidity {
    /// Names of the rejected fields, in form order.
    pub fn invalid_fields(&self) -> Vec<&'static str> {
        [
            (self.hours, "hours"),
            (self.minutes, "minutes"),
            (self.seconds, "seconds"),
            (self.time, "time"),
            (self.min_before, "minutes before warning"),
        ]
        .into_iter()
        .filter_map(|(invalid, name)| invalid.then_some(name))
        .collect()
    }
}

/// Bad user input caught at the input boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid value for: {}", .0.invalid_fields().join(", "))]
    Fields(FieldValidity),

    #[error("duration is empty")]
    EmptyDuration,

    #[error("alarm time must be in the future")]
    InvalidTime,
}

/// Timer store rejections.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("end time {end} is not after {now}")]
    NotInFuture {
        end: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    #[error("duration is out of range")]
    DurationOutOfRange,
}

/// Problems reading or writing persisted state.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupt record under '{key}': {message}")]
    Corrupt { key: String, message: String },
}

/// An external media capability is missing or unusable.
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("media unavailable: {0}")]
    Unavailable(String),

    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),
}

/// Failure evaluating a single timer during a tick.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TickError {
    #[error("warning window of timer {id} overflows ({min_before} minutes)")]
    WarningWindowOverflow { id: TimerId, min_before: u64 },
}

/// Application level error.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("failed to lock {0}")]
    Lock(&'static str),
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
