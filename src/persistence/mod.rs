//! Persistence adapter
//!
//! Saves timers, preferences and the custom buzzer into a key-value store
//! under namespaced keys (`<namespace>.timers`, `.opts`, `.buzzer`).
//!
//! Loading is forgiving: a bad timer record is dropped on its own, and a
//! bad `opts` or `buzzer` record falls back to nothing. Corruption is
//! logged, never fatal.

pub mod kv;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    error::PersistenceError,
    sound::BuzzerSound,
    state::{Deadline, Options, TimerSpec, TimerStore},
};

pub use kv::{FileStore, KeyValueStore, MemoryStore};

pub const DEFAULT_NAMESPACE: &str = "simple-timers";

/// One persisted timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTimer {
    /// Epoch milliseconds.
    pub end_time: i64,
    #[serde(default)]
    pub name: String,
    #[serde(alias = "minBefore")]
    pub min_before_warning: u64,
}

impl StoredTimer {
    fn into_spec(self) -> Option<TimerSpec> {
        let end = DateTime::<Utc>::from_timestamp_millis(self.end_time)?;
        Some(TimerSpec::new(
            Deadline::At(end),
            self.name,
            self.min_before_warning,
        ))
    }
}

pub struct Persistence {
    kv: Arc<dyn KeyValueStore>,
    namespace: String,
}

impl Persistence {
    pub fn new(kv: Arc<dyn KeyValueStore>, namespace: impl Into<String>) -> Self {
        Self {
            kv,
            namespace: namespace.into(),
        }
    }

    fn key(&self, name: &str) -> String {
        format!("{}.{}", self.namespace, name)
    }

    fn read_json(&self, name: &str) -> Result<Option<Value>, PersistenceError> {
        let key = self.key(name);
        match self.kv.get(&key)? {
            Some(text) => serde_json::from_str(&text)
                .map(Some)
                .map_err(|e| PersistenceError::Corrupt {
                    key,
                    message: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<(), PersistenceError> {
        let text = serde_json::to_string(value)?;
        let key = self.key(name);
        debug!("Saving {}: {} bytes", key, text.len());
        self.kv.set(&key, text)
    }

    /// Persist every timer that has not yet ended as of `now`.
    ///
    /// Returns how many were written.
    pub fn save_timers(&self, store: &TimerStore, now: DateTime<Utc>) -> Result<usize, PersistenceError> {
        let records: Vec<StoredTimer> = store
            .list()
            .iter()
            .filter(|t| !t.is_ended() && t.end_time() > now)
            .map(|t| StoredTimer {
                end_time: t.end_time().timestamp_millis(),
                name: t.name().to_string(),
                min_before_warning: t.min_before_warning(),
            })
            .collect();
        self.write_json("timers", &records)?;
        Ok(records.len())
    }

    /// Read persisted timers still in the future at `now`, in saved order.
    pub fn load_timers(&self, now: DateTime<Utc>) -> Result<Vec<TimerSpec>, PersistenceError> {
        let Some(value) = self.read_json("timers")? else {
            return Ok(Vec::new());
        };

        let entries = match value {
            Value::Array(entries) => entries,
            // Older layout wrapped the list: {"timers": [...]}
            Value::Object(mut wrapper) => match wrapper.remove("timers") {
                Some(Value::Array(entries)) => entries,
                _ => return Err(self.corrupt("timers", "expected a list of timers")),
            },
            _ => return Err(self.corrupt("timers", "expected a list of timers")),
        };

        let mut specs = Vec::with_capacity(entries.len());
        for (idx, entry) in entries.into_iter().enumerate() {
            let record = match serde_json::from_value::<StoredTimer>(entry) {
                Ok(record) => record,
                Err(e) => {
                    warn!("Dropping persisted timer #{}: {}", idx, e);
                    continue;
                }
            };
            let Some(spec) = record.into_spec() else {
                warn!("Dropping persisted timer #{}: end time out of range", idx);
                continue;
            };
            match spec.deadline {
                Deadline::At(end) if end > now => specs.push(spec),
                _ => debug!("Discarding persisted timer #{} that already ended", idx),
            }
        }
        Ok(specs)
    }

    pub fn save_options(&self, options: &Options) -> Result<(), PersistenceError> {
        self.write_json("opts", options)
    }

    /// Saved preferences, or `None` if nothing usable is stored.
    pub fn load_options(&self) -> Result<Option<Options>, PersistenceError> {
        match self.read_json("opts")? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| self.corrupt("opts", &e.to_string())),
            None => Ok(None),
        }
    }

    pub fn save_buzzer(&self, buzzer: &BuzzerSound) -> Result<(), PersistenceError> {
        self.write_json("buzzer", buzzer)
    }

    /// Forget the custom buzzer.
    pub fn clear_buzzer(&self) -> Result<(), PersistenceError> {
        let key = self.key("buzzer");
        debug!("Removing {}", key);
        self.kv.remove(&key)
    }

    pub fn load_buzzer(&self) -> Result<Option<BuzzerSound>, PersistenceError> {
        match self.read_json("buzzer")? {
            Some(value) => {
                let buzzer: BuzzerSound = serde_json::from_value(value)
                    .map_err(|e| self.corrupt("buzzer", &e.to_string()))?;
                if !buzzer.is_complete() {
                    return Err(self.corrupt("buzzer", "missing name or source"));
                }
                buzzer
                    .decode()
                    .map_err(|e| self.corrupt("buzzer", &e.to_string()))?;
                Ok(Some(buzzer))
            }
            None => Ok(None),
        }
    }

    fn corrupt(&self, name: &str, message: &str) -> PersistenceError {
        PersistenceError::Corrupt {
            key: self.key(name),
            message: message.to_string(),
        }
    }
}
