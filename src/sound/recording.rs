//! Sound adapter that records requests instead of playing them

use std::sync::Mutex;

use super::{BuzzerSound, SoundAdapter, SoundKind};

/// A single request made to a sound adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundCall {
    PlayOnce(SoundKind),
    StartRepeating(SoundKind, u64),
    StopRepeating,
    /// Name of the custom buzzer, `None` for the built-in one.
    SetBuzzer(Option<String>),
}

/// Keeps every call in order. Useful for tests and headless runs.
#[derive(Debug, Default)]
pub struct RecordingSound {
    calls: Mutex<Vec<SoundCall>>,
}

impl RecordingSound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SoundCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// One-shot sounds played so far.
    pub fn played(&self) -> Vec<SoundKind> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SoundCall::PlayOnce(kind) => Some(kind),
                _ => None,
            })
            .collect()
    }

    /// The loop that would currently be running, replaying calls in order.
    pub fn repeating(&self) -> Option<(SoundKind, u64)> {
        self.calls().into_iter().fold(None, |current, call| match call {
            SoundCall::StartRepeating(kind, ms) => Some((kind, ms)),
            SoundCall::StopRepeating => None,
            _ => current,
        })
    }

    fn push(&self, call: SoundCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl SoundAdapter for RecordingSound {
    fn play_once(&self, kind: SoundKind) {
        self.push(SoundCall::PlayOnce(kind));
    }

    fn start_repeating(&self, kind: SoundKind, interval_ms: u64) {
        self.push(SoundCall::StartRepeating(kind, interval_ms));
    }

    fn stop_repeating(&self) {
        self.push(SoundCall::StopRepeating);
    }

    fn set_buzzer(&self, buzzer: Option<&BuzzerSound>) {
        self.push(SoundCall::SetBuzzer(buzzer.map(|b| b.name.clone())));
    }
}
