//! Sound adapter for a terminal session
//!
//! There is no audio device to drive, so sounds are logged and the buzzer
//! and warning tick ring the terminal bell.

use std::{
    io::Write,
    sync::Mutex,
    time::Duration,
};

use tracing::{debug, info, warn};

use super::{BuzzerSound, SoundAdapter, SoundKind};
use crate::tasks::RepeatingTask;

#[derive(Debug, Default)]
pub struct TerminalSound {
    repeating: RepeatingTask,
    buzzer: Mutex<Option<String>>,
}

impl TerminalSound {
    pub fn new() -> Self {
        Self::default()
    }
}

fn bell() {
    let mut stdout = std::io::stdout();
    let _ = stdout.write_all(b"\x07");
    let _ = stdout.flush();
}

impl SoundAdapter for TerminalSound {
    fn play_once(&self, kind: SoundKind) {
        match kind {
            SoundKind::Buzzer => {
                let custom = self.buzzer.lock().ok().and_then(|b| b.clone());
                match custom {
                    Some(name) => info!("Playing buzzer '{}'", name),
                    None => info!("Playing buzzer"),
                }
                bell();
            }
            other => debug!("Playing {}", other),
        }
    }

    fn start_repeating(&self, kind: SoundKind, interval_ms: u64) {
        debug!("Repeating {} every {}ms", kind, interval_ms);
        self.repeating
            .start(Duration::from_millis(interval_ms), move || {
                if kind == SoundKind::Tick {
                    bell();
                }
            });
    }

    fn stop_repeating(&self) {
        self.repeating.stop();
    }

    fn set_buzzer(&self, buzzer: Option<&BuzzerSound>) {
        match buzzer {
            Some(buzzer) => match buzzer.decode() {
                Ok(bytes) => info!(
                    "Using custom buzzer '{}' ({}, {} bytes)",
                    buzzer.name,
                    buzzer.mime().unwrap_or("unknown type"),
                    bytes.len()
                ),
                Err(e) => warn!("Custom buzzer '{}' may not play: {}", buzzer.name, e),
            },
            None => info!("Using built-in buzzer"),
        }
        if let Ok(mut current) = self.buzzer.lock() {
            *current = buzzer.map(|b| b.name.clone());
        }
    }
}
