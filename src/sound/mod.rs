//! Sound output
//!
//! The core asks for sounds through `SoundBoard`; an adapter does the
//! actual playing. One-shot sounds and the repeating warning tick are
//! separate channels and never interrupt each other.

pub mod buzzer;
pub mod recording;
pub mod terminal;

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use tracing::debug;

pub use buzzer::BuzzerSound;
pub use recording::{RecordingSound, SoundCall};
pub use terminal::TerminalSound;

/// Every sound the application can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundKind {
    Open,
    Blop,
    Break,
    Buzzer,
    Activate,
    End,
    Tick,
}

impl fmt::Display for SoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SoundKind::Open => "open",
            SoundKind::Blop => "blop",
            SoundKind::Break => "break",
            SoundKind::Buzzer => "buzzer",
            SoundKind::Activate => "activate",
            SoundKind::End => "end",
            SoundKind::Tick => "tick",
        };
        f.write_str(name)
    }
}

/// Something that can play sounds.
pub trait SoundAdapter: Send + Sync {
    fn play_once(&self, kind: SoundKind);

    /// Start repeating `kind` every `interval_ms`, replacing any running loop.
    fn start_repeating(&self, kind: SoundKind, interval_ms: u64);

    fn stop_repeating(&self);

    /// Swap in a custom buzzer sound. `None` restores the built-in one.
    fn set_buzzer(&self, _buzzer: Option<&BuzzerSound>) {}
}

/// Gate between the core and a `SoundAdapter`.
///
/// Honors the master sound switch and remembers the loop the engine wants,
/// so switching sound back on can resume it.
pub struct SoundBoard {
    adapter: Arc<dyn SoundAdapter>,
    enabled: AtomicBool,
    wanted_loop: Mutex<Option<(SoundKind, u64)>>,
}

impl SoundBoard {
    pub fn new(adapter: Arc<dyn SoundAdapter>, enabled: bool) -> Self {
        Self {
            adapter,
            enabled: AtomicBool::new(enabled),
            wanted_loop: Mutex::new(None),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn play(&self, kind: SoundKind) {
        if self.is_enabled() {
            self.adapter.play_once(kind);
        } else {
            debug!("Sound disabled, not playing {}", kind);
        }
    }

    pub fn start_loop(&self, kind: SoundKind, interval_ms: u64) {
        if let Ok(mut wanted) = self.wanted_loop.lock() {
            *wanted = Some((kind, interval_ms));
        }
        // Cancel first so two loops never overlap, even when muted.
        self.adapter.stop_repeating();
        if self.is_enabled() {
            self.adapter.start_repeating(kind, interval_ms);
        }
    }

    pub fn stop_loop(&self) {
        if let Ok(mut wanted) = self.wanted_loop.lock() {
            *wanted = None;
        }
        self.adapter.stop_repeating();
    }

    /// Flip the master switch, stopping or resuming the loop to match.
    pub fn set_enabled(&self, enabled: bool) {
        let was = self.enabled.swap(enabled, Ordering::SeqCst);
        if was == enabled {
            return;
        }
        if !enabled {
            self.adapter.stop_repeating();
            return;
        }
        let wanted = self.wanted_loop.lock().ok().and_then(|w| *w);
        if let Some((kind, interval_ms)) = wanted {
            self.adapter.start_repeating(kind, interval_ms);
        }
    }

    pub fn set_buzzer(&self, buzzer: Option<&BuzzerSound>) {
        self.adapter.set_buzzer(buzzer);
    }
}
