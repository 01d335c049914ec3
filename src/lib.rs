//! Simple Timers - countdown timers and alarms with escalating warnings
//!
//! This library provides the timer store, the tick engine that drives timers
//! from pending through warning to ended, sound and persistence adapters,
//! and a terminal front end.

pub mod clock;
pub mod commands;
pub mod config;
pub mod console;
pub mod engine;
pub mod error;
pub mod events;
pub mod persistence;
pub mod sound;
pub mod state;
pub mod tasks;
pub mod urgency;
pub mod utils;
pub mod voice;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use engine::{LoopChange, TickEngine, TickReport};
pub use error::{AppError, Result};
pub use events::{RenderEvent, Remaining, UiEvent};
pub use state::{AppState, Timer, TimerId, TimerStore};
pub use utils::signals::shutdown_signal;
