//! State management module
//!
//! Timers, the ordered store holding them, user preferences and the
//! application state that ties them to sound, storage and the UI.

pub mod app_state;
pub mod options;
pub mod timer;
pub mod timer_store;

// Re-export main types
pub use app_state::AppState;
pub use options::Options;
pub use timer::{sanitize_name, Deadline, Timer, TimerId, TimerSpec};
pub use timer_store::TimerStore;
