//! Background tasks module
//!
//! The per-second tick driver and the cancellable repeat used for the
//! warning sound.

pub mod repeating;
pub mod tick_task;

// Re-export main functions
pub use repeating::RepeatingTask;
pub use tick_task::tick_task;
