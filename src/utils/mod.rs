//! Utility functions module
//!
//! Signal handling and time formatting shared by the binary and the core.

pub mod format;
pub mod signals;

// Re-export main functions
pub use format::{format_hms, NowFormat};
pub use signals::shutdown_signal;
