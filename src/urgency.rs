//! Urgency policy
//!
//! Maps the seconds left on a timer to how aggressively it should nag: the
//! repeat interval of the tick sound and a discrete visual intensity. Both
//! tighten as the deadline approaches. Only consulted while a timer is
//! inside its warning band.

/// Repeat interval of the warning tick sound, in milliseconds.
pub fn tick_interval_millis(seconds_remaining: u64) -> u64 {
    match seconds_remaining {
        0..=9 => 250,
        10..=29 => 500,
        30..=59 => 1000,
        60..=119 => 1500,
        120..=149 => 2000,
        150..=179 => 2500,
        _ => 3000,
    }
}

/// Visual pulse intensity, 0 (none) to 3 (most urgent).
pub fn visual_intensity(seconds_remaining: u64) -> u8 {
    match seconds_remaining {
        0..=29 => 3,
        30..=59 => 2,
        60..=119 => 1,
        _ => 0,
    }
}

/// Whether `seconds_remaining` falls inside a warning lead of
/// `min_before_warning` minutes. A lead of zero never warns.
pub fn in_warning_band(seconds_remaining: u64, min_before_warning: u64) -> Option<bool> {
    let window = min_before_warning.checked_mul(60)?;
    Some(seconds_remaining < window)
}
