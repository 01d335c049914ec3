//! Time formatting helpers

use chrono::{DateTime, Datelike, TimeZone};
use std::fmt::Display;

/// Format a countdown as `HH:MM:SS`. Hours are not wrapped.
pub fn format_hms(seconds: u64) -> String {
    let h = seconds / 3600;
    let m = (seconds / 60) % 60;
    let s = seconds % 60;
    format!("{:02}:{:02}:{:02}", h, m, s)
}

/// English ordinal suffix for a day of month.
fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// Readout styles for the current time, cycled on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NowFormat {
    /// Wednesday, September 9th 2020, 8:57:09 PM
    #[default]
    Full,
    /// September 9th 2020, 8:57:09 PM
    Long,
    /// Sep 9th 2020, 8:57:09 PM
    Medium,
    /// 09/09/2020 8:57:09 PM
    Slashed,
    /// 09-09-2020 8:57:09 PM
    Dashed,
}

impl NowFormat {
    pub fn next(self) -> Self {
        match self {
            NowFormat::Full => NowFormat::Long,
            NowFormat::Long => NowFormat::Medium,
            NowFormat::Medium => NowFormat::Slashed,
            NowFormat::Slashed => NowFormat::Dashed,
            NowFormat::Dashed => NowFormat::Full,
        }
    }

    pub fn render<Tz: TimeZone>(self, at: &DateTime<Tz>) -> String
    where
        Tz::Offset: Display,
    {
        let day = at.day();
        let suffix = ordinal_suffix(day);
        let time = at.format("%-I:%M:%S %p");
        match self {
            NowFormat::Full => format!("{} {}{} {}, {}", at.format("%A, %B"), day, suffix, at.year(), time),
            NowFormat::Long => format!("{} {}{} {}, {}", at.format("%B"), day, suffix, at.year(), time),
            NowFormat::Medium => format!("{} {}{} {}, {}", at.format("%b"), day, suffix, at.year(), time),
            NowFormat::Slashed => format!("{} {}", at.format("%m/%d/%Y"), time),
            NowFormat::Dashed => format!("{} {}", at.format("%m-%d-%Y"), time),
        }
    }
}
