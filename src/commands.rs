//! Input boundary
//!
//! Turns raw form input into `TimerSpec`s. Every field is checked before
//! anything reaches the store; problems come back as `ValidationError`
//! with a flag per offending field.

use std::sync::OnceLock;

use chrono::{DateTime, Days, Duration, NaiveTime, TimeZone, Utc};
use regex::Regex;

use crate::{
    error::{FieldValidity, ValidationError},
    state::{Deadline, TimerSpec},
};

/// Raw input for a duration-based timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimerForm<'a> {
    pub hours: &'a str,
    pub minutes: &'a str,
    pub seconds: &'a str,
    pub min_before: &'a str,
    pub name: &'a str,
}

/// Raw input for a clock-time alarm.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlarmForm<'a> {
    /// `HH:MM`, 24-hour.
    pub time: &'a str,
    pub min_before: &'a str,
    pub name: &'a str,
}

/// Parse a non-negative whole number. Blank counts as zero.
fn parse_count(text: &str) -> Option<u64> {
    let text = text.trim();
    if text.is_empty() {
        return Some(0);
    }
    text.parse().ok()
}

/// Parse `HH:MM` on a 24-hour clock.
pub fn parse_clock_time(text: &str) -> Option<NaiveTime> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"^([0-2][0-9]):([0-5][0-9])$").expect("clock pattern compiles")
    });
    let caps = pattern.captures(text.trim())?;
    let hour = caps[1].parse().ok()?;
    let minute = caps[2].parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Build a timer spec from already-numeric duration parts.
pub fn duration_spec(
    hours: u64,
    minutes: u64,
    seconds: u64,
    min_before: u64,
    name: &str,
) -> Result<TimerSpec, ValidationError> {
    let too_long = ValidationError::Fields(FieldValidity {
        hours: true,
        ..Default::default()
    });
    let total = hours
        .checked_mul(3600)
        .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
        .and_then(|hm| hm.checked_add(seconds))
        .ok_or_else(|| too_long.clone())?;
    if total == 0 {
        return Err(ValidationError::EmptyDuration);
    }
    let total = i64::try_from(total)
        .ok()
        .and_then(Duration::try_seconds)
        .ok_or(too_long)?;

    Ok(TimerSpec::new(Deadline::In(total), name.trim(), min_before))
}

/// Validate a timer form.
pub fn timer_spec(form: &TimerForm<'_>) -> Result<TimerSpec, ValidationError> {
    let hours = parse_count(form.hours);
    let minutes = parse_count(form.minutes);
    let seconds = parse_count(form.seconds);
    let min_before = parse_count(form.min_before);

    let validity = FieldValidity {
        hours: hours.is_none(),
        minutes: minutes.is_none(),
        seconds: seconds.is_none(),
        min_before: min_before.is_none(),
        ..Default::default()
    };
    match (hours, minutes, seconds, min_before) {
        (Some(h), Some(m), Some(s), Some(before)) => duration_spec(h, m, s, before, form.name),
        _ => Err(ValidationError::Fields(validity)),
    }
}

/// Next occurrence of `time` on the clock face of `now`: today if still
/// ahead, otherwise tomorrow. `None` if the local time does not exist.
pub fn resolve_alarm<Tz: TimeZone>(now: &DateTime<Tz>, time: NaiveTime) -> Option<DateTime<Utc>> {
    let tz = now.timezone();
    let today = now.date_naive();
    let mut at = tz.from_local_datetime(&today.and_time(time)).earliest()?;
    if at < *now {
        let tomorrow = today.checked_add_days(Days::new(1))?;
        at = tz.from_local_datetime(&tomorrow.and_time(time)).earliest()?;
    }
    Some(at.with_timezone(&Utc))
}

/// Validate an alarm form against the current local time.
pub fn alarm_spec<Tz: TimeZone>(form: &AlarmForm<'_>, now: &DateTime<Tz>) -> Result<TimerSpec, ValidationError> {
    let time = parse_clock_time(form.time);
    let min_before = parse_count(form.min_before);

    let (Some(time), Some(min_before)) = (time, min_before) else {
        return Err(ValidationError::Fields(FieldValidity {
            time: time.is_none(),
            min_before: min_before.is_none(),
            ..Default::default()
        }));
    };

    let at = resolve_alarm(now, time).ok_or(ValidationError::InvalidTime)?;
    if at <= now.with_timezone(&Utc) {
        return Err(ValidationError::InvalidTime);
    }
    Ok(TimerSpec::new(Deadline::At(at), form.name.trim(), min_before))
}
