//! Spoken command grammar
//!
//! Speech recognition happens elsewhere; this module gets the transcript
//! and decides whether it asked for a timer or an alarm.
//!
//! Understood phrasings:
//! - "set a 15 minute timer", "timer for 1 hour 2 minutes and 3 seconds"
//! - "set an alarm for 2:30", "alarm at 7 a.m."

use std::sync::OnceLock;

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use regex::Regex;

use crate::commands::resolve_alarm;

const EXAMPLES: [&str; 3] = [
    "Set a 15 minute timer.",
    "Set an alarm for 2:30.",
    "Set a timer for 1 minute and 30 seconds.",
];

const CONFIRMATIONS: [&str; 3] = ["Okay.", "You got it!", "Alright."];

/// What a transcript asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceCommand {
    /// Normalized so minutes and seconds are below 60.
    Timer { hours: u64, minutes: u64, seconds: u64 },
    Alarm { at: DateTime<Utc> },
}

struct Patterns {
    hours: Regex,
    minutes: Regex,
    seconds: Regex,
    clock: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let build = |p: &str| Regex::new(p).expect("voice pattern compiles");
        Patterns {
            hours: build(r"(?i)(\d+)[\s\-]+hour"),
            minutes: build(r"(?i)(\d+)[\s\-]+minute"),
            seconds: build(r"(?i)(\d+)[\s\-]+second"),
            clock: build(r"(?i)\b(1[0-2]|0?[1-9])(?::([0-5][0-9]))?\s?([ap]\.?m\.?)?"),
        }
    })
}

fn capture_count(pattern: &Regex, text: &str) -> u64 {
    pattern
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(0)
}

fn parse_timer(text: &str) -> Option<VoiceCommand> {
    let p = patterns();
    let total = capture_count(&p.hours, text)
        .saturating_mul(3600)
        .saturating_add(capture_count(&p.minutes, text).saturating_mul(60))
        .saturating_add(capture_count(&p.seconds, text));
    if total == 0 {
        return None;
    }
    Some(VoiceCommand::Timer {
        hours: total / 3600,
        minutes: (total % 3600) / 60,
        seconds: total % 60,
    })
}

fn parse_alarm<Tz: TimeZone>(text: &str, now: &DateTime<Tz>) -> Option<VoiceCommand> {
    let caps = patterns().clock.captures(text)?;
    let mut hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps.get(2).map_or(Some(0), |m| m.as_str().parse().ok())?;
    let meridiem = caps
        .get(3)
        .map(|m| m.as_str().replace('.', "").to_ascii_lowercase());

    let now_utc = now.with_timezone(&Utc);
    let at = match meridiem.as_deref() {
        Some(half) => {
            hour %= 12;
            if half == "pm" {
                hour += 12;
            }
            resolve_alarm(now, NaiveTime::from_hms_opt(hour, minute, 0)?)?
        }
        None => {
            // Bare "2:30" means the next 2:30 on a 12-hour dial.
            let tz = now.timezone();
            let naive = now.date_naive().and_time(NaiveTime::from_hms_opt(hour, minute, 0)?);
            let mut at = tz.from_local_datetime(&naive).earliest()?.with_timezone(&Utc);
            for _ in 0..2 {
                if at < now_utc {
                    at += Duration::hours(12);
                }
            }
            at
        }
    };

    (at > now_utc).then_some(VoiceCommand::Alarm { at })
}

/// Interpret a transcript.
pub fn parse_command<Tz: TimeZone>(transcript: &str, now: &DateTime<Tz>) -> Option<VoiceCommand> {
    let text = transcript.to_lowercase();
    if text.contains("timer") {
        parse_timer(&text)
    } else if text.contains("alarm") {
        parse_alarm(&text, now)
    } else {
        None
    }
}

fn plural(count: u64, unit: &str) -> String {
    format!("{} {}{}", count, unit, if count > 1 { "s" } else { "" })
}

/// "1 hour, 2 minutes, and 3 seconds" style phrase.
pub fn describe_duration(hours: u64, minutes: u64, seconds: u64) -> String {
    let mut out = String::new();
    if hours > 0 {
        out.push_str(&plural(hours, "hour"));
    }
    if minutes > 0 {
        if hours > 0 {
            out.push_str(if seconds > 0 { ", " } else { " and " });
        }
        out.push_str(&plural(minutes, "minute"));
    }
    if seconds > 0 {
        if hours > 0 && minutes > 0 {
            out.push_str(", and ");
        } else if hours > 0 || minutes > 0 {
            out.push_str(" and ");
        }
        out.push_str(&plural(seconds, "second"));
    }
    out
}

/// Result of handling one transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceReply {
    pub command: Option<VoiceCommand>,
    /// Text to show and speak back.
    pub feedback: String,
}

/// Keeps the rotating confirmation and example phrases.
#[derive(Debug, Default)]
pub struct VoiceAssistant {
    confirm_idx: usize,
    example_idx: usize,
}

impl VoiceAssistant {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next suggestion to show when nothing was understood.
    pub fn next_example(&mut self) -> &'static str {
        self.example_idx = (self.example_idx + 1) % EXAMPLES.len();
        EXAMPLES[self.example_idx]
    }

    fn next_confirmation(&mut self) -> &'static str {
        self.confirm_idx = (self.confirm_idx + 1) % CONFIRMATIONS.len();
        CONFIRMATIONS[self.confirm_idx]
    }

    /// Confirm a command that was carried out. Alarm times are read back
    /// in the time zone of `now`.
    pub fn confirm<Tz: TimeZone>(&mut self, command: VoiceCommand, now: &DateTime<Tz>) -> VoiceReply
    where
        Tz::Offset: std::fmt::Display,
    {
        let detail = match &command {
            VoiceCommand::Timer {
                hours,
                minutes,
                seconds,
            } => format!("Timer set for {}.", describe_duration(*hours, *minutes, *seconds)),
            VoiceCommand::Alarm { at } => format!(
                "Alarm set for {}.",
                at.with_timezone(&now.timezone()).format("%-I:%M %p")
            ),
        };
        VoiceReply {
            command: Some(command),
            feedback: format!("{} {}", self.next_confirmation(), detail),
        }
    }

    /// Echo a transcript that led nowhere and suggest a phrasing.
    pub fn not_understood(&mut self, transcript: &str) -> VoiceReply {
        VoiceReply {
            command: None,
            feedback: format!(
                "You said: \"{}\". Try saying \"{}\"",
                transcript.trim(),
                self.next_example()
            ),
        }
    }
}
