//! Console command handlers

use tracing::{error, info, warn};

use super::{render::list_timers, Command, HELP};
use crate::{
    commands::{AlarmForm, TimerForm},
    error::{AppError, ValidationError},
    state::AppState,
    voice::VoiceCommand,
};

/// Text shown for a rejected command.
fn describe_error(e: &AppError) -> String {
    match e {
        AppError::Validation(ValidationError::Fields(fields)) => {
            format!("Please fix: {}", fields.invalid_fields().join(", "))
        }
        AppError::Validation(ValidationError::EmptyDuration) => {
            "Please enter a duration of at least one second".to_string()
        }
        AppError::Validation(ValidationError::InvalidTime) => {
            "Please enter a time in the future".to_string()
        }
        other => format!("Error: {}", other),
    }
}

/// Run one command and return what to print.
pub fn handle_command(state: &AppState, command: Command) -> String {
    match run(state, command) {
        Ok(output) => output,
        Err(e) => {
            match &e {
                AppError::Validation(_) => warn!("Rejected input: {}", e),
                _ => error!("Command failed: {}", e),
            }
            describe_error(&e)
        }
    }
}

/// The typed warning lead, or the saved preference.
fn lead_or_default(state: &AppState, typed: Option<String>) -> Result<String, AppError> {
    match typed {
        Some(lead) => Ok(lead),
        None => Ok(state.options()?.min_before.to_string()),
    }
}

fn run(state: &AppState, command: Command) -> Result<String, AppError> {
    match command {
        Command::Timer {
            hours,
            minutes,
            seconds,
            min_before,
            name,
        } => {
            let min_before = lead_or_default(state, min_before)?;
            let timer = state.create_timer(&TimerForm {
                hours: &hours,
                minutes: &minutes,
                seconds: &seconds,
                min_before: &min_before,
                name: &name,
            })?;
            Ok(format!("Timer #{} started", timer.id))
        }
        Command::Alarm {
            time,
            min_before,
            name,
        } => {
            let min_before = lead_or_default(state, min_before)?;
            let timer = state.create_alarm(&AlarmForm {
                time: &time,
                min_before: &min_before,
                name: &name,
            })?;
            Ok(format!("Alarm #{} set", timer.id))
        }
        Command::Remove(id) => Ok(if state.remove_timer(id)? {
            format!("Timer #{} removed", id)
        } else {
            format!("No timer #{}", id)
        }),
        Command::Rename(id, text) => Ok(match state.rename_timer(id, &text)? {
            Some(name) if name.is_empty() => format!("Timer #{} is now unnamed", id),
            Some(name) => format!("Timer #{} is now '{}'", id, name),
            None => format!("No timer #{}", id),
        }),
        Command::Clear => {
            let removed = state.clear_all()?;
            Ok(format!("Removed {} timers", removed))
        }
        Command::List => Ok(list_timers(&state.timers()?, state.now())),
        Command::Say(transcript) => {
            let reply = state.handle_voice(&transcript)?;
            if let Some(VoiceCommand::Alarm { at }) = &reply.command {
                info!("Voice alarm for {}", at);
            }
            Ok(reply.feedback)
        }
        Command::Now => Ok(state.cycle_now_format()),
        Command::Sound(enabled) => {
            state.set_sound_enabled(enabled)?;
            Ok(format!("Sound {}", if enabled { "on" } else { "off" }))
        }
        Command::InstallBuzzer(path) => {
            let buzzer = state.install_buzzer(&path)?;
            Ok(format!("Buzzer set to '{}'", buzzer.name))
        }
        Command::ResetBuzzer => {
            state.reset_buzzer()?;
            Ok("Buzzer reset to default".to_string())
        }
        Command::Help => Ok(HELP.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::ManualClock, persistence::MemoryStore, sound::RecordingSound, state::TimerId};
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn state() -> AppState {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
        ));
        AppState::new(
            clock,
            Arc::new(MemoryStore::new()),
            "simple-timers",
            Arc::new(RecordingSound::new()),
        )
    }

    fn timer(h: &str, m: &str, s: &str, name: &str) -> Command {
        Command::Timer {
            hours: h.into(),
            minutes: m.into(),
            seconds: s.into(),
            min_before: None,
            name: name.into(),
        }
    }

    #[test]
    fn timer_uses_default_warning_lead() {
        let state = state();
        assert_eq!(handle_command(&state, timer("0", "1", "0", "tea")), "Timer #1 started");
        let timers = state.timers().unwrap();
        assert_eq!(timers[0].min_before_warning(), 5);
        assert_eq!(timers[0].name(), "tea");
    }

    #[test]
    fn typed_warning_lead_wins() {
        let state = state();
        let command = Command::Timer {
            hours: "0".into(),
            minutes: "30".into(),
            seconds: "0".into(),
            min_before: Some("2".into()),
            name: "".into(),
        };
        assert_eq!(handle_command(&state, command), "Timer #1 started");
        let alarm = Command::Alarm {
            time: "11:00".into(),
            min_before: Some("15".into()),
            name: "meeting".into(),
        };
        assert_eq!(handle_command(&state, alarm), "Alarm #2 set");

        let timers = state.timers().unwrap();
        let lead = |id: u64| {
            timers
                .iter()
                .find(|t| t.id == TimerId(id))
                .map(|t| t.min_before_warning())
        };
        assert_eq!(lead(1), Some(2));
        assert_eq!(lead(2), Some(15));

        let bad = Command::Timer {
            hours: "0".into(),
            minutes: "1".into(),
            seconds: "0".into(),
            min_before: Some("soon".into()),
            name: "".into(),
        };
        assert_eq!(handle_command(&state, bad), "Please fix: minutes before warning");
    }

    #[test]
    fn buzzer_reset_command() {
        let state = state();
        assert_eq!(handle_command(&state, Command::ResetBuzzer), "Buzzer reset to default");
        assert!(handle_command(&state, Command::InstallBuzzer("notes.txt".into()))
            .starts_with("Error: unsupported audio format"));
    }

    #[test]
    fn validation_is_explained() {
        let state = state();
        assert_eq!(
            handle_command(&state, timer("x", "0", "-1", "")),
            "Please fix: hours, seconds"
        );
        assert_eq!(
            handle_command(&state, timer("0", "0", "0", "")),
            "Please enter a duration of at least one second"
        );
        assert_eq!(
            handle_command(
                &state,
                Command::Alarm {
                    time: "25:00".into(),
                    min_before: None,
                    name: String::new()
                }
            ),
            "Please fix: time"
        );
        assert!(state.timers().unwrap().is_empty());
    }

    #[test]
    fn remove_and_rename_report_missing_ids() {
        let state = state();
        handle_command(&state, timer("0", "0", "30", ""));
        assert_eq!(handle_command(&state, Command::Remove(TimerId(5))), "No timer #5");
        assert_eq!(
            handle_command(&state, Command::Rename(TimerId(1), "soup".into())),
            "Timer #1 is now 'soup'"
        );
        assert_eq!(
            handle_command(&state, Command::Rename(TimerId(1), "  ".into())),
            "Timer #1 is now unnamed"
        );
        assert_eq!(handle_command(&state, Command::Remove(TimerId(1))), "Timer #1 removed");
    }

    #[test]
    fn list_shows_remaining_time() {
        let state = state();
        assert_eq!(handle_command(&state, Command::List), "No timers");
        handle_command(&state, timer("1", "0", "5", "bread"));
        let listing = handle_command(&state, Command::List);
        assert!(listing.starts_with("#1 bread 01:00:05"), "{}", listing);
    }
}
