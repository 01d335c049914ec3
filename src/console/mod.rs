//! Terminal presentation adapter
//!
//! Reads commands from stdin and shows timers on stdout. Logs go to stderr
//! so they never mix with the readout.

pub mod handlers;
pub mod render;

use std::{path::PathBuf, sync::Arc};

use thiserror::Error;
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tracing::{debug, info, warn};

use crate::state::{AppState, TimerId};
pub use handlers::handle_command;
pub use render::TimerBoard;

pub const HELP: &str = "\
Commands:
  timer <h> <m> <s> [-w <min>] [name]
                             start a countdown, warning <min> minutes before
  alarm <HH:MM> [-w <min>] [name]
                             ring at a clock time (24-hour)
  rm <id>                    remove a timer
  rename <id> <text>         rename a timer
  clear                      remove every timer
  list                       show all timers
  say <words>                spoken command, e.g. say set a 5 minute timer
  now                        show the time, again to change style
  sound on|off               turn all sound on or off
  buzzer <file>|reset        use an audio file as the buzzer, or the default
  help                       show this help";

/// One line of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Timer {
        hours: String,
        minutes: String,
        seconds: String,
        /// Warning lead in minutes, the preference when absent.
        min_before: Option<String>,
        name: String,
    },
    Alarm {
        time: String,
        min_before: Option<String>,
        name: String,
    },
    Remove(TimerId),
    Rename(TimerId, String),
    Clear,
    List,
    Say(String),
    Now,
    Sound(bool),
    InstallBuzzer(PathBuf),
    ResetBuzzer,
    Help,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}', try 'help'")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),
}

fn parse_id(word: Option<&str>, usage: &'static str) -> Result<TimerId, CommandError> {
    word.map(|w| w.trim_start_matches('#'))
        .and_then(|w| w.parse().ok())
        .map(TimerId)
        .ok_or(CommandError::Usage(usage))
}

/// Split an optional leading `-w <min>` off the rest of a line.
fn split_lead(text: &str, usage: &'static str) -> Result<(Option<String>, String), CommandError> {
    let text = text.trim();
    let Some(after) = text.strip_prefix("-w") else {
        return Ok((None, text.to_string()));
    };
    if !after.is_empty() && !after.starts_with(char::is_whitespace) {
        return Ok((None, text.to_string()));
    }
    let after = after.trim_start();
    let (lead, name) = after.split_once(char::is_whitespace).unwrap_or((after, ""));
    if lead.is_empty() {
        return Err(CommandError::Usage(usage));
    }
    Ok((Some(lead.to_string()), name.trim().to_string()))
}

/// Parse one input line. Blank lines give `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    if word.is_empty() {
        return Ok(None);
    }

    let command = match word.to_ascii_lowercase().as_str() {
        "timer" | "t" => {
            const USAGE: &str = "timer <h> <m> <s> [-w <min>] [name]";
            let mut parts = rest.splitn(4, char::is_whitespace);
            let (Some(hours), Some(minutes), Some(seconds)) = (parts.next(), parts.next(), parts.next()) else {
                return Err(CommandError::Usage(USAGE));
            };
            if hours.is_empty() {
                return Err(CommandError::Usage(USAGE));
            }
            let (min_before, name) = split_lead(parts.next().unwrap_or(""), USAGE)?;
            Command::Timer {
                hours: hours.to_string(),
                minutes: minutes.to_string(),
                seconds: seconds.to_string(),
                min_before,
                name,
            }
        }
        "alarm" | "a" => {
            const USAGE: &str = "alarm <HH:MM> [-w <min>] [name]";
            if rest.is_empty() {
                return Err(CommandError::Usage(USAGE));
            }
            let (time, tail) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            let (min_before, name) = split_lead(tail, USAGE)?;
            Command::Alarm {
                time: time.to_string(),
                min_before,
                name,
            }
        }
        "rm" | "remove" => Command::Remove(parse_id(Some(rest), "rm <id>")?),
        "rename" => {
            const USAGE: &str = "rename <id> <text>";
            let (id, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            Command::Rename(parse_id(Some(id), USAGE)?, text.trim().to_string())
        }
        "clear" => Command::Clear,
        "list" | "ls" => Command::List,
        "say" => {
            if rest.is_empty() {
                return Err(CommandError::Usage("say <words>"));
            }
            Command::Say(rest.to_string())
        }
        "now" => Command::Now,
        "sound" => match rest.to_ascii_lowercase().as_str() {
            "on" => Command::Sound(true),
            "off" => Command::Sound(false),
            _ => return Err(CommandError::Usage("sound on|off")),
        },
        "buzzer" => match rest {
            "" => return Err(CommandError::Usage("buzzer <file>|reset")),
            "reset" => Command::ResetBuzzer,
            path => Command::InstallBuzzer(PathBuf::from(path)),
        },
        "help" | "?" => Command::Help,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

/// Read commands from stdin until it closes.
///
/// Reading happens on a plain thread so a pending read never holds up
/// runtime shutdown.
pub async fn console_task(state: Arc<AppState>) {
    info!("Reading commands from stdin, type 'help' for a list");
    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();

    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            match line {
                Ok(line) => {
                    if line_tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
        debug!("stdin closed");
    });

    while let Some(line) = line_rx.recv().await {
        let output = match parse_command(&line) {
            Ok(Some(command)) => handle_command(&state, command),
            Ok(None) => continue,
            Err(e) => e.to_string(),
        };
        render::print_line(&output);
    }
}

/// Show UI events on stdout as they arrive.
pub async fn render_task(state: Arc<AppState>) {
    let mut rx = state.subscribe();
    let mut board = TimerBoard::default();
    match state.timers() {
        Ok(timers) => board.reset(&timers),
        Err(e) => warn!("Failed to read timers for display: {}", e),
    }

    loop {
        match rx.recv().await {
            Ok(event) => {
                if let Some(notice) = board.apply(&event) {
                    render::print_line(&notice);
                }
                // Redraw once the burst for this tick is drained.
                if rx.is_empty() {
                    render::print_status(&board.status_line());
                }
            }
            Err(RecvError::Lagged(missed)) => {
                debug!("Display fell behind by {} events, resyncing", missed);
                if let Ok(timers) = state.timers() {
                    board.reset(&timers);
                }
            }
            Err(RecvError::Closed) => break,
        }
    }
}
