//! Text rendering for the terminal

use std::io::Write;

use chrono::{DateTime, Local, Utc};

use crate::{
    events::{Remaining, UiEvent},
    state::{Timer, TimerId},
};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Row {
    id: TimerId,
    end_time: DateTime<Utc>,
    name: String,
    remaining: Option<Remaining>,
    urgency: Option<u8>,
}

impl Row {
    fn from_timer(timer: &Timer) -> Self {
        Self {
            id: timer.id,
            end_time: timer.end_time(),
            name: timer.name().to_string(),
            remaining: timer.is_ended().then_some(Remaining::Expired),
            urgency: None,
        }
    }

    fn label(&self) -> String {
        if self.name.is_empty() {
            format!("#{}", self.id)
        } else {
            format!("#{} {}", self.id, self.name)
        }
    }

    fn readout(&self) -> String {
        let remaining = match &self.remaining {
            Some(Remaining::Left(text)) => text.as_str(),
            Some(Remaining::Expired) => "Time's up!",
            None => "--:--:--",
        };
        let marks = "!".repeat(usize::from(self.urgency.unwrap_or(0)));
        format!("{} {}{}", self.label(), remaining, marks)
    }
}

/// What the terminal currently shows, in display order.
#[derive(Debug, Default)]
pub struct TimerBoard {
    rows: Vec<Row>,
}

impl TimerBoard {
    /// Replace the board with a fresh snapshot.
    pub fn reset(&mut self, timers: &[Timer]) {
        self.rows = timers.iter().map(Row::from_timer).collect();
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn row_mut(&mut self, id: TimerId) -> Option<&mut Row> {
        self.rows.iter_mut().find(|r| r.id == id)
    }

    /// Fold in one event. Returns a notice line for events worth calling out.
    pub fn apply(&mut self, event: &UiEvent) -> Option<String> {
        match event {
            UiEvent::Render(render) => {
                let row = self.row_mut(render.timer_id)?;
                let newly_expired = render.remaining == Remaining::Expired
                    && row.remaining != Some(Remaining::Expired);
                row.remaining = Some(render.remaining.clone());
                row.urgency = render.urgency;
                newly_expired.then(|| format!("{}: Time's up!", row.label()))
            }
            UiEvent::TimerAdded(timer) => {
                if self.rows.iter().any(|r| r.id == timer.id) {
                    return None;
                }
                let row = Row::from_timer(timer);
                let at = self
                    .rows
                    .partition_point(|r| (r.end_time, r.id) < (row.end_time, row.id));
                let notice = format!(
                    "Added {} ending {}",
                    row.label(),
                    row.end_time.with_timezone(&Local).format("%-I:%M:%S %p")
                );
                self.rows.insert(at, row);
                Some(notice)
            }
            UiEvent::TimerRemoved { id } => {
                let idx = self.rows.iter().position(|r| r.id == *id)?;
                let row = self.rows.remove(idx);
                Some(format!("Removed {}", row.label()))
            }
            UiEvent::TimerRenamed { id, name } => {
                let row = self.row_mut(*id)?;
                row.name = name.clone();
                None
            }
        }
    }

    /// One-line summary of every timer.
    pub fn status_line(&self) -> String {
        self.rows
            .iter()
            .map(Row::readout)
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// Multi-line listing used by the `list` command.
pub fn list_timers(timers: &[Timer], now: DateTime<Utc>) -> String {
    if timers.is_empty() {
        return "No timers".to_string();
    }
    timers
        .iter()
        .map(|timer| {
            let mut row = Row::from_timer(timer);
            if !timer.is_ended() {
                let secs = crate::engine::seconds_remaining(timer.end_time(), now).max(0);
                row.remaining = Some(Remaining::Left(crate::utils::format_hms(secs.unsigned_abs())));
            }
            format!(
                "{}  (ends {}, warns {} min before)",
                row.readout(),
                timer.end_time().with_timezone(&Local).format("%a %-I:%M:%S %p"),
                timer.min_before_warning()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Print a full line, clearing any status line first.
pub fn print_line(text: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = writeln!(stdout, "\r\x1b[2K{}", text);
    let _ = stdout.flush();
}

/// Overwrite the status line in place.
pub fn print_status(text: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = write!(stdout, "\r\x1b[2K{}", text);
    let _ = stdout.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        events::RenderEvent,
        state::{Deadline, TimerSpec, TimerStore},
    };
    use chrono::{Duration, TimeZone};

    fn timers() -> Vec<Timer> {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let mut store = TimerStore::new();
        store
            .add(TimerSpec::new(Deadline::In(Duration::minutes(10)), "eggs", 1), now)
            .unwrap();
        store
            .add(TimerSpec::new(Deadline::In(Duration::minutes(3)), "", 1), now)
            .unwrap();
        store.list().to_vec()
    }

    #[test]
    fn renders_follow_display_order() {
        let timers = timers();
        let mut board = TimerBoard::default();
        board.reset(&timers);
        assert_eq!(board.status_line(), "#2 --:--:-- | #1 eggs --:--:--");

        board.apply(&UiEvent::Render(RenderEvent {
            timer_id: TimerId(2),
            remaining: Remaining::Left("00:00:42".into()),
            urgency: Some(2),
        }));
        assert_eq!(board.status_line(), "#2 00:00:42!! | #1 eggs --:--:--");
    }

    #[test]
    fn expiry_is_announced_once() {
        let mut board = TimerBoard::default();
        board.reset(&timers());
        let expired = UiEvent::Render(RenderEvent {
            timer_id: TimerId(1),
            remaining: Remaining::Expired,
            urgency: None,
        });
        assert_eq!(board.apply(&expired), Some("#1 eggs: Time's up!".into()));
        assert_eq!(board.apply(&expired), None);
    }

    #[test]
    fn structural_events_update_rows() {
        let mut board = TimerBoard::default();
        let timers = timers();
        for timer in &timers {
            assert!(board.apply(&UiEvent::TimerAdded(timer.clone())).is_some());
        }
        assert_eq!(board.len(), 2);
        assert_eq!(board.apply(&UiEvent::TimerAdded(timers[0].clone())), None);
        assert_eq!(board.len(), 2);

        board.apply(&UiEvent::TimerRenamed {
            id: TimerId(2),
            name: "tea".into(),
        });
        assert_eq!(
            board.apply(&UiEvent::TimerRemoved { id: TimerId(1) }),
            Some("Removed #1 eggs".into())
        );
        assert_eq!(board.status_line(), "#2 tea --:--:--");
        assert_eq!(board.apply(&UiEvent::TimerRemoved { id: TimerId(9) }), None);
    }
}
