//! End-to-end timer lifecycle through the public API

use std::sync::Arc;

use chrono::{Duration, FixedOffset, TimeZone, Utc};
use simple_timers::{
    clock::ManualClock,
    commands::{AlarmForm, TimerForm},
    console::{handle_command, parse_command},
    events::{Remaining, UiEvent},
    persistence::FileStore,
    sound::{RecordingSound, SoundKind},
    AppState,
};

fn start() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 12, 31, 22, 0, 0).unwrap()
}

fn open_state(
    clock: Arc<ManualClock>,
    path: &std::path::Path,
) -> (AppState, Arc<RecordingSound>) {
    let sound = Arc::new(RecordingSound::new());
    let store = Arc::new(FileStore::open(path));
    let state = AppState::new(clock, store, "simple-timers", sound.clone());
    (state, sound)
}

#[test]
fn timer_counts_down_warns_and_rings() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(start()));
    let (state, sound) = open_state(clock.clone(), &dir.path().join("storage.json"));
    let mut rx = state.subscribe();

    let timer = state
        .create_timer(&TimerForm {
            minutes: "2",
            min_before: "1",
            name: "pasta",
            ..Default::default()
        })
        .unwrap();

    // Outside the warning band: no urgency, no tick sound.
    state.tick().unwrap();
    assert_eq!(sound.repeating(), None);

    clock.advance(Duration::seconds(61));
    state.tick().unwrap();
    assert_eq!(sound.repeating(), Some((SoundKind::Tick, 1000)));

    clock.advance(Duration::seconds(59));
    let report = state.tick().unwrap();
    assert_eq!(report.expired, vec![timer.id]);
    assert_eq!(sound.repeating(), None);
    assert_eq!(sound.played(), vec![SoundKind::Buzzer]);

    let renders: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
        .filter_map(|e| match e {
            UiEvent::Render(r) => Some(r),
            _ => None,
        })
        .collect();
    assert_eq!(renders.len(), 3);
    assert_eq!(renders[0].remaining, Remaining::Left("00:02:00".into()));
    assert_eq!(renders[0].urgency, None);
    assert_eq!(renders[1].remaining, Remaining::Left("00:00:59".into()));
    assert_eq!(renders[1].urgency, Some(2));
    assert_eq!(renders[2].remaining, Remaining::Expired);

    // Later ticks leave the ended timer alone.
    clock.advance(Duration::seconds(5));
    let report = state.tick().unwrap();
    assert!(report.renders.is_empty());
    assert!(report.expired.is_empty());
}

#[test]
fn timers_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    let clock = Arc::new(ManualClock::with_offset(
        start(),
        FixedOffset::east_opt(0).unwrap(),
    ));

    {
        let (state, _) = open_state(clock.clone(), &path);
        state
            .create_alarm(&AlarmForm {
                time: "00:10",
                min_before: "3",
                name: "new year call",
            })
            .unwrap();
        state
            .create_timer(&TimerForm {
                seconds: "30",
                ..Default::default()
            })
            .unwrap();
        state.set_sound_enabled(false).unwrap();
        state.save().unwrap();
    }

    clock.advance(Duration::minutes(1));
    let (state, _) = open_state(clock.clone(), &path);
    assert_eq!(state.rehydrate().unwrap(), 1);

    let timers = state.timers().unwrap();
    assert_eq!(timers[0].name(), "new year call");
    assert_eq!(
        timers[0].end_time(),
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 10, 0).unwrap()
    );
    assert_eq!(timers[0].min_before_warning(), 3);
    assert!(!state.options().unwrap().sound);
}

#[test]
fn console_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(start()));
    let (state, sound) = open_state(clock, &dir.path().join("storage.json"));

    let run = |line: &str| {
        let command = parse_command(line).unwrap().unwrap();
        handle_command(&state, command)
    };

    assert_eq!(run("timer 0 0 45 eggs"), "Timer #1 started");
    assert_eq!(run("say set a timer for 2 minutes"), "You got it! Timer set for 2 minutes.");
    assert_eq!(state.timers().unwrap().len(), 2);
    assert_eq!(run("clear"), "Removed 2 timers");
    assert_eq!(run("sound off"), "Sound off");
    assert_eq!(run("rm 1"), "No timer #1");

    assert_eq!(
        sound.played(),
        vec![SoundKind::Activate, SoundKind::Break]
    );
}

#[test]
fn truncated_storage_file_does_not_stop_timers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    std::fs::write(&path, r#"{"simple-timers.opts":"{}""#).unwrap();

    let clock = Arc::new(ManualClock::new(start()));
    let (state, _) = open_state(clock, &path);
    assert_eq!(state.rehydrate().unwrap(), 0);

    state
        .create_timer(&TimerForm {
            seconds: "30",
            ..Default::default()
        })
        .unwrap();
    assert_eq!(state.timers().unwrap().len(), 1);
    assert!(dir.path().join("storage.json.corrupt").exists());
    assert!(path.exists());
}
