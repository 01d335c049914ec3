//! Main application state management

use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use super::{Deadline, Options, Timer, TimerId, TimerSpec, TimerStore};
use crate::{
    clock::Clock,
    commands::{alarm_spec, duration_spec, timer_spec, AlarmForm, TimerForm},
    engine::{LoopChange, TickEngine, TickReport},
    error::{AppError, Result},
    events::UiEvent,
    persistence::{KeyValueStore, Persistence},
    sound::{BuzzerSound, SoundAdapter, SoundBoard, SoundKind},
    utils::NowFormat,
    voice::{parse_command, VoiceAssistant, VoiceCommand, VoiceReply},
};

/// Application state shared between the tick task and user commands.
///
/// All mutation goes through here: it validates input, updates the store,
/// tells the presentation adapter, plays sounds and saves.
pub struct AppState {
    store: Mutex<TimerStore>,
    engine: Mutex<TickEngine>,
    options: Mutex<Options>,
    voice: Mutex<VoiceAssistant>,
    now_format: Mutex<NowFormat>,
    sound: SoundBoard,
    persistence: Persistence,
    clock: Arc<dyn Clock>,
    /// Channel for render and structural events
    event_tx: broadcast::Sender<UiEvent>,
    /// Set after a failed save so repeats are not reported again
    persist_failed: AtomicBool,
}

impl AppState {
    pub fn new(
        clock: Arc<dyn Clock>,
        kv: Arc<dyn KeyValueStore>,
        namespace: &str,
        sound: Arc<dyn SoundAdapter>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        let options = Options::default();

        Self {
            store: Mutex::new(TimerStore::new()),
            engine: Mutex::new(TickEngine::new()),
            sound: SoundBoard::new(sound, options.sound),
            options: Mutex::new(options),
            voice: Mutex::new(VoiceAssistant::new()),
            now_format: Mutex::new(NowFormat::default()),
            persistence: Persistence::new(kv, namespace),
            clock,
            event_tx,
            persist_failed: AtomicBool::new(false),
        }
    }

    fn lock_store(&self) -> Result<MutexGuard<'_, TimerStore>> {
        self.store.lock().map_err(|_| AppError::Lock("timer store"))
    }

    fn lock_options(&self) -> Result<MutexGuard<'_, Options>> {
        self.options.lock().map_err(|_| AppError::Lock("options"))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.event_tx.subscribe()
    }

    fn emit(&self, event: UiEvent) {
        if self.event_tx.send(event).is_err() {
            debug!("No listeners for UI event");
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Restore preferences, custom buzzer and timers from storage.
    ///
    /// Corrupt records are logged and skipped. Returns how many timers
    /// were restored.
    pub fn rehydrate(&self) -> Result<usize> {
        match self.persistence.load_options() {
            Ok(Some(options)) => {
                debug!("Restored options: {:?}", options);
                self.sound.set_enabled(options.sound);
                *self.lock_options()? = options;
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to rehydrate options: {}", e),
        }

        match self.persistence.load_buzzer() {
            Ok(Some(buzzer)) => self.sound.set_buzzer(Some(&buzzer)),
            Ok(None) => {}
            Err(e) => warn!("Failed to rehydrate buzzer: {}", e),
        }

        let now = self.now();
        let specs = match self.persistence.load_timers(now) {
            Ok(specs) => specs,
            Err(e) => {
                warn!("Failed to rehydrate timers: {}", e);
                Vec::new()
            }
        };

        let mut store = self.lock_store()?;
        let mut restored = Vec::with_capacity(specs.len());
        for spec in specs {
            match store.add(spec, now) {
                Ok(timer) => restored.push(timer),
                Err(e) => warn!("Dropping persisted timer: {}", e),
            }
        }
        store.purge_expired_before(now);
        drop(store);

        info!("Rehydrated {} timers", restored.len());
        let count = restored.len();
        for timer in restored {
            self.emit(UiEvent::TimerAdded(timer));
        }
        Ok(count)
    }

    fn persist_timers(&self, store: &TimerStore) {
        match self.persistence.save_timers(store, self.now()) {
            Ok(count) => {
                if self.persist_failed.swap(false, Ordering::SeqCst) {
                    info!("Saving timers works again");
                }
                debug!("Saved {} timers", count);
            }
            Err(e) => {
                if self.persist_failed.swap(true, Ordering::SeqCst) {
                    debug!("Still failing to save timers: {}", e);
                } else {
                    error!("Failed to save timers: {}", e);
                }
            }
        }
    }

    /// Save the current timers. Failures are reported, not returned.
    pub fn save(&self) -> Result<()> {
        let store = self.lock_store()?;
        self.persist_timers(&store);
        Ok(())
    }

    fn add(&self, spec: TimerSpec) -> Result<Timer> {
        let now = self.now();
        let mut store = self.lock_store()?;
        let timer = store.add(spec, now)?;
        self.persist_timers(&store);
        drop(store);

        info!(
            "Timer {} set for {}{}",
            timer.id,
            timer.end_time(),
            if timer.has_name() { format!(" ({})", timer.name()) } else { String::new() }
        );
        self.emit(UiEvent::TimerAdded(timer.clone()));
        Ok(timer)
    }

    /// Create a timer from a duration form.
    pub fn create_timer(&self, form: &TimerForm<'_>) -> Result<Timer> {
        let spec = timer_spec(form)?;
        self.add(spec)
    }

    /// Create an alarm from a clock-time form.
    pub fn create_alarm(&self, form: &AlarmForm<'_>) -> Result<Timer> {
        let spec = alarm_spec(form, &self.clock.local_now())?;
        self.add(spec)
    }

    /// Remove a timer. Returns whether it existed.
    pub fn remove_timer(&self, id: TimerId) -> Result<bool> {
        let mut store = self.lock_store()?;
        let removed = store.remove(id);
        self.persist_timers(&store);
        drop(store);

        if removed {
            self.sound.play(SoundKind::Break);
            self.emit(UiEvent::TimerRemoved { id });
        } else {
            debug!("Timer {} not found, nothing removed", id);
        }
        Ok(removed)
    }

    /// Rename a timer. Returns the stored name, `None` if it does not exist.
    pub fn rename_timer(&self, id: TimerId, text: &str) -> Result<Option<String>> {
        let mut store = self.lock_store()?;
        let renamed = store.rename(id, text);
        if renamed.is_some() {
            self.persist_timers(&store);
        }
        drop(store);

        if let Some(name) = &renamed {
            self.emit(UiEvent::TimerRenamed {
                id,
                name: name.clone(),
            });
        }
        Ok(renamed)
    }

    /// Remove every timer. Returns how many were removed.
    pub fn clear_all(&self) -> Result<usize> {
        let mut store = self.lock_store()?;
        let ids: Vec<TimerId> = store.list().iter().map(|t| t.id).collect();
        let removed = store.clear();
        self.persist_timers(&store);
        drop(store);

        if removed > 0 {
            self.sound.play(SoundKind::Break);
        }
        for id in ids {
            self.emit(UiEvent::TimerRemoved { id });
        }
        info!("Cleared {} timers", removed);
        Ok(removed)
    }

    /// Snapshot of the timers in display order.
    pub fn timers(&self) -> Result<Vec<Timer>> {
        Ok(self.lock_store()?.list().to_vec())
    }

    /// Run one tick at the clock's current time.
    pub fn tick(&self) -> Result<TickReport> {
        self.tick_at(self.now())
    }

    /// Run one tick at `now` and carry out what it asks for.
    pub fn tick_at(&self, now: DateTime<Utc>) -> Result<TickReport> {
        let mut engine = self.engine.lock().map_err(|_| AppError::Lock("tick engine"))?;
        let report = {
            let mut store = self.lock_store()?;
            engine.tick(&mut store, now)
        };
        drop(engine);

        for render in &report.renders {
            self.emit(UiEvent::Render(render.clone()));
        }
        if !report.expired.is_empty() {
            self.sound.play(SoundKind::Buzzer);
        }
        match report.sound {
            LoopChange::Start(interval_ms) => self.sound.start_loop(SoundKind::Tick, interval_ms),
            LoopChange::Stop => self.sound.stop_loop(),
            LoopChange::Unchanged => {}
        }
        Ok(report)
    }

    pub fn options(&self) -> Result<Options> {
        Ok(self.lock_options()?.clone())
    }

    fn update_options<F>(&self, updater: F) -> Result<Options>
    where
        F: FnOnce(&mut Options),
    {
        let mut options = self.lock_options()?;
        updater(&mut options);
        let updated = options.clone();
        drop(options);

        if let Err(e) = self.persistence.save_options(&updated) {
            error!("Failed to save options: {}", e);
        }
        Ok(updated)
    }

    /// Turn all sound on or off.
    pub fn set_sound_enabled(&self, enabled: bool) -> Result<Options> {
        info!("Setting sound to: {}", if enabled { "on" } else { "off" });
        let options = self.update_options(|o| o.sound = enabled)?;
        self.sound.set_enabled(enabled);
        Ok(options)
    }

    /// Change the warning lead offered for new timers.
    pub fn set_default_min_before(&self, minutes: u64) -> Result<Options> {
        self.update_options(|o| o.min_before = minutes)
    }

    /// Embed an audio file as the buzzer and save it.
    pub fn install_buzzer(&self, path: &Path) -> Result<BuzzerSound> {
        let buzzer = BuzzerSound::from_file(path)?;
        self.persistence.save_buzzer(&buzzer)?;
        self.sound.set_buzzer(Some(&buzzer));
        Ok(buzzer)
    }

    /// Go back to the built-in buzzer and forget the custom one.
    pub fn reset_buzzer(&self) -> Result<()> {
        self.persistence.clear_buzzer()?;
        self.sound.set_buzzer(None);
        info!("Buzzer reset to default");
        Ok(())
    }

    /// Handle a spoken command transcript.
    ///
    /// Feedback confirms only what was actually created; a command that
    /// parses but cannot be turned into a timer counts as not understood.
    pub fn handle_voice(&self, transcript: &str) -> Result<VoiceReply> {
        self.sound.play(SoundKind::Activate);
        let local_now = self.clock.local_now();
        let min_before = self.options()?.min_before;

        let created = match parse_command(transcript, &local_now) {
            Some(command) => {
                let spec = match &command {
                    VoiceCommand::Timer {
                        hours,
                        minutes,
                        seconds,
                    } => duration_spec(*hours, *minutes, *seconds, min_before, "").map_err(AppError::from),
                    VoiceCommand::Alarm { at } => Ok(TimerSpec::new(Deadline::At(*at), "", min_before)),
                };
                match spec.and_then(|spec| self.add(spec)) {
                    Ok(_) => Some(command),
                    Err(e @ (AppError::Validation(_) | AppError::Store(_))) => {
                        warn!("Voice command '{}' not usable: {}", transcript.trim(), e);
                        None
                    }
                    Err(e) => return Err(e),
                }
            }
            None => None,
        };

        let mut voice = self
            .voice
            .lock()
            .map_err(|_| AppError::Lock("voice assistant"))?;
        let reply = match created {
            Some(command) => voice.confirm(command, &local_now),
            None => {
                self.sound.play(SoundKind::End);
                voice.not_understood(transcript)
            }
        };
        Ok(reply)
    }

    /// Current time in the active readout style.
    pub fn now_text(&self) -> String {
        let format = self.now_format.lock().map(|f| *f).unwrap_or_default();
        format.render(&self.clock.local_now())
    }

    /// Switch to the next readout style and return the new text.
    pub fn cycle_now_format(&self) -> String {
        if let Ok(mut format) = self.now_format.lock() {
            *format = format.next();
        }
        self.sound.play(SoundKind::Open);
        self.now_text()
    }

    pub fn sound(&self) -> &SoundBoard {
        &self.sound
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::ManualClock,
        error::ValidationError,
        events::{Remaining, RenderEvent},
        persistence::MemoryStore,
        sound::{RecordingSound, SoundCall},
    };
    use chrono::{Duration, FixedOffset, TimeZone};

    struct Harness {
        clock: Arc<ManualClock>,
        kv: Arc<MemoryStore>,
        sound: Arc<RecordingSound>,
        state: AppState,
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 9, 20, 57, 9).unwrap()
    }

    fn harness() -> Harness {
        let clock = Arc::new(ManualClock::with_offset(
            start(),
            FixedOffset::east_opt(0).unwrap(),
        ));
        let kv = Arc::new(MemoryStore::new());
        let sound = Arc::new(RecordingSound::new());
        let state = AppState::new(clock.clone(), kv.clone(), "simple-timers", sound.clone());
        Harness {
            clock,
            kv,
            sound,
            state,
        }
    }

    fn seconds<'a>(secs: &'a str, min_before: &'a str) -> TimerForm<'a> {
        TimerForm {
            seconds: secs,
            min_before,
            ..Default::default()
        }
    }

    fn drain(rx: &mut broadcast::Receiver<UiEvent>) -> Vec<UiEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn create_emits_added_and_persists() {
        let h = harness();
        let mut rx = h.state.subscribe();

        let timer = h.state.create_timer(&seconds("90", "1")).unwrap();
        assert_eq!(timer.end_time(), start() + Duration::seconds(90));
        assert_eq!(drain(&mut rx), vec![UiEvent::TimerAdded(timer.clone())]);

        let saved = h.kv.get("simple-timers.timers").unwrap().unwrap();
        assert!(saved.contains(&(start().timestamp_millis() + 90_000).to_string()));
    }

    #[test]
    fn validation_errors_do_not_touch_store() {
        let h = harness();
        let err = h.state.create_timer(&seconds("0", "")).unwrap_err();
        assert!(matches!(err, AppError::Validation(ValidationError::EmptyDuration)));
        assert!(h.state.timers().unwrap().is_empty());
        assert!(h.kv.get("simple-timers.timers").unwrap().is_none());
    }

    #[test]
    fn alarm_uses_local_clock() {
        let h = harness();
        let timer = h
            .state
            .create_alarm(&AlarmForm {
                time: "21:30",
                min_before: "5",
                name: "call",
            })
            .unwrap();
        assert_eq!(
            timer.end_time(),
            Utc.with_ymd_and_hms(2024, 9, 9, 21, 30, 0).unwrap()
        );
        assert_eq!(timer.name(), "call");
    }

    #[test]
    fn remove_plays_break_only_when_found() {
        let h = harness();
        let timer = h.state.create_timer(&seconds("30", "")).unwrap();
        let mut rx = h.state.subscribe();

        assert!(!h.state.remove_timer(TimerId(404)).unwrap());
        assert!(h.sound.played().is_empty());

        assert!(h.state.remove_timer(timer.id).unwrap());
        assert_eq!(h.sound.played(), vec![SoundKind::Break]);
        assert_eq!(drain(&mut rx), vec![UiEvent::TimerRemoved { id: timer.id }]);
    }

    #[test]
    fn clear_all_reports_each_removal() {
        let h = harness();
        assert_eq!(h.state.clear_all().unwrap(), 0);
        assert!(h.sound.played().is_empty());

        let a = h.state.create_timer(&seconds("30", "")).unwrap();
        let b = h.state.create_timer(&seconds("10", "")).unwrap();
        let mut rx = h.state.subscribe();

        assert_eq!(h.state.clear_all().unwrap(), 2);
        assert_eq!(h.sound.played(), vec![SoundKind::Break]);
        assert_eq!(
            drain(&mut rx),
            vec![
                UiEvent::TimerRemoved { id: b.id },
                UiEvent::TimerRemoved { id: a.id },
            ]
        );
    }

    #[test]
    fn rename_emits_sanitized_name() {
        let h = harness();
        let timer = h.state.create_timer(&seconds("30", "")).unwrap();
        let mut rx = h.state.subscribe();

        assert_eq!(
            h.state.rename_timer(timer.id, "pizza\r\n").unwrap(),
            Some("pizza".to_string())
        );
        assert_eq!(h.state.rename_timer(TimerId(77), "x").unwrap(), None);
        assert_eq!(
            drain(&mut rx),
            vec![UiEvent::TimerRenamed {
                id: timer.id,
                name: "pizza".into()
            }]
        );
    }

    #[test]
    fn tick_drives_sound_and_buzzer() {
        let h = harness();
        let timer = h.state.create_timer(&seconds("12", "1")).unwrap();
        let mut rx = h.state.subscribe();

        h.state.tick().unwrap();
        assert_eq!(h.sound.repeating(), Some((SoundKind::Tick, 500)));
        assert_eq!(
            drain(&mut rx),
            vec![UiEvent::Render(RenderEvent {
                timer_id: timer.id,
                remaining: Remaining::Left("00:00:12".into()),
                urgency: Some(3),
            })]
        );

        h.clock.advance(Duration::seconds(3));
        h.state.tick().unwrap();
        assert_eq!(h.sound.repeating(), Some((SoundKind::Tick, 250)));

        h.clock.advance(Duration::seconds(9));
        let report = h.state.tick().unwrap();
        assert_eq!(report.expired, vec![timer.id]);
        assert_eq!(h.sound.played(), vec![SoundKind::Buzzer]);
        assert_eq!(h.sound.repeating(), None);

        // Ended timers stay listed until removed.
        assert!(h.state.timers().unwrap()[0].is_ended());
    }

    #[test]
    fn muting_silences_everything() {
        let h = harness();
        h.state.create_timer(&seconds("5", "1")).unwrap();
        h.state.set_sound_enabled(false).unwrap();

        h.state.tick().unwrap();
        h.clock.advance(Duration::seconds(5));
        h.state.tick().unwrap();

        assert!(h.sound.played().is_empty());
        assert_eq!(h.sound.repeating(), None);
        assert!(!h.state.options().unwrap().sound);
    }

    #[test]
    fn unmuting_resumes_loop() {
        let h = harness();
        h.state.create_timer(&seconds("50", "1")).unwrap();
        h.state.tick().unwrap();
        h.state.set_sound_enabled(false).unwrap();
        assert_eq!(h.sound.repeating(), None);

        h.state.set_sound_enabled(true).unwrap();
        assert_eq!(h.sound.repeating(), Some((SoundKind::Tick, 1000)));
    }

    #[test]
    fn rehydrate_restores_live_timers_and_options() {
        let h = harness();
        h.state.create_timer(&seconds("60", "2")).unwrap();
        h.state.create_timer(&seconds("5", "0")).unwrap();
        h.state.set_default_min_before(9).unwrap();
        h.state.set_sound_enabled(false).unwrap();

        h.clock.advance(Duration::seconds(10));
        let sound = Arc::new(RecordingSound::new());
        let fresh = AppState::new(h.clock.clone(), h.kv.clone(), "simple-timers", sound.clone());
        let mut rx = fresh.subscribe();

        assert_eq!(fresh.rehydrate().unwrap(), 1);
        let timers = fresh.timers().unwrap();
        assert_eq!(timers.len(), 1);
        assert_eq!(timers[0].end_time(), start() + Duration::seconds(60));
        assert_eq!(timers[0].min_before_warning(), 2);
        assert!(matches!(drain(&mut rx).as_slice(), [UiEvent::TimerAdded(_)]));

        let options = fresh.options().unwrap();
        assert_eq!(options.min_before, 9);
        assert!(!options.sound);
        assert!(!fresh.sound().is_enabled());
    }

    #[test]
    fn rehydrate_survives_corrupt_storage() {
        let h = harness();
        h.kv.set("simple-timers.timers", "][".into()).unwrap();
        h.kv.set("simple-timers.opts", "{\"sound\": \"loud\"}".into()).unwrap();
        assert_eq!(h.state.rehydrate().unwrap(), 0);
        assert_eq!(h.state.options().unwrap(), Options::default());
    }

    #[test]
    fn voice_creates_timer_with_default_lead() {
        let h = harness();
        let reply = h.state.handle_voice("set a 15 minute timer").unwrap();
        assert!(reply.command.is_some());

        let timers = h.state.timers().unwrap();
        assert_eq!(timers.len(), 1);
        assert_eq!(timers[0].end_time(), start() + Duration::minutes(15));
        assert_eq!(timers[0].min_before_warning(), 5);
        assert_eq!(h.sound.played(), vec![SoundKind::Activate]);
    }

    #[test]
    fn voice_not_understood_plays_end() {
        let h = harness();
        let reply = h.state.handle_voice("make coffee").unwrap();
        assert!(reply.command.is_none());
        assert!(h.state.timers().unwrap().is_empty());
        assert_eq!(h.sound.played(), vec![SoundKind::Activate, SoundKind::End]);
    }

    #[test]
    fn voice_timer_out_of_range_is_not_confirmed() {
        let h = harness();
        let reply = h
            .state
            .handle_voice("set a timer for 99999999999999999 hours")
            .unwrap();
        assert!(reply.command.is_none());
        assert!(reply.feedback.starts_with("You said:"), "{}", reply.feedback);
        assert!(h.state.timers().unwrap().is_empty());
        assert_eq!(h.sound.played(), vec![SoundKind::Activate, SoundKind::End]);
    }

    #[test]
    fn cycling_now_format_plays_open() {
        let h = harness();
        assert_eq!(h.state.now_text(), "Monday, September 9th 2024, 8:57:09 PM");
        assert_eq!(h.state.cycle_now_format(), "September 9th 2024, 8:57:09 PM");
        assert_eq!(h.sound.played(), vec![SoundKind::Open]);
    }

    #[test]
    fn installing_buzzer_saves_and_notifies_adapter() {
        let h = harness();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bell.wav");
        std::fs::write(&path, b"RIFF....WAVE").unwrap();

        let buzzer = h.state.install_buzzer(&path).unwrap();
        assert_eq!(buzzer.name, "bell.wav");
        assert!(h.kv.get("simple-timers.buzzer").unwrap().is_some());
        assert_eq!(
            h.sound.calls(),
            vec![SoundCall::SetBuzzer(Some("bell.wav".into()))]
        );

        h.state.reset_buzzer().unwrap();
        assert!(h.kv.get("simple-timers.buzzer").unwrap().is_none());
        assert_eq!(h.sound.calls().last(), Some(&SoundCall::SetBuzzer(None)));

        // A fresh start no longer picks up the old buzzer.
        let sound = Arc::new(RecordingSound::new());
        let fresh = AppState::new(h.clock.clone(), h.kv.clone(), "simple-timers", sound.clone());
        fresh.rehydrate().unwrap();
        assert!(sound.calls().is_empty());
    }

    #[test]
    fn persistence_failure_does_not_block_timers() {
        struct BrokenStore;
        impl KeyValueStore for BrokenStore {
            fn get(&self, _: &str) -> std::result::Result<Option<String>, crate::error::PersistenceError> {
                Ok(None)
            }
            fn set(&self, key: &str, _: String) -> std::result::Result<(), crate::error::PersistenceError> {
                Err(crate::error::PersistenceError::Corrupt {
                    key: key.into(),
                    message: "quota exceeded".into(),
                })
            }
            fn remove(&self, _: &str) -> std::result::Result<(), crate::error::PersistenceError> {
                Ok(())
            }
        }

        let clock = Arc::new(ManualClock::new(start()));
        let state = AppState::new(clock, Arc::new(BrokenStore), "simple-timers", Arc::new(RecordingSound::new()));
        let timer = state.create_timer(&seconds("30", "")).unwrap();
        state.create_timer(&seconds("40", "")).unwrap();
        assert_eq!(state.timers().unwrap().len(), 2);
        assert!(state.remove_timer(timer.id).unwrap());
        assert_eq!(state.timers().unwrap().len(), 1);
    }
}
