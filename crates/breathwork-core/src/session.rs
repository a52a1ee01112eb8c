//! Session orchestration.
//!
//! A [`Session`] owns one breathing engine, stage tracker, countdown, audio
//! controller and message rotator. Front ends send [`Command`]s and call
//! [`Session::tick`] periodically; both return the ordered events to render.
//! Every event is also shown to the audio controller, so cues and drones
//! follow exactly what the front end sees.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::audio::{AudioBackend, AudioController};
use crate::breathing::BreathingEngine;
use crate::clock::timestamp;
use crate::countdown::CountdownTimer;
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::messages::MessageRotator;
use crate::pattern::PatternTable;
use crate::stage::{SessionStage, StageTracker};
use crate::storage::Config;

/// Inputs from a presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Start,
    Stop,
    Toggle,
    SelectPattern { id: String },
    ToggleAudio,
    StartCountdown { minutes: i64 },
    CancelCountdown,
    Snapshot,
}

#[derive(Debug)]
pub struct Session<B> {
    patterns: PatternTable,
    engine: BreathingEngine,
    stage: StageTracker,
    countdown: CountdownTimer,
    audio: AudioController<B>,
    messages: MessageRotator,
    lock_controls: bool,
}

impl<B: AudioBackend> Session<B> {
    /// New session loaded at `now_ms`, messages seeded from the OS RNG.
    pub fn new(config: &Config, backend: B, now_ms: u64) -> Result<Self> {
        Self::with_seed(config, backend, now_ms, rand::random())
    }

    pub fn with_seed(config: &Config, backend: B, now_ms: u64, seed: u64) -> Result<Self> {
        config.validate()?;
        let patterns = config.pattern_table()?;
        let pattern = patterns.lookup(&config.breathing.default_pattern)?.clone();
        info!(pattern = pattern.id(), audio = config.audio.enabled, "session created");
        Ok(Self {
            engine: BreathingEngine::new(pattern),
            patterns,
            stage: StageTracker::new(now_ms, config.stage_thresholds()),
            countdown: CountdownTimer::new(config.countdown_settings()),
            audio: AudioController::new(backend, config.audio.enabled),
            messages: MessageRotator::new(seed, config.messages.rotate_interval_ms, now_ms),
            lock_controls: config.stage.lock_controls,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn engine(&self) -> &BreathingEngine {
        &self.engine
    }

    pub fn stage(&self) -> SessionStage {
        self.stage.stage()
    }

    pub fn countdown(&self) -> &CountdownTimer {
        &self.countdown
    }

    pub fn audio(&self) -> &AudioController<B> {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut AudioController<B> {
        &mut self.audio
    }

    pub fn patterns(&self) -> &PatternTable {
        &self.patterns
    }

    pub fn snapshot(&self, now_ms: u64) -> Event {
        Event::Snapshot {
            engine: self.engine.state(),
            phase: self.engine.phase(),
            phase_progress: self.engine.phase_progress(now_ms),
            pattern_id: self.engine.pattern().id().to_string(),
            stage: self.stage.stage(),
            audio_enabled: self.audio.enabled(),
            countdown_fraction: self.countdown.fraction(now_ms),
            at: timestamp(now_ms),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Apply a command. Rejected commands change nothing.
    pub fn handle(&mut self, command: Command, now_ms: u64) -> Result<Vec<Event>> {
        debug!(?command, "session command");
        let events = match command {
            Command::Start => self.engine.start(now_ms),
            Command::Stop => self.stop_breathing(now_ms),
            Command::Toggle => {
                if self.engine.is_running() {
                    self.stop_breathing(now_ms)
                } else {
                    self.engine.start(now_ms)
                }
            }
            Command::SelectPattern { id } => {
                self.ensure_unlocked()?;
                let pattern = self.patterns.lookup(&id)?.clone();
                self.engine.switch_pattern(pattern, now_ms)
            }
            Command::ToggleAudio => {
                self.ensure_unlocked()?;
                self.audio.toggle(now_ms)
            }
            Command::StartCountdown { minutes } => {
                let mut events = self.countdown.start(minutes, now_ms)?;
                events.extend(self.engine.start(now_ms));
                events
            }
            Command::CancelCountdown => self.countdown.cancel(now_ms).into_iter().collect(),
            Command::Snapshot => vec![self.snapshot(now_ms)],
        };
        Ok(self.dispatch(events, now_ms))
    }

    /// Call periodically (tens of milliseconds is plenty).
    pub fn tick(&mut self, now_ms: u64) -> Vec<Event> {
        let mut events = self.stage.tick(now_ms);
        events.extend(self.engine.tick(now_ms));

        let countdown = self.countdown.poll(now_ms);
        let completed = countdown
            .iter()
            .any(|e| matches!(e, Event::CountdownCompleted { .. }));
        events.extend(countdown);
        if completed {
            events.extend(self.engine.stop(now_ms));
        }

        events.extend(self.messages.tick(now_ms, self.stage.stage()));
        self.dispatch(events, now_ms)
    }

    /// Stop everything and release the audio graph.
    pub fn shutdown(&mut self, now_ms: u64) -> Vec<Event> {
        let events = self.stop_breathing(now_ms);
        let events = self.dispatch(events, now_ms);
        self.audio.shutdown();
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn ensure_unlocked(&self) -> Result<()> {
        let stage = self.stage.stage();
        if self.lock_controls && stage != SessionStage::Active {
            return Err(CoreError::ControlsLocked { stage });
        }
        Ok(())
    }

    /// Stopping by hand also drops a running countdown.
    fn stop_breathing(&mut self, now_ms: u64) -> Vec<Event> {
        let mut events: Vec<Event> = self.countdown.cancel(now_ms).into_iter().collect();
        events.extend(self.engine.stop(now_ms));
        events
    }

    fn dispatch(&mut self, events: Vec<Event>, now_ms: u64) -> Vec<Event> {
        let mut out = Vec::with_capacity(events.len());
        for event in events {
            let audio = self.audio.observe(&event, now_ms);
            out.push(event);
            out.extend(audio);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SilentBackend;
    use crate::breathing::EngineState;

    const T0: u64 = 1_700_000_000_000;
    const ACTIVE: u64 = T0 + 20_001;

    fn session() -> Session<SilentBackend> {
        Session::with_seed(&Config::default(), SilentBackend::new(), T0, 1).unwrap()
    }

    #[test]
    fn toggle_starts_and_stops() {
        let mut s = session();
        s.handle(Command::Toggle, T0).unwrap();
        assert_eq!(s.engine().state(), EngineState::Running);
        assert!(s.audio().backend().graph_open());
        s.handle(Command::Toggle, T0 + 1_000).unwrap();
        assert_eq!(s.engine().state(), EngineState::Idle);
        assert!(!s.audio().backend().graph_open());
    }

    #[test]
    fn controls_locked_until_active() {
        let mut s = session();
        let err = s
            .handle(Command::SelectPattern { id: "4-7-8".into() }, T0 + 1_000)
            .unwrap_err();
        assert!(matches!(err, CoreError::ControlsLocked { stage: SessionStage::Arrival }));
        s.tick(ACTIVE);
        assert!(s
            .handle(Command::SelectPattern { id: "4-7-8".into() }, ACTIVE)
            .is_ok());
        assert_eq!(s.engine().pattern().id(), "4-7-8");
    }

    #[test]
    fn unknown_pattern_keeps_previous() {
        let mut s = session();
        s.tick(ACTIVE);
        let err = s
            .handle(Command::SelectPattern { id: "nope".into() }, ACTIVE)
            .unwrap_err();
        assert!(matches!(err, CoreError::UnknownPattern(_)));
        assert_eq!(s.engine().pattern().id(), "6-6-6-6");
    }

    #[test]
    fn unlocked_config_allows_early_controls() {
        let mut cfg = Config::default();
        cfg.stage.lock_controls = false;
        let mut s = Session::with_seed(&cfg, SilentBackend::new(), T0, 1).unwrap();
        assert!(s.handle(Command::ToggleAudio, T0).is_ok());
        assert!(!s.audio().enabled());
    }

    #[test]
    fn manual_stop_cancels_countdown() {
        let mut s = session();
        s.handle(Command::StartCountdown { minutes: 1 }, T0).unwrap();
        let events = s.handle(Command::Stop, T0 + 5_000).unwrap();
        assert!(matches!(events.first(), Some(Event::CountdownCancelled { .. })));
        assert!(!s.countdown().is_active());
    }

    #[test]
    fn snapshot_reflects_state() {
        let mut s = session();
        s.handle(Command::Start, T0).unwrap();
        match s.snapshot(T0 + 3_000) {
            Event::Snapshot {
                engine,
                phase,
                phase_progress,
                pattern_id,
                stage,
                countdown_fraction,
                ..
            } => {
                assert_eq!(engine, EngineState::Running);
                assert_eq!(phase, Some(crate::breathing::Phase::Inhale));
                assert!((phase_progress - 0.5).abs() < 1e-9);
                assert_eq!(pattern_id, "6-6-6-6");
                assert_eq!(stage, SessionStage::Arrival);
                assert_eq!(countdown_fraction, None);
            }
            other => panic!("Expected Snapshot, got {other:?}"),
        }
    }

    #[test]
    fn first_tick_shows_a_message() {
        let mut s = session();
        let events = s.tick(T0);
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::MessageRotated { stage: SessionStage::Arrival, .. })));
    }
}
