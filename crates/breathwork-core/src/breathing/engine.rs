//! Breathing cycle engine.
//!
//! The engine is a wall-clock-based state machine. It does not use internal
//! threads or timer handles - the caller is responsible for calling `tick()`
//! periodically, and every boundary crossed since the previous tick is
//! reported in order.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Inhale -> HoldIn -> Exhale -> HoldOut -> Inhale -> ...
//!   ^                                                  |
//!   +------------------------ stop() -----------------+
//! ```
//!
//! Exactly one deadline is pending while running: the next phase boundary.
//! Stopping or switching patterns replaces it, so a transition computed
//! from a previous pattern can never be emitted.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = BreathingEngine::new(pattern);
//! engine.start(now_ms());
//! // In a loop:
//! for event in engine.tick(now_ms()) { /* render */ }
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::phase::{Phase, PAUSED_INSTRUCTION};
use crate::clock::timestamp;
use crate::events::Event;
use crate::pattern::BreathingPattern;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    Idle,
    Running,
}

/// Position inside the running cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Cursor {
    phase: Phase,
    /// Completed cycles since the last (re)start.
    cycle: u64,
    /// Epoch ms at which the current cycle's inhale began.
    cycle_start_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreathingEngine {
    pattern: BreathingPattern,
    /// `None` while idle.
    cursor: Option<Cursor>,
}

impl BreathingEngine {
    pub fn new(pattern: BreathingPattern) -> Self {
        Self {
            pattern,
            cursor: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> EngineState {
        if self.cursor.is_some() {
            EngineState::Running
        } else {
            EngineState::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn pattern(&self) -> &BreathingPattern {
        &self.pattern
    }

    /// Current phase, `None` while idle.
    pub fn phase(&self) -> Option<Phase> {
        self.cursor.map(|c| c.phase)
    }

    pub fn cycle(&self) -> Option<u64> {
        self.cursor.map(|c| c.cycle)
    }

    /// The single pending phase boundary (epoch ms), `None` while idle.
    pub fn pending_deadline(&self) -> Option<u64> {
        self.cursor.map(|c| self.deadline_after(&c))
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn phase_progress(&self, now_ms: u64) -> f64 {
        let Some(cursor) = self.cursor else {
            return 0.0;
        };
        let len = self.pattern.phase_ms(cursor.phase.index());
        let began = cursor.cycle_start_ms + self.pattern.offset_ms(cursor.phase.index());
        if len == 0 {
            return 0.0;
        }
        (now_ms.saturating_sub(began) as f64 / len as f64).min(1.0)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a cycle at `now_ms`. Already running: no-op, no events.
    pub fn start(&mut self, now_ms: u64) -> Vec<Event> {
        if self.is_running() {
            debug!("breathing engine already running; start ignored");
            return Vec::new();
        }
        let cursor = Cursor {
            phase: Phase::Inhale,
            cycle: 0,
            cycle_start_ms: now_ms,
        };
        self.cursor = Some(cursor);
        debug!(pattern = self.pattern.id(), "breathing engine started");
        vec![
            Event::BreathingStarted {
                pattern_id: self.pattern.id().to_string(),
                cycle_ms: self.pattern.total_ms(),
                at: timestamp(now_ms),
            },
            self.phase_event(&cursor, now_ms),
        ]
    }

    /// Drop the pending boundary and go idle. Idle: no-op.
    pub fn stop(&mut self, now_ms: u64) -> Option<Event> {
        let cursor = self.cursor.take()?;
        debug!(cycle = cursor.cycle, "breathing engine stopped");
        Some(Event::BreathingStopped {
            instruction: PAUSED_INSTRUCTION.to_string(),
            cycles_completed: cursor.cycle,
            at: timestamp(now_ms),
        })
    }

    /// Replace the pattern. While running the cycle restarts at `now_ms`
    /// with the new durations and the engine never reports itself stopped.
    pub fn switch_pattern(&mut self, pattern: BreathingPattern, now_ms: u64) -> Vec<Event> {
        let from = std::mem::replace(&mut self.pattern, pattern);
        let restarted = self.is_running();
        let mut events = vec![Event::PatternSwitched {
            from: from.id().to_string(),
            to: self.pattern.id().to_string(),
            restarted,
            at: timestamp(now_ms),
        }];
        if restarted {
            let cursor = Cursor {
                phase: Phase::Inhale,
                cycle: 0,
                cycle_start_ms: now_ms,
            };
            self.cursor = Some(cursor);
            events.push(self.phase_event(&cursor, now_ms));
        }
        debug!(from = from.id(), to = self.pattern.id(), restarted, "pattern switched");
        events
    }

    /// Call periodically. Returns every phase change due at or before `now_ms`.
    pub fn tick(&mut self, now_ms: u64) -> Vec<Event> {
        let mut events = Vec::new();
        let Some(mut cursor) = self.cursor else {
            return events;
        };

        let total = self.pattern.total_ms();
        let deadline = self.deadline_after(&cursor);
        if total > 0 && now_ms >= deadline.saturating_add(total) {
            // More than a whole cycle behind (host suspended?): skip the
            // missed cycles rather than replaying them.
            let skipped = (now_ms - deadline) / total;
            cursor.cycle_start_ms += skipped * total;
            cursor.cycle += skipped;
            debug!(skipped, "breathing engine fell behind; skipping cycles");
        }

        loop {
            let deadline = self.deadline_after(&cursor);
            if now_ms < deadline {
                break;
            }
            cursor.phase = cursor.phase.next();
            if cursor.phase == Phase::Inhale {
                cursor.cycle_start_ms += total;
                cursor.cycle += 1;
            }
            events.push(self.phase_event(&cursor, deadline));
        }

        self.cursor = Some(cursor);
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn deadline_after(&self, cursor: &Cursor) -> u64 {
        cursor.cycle_start_ms + self.pattern.offset_ms(cursor.phase.index() + 1)
    }

    fn phase_event(&self, cursor: &Cursor, at_ms: u64) -> Event {
        Event::PhaseChanged {
            phase: cursor.phase,
            instruction: cursor.phase.instruction().to_string(),
            duration_secs: self.pattern.durations()[cursor.phase.index()],
            cycle: cursor.cycle,
            pattern_id: self.pattern.id().to_string(),
            at: timestamp(at_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: u64 = 1_700_000_000_000;

    fn engine(d: [u32; 4]) -> BreathingEngine {
        BreathingEngine::new(BreathingPattern::new("test", d).unwrap())
    }

    fn phases(events: &[Event]) -> Vec<Phase> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::PhaseChanged { phase, .. } => Some(*phase),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn start_emits_inhale_immediately() {
        let mut e = engine([4, 7, 8, 4]);
        assert_eq!(e.state(), EngineState::Idle);
        let events = e.start(T0);
        assert_eq!(phases(&events), vec![Phase::Inhale]);
        assert_eq!(e.state(), EngineState::Running);
        assert_eq!(e.pending_deadline(), Some(T0 + 4_000));
    }

    #[test]
    fn double_start_is_noop() {
        let mut e = engine([4, 7, 8, 4]);
        e.start(T0);
        assert!(e.start(T0 + 1_000).is_empty());
        assert_eq!(e.pending_deadline(), Some(T0 + 4_000));
    }

    #[test]
    fn tick_before_deadline_is_silent() {
        let mut e = engine([4, 7, 8, 4]);
        e.start(T0);
        assert!(e.tick(T0 + 3_999).is_empty());
        assert_eq!(phases(&e.tick(T0 + 4_000)), vec![Phase::HoldIn]);
    }

    #[test]
    fn late_tick_reports_each_boundary_in_order() {
        let mut e = engine([4, 7, 8, 4]);
        e.start(T0);
        let events = e.tick(T0 + 20_000);
        assert_eq!(
            phases(&events),
            vec![Phase::HoldIn, Phase::Exhale, Phase::HoldOut]
        );
        let stamps: Vec<i64> = events.iter().map(|e| e.at().timestamp_millis()).collect();
        let base = T0 as i64;
        assert_eq!(stamps, vec![base + 4_000, base + 11_000, base + 19_000]);
    }

    #[test]
    fn cycle_wraps_to_inhale() {
        let mut e = engine([1, 1, 1, 1]);
        e.start(T0);
        e.tick(T0 + 3_000);
        let events = e.tick(T0 + 4_000);
        assert_eq!(phases(&events), vec![Phase::Inhale]);
        assert_eq!(e.cycle(), Some(1));
        assert_eq!(e.pending_deadline(), Some(T0 + 5_000));
    }

    #[test]
    fn far_behind_tick_skips_whole_cycles() {
        let mut e = engine([1, 1, 1, 1]);
        e.start(T0);
        let events = e.tick(T0 + 100_500);
        assert!(events.len() <= 4, "replayed {} transitions", events.len());
        assert_eq!(e.phase(), Some(Phase::Inhale));
        assert_eq!(e.cycle(), Some(25));
        assert_eq!(e.pending_deadline(), Some(T0 + 101_000));
    }

    #[test]
    fn stop_is_noop_when_idle() {
        let mut e = engine([4, 7, 8, 4]);
        assert!(e.stop(T0).is_none());
        e.start(T0);
        assert!(e.stop(T0 + 10).is_some());
        assert!(e.stop(T0 + 20).is_none());
    }

    #[test]
    fn stop_cancels_pending_boundary() {
        let mut e = engine([4, 7, 8, 4]);
        e.start(T0);
        e.stop(T0 + 1_000);
        assert_eq!(e.pending_deadline(), None);
        assert!(e.tick(T0 + 60_000).is_empty());
    }

    #[test]
    fn switch_while_running_restarts_without_stopping() {
        let mut e = engine([6, 6, 6, 6]);
        e.start(T0);
        let next = BreathingPattern::new("fast", [1, 2, 3, 4]).unwrap();
        let events = e.switch_pattern(next, T0 + 5_000);
        assert!(events
            .iter()
            .all(|e| !matches!(e, Event::BreathingStopped { .. })));
        assert_eq!(phases(&events), vec![Phase::Inhale]);
        assert!(e.is_running());
        assert_eq!(e.pending_deadline(), Some(T0 + 6_000));
        // The old 6 s boundary at T0 + 6_000 coincides; the emitted phase
        // must come from the new pattern's schedule.
        let events = e.tick(T0 + 6_000);
        assert_eq!(phases(&events), vec![Phase::HoldIn]);
        match &events[0] {
            Event::PhaseChanged {
                duration_secs,
                pattern_id,
                ..
            } => {
                assert_eq!(*duration_secs, 2);
                assert_eq!(pattern_id, "fast");
            }
            other => panic!("Expected PhaseChanged, got {other:?}"),
        }
    }

    #[test]
    fn switch_while_idle_only_stores_pattern() {
        let mut e = engine([6, 6, 6, 6]);
        let next = BreathingPattern::new("fast", [1, 2, 3, 4]).unwrap();
        let events = e.switch_pattern(next, T0);
        assert_eq!(events.len(), 1);
        assert!(!e.is_running());
        assert_eq!(e.pattern().id(), "fast");
        e.start(T0 + 10);
        assert_eq!(e.pending_deadline(), Some(T0 + 1_010));
    }

    #[test]
    fn phase_progress_tracks_elapsed_fraction() {
        let mut e = engine([4, 4, 4, 4]);
        assert_eq!(e.phase_progress(T0), 0.0);
        e.start(T0);
        assert!((e.phase_progress(T0 + 1_000) - 0.25).abs() < 1e-9);
    }
}
