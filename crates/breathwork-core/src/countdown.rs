//! Countdown timer wrapping a breathing session.
//!
//! Like the breathing engine this is driven by `poll(now)`. It only reports
//! progress; starting and stopping the engine around it is the session's job.

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::clock::timestamp;
use crate::error::{CoreError, Result};
use crate::events::Event;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
pub const DEFAULT_MAX_MINUTES: u32 = 60;

/// Remaining/elapsed seconds as `m:ss`.
pub fn format_mm_ss(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSession {
    pub id: Uuid,
    pub total_secs: u64,
    pub started_at_ms: u64,
}

impl TimerSession {
    pub fn total_ms(&self) -> u64 {
        self.total_secs.saturating_mul(1000)
    }

    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.started_at_ms)
    }

    /// `min(elapsed / total, 1.0)`
    pub fn fraction(&self, now_ms: u64) -> f64 {
        let total = self.total_ms();
        if total == 0 {
            return 1.0;
        }
        (self.elapsed_ms(now_ms) as f64 / total as f64).min(1.0)
    }

    /// Whole seconds left, rounded up so the display reads 0:00 only at the end.
    pub fn remaining_secs(&self, now_ms: u64) -> u64 {
        self.total_ms()
            .saturating_sub(self.elapsed_ms(now_ms))
            .div_ceil(1000)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownSettings {
    pub poll_interval_ms: u64,
    pub max_minutes: u32,
}

impl Default for CountdownSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_minutes: DEFAULT_MAX_MINUTES,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CountdownTimer {
    settings: CountdownSettings,
    session: Option<TimerSession>,
    last_report_ms: u64,
}

impl CountdownTimer {
    pub fn new(settings: CountdownSettings) -> Self {
        Self {
            settings,
            session: None,
            last_report_ms: 0,
        }
    }

    pub fn session(&self) -> Option<&TimerSession> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn fraction(&self, now_ms: u64) -> Option<f64> {
        self.session.as_ref().map(|s| s.fraction(now_ms))
    }

    /// Start a countdown of `minutes`. Any running countdown is cancelled
    /// first and reported as such. Rejected durations leave state untouched.
    pub fn start(&mut self, minutes: i64, now_ms: u64) -> Result<Vec<Event>> {
        let max = self.settings.max_minutes;
        if minutes <= 0 || minutes > i64::from(max) {
            return Err(CoreError::InvalidDuration { minutes, max });
        }

        let mut events = Vec::new();
        events.extend(self.cancel(now_ms));

        let session = TimerSession {
            id: Uuid::new_v4(),
            total_secs: minutes as u64 * 60,
            started_at_ms: now_ms,
        };
        info!(session_id = %session.id, minutes, "countdown started");
        events.push(Event::CountdownStarted {
            session_id: session.id,
            total_secs: session.total_secs,
            at: timestamp(now_ms),
        });
        events.push(Self::progress(&session, now_ms));
        self.last_report_ms = now_ms;
        self.session = Some(session);
        Ok(events)
    }

    /// Report progress at most once per poll interval. On reaching the end
    /// emits a final progress of exactly 1.0 followed by the completion, both
    /// stamped with the scheduled end, then clears the session.
    pub fn poll(&mut self, now_ms: u64) -> Vec<Event> {
        let Some(session) = self.session.as_ref() else {
            return Vec::new();
        };

        if session.elapsed_ms(now_ms) >= session.total_ms() {
            let id = session.id;
            let total_secs = session.total_secs;
            let ends_at = timestamp(session.started_at_ms.saturating_add(session.total_ms()));
            self.session = None;
            info!(session_id = %id, "countdown completed");
            return vec![
                Event::CountdownProgress {
                    session_id: id,
                    fraction: 1.0,
                    remaining: format_mm_ss(0),
                    at: ends_at,
                },
                Event::CountdownCompleted {
                    session_id: id,
                    total_secs,
                    at: ends_at,
                },
            ];
        }

        if now_ms.saturating_sub(self.last_report_ms) < self.settings.poll_interval_ms {
            return Vec::new();
        }
        self.last_report_ms = now_ms;
        vec![Self::progress(session, now_ms)]
    }

    /// Drop the session without completion effects. No session: no-op.
    pub fn cancel(&mut self, now_ms: u64) -> Option<Event> {
        let session = self.session.take()?;
        info!(session_id = %session.id, "countdown cancelled");
        Some(Event::CountdownCancelled {
            session_id: session.id,
            fraction: session.fraction(now_ms),
            at: timestamp(now_ms),
        })
    }

    fn progress(session: &TimerSession, now_ms: u64) -> Event {
        Event::CountdownProgress {
            session_id: session.id,
            fraction: session.fraction(now_ms),
            remaining: format_mm_ss(session.remaining_secs(now_ms)),
            at: timestamp(now_ms),
        }
    }
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new(CountdownSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: u64 = 1_700_000_000_000;

    fn completions(events: &[Event]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, Event::CountdownCompleted { .. }))
            .count()
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_mm_ss(0), "0:00");
        assert_eq!(format_mm_ss(59), "0:59");
        assert_eq!(format_mm_ss(61), "1:01");
        assert_eq!(format_mm_ss(600), "10:00");
    }

    #[test]
    fn non_positive_minutes_are_rejected() {
        let mut timer = CountdownTimer::default();
        for minutes in [0, -5] {
            assert!(matches!(
                timer.start(minutes, T0),
                Err(CoreError::InvalidDuration { .. })
            ));
        }
        assert!(!timer.is_active());
    }

    #[test]
    fn minutes_above_max_are_rejected() {
        let mut timer = CountdownTimer::default();
        assert!(timer.start(61, T0).is_err());
        assert!(timer.start(60, T0).is_ok());
    }

    #[test]
    fn one_minute_completes_once_at_full_progress() {
        let mut timer = CountdownTimer::default();
        timer.start(1, T0).unwrap();
        let mut all = Vec::new();
        let mut t = T0;
        while t <= T0 + 61_000 {
            all.extend(timer.poll(t));
            t += 100;
        }
        assert_eq!(completions(&all), 1);
        let last_fraction = all
            .iter()
            .rev()
            .find_map(|e| match e {
                Event::CountdownProgress { fraction, .. } => Some(*fraction),
                _ => None,
            })
            .unwrap();
        assert_eq!(last_fraction, 1.0);
        assert!(!timer.is_active());
    }

    #[test]
    fn late_poll_stamps_completion_at_scheduled_end() {
        let mut timer = CountdownTimer::default();
        timer.start(1, T0).unwrap();
        let events = timer.poll(T0 + 65_000);
        assert_eq!(completions(&events), 1);
        let end = (T0 + 60_000) as i64;
        assert!(events.iter().all(|e| e.at().timestamp_millis() == end));
    }

    #[test]
    fn progress_is_throttled_to_poll_interval() {
        let mut timer = CountdownTimer::default();
        timer.start(1, T0).unwrap();
        assert!(timer.poll(T0 + 50).is_empty());
        assert_eq!(timer.poll(T0 + 100).len(), 1);
        assert!(timer.poll(T0 + 150).is_empty());
    }

    #[test]
    fn remaining_is_rounded_up() {
        let mut timer = CountdownTimer::default();
        timer.start(1, T0).unwrap();
        match timer.poll(T0 + 30_500).as_slice() {
            [Event::CountdownProgress {
                fraction,
                remaining,
                ..
            }] => {
                assert!((fraction - 30.5 / 60.0).abs() < 1e-9);
                assert_eq!(remaining, "0:30");
            }
            other => panic!("Expected one progress event, got {other:?}"),
        }
    }

    #[test]
    fn cancel_mid_way_never_completes() {
        let mut timer = CountdownTimer::default();
        timer.start(1, T0).unwrap();
        timer.poll(T0 + 30_000);
        assert!(timer.cancel(T0 + 30_000).is_some());
        let after = timer.poll(T0 + 120_000);
        assert_eq!(completions(&after), 0);
        assert!(timer.cancel(T0 + 120_000).is_none());
    }

    #[test]
    fn restart_cancels_previous_session() {
        let mut timer = CountdownTimer::default();
        timer.start(5, T0).unwrap();
        let first = timer.session().unwrap().id;
        let events = timer.start(1, T0 + 1_000).unwrap();
        assert!(matches!(
            events.first(),
            Some(Event::CountdownCancelled { session_id, .. }) if *session_id == first
        ));
        assert_ne!(timer.session().unwrap().id, first);
        assert_eq!(timer.session().unwrap().total_secs, 60);
    }
}
