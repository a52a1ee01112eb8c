use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::breathing::{EngineState, Phase};
use crate::stage::{Reveal, SessionStage};

/// Every state change in the core produces an Event.
/// Presentation layers render them; the audio controller reacts to them.
///
/// `at` is the instant the change was scheduled for, which may be earlier
/// than the tick that reported it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    BreathingStarted {
        pattern_id: String,
        cycle_ms: u64,
        at: DateTime<Utc>,
    },
    PhaseChanged {
        phase: Phase,
        instruction: String,
        /// Length of this phase; drives the shape's transition duration.
        duration_secs: u32,
        cycle: u64,
        pattern_id: String,
        at: DateTime<Utc>,
    },
    BreathingStopped {
        instruction: String,
        cycles_completed: u64,
        at: DateTime<Utc>,
    },
    PatternSwitched {
        from: String,
        to: String,
        /// True when the running cycle restarted with the new durations.
        restarted: bool,
        at: DateTime<Utc>,
    },
    StageChanged {
        stage: SessionStage,
        reveal: Reveal,
        at: DateTime<Utc>,
    },
    CountdownStarted {
        session_id: Uuid,
        total_secs: u64,
        at: DateTime<Utc>,
    },
    CountdownProgress {
        session_id: Uuid,
        /// 0.0 ..= 1.0
        fraction: f64,
        /// Remaining time as `m:ss`.
        remaining: String,
        at: DateTime<Utc>,
    },
    CountdownCompleted {
        session_id: Uuid,
        total_secs: u64,
        at: DateTime<Utc>,
    },
    CountdownCancelled {
        session_id: Uuid,
        fraction: f64,
        at: DateTime<Utc>,
    },
    AudioStateChanged {
        enabled: bool,
        /// Platform refused audio; running visual-only until re-toggled.
        degraded: bool,
        at: DateTime<Utc>,
    },
    MessageRotated {
        stage: SessionStage,
        message: String,
        at: DateTime<Utc>,
    },
    Snapshot {
        engine: EngineState,
        phase: Option<Phase>,
        /// 0.0 ..= 1.0 through the current phase; 0.0 while idle.
        phase_progress: f64,
        pattern_id: String,
        stage: SessionStage,
        audio_enabled: bool,
        countdown_fraction: Option<f64>,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::BreathingStarted { at, .. }
            | Event::PhaseChanged { at, .. }
            | Event::BreathingStopped { at, .. }
            | Event::PatternSwitched { at, .. }
            | Event::StageChanged { at, .. }
            | Event::CountdownStarted { at, .. }
            | Event::CountdownProgress { at, .. }
            | Event::CountdownCompleted { at, .. }
            | Event::CountdownCancelled { at, .. }
            | Event::AudioStateChanged { at, .. }
            | Event::MessageRotated { at, .. }
            | Event::Snapshot { at, .. } => *at,
        }
    }

    /// Short human-readable rendering for line-oriented front ends.
    pub fn describe(&self) -> String {
        match self {
            Event::BreathingStarted { pattern_id, .. } => format!("started ({pattern_id})"),
            Event::PhaseChanged {
                instruction,
                duration_secs,
                ..
            } => format!("{instruction} ({duration_secs}s)"),
            Event::BreathingStopped { instruction, .. } => instruction.clone(),
            Event::PatternSwitched { to, .. } => format!("pattern {to}"),
            Event::StageChanged { stage, reveal, .. } => match &reveal.instruction {
                Some(text) => format!("[{stage}] {text}"),
                None => format!("[{stage}]"),
            },
            Event::CountdownStarted { total_secs, .. } => {
                format!("timer started ({})", crate::countdown::format_mm_ss(*total_secs))
            }
            Event::CountdownProgress {
                fraction, remaining, ..
            } => format!("timer {remaining} ({:.0}%)", fraction * 100.0),
            Event::CountdownCompleted { .. } => "timer complete".to_string(),
            Event::CountdownCancelled { .. } => "timer cancelled".to_string(),
            Event::AudioStateChanged {
                enabled, degraded, ..
            } => match (enabled, degraded) {
                (true, false) => "audio on".to_string(),
                (true, true) => "audio unavailable (visual only)".to_string(),
                (false, _) => "audio off".to_string(),
            },
            Event::MessageRotated { message, .. } => message.clone(),
            Event::Snapshot {
                engine,
                phase,
                phase_progress,
                pattern_id,
                stage,
                audio_enabled,
                countdown_fraction,
                ..
            } => {
                let phase = phase
                    .map(|p| format!("{p} {:.0}%", phase_progress * 100.0))
                    .unwrap_or_else(|| "-".into());
                let timer = countdown_fraction
                    .map(|f| format!("{:.0}%", f * 100.0))
                    .unwrap_or_else(|| "-".into());
                format!(
                    "engine={engine:?} phase=({phase}) pattern={pattern_id} stage={stage} audio={audio_enabled} timer={timer}"
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::timestamp;

    #[test]
    fn serializes_with_snake_case_tag() {
        let event = Event::PhaseChanged {
            phase: Phase::HoldIn,
            instruction: "Hold...".into(),
            duration_secs: 7,
            cycle: 0,
            pattern_id: "4-7-8".into(),
            at: timestamp(0),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "phase_changed");
        assert_eq!(json["phase"], "hold_in");
        assert_eq!(json["duration_secs"], 7);
    }
}
