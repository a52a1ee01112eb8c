//! Progressive disclosure stages.
//!
//! The stage is a pure function of time since load and only ever moves
//! forward: arrival -> engagement -> active. Each step reveals more of the
//! interface.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clock::timestamp;
use crate::events::Event;

pub const ARRIVAL_MS: u64 = 5_000;
pub const ENGAGEMENT_MS: u64 = 15_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStage {
    Arrival,
    Engagement,
    Active,
}

impl SessionStage {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStage::Arrival => "arrival",
            SessionStage::Engagement => "engagement",
            SessionStage::Active => "active",
        }
    }

    fn next(self) -> Option<Self> {
        match self {
            SessionStage::Arrival => Some(SessionStage::Engagement),
            SessionStage::Engagement => Some(SessionStage::Active),
            SessionStage::Active => None,
        }
    }

    /// What the presentation layer should uncover on entering this stage.
    pub fn reveal(self) -> Reveal {
        match self {
            SessionStage::Arrival => Reveal {
                instruction: None,
                content_opacity: 0.0,
                controls_visible: false,
            },
            SessionStage::Engagement => Reveal {
                instruction: Some("Breathe with the circle".into()),
                content_opacity: 0.3,
                controls_visible: false,
            },
            SessionStage::Active => Reveal {
                instruction: None,
                content_opacity: 1.0,
                controls_visible: true,
            },
        }
    }
}

impl std::fmt::Display for SessionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presentation hint attached to a stage transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reveal {
    /// Replacement instruction text, if any.
    pub instruction: Option<String>,
    /// Opacity of the gated content (0.0 ..= 1.0).
    pub content_opacity: f64,
    /// Pattern selector and controls are shown.
    pub controls_visible: bool,
}

/// Stage boundaries, in milliseconds after load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageThresholds {
    /// Arrival lasts while elapsed <= this.
    pub arrival_ms: u64,
    /// Engagement lasts for this long after arrival ends.
    pub engagement_ms: u64,
}

impl Default for StageThresholds {
    fn default() -> Self {
        Self {
            arrival_ms: ARRIVAL_MS,
            engagement_ms: ENGAGEMENT_MS,
        }
    }
}

impl StageThresholds {
    pub fn stage_at(&self, elapsed_ms: u64) -> SessionStage {
        if elapsed_ms <= self.arrival_ms {
            SessionStage::Arrival
        } else if elapsed_ms <= self.arrival_ms.saturating_add(self.engagement_ms) {
            SessionStage::Engagement
        } else {
            SessionStage::Active
        }
    }

    /// First elapsed millisecond that falls in `stage`.
    pub fn starts_at(&self, stage: SessionStage) -> u64 {
        match stage {
            SessionStage::Arrival => 0,
            SessionStage::Engagement => self.arrival_ms.saturating_add(1),
            SessionStage::Active => self
                .arrival_ms
                .saturating_add(self.engagement_ms)
                .saturating_add(1),
        }
    }
}

/// One-way stage ratchet evaluated on the periodic tick.
#[derive(Debug, Clone)]
pub struct StageTracker {
    loaded_at_ms: u64,
    thresholds: StageThresholds,
    stage: SessionStage,
}

impl StageTracker {
    pub fn new(loaded_at_ms: u64, thresholds: StageThresholds) -> Self {
        Self {
            loaded_at_ms,
            thresholds,
            stage: SessionStage::Arrival,
        }
    }

    pub fn stage(&self) -> SessionStage {
        self.stage
    }

    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.loaded_at_ms)
    }

    /// Advance to the stage implied by `now_ms`. A tick that jumps past a
    /// stage still reports each transition, in order, stamped with the
    /// instant the stage began. Never moves backwards.
    pub fn tick(&mut self, now_ms: u64) -> Vec<Event> {
        let target = self.thresholds.stage_at(self.elapsed_ms(now_ms));
        let mut events = Vec::new();
        while self.stage < target {
            let Some(next) = self.stage.next() else {
                break;
            };
            self.stage = next;
            info!(stage = %next, "session stage advanced");
            events.push(Event::StageChanged {
                stage: next,
                reveal: next.reveal(),
                at: timestamp(self.loaded_at_ms.saturating_add(self.thresholds.starts_at(next))),
            });
        }
        events
    }
}
