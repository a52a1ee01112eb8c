use serde::{Deserialize, Serialize};

/// One segment of a breathing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Inhale,
    /// Hold after inhale.
    HoldIn,
    Exhale,
    /// Hold after exhale.
    HoldOut,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Inhale, Phase::HoldIn, Phase::Exhale, Phase::HoldOut];

    /// Position within the cycle (0..4), matching the pattern tuple order.
    pub fn index(self) -> usize {
        match self {
            Phase::Inhale => 0,
            Phase::HoldIn => 1,
            Phase::Exhale => 2,
            Phase::HoldOut => 3,
        }
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 4]
    }

    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// Suggested on-screen instruction.
    pub fn instruction(self) -> &'static str {
        match self {
            Phase::Inhale => "Breathe in...",
            Phase::HoldIn | Phase::HoldOut => "Hold...",
            Phase::Exhale => "Breathe out...",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Inhale => "inhale",
            Phase::HoldIn => "hold_in",
            Phase::Exhale => "exhale",
            Phase::HoldOut => "hold_out",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const PAUSED_INSTRUCTION: &str = "Paused";
