//! Breathing pattern table.
//!
//! A pattern is four phase lengths in seconds: inhale, hold after inhale,
//! exhale, hold after exhale. The table holds the built-in patterns plus any
//! custom ones loaded from configuration and is never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{CoreError, Result};

pub const DEFAULT_PATTERN_ID: &str = "6-6-6-6";

const BUILTIN: [(&str, [u32; 4]); 2] = [("6-6-6-6", [6, 6, 6, 6]), ("4-7-8", [4, 7, 8, 4])];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreathingPattern {
    id: String,
    /// inhale, hold, exhale, hold (seconds).
    durations: [u32; 4],
}

impl BreathingPattern {
    /// Build a pattern, rejecting zero-length phases.
    pub fn new(id: impl Into<String>, durations: [u32; 4]) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(CoreError::InvalidPattern {
                id,
                message: "pattern id is empty".into(),
            });
        }
        if let Some(pos) = durations.iter().position(|&d| d == 0) {
            return Err(CoreError::InvalidPattern {
                id,
                message: format!("phase {} has zero length", pos + 1),
            });
        }
        Ok(Self { id, durations })
    }

    /// Parse `"i-h-e-h"` (or `"i-h-e"`, whose second hold repeats the inhale).
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid = |message: String| CoreError::InvalidPattern {
            id: spec.to_string(),
            message,
        };
        let parts = spec
            .split('-')
            .map(|p| {
                p.trim()
                    .parse::<u32>()
                    .map_err(|_| invalid(format!("'{p}' is not a whole number of seconds")))
            })
            .collect::<Result<Vec<_>>>()?;
        let durations = match parts.as_slice() {
            [i, h, e] => [*i, *h, *e, *i],
            [i, h1, e, h2] => [*i, *h1, *e, *h2],
            _ => return Err(invalid(format!("expected 3 or 4 parts, got {}", parts.len()))),
        };
        Self::new(spec, durations)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn durations(&self) -> [u32; 4] {
        self.durations
    }

    pub fn inhale_secs(&self) -> u32 {
        self.durations[0]
    }

    pub fn hold_in_secs(&self) -> u32 {
        self.durations[1]
    }

    pub fn exhale_secs(&self) -> u32 {
        self.durations[2]
    }

    pub fn hold_out_secs(&self) -> u32 {
        self.durations[3]
    }

    /// Length of phase `index` (0..4) in milliseconds.
    pub fn phase_ms(&self, index: usize) -> u64 {
        u64::from(self.durations[index % 4]).saturating_mul(1000)
    }

    /// Offset of phase `index` from the start of the cycle, in milliseconds.
    pub fn offset_ms(&self, index: usize) -> u64 {
        (0..index.min(4)).map(|i| self.phase_ms(i)).sum()
    }

    /// Full cycle length in milliseconds.
    pub fn total_ms(&self) -> u64 {
        self.offset_ms(4)
    }
}

#[derive(Debug, Clone)]
pub struct PatternTable {
    builtin: Vec<BreathingPattern>,
    custom: BTreeMap<String, BreathingPattern>,
}

impl PatternTable {
    /// Table with the built-in patterns only.
    pub fn builtin() -> Self {
        let builtin = BUILTIN
            .iter()
            .map(|(id, d)| BreathingPattern {
                id: (*id).to_string(),
                durations: *d,
            })
            .collect();
        Self {
            builtin,
            custom: BTreeMap::new(),
        }
    }

    /// Built-ins plus user patterns. Custom ids may not shadow a built-in.
    pub fn with_custom(custom: &BTreeMap<String, [u32; 4]>) -> Result<Self> {
        let mut table = Self::builtin();
        for (id, durations) in custom {
            if table.builtin.iter().any(|p| &p.id == id) {
                return Err(CoreError::InvalidPattern {
                    id: id.clone(),
                    message: "id is reserved by a built-in pattern".into(),
                });
            }
            let pattern = BreathingPattern::new(id.clone(), *durations)?;
            table.custom.insert(id.clone(), pattern);
        }
        Ok(table)
    }

    pub fn lookup(&self, id: &str) -> Result<&BreathingPattern> {
        self.builtin
            .iter()
            .find(|p| p.id == id)
            .or_else(|| self.custom.get(id))
            .ok_or_else(|| CoreError::UnknownPattern(id.to_string()))
    }

    /// Built-ins in declaration order, then custom patterns sorted by id.
    pub fn ids(&self) -> Vec<&str> {
        self.iter().map(BreathingPattern::id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BreathingPattern> {
        self.builtin.iter().chain(self.custom.values())
    }
}

impl Default for PatternTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lookup() {
        let table = PatternTable::builtin();
        assert_eq!(table.lookup("4-7-8").unwrap().durations(), [4, 7, 8, 4]);
        assert_eq!(table.lookup(DEFAULT_PATTERN_ID).unwrap().total_ms(), 24_000);
    }

    #[test]
    fn unknown_pattern_is_rejected() {
        let table = PatternTable::builtin();
        assert!(matches!(
            table.lookup("1-2-3-4"),
            Err(CoreError::UnknownPattern(id)) if id == "1-2-3-4"
        ));
    }

    #[test]
    fn offsets_are_cumulative() {
        let p = BreathingPattern::new("t", [4, 7, 8, 4]).unwrap();
        assert_eq!(p.offset_ms(0), 0);
        assert_eq!(p.offset_ms(1), 4_000);
        assert_eq!(p.offset_ms(2), 11_000);
        assert_eq!(p.offset_ms(3), 19_000);
        assert_eq!(p.total_ms(), 23_000);
    }

    #[test]
    fn zero_phase_is_invalid() {
        assert!(BreathingPattern::new("bad", [4, 0, 4, 4]).is_err());
    }

    #[test]
    fn parse_three_part_form_repeats_inhale() {
        let p = BreathingPattern::parse("4-7-8").unwrap();
        assert_eq!(p.durations(), [4, 7, 8, 4]);
        assert!(BreathingPattern::parse("4-x-8").is_err());
        assert!(BreathingPattern::parse("4-4").is_err());
    }

    #[test]
    fn custom_patterns_follow_builtins() {
        let mut custom = BTreeMap::new();
        custom.insert("box".to_string(), [4, 4, 4, 4]);
        let table = PatternTable::with_custom(&custom).unwrap();
        assert_eq!(table.ids(), vec!["6-6-6-6", "4-7-8", "box"]);
    }

    #[test]
    fn custom_pattern_cannot_shadow_builtin() {
        let mut custom = BTreeMap::new();
        custom.insert("4-7-8".to_string(), [1, 1, 1, 1]);
        assert!(PatternTable::with_custom(&custom).is_err());
    }
}
