//! Calming message rotation.
//!
//! Each stage has its own pool; later stages offer more. A message is shown
//! on load and replaced every rotation interval with a random pick from the
//! current stage's pool.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_pcg::Pcg64;

use crate::clock::timestamp;
use crate::events::Event;
use crate::stage::SessionStage;

pub const DEFAULT_ROTATE_INTERVAL_MS: u64 = 10_000;

const ARRIVAL: &[&str] = &["Just focus on the circle", "Follow your breath"];

const ENGAGEMENT: &[&str] = &[
    "Notice how your body feels",
    "You're doing great",
    "Stay with your breath",
];

const ACTIVE: &[&str] = &[
    "Each breath brings more peace",
    "Let go of any tension",
    "You're safe and supported",
    "This moment is yours",
    "We're here with you",
];

pub fn pool(stage: SessionStage) -> &'static [&'static str] {
    match stage {
        SessionStage::Arrival => ARRIVAL,
        SessionStage::Engagement => ENGAGEMENT,
        SessionStage::Active => ACTIVE,
    }
}

#[derive(Debug, Clone)]
pub struct MessageRotator {
    rng: Pcg64,
    interval_ms: u64,
    next_at_ms: u64,
    current: Option<&'static str>,
}

impl MessageRotator {
    /// First message is due immediately at `now_ms`.
    pub fn new(seed: u64, interval_ms: u64, now_ms: u64) -> Self {
        Self {
            rng: Pcg64::seed_from_u64(seed),
            interval_ms: interval_ms.max(1),
            next_at_ms: now_ms,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&'static str> {
        self.current
    }

    pub fn tick(&mut self, now_ms: u64, stage: SessionStage) -> Option<Event> {
        if now_ms < self.next_at_ms {
            return None;
        }
        let message = *pool(stage).choose(&mut self.rng)?;
        self.current = Some(message);
        self.next_at_ms = now_ms.saturating_add(self.interval_ms);
        Some(Event::MessageRotated {
            stage,
            message: message.to_string(),
            at: timestamp(now_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotates_on_interval_from_stage_pool() {
        let mut rotator = MessageRotator::new(7, 10_000, 0);
        let first = rotator.tick(0, SessionStage::Arrival);
        assert!(first.is_some());
        assert!(ARRIVAL.contains(&rotator.current().unwrap()));
        assert!(rotator.tick(9_999, SessionStage::Arrival).is_none());
        assert!(rotator.tick(10_000, SessionStage::Active).is_some());
        assert!(ACTIVE.contains(&rotator.current().unwrap()));
    }

    #[test]
    fn huge_interval_shows_first_message_only() {
        let mut rotator = MessageRotator::new(1, u64::MAX, 1_700_000_000_000);
        assert!(rotator.tick(1_700_000_000_000, SessionStage::Arrival).is_some());
        assert!(rotator.tick(u64::MAX - 1, SessionStage::Active).is_none());
    }

    #[test]
    fn same_seed_same_sequence() {
        let picks = |seed| {
            let mut r = MessageRotator::new(seed, 1, 0);
            (0..8)
                .filter_map(|t| {
                    r.tick(t, SessionStage::Active);
                    r.current()
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(picks(42), picks(42));
    }
}
