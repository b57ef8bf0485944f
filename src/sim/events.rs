//! Side effects produced by a tick, drained by the session

use serde::{Deserialize, Serialize};

use super::phase::GamePhase;
use crate::audio::SoundEffect;

/// Deferred state change requested by a game, fired later by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    /// Leave the level-complete banner for the next level
    NextLevel,
}

/// Something the host should know about after a tick
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Fire-and-forget sound effect
    Sound(SoundEffect),
    /// One scoring event for the host's points counter
    AwardPoints(u32),
    PhaseChanged { from: GamePhase, to: GamePhase },
    /// Overlay banner text
    Message(String),
    /// Ask the session to call `apply(transition)` after `delay_ms`
    Schedule { delay_ms: u32, transition: Transition },
    /// Content generation hit an attempt ceiling and placed fewer features
    Degraded {
        feature: String,
        requested: usize,
        placed: usize,
    },
}

/// Total points awarded in a batch of events
pub fn points_awarded(events: &[GameEvent]) -> u32 {
    events
        .iter()
        .map(|e| match e {
            GameEvent::AwardPoints(n) => *n,
            _ => 0,
        })
        .sum()
}

/// Whether `effect` was played in a batch of events
pub fn played(events: &[GameEvent], effect: SoundEffect) -> bool {
    events.contains(&GameEvent::Sound(effect))
}
