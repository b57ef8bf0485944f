//! Per-game phase state machine

use serde::{Deserialize, Serialize};

use super::events::GameEvent;

/// Current phase of a mini-game instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Level banner, waiting for confirm
    Intro,
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Arithmetic gate between runner levels
    Math,
    /// Level banner after a win, waiting for the next level
    LevelComplete,
    /// Whole game cleared
    Won,
    /// Run ended
    Lost,
}

impl GamePhase {
    /// Legal edges of the phase graph. Won has no outgoing edges; only a reset leaves it.
    pub fn can_transition_to(self, next: GamePhase) -> bool {
        use GamePhase::*;
        matches!(
            (self, next),
            (Intro, Playing)
                | (Playing, Paused | Math | LevelComplete | Won | Lost)
                | (Paused, Playing)
                | (Math, LevelComplete | Won)
                | (LevelComplete, Intro | Playing | Won)
                | (Lost, Playing)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, GamePhase::Won | GamePhase::Lost)
    }

    /// Gameplay input is only consumed while playing; everything else is dropped, never queued
    pub fn accepts_input(self) -> bool {
        self == GamePhase::Playing
    }
}

/// Move `phase` to `next` if the edge is legal, recording the change.
pub fn transition(phase: &mut GamePhase, next: GamePhase, events: &mut Vec<GameEvent>) -> bool {
    if !phase.can_transition_to(next) {
        log::warn!("Ignored phase change {:?} -> {:?}", phase, next);
        return false;
    }
    log::debug!("Phase {:?} -> {:?}", phase, next);
    events.push(GameEvent::PhaseChanged {
        from: *phase,
        to: next,
    });
    *phase = next;
    true
}

/// Shared pause toggle. Returns true when the toggle consumed the tick.
pub fn toggle_pause(phase: &mut GamePhase, events: &mut Vec<GameEvent>) -> bool {
    match *phase {
        GamePhase::Playing => transition(phase, GamePhase::Paused, events),
        GamePhase::Paused => {
            transition(phase, GamePhase::Playing, events);
            false
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_won_is_terminal() {
        for next in [
            GamePhase::Intro,
            GamePhase::Playing,
            GamePhase::Paused,
            GamePhase::Math,
            GamePhase::LevelComplete,
            GamePhase::Lost,
        ] {
            assert!(!GamePhase::Won.can_transition_to(next));
        }
        assert!(GamePhase::Won.is_terminal());
    }

    #[test]
    fn test_lost_allows_retry_only() {
        assert!(GamePhase::Lost.can_transition_to(GamePhase::Playing));
        assert!(!GamePhase::Lost.can_transition_to(GamePhase::Won));
        assert!(!GamePhase::Lost.can_transition_to(GamePhase::LevelComplete));
    }

    #[test]
    fn test_transition_records_event() {
        let mut phase = GamePhase::Intro;
        let mut events = Vec::new();
        assert!(transition(&mut phase, GamePhase::Playing, &mut events));
        assert!(!transition(&mut phase, GamePhase::Intro, &mut events));
        assert_eq!(phase, GamePhase::Playing);
        assert_eq!(
            events,
            vec![GameEvent::PhaseChanged {
                from: GamePhase::Intro,
                to: GamePhase::Playing
            }]
        );
    }

    #[test]
    fn test_pause_toggle() {
        let mut phase = GamePhase::Playing;
        let mut events = Vec::new();
        assert!(toggle_pause(&mut phase, &mut events));
        assert_eq!(phase, GamePhase::Paused);
        assert!(!toggle_pause(&mut phase, &mut events));
        assert_eq!(phase, GamePhase::Playing);

        let mut math = GamePhase::Math;
        assert!(!toggle_pause(&mut math, &mut events));
        assert_eq!(math, GamePhase::Math);
    }
}
