//! Latched player intents
//!
//! Keyboard/touch handlers only ever write into an [`InputLatch`]. The frame loop copies a
//! [`TickInput`] out of it before every tick and clears the one-shot flags afterwards.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::combat::AttackKind;

/// Grid/lane direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Fixed neighbour order used by every grid search
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Unit step in grid coordinates (y grows downward)
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Horizontal sign for lane/side-scroller games (0 for vertical)
    pub fn lateral(self) -> i32 {
        self.delta().0
    }
}

/// On-screen pad names: "up", "down", "left", "right"
impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            _ => Err(format!("unknown direction '{s}'")),
        }
    }
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Direction key currently held
    pub held: Option<Direction>,
    /// Direction pressed since the last tick
    pub pressed: Option<Direction>,
    /// Jump pressed since the last tick
    pub jump: bool,
    /// Duck pressed since the last tick
    pub duck: bool,
    /// Attack pressed since the last tick
    pub attack: Option<AttackKind>,
    /// Pause toggle
    pub pause: bool,
    /// Confirm / continue / retry
    pub confirm: bool,
    /// Submitted answer for an arithmetic gate
    pub answer: Option<i64>,
}

/// Shared slot written by input listeners and read by the frame loop
#[derive(Debug, Clone, Default)]
pub struct InputLatch {
    pending: TickInput,
}

impl InputLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a DOM `KeyboardEvent.key` onto intents. Returns false for keys we don't use.
    pub fn key_down(&mut self, key: &str) -> bool {
        match key {
            "ArrowUp" | "w" | "W" => {
                self.press(Direction::Up);
                self.pending.jump = true;
            }
            "ArrowDown" | "s" | "S" => {
                self.press(Direction::Down);
                self.pending.duck = true;
            }
            "ArrowLeft" | "a" | "A" => self.press(Direction::Left),
            "ArrowRight" | "d" | "D" => self.press(Direction::Right),
            " " => self.pending.jump = true,
            "1" | "z" | "Z" => self.pending.attack = Some(AttackKind::Quick),
            "2" | "x" | "X" => self.pending.attack = Some(AttackKind::Guard),
            "3" | "c" | "C" => self.pending.attack = Some(AttackKind::Heavy),
            "Escape" | "p" | "P" => self.pending.pause = true,
            "Enter" => self.pending.confirm = true,
            _ => return false,
        }
        true
    }

    pub fn key_up(&mut self, key: &str) {
        let released = match key {
            "ArrowUp" | "w" | "W" => Direction::Up,
            "ArrowDown" | "s" | "S" => Direction::Down,
            "ArrowLeft" | "a" | "A" => Direction::Left,
            "ArrowRight" | "d" | "D" => Direction::Right,
            _ => return,
        };
        if self.pending.held == Some(released) {
            self.pending.held = None;
        }
    }

    /// Direction press from keyboard or an on-screen pad
    pub fn press(&mut self, dir: Direction) {
        self.pending.held = Some(dir);
        self.pending.pressed = Some(dir);
    }

    pub fn release_all(&mut self) {
        self.pending.held = None;
    }

    pub fn jump(&mut self) {
        self.pending.jump = true;
    }

    pub fn duck(&mut self) {
        self.pending.duck = true;
    }

    pub fn attack(&mut self, kind: AttackKind) {
        self.pending.attack = Some(kind);
    }

    pub fn pause(&mut self) {
        self.pending.pause = true;
    }

    pub fn confirm(&mut self) {
        self.pending.confirm = true;
    }

    pub fn answer(&mut self, value: i64) {
        self.pending.answer = Some(value);
    }

    /// Copy of the current intents for one tick
    pub fn snapshot(&self) -> TickInput {
        self.pending.clone()
    }

    /// Clear one-shot inputs after processing. Held direction survives.
    pub fn clear_one_shots(&mut self) {
        let held = self.pending.held;
        self.pending = TickInput {
            held,
            ..Default::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_names_parse() {
        assert_eq!("left".parse::<Direction>(), Ok(Direction::Left));
        assert_eq!("UP".parse::<Direction>(), Ok(Direction::Up));
        assert!("north".parse::<Direction>().is_err());
        assert_eq!("guard".parse::<AttackKind>(), Ok(AttackKind::Guard));
        assert!("kick".parse::<AttackKind>().is_err());
    }

    #[test]
    fn test_one_shots_clear_but_held_survives() {
        let mut latch = InputLatch::new();
        assert!(latch.key_down("ArrowLeft"));
        assert!(latch.key_down("Enter"));
        let input = latch.snapshot();
        assert_eq!(input.pressed, Some(Direction::Left));
        assert!(input.confirm);

        latch.clear_one_shots();
        let input = latch.snapshot();
        assert_eq!(input.held, Some(Direction::Left));
        assert_eq!(input.pressed, None);
        assert!(!input.confirm);

        latch.key_up("ArrowLeft");
        assert_eq!(latch.snapshot().held, None);
    }

    #[test]
    fn test_key_up_of_other_direction_keeps_held() {
        let mut latch = InputLatch::new();
        latch.key_down("ArrowRight");
        latch.key_up("ArrowLeft");
        assert_eq!(latch.snapshot().held, Some(Direction::Right));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let mut latch = InputLatch::new();
        assert!(!latch.key_down("F5"));
        assert_eq!(latch.snapshot(), TickInput::default());
    }

    #[test]
    fn test_up_arrow_doubles_as_jump() {
        let mut latch = InputLatch::new();
        latch.key_down("ArrowUp");
        let input = latch.snapshot();
        assert!(input.jump);
        assert_eq!(input.pressed, Some(Direction::Up));
        latch.key_down("x");
        assert_eq!(latch.snapshot().attack, Some(AttackKind::Guard));
    }
}
