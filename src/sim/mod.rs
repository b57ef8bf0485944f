//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod chase;
pub mod combat;
pub mod events;
pub mod input;
pub mod lane;
pub mod maze;
pub mod maze_run;
pub mod meter;
pub mod phase;
pub mod projection;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use chase::{ChaseGame, ChaseView};
pub use combat::{AttackKind, BrawlGame, BrawlView, Fighter, FighterAction};
pub use events::{GameEvent, Transition};
pub use input::{Direction, InputLatch, TickInput};
pub use lane::{Avoidance, RunnerGame, RunnerView};
pub use maze::{Cell, GeneratedMaze, Grid, MazeParams, Mechanic, Pos};
pub use maze_run::{MazeRun, MazeView};
pub use meter::Meter;
pub use phase::GamePhase;
pub use projection::{Projected, Projection};

use crate::tuning::Tuning;

/// Which mini-game a session runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameKind {
    /// Grid maze traversal with mechanic overlays
    Maze,
    /// Grid collector with pursuers
    Chase,
    /// Endurance lane runner
    Dodger,
    /// Coin-goal lane runner with arithmetic gates
    Collector,
    /// Side-scrolling brawler
    Brawl,
}

impl GameKind {
    pub const ALL: [GameKind; 5] = [
        GameKind::Maze,
        GameKind::Chase,
        GameKind::Dodger,
        GameKind::Collector,
        GameKind::Brawl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::Maze => "maze",
            GameKind::Chase => "chase",
            GameKind::Dodger => "dodger",
            GameKind::Collector => "collector",
            GameKind::Brawl => "brawl",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown game '{s}'"))
    }
}

/// Read-only presentation copy, taken after a tick
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "game", rename_all = "lowercase")]
pub enum Snapshot {
    Maze(MazeView),
    Chase(ChaseView),
    Runner(RunnerView),
    Brawl(BrawlView),
}

impl Snapshot {
    pub fn phase(&self) -> GamePhase {
        match self {
            Snapshot::Maze(v) => v.phase,
            Snapshot::Chase(v) => v.phase,
            Snapshot::Runner(v) => v.phase,
            Snapshot::Brawl(v) => v.phase,
        }
    }
}

/// A mini-game driven by the session frame loop
pub trait MiniGame {
    fn kind(&self) -> GameKind;

    fn phase(&self) -> GamePhase;

    /// Advance by one fixed step of `dt_ms`
    fn step(&mut self, input: &TickInput, dt_ms: f32, events: &mut Vec<GameEvent>);

    /// Apply a deferred transition previously requested with `GameEvent::Schedule`
    fn apply(&mut self, transition: Transition, events: &mut Vec<GameEvent>);

    fn snapshot(&self) -> Snapshot;

    /// Back to the first level with fresh state
    fn reset(&mut self, events: &mut Vec<GameEvent>);
}

/// Build a game instance from its tuning tables
pub fn new_game(kind: GameKind, tuning: &Tuning, seed: u64) -> Box<dyn MiniGame> {
    match kind {
        GameKind::Maze => Box::new(MazeRun::new(tuning.maze.clone(), seed)),
        GameKind::Chase => Box::new(ChaseGame::new(tuning.chase.clone(), seed)),
        GameKind::Dodger => Box::new(RunnerGame::endurance(
            tuning.dodger.clone(),
            tuning.projection.clone(),
            seed,
        )),
        GameKind::Collector => Box::new(RunnerGame::collector(
            tuning.collector.clone(),
            tuning.projection.clone(),
            seed,
        )),
        GameKind::Brawl => Box::new(BrawlGame::new(tuning.brawl.clone(), seed)),
    }
}
