//! Maze traversal: walk the actor from START to GOAL, one cell per press

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use super::events::{GameEvent, Transition};
use super::input::{Direction, TickInput};
use super::maze::{self, Cell, GeneratedMaze, Grid, Mechanic, Pos};
use super::phase::{GamePhase, toggle_pause, transition};
use super::{GameKind, MiniGame, Snapshot};
use crate::audio::SoundEffect;
use crate::tuning::MazeTuning;

#[derive(Debug, Clone, Serialize)]
pub struct MazeView {
    pub phase: GamePhase,
    pub level: usize,
    pub name: String,
    pub mechanic: Mechanic,
    pub grid: Grid,
    pub actor: Pos,
    pub coins_collected: u32,
    pub coins_required: u32,
    pub gate_open: bool,
    pub message: Option<String>,
}

pub struct MazeRun {
    tuning: MazeTuning,
    rng: Pcg32,
    pub phase: GamePhase,
    pub level: usize,
    pub maze: GeneratedMaze,
    pub actor: Pos,
    pub coins_collected: u32,
    /// Set by a slow tile; swallows the next move
    pub skip_next: bool,
    message: Option<String>,
    /// Events raised outside a tick (construction), flushed on the next step
    pending: Vec<GameEvent>,
}

impl MazeRun {
    pub fn new(tuning: MazeTuning, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let maze = Self::build(&tuning, 0, &mut rng);
        let mut run = Self {
            tuning,
            rng,
            phase: GamePhase::Playing,
            level: 0,
            actor: maze.start,
            maze,
            coins_collected: 0,
            skip_next: false,
            message: None,
            pending: Vec::new(),
        };
        let mut events = Vec::new();
        run.announce(&mut events);
        run.pending = events;
        run
    }

    fn build(tuning: &MazeTuning, level: usize, rng: &mut Pcg32) -> GeneratedMaze {
        match tuning.levels.get(level) {
            Some(l) => maze::generate(l.size, l.mechanic, &l.params, rng),
            None => maze::generate(15, Mechanic::None, &Default::default(), rng),
        }
    }

    fn level_name(&self) -> String {
        self.tuning
            .levels
            .get(self.level)
            .map_or_else(String::new, |l| l.name.clone())
    }

    fn start_level(&mut self, level: usize, events: &mut Vec<GameEvent>) {
        self.level = level;
        self.maze = Self::build(&self.tuning, level, &mut self.rng);
        self.actor = self.maze.start;
        self.coins_collected = 0;
        self.skip_next = false;
        self.announce(events);
    }

    fn announce(&mut self, events: &mut Vec<GameEvent>) {
        log::info!(
            "Maze level {} ({}) {:?}",
            self.level + 1,
            self.level_name(),
            self.maze.mechanic
        );
        for s in &self.maze.shortfalls {
            events.push(GameEvent::Degraded {
                feature: s.feature.clone(),
                requested: s.requested,
                placed: s.placed,
            });
        }
        self.message = Some(self.level_name());
    }

    pub fn gate_open(&self) -> bool {
        self.maze
            .gate
            .is_none_or(|g| self.maze.grid.get(g) != Cell::LockedGate)
    }

    /// Attempt one step. Returns true when the actor moved.
    pub fn try_move(&mut self, dir: Direction, events: &mut Vec<GameEvent>) -> bool {
        if !self.phase.accepts_input() {
            return false;
        }
        if self.skip_next {
            self.skip_next = false;
            log::debug!("Slow tile swallowed a move");
            return false;
        }

        let target = self.actor.step(dir);
        let mut cell = self.maze.grid.get(target);
        if cell == Cell::LockedGate && self.coins_collected >= self.maze.coins_required {
            self.maze.grid.set(target, Cell::Path);
            events.push(GameEvent::Sound(SoundEffect::Success));
            cell = Cell::Path;
        }
        if !cell.is_open() {
            events.push(GameEvent::Sound(SoundEffect::Error));
            return false;
        }

        self.actor = target;
        match cell {
            Cell::Coin => {
                self.maze.grid.set(target, Cell::Path);
                self.coins_collected += 1;
                events.push(GameEvent::Sound(SoundEffect::Coin));
            }
            Cell::PortalA | Cell::PortalB => {
                if let Some((a, b)) = self.maze.portals {
                    self.actor = if target == a { b } else { a };
                    events.push(GameEvent::Sound(SoundEffect::Jump));
                }
            }
            Cell::SlowTile => {
                let chance = self
                    .tuning
                    .levels
                    .get(self.level)
                    .map_or(0.0, |l| l.params.slow_skip_chance);
                let roll: f32 = self.rng.random();
                self.skip_next = roll < chance;
            }
            Cell::Goal => self.reach_goal(events),
            _ => {}
        }
        true
    }

    fn reach_goal(&mut self, events: &mut Vec<GameEvent>) {
        events.push(GameEvent::AwardPoints(self.tuning.level_points));
        if self.level + 1 >= self.tuning.levels.len() {
            if transition(&mut self.phase, GamePhase::Won, events) {
                events.push(GameEvent::Sound(SoundEffect::Win));
                self.message = Some("Every maze cleared!".to_string());
            }
        } else if transition(&mut self.phase, GamePhase::LevelComplete, events) {
            events.push(GameEvent::Sound(SoundEffect::LevelUp));
            self.message = Some(format!("{} complete", self.level_name()));
        }
    }

    fn advance(&mut self, events: &mut Vec<GameEvent>) {
        if self.phase != GamePhase::LevelComplete {
            return;
        }
        self.start_level(self.level + 1, events);
        transition(&mut self.phase, GamePhase::Playing, events);
    }
}

impl MiniGame for MazeRun {
    fn kind(&self) -> GameKind {
        GameKind::Maze
    }

    fn phase(&self) -> GamePhase {
        self.phase
    }

    fn step(&mut self, input: &TickInput, _dt_ms: f32, events: &mut Vec<GameEvent>) {
        events.append(&mut self.pending);
        if input.pause && toggle_pause(&mut self.phase, events) {
            return;
        }
        match self.phase {
            GamePhase::LevelComplete if input.confirm => self.advance(events),
            GamePhase::Playing => {
                if let Some(dir) = input.pressed {
                    self.try_move(dir, events);
                }
            }
            _ => {}
        }
    }

    fn apply(&mut self, transition_kind: Transition, events: &mut Vec<GameEvent>) {
        match transition_kind {
            Transition::NextLevel => self.advance(events),
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::Maze(MazeView {
            phase: self.phase,
            level: self.level,
            name: self.level_name(),
            mechanic: self.maze.mechanic,
            grid: self.maze.grid.clone(),
            actor: self.actor,
            coins_collected: self.coins_collected,
            coins_required: self.maze.coins_required,
            gate_open: self.gate_open(),
            message: self.message.clone(),
        })
    }

    fn reset(&mut self, events: &mut Vec<GameEvent>) {
        let from = self.phase;
        self.start_level(0, events);
        self.phase = GamePhase::Playing;
        events.push(GameEvent::PhaseChanged {
            from,
            to: GamePhase::Playing,
        });
    }
}
