//! Maze chase: eat every food item on a braided maze while pursuers hunt the actor
//!
//! Actor and pursuers move on their own fixed intervals of simulated time. A freeze
//! power-up stops the pursuers and makes them harmless for a while.

use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use super::events::{GameEvent, Transition};
use super::input::{Direction, TickInput};
use super::maze::{self, Cell, Grid, Pos, START};
use super::phase::{GamePhase, toggle_pause, transition};
use super::{GameKind, MiniGame, Snapshot};
use crate::audio::SoundEffect;
use crate::tuning::ChaseTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ItemKind {
    Food,
    /// Freezes pursuers when eaten
    Freeze,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Item {
    pub pos: Pos,
    pub kind: ItemKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pursuer {
    pub id: u32,
    pub pos: Pos,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChaseView {
    pub phase: GamePhase,
    pub level: u32,
    pub grid: Grid,
    pub actor: Pos,
    pub heading: Option<Direction>,
    pub pursuers: Vec<Pursuer>,
    pub items: Vec<Item>,
    pub frozen_ms: f32,
    pub score: u32,
    pub message: Option<String>,
}

/// Open neighbour closest to `target` by Manhattan distance, first in [`Direction::ALL`] order on ties
pub fn greedy_step(grid: &Grid, from: Pos, target: Pos) -> Option<Pos> {
    Direction::ALL
        .into_iter()
        .map(|d| from.step(d))
        .filter(|p| grid.get(*p).is_open())
        .min_by_key(|p| p.manhattan(target))
}

pub struct ChaseGame {
    tuning: ChaseTuning,
    rng: Pcg32,
    pub phase: GamePhase,
    /// 1-based
    pub level: u32,
    pub grid: Grid,
    pub actor: Pos,
    pub heading: Option<Direction>,
    pub pursuers: Vec<Pursuer>,
    pub items: Vec<Item>,
    pub frozen_ms: f32,
    pub score: u32,
    actor_clock_ms: f32,
    pursuer_clock_ms: f32,
    next_id: u32,
    message: Option<String>,
    pending: Vec<GameEvent>,
}

impl ChaseGame {
    pub fn new(tuning: ChaseTuning, seed: u64) -> Self {
        let size = maze::normalize_size(tuning.size);
        let mut game = Self {
            tuning,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Playing,
            level: 1,
            grid: Grid::filled(size, Cell::Wall),
            actor: START,
            heading: None,
            pursuers: Vec::new(),
            items: Vec::new(),
            frozen_ms: 0.0,
            score: 0,
            actor_clock_ms: 0.0,
            pursuer_clock_ms: 0.0,
            next_id: 1,
            message: None,
            pending: Vec::new(),
        };
        let mut events = Vec::new();
        game.start_level(1, &mut events);
        game.pending = events;
        game
    }

    fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn start_level(&mut self, level: u32, events: &mut Vec<GameEvent>) {
        self.level = level;
        let size = maze::normalize_size(self.tuning.size);
        let mut grid = maze::carve_perfect(size, &mut self.rng);
        maze::braid(&mut grid, self.tuning.braid_factor, &mut self.rng);
        grid.set(START, Cell::Start);
        self.grid = grid;
        self.actor = START;
        self.heading = None;
        self.frozen_ms = 0.0;
        self.actor_clock_ms = 0.0;
        self.pursuer_clock_ms = 0.0;
        self.items.clear();
        self.pursuers.clear();

        let food = self.tuning.base_food + self.tuning.food_per_level * level as usize;
        let placed = (0..food)
            .filter(|_| self.place_item(ItemKind::Food))
            .count();
        self.report("food", food, placed, events);
        let freeze = usize::from(self.place_item(ItemKind::Freeze));
        self.report("freeze", 1, freeze, events);

        let wanted = self.tuning.base_pursuers + (level / 2) as usize;
        let spawned = (0..wanted).filter(|_| self.spawn_pursuer()).count();
        self.report("pursuers", wanted, spawned, events);

        log::info!(
            "Chase level {}: {} food, {} pursuers",
            level,
            placed,
            spawned
        );
        self.message = Some(format!("Level {level}"));
    }

    fn report(&self, feature: &str, requested: usize, placed: usize, events: &mut Vec<GameEvent>) {
        if placed < requested {
            log::warn!("Chase: placed {} of {} {}", placed, requested, feature);
            events.push(GameEvent::Degraded {
                feature: feature.to_string(),
                requested,
                placed,
            });
        }
    }

    fn place_item(&mut self, kind: ItemKind) -> bool {
        let last = self.grid.size() - 2;
        for _ in 0..self.tuning.placement_attempts {
            let p = Pos::new(
                self.rng.random_range(1..=last),
                self.rng.random_range(1..=last),
            );
            if self.grid.get(p) == Cell::Path && !self.items.iter().any(|i| i.pos == p) {
                self.items.push(Item { pos: p, kind });
                return true;
            }
        }
        false
    }

    fn spawn_pursuer(&mut self) -> bool {
        let last = self.grid.size() - 2;
        let first = last - self.tuning.spawn_region.clamp(1, last) + 1;
        for _ in 0..self.tuning.placement_attempts {
            let p = Pos::new(
                self.rng.random_range(first..=last),
                self.rng.random_range(first..=last),
            );
            if self.grid.get(p).is_open() && p != self.actor {
                let id = self.next_entity_id();
                self.pursuers.push(Pursuer { id, pos: p });
                return true;
            }
        }
        false
    }

    fn move_actor(&mut self, events: &mut Vec<GameEvent>) {
        let Some(dir) = self.heading else {
            return;
        };
        let target = self.actor.step(dir);
        if !self.grid.get(target).is_open() {
            return;
        }
        self.actor = target;

        if let Some(i) = self.items.iter().position(|it| it.pos == target) {
            let item = self.items.swap_remove(i);
            match item.kind {
                ItemKind::Food => {
                    self.score += self.tuning.food_score;
                    events.push(GameEvent::Sound(SoundEffect::Coin));
                }
                ItemKind::Freeze => {
                    self.frozen_ms = self.tuning.freeze_ms;
                    events.push(GameEvent::Sound(SoundEffect::Success));
                }
            }
        }
    }

    fn move_pursuers(&mut self) {
        let actor = self.actor;
        for i in 0..self.pursuers.len() {
            let from = self.pursuers[i].pos;
            let roll: f32 = self.rng.random();
            let next = if roll < self.tuning.chase_bias {
                greedy_step(&self.grid, from, actor)
            } else {
                let open: Vec<Pos> = Direction::ALL
                    .into_iter()
                    .map(|d| from.step(d))
                    .filter(|p| self.grid.get(*p).is_open())
                    .collect();
                open.choose(&mut self.rng).copied()
            };
            if let Some(p) = next {
                self.pursuers[i].pos = p;
            }
        }
    }

    fn food_left(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.kind == ItemKind::Food)
            .count()
    }

    fn level_cleared(&mut self, events: &mut Vec<GameEvent>) {
        if self.level >= self.tuning.max_level {
            if transition(&mut self.phase, GamePhase::Won, events) {
                events.push(GameEvent::Sound(SoundEffect::Win));
                events.push(GameEvent::AwardPoints(self.tuning.final_points));
                self.message = Some("All levels cleared!".to_string());
            }
            return;
        }
        if transition(&mut self.phase, GamePhase::LevelComplete, events) {
            events.push(GameEvent::Sound(SoundEffect::LevelUp));
            events.push(GameEvent::AwardPoints(self.tuning.level_points));
            events.push(GameEvent::Schedule {
                delay_ms: self.tuning.advance_delay_ms,
                transition: Transition::NextLevel,
            });
            self.message = Some(format!("Level {} complete", self.level));
        }
    }

    fn caught(&self) -> bool {
        self.frozen_ms <= 0.0 && self.pursuers.iter().any(|p| p.pos == self.actor)
    }

    /// A pursuer and the actor traded cells this tick
    fn swapped(&self, before: &[Pos], actor_before: Pos) -> bool {
        self.frozen_ms <= 0.0
            && self
                .pursuers
                .iter()
                .zip(before)
                .any(|(p, from)| *from == self.actor && p.pos == actor_before)
    }

    fn lose(&mut self, events: &mut Vec<GameEvent>) {
        if transition(&mut self.phase, GamePhase::Lost, events) {
            events.push(GameEvent::Sound(SoundEffect::Error));
            self.message = Some("Caught!".to_string());
        }
    }
}

impl MiniGame for ChaseGame {
    fn kind(&self) -> GameKind {
        GameKind::Chase
    }

    fn phase(&self) -> GamePhase {
        self.phase
    }

    fn step(&mut self, input: &TickInput, dt_ms: f32, events: &mut Vec<GameEvent>) {
        events.append(&mut self.pending);
        if input.pause && toggle_pause(&mut self.phase, events) {
            return;
        }
        match self.phase {
            GamePhase::Lost if input.confirm => {
                self.start_level(1, events);
                transition(&mut self.phase, GamePhase::Playing, events);
                return;
            }
            GamePhase::Playing => {}
            _ => return,
        }

        if let Some(dir) = input.pressed {
            self.heading = Some(dir);
        }
        self.frozen_ms = (self.frozen_ms - dt_ms).max(0.0);

        let actor_before = self.actor;
        self.actor_clock_ms += dt_ms;
        if self.actor_clock_ms >= self.tuning.actor_step_ms {
            self.actor_clock_ms -= self.tuning.actor_step_ms;
            self.move_actor(events);
        }
        // Checked on both sides of the pursuer move so nobody passes through anybody
        if self.caught() {
            self.lose(events);
            return;
        }

        if self.frozen_ms > 0.0 {
            self.pursuer_clock_ms = 0.0;
        } else {
            self.pursuer_clock_ms += dt_ms;
            let interval = self.tuning.pursuer_step_ms(self.level);
            if self.pursuer_clock_ms >= interval {
                self.pursuer_clock_ms -= interval;
                let before: Vec<Pos> = self.pursuers.iter().map(|p| p.pos).collect();
                self.move_pursuers();
                if self.caught() || self.swapped(&before, actor_before) {
                    self.lose(events);
                    return;
                }
            }
        }
        if self.food_left() == 0 {
            self.level_cleared(events);
        }
    }

    fn apply(&mut self, transition_kind: Transition, events: &mut Vec<GameEvent>) {
        let Transition::NextLevel = transition_kind;
        if self.phase != GamePhase::LevelComplete {
            return;
        }
        self.start_level(self.level + 1, events);
        transition(&mut self.phase, GamePhase::Playing, events);
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::Chase(ChaseView {
            phase: self.phase,
            level: self.level,
            grid: self.grid.clone(),
            actor: self.actor,
            heading: self.heading,
            pursuers: self.pursuers.clone(),
            items: self.items.clone(),
            frozen_ms: self.frozen_ms,
            score: self.score,
            message: self.message.clone(),
        })
    }

    fn reset(&mut self, events: &mut Vec<GameEvent>) {
        let from = self.phase;
        self.score = 0;
        self.start_level(1, events);
        self.phase = GamePhase::Playing;
        events.push(GameEvent::PhaseChanged {
            from,
            to: GamePhase::Playing,
        });
    }
}
