//! Lane runner loop
//!
//! Shared by the endurance dodger and the coin-goal collector. Each tick runs, in order:
//! advance clock/speed, spawn, move entities, cull, resolve collisions, check terminal.
//! Collisions use this tick's post-move depths.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::events::{GameEvent, Transition};
use super::input::{Direction, TickInput};
use super::meter::Meter;
use super::phase::{GamePhase, toggle_pause, transition};
use super::projection::{Projected, Projection};
use super::{GameKind, MiniGame, Snapshot};
use crate::audio::SoundEffect;
use crate::consts::FRAME_MS;
use crate::tuning::{CollectorTuning, DodgerTuning, LaneTuning, ObstacleSpec};

pub const LANES: [i8; 3] = [-1, 0, 1];

/// Action that lets the actor pass an obstacle in its own lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Avoidance {
    /// Low obstacle, jump over it
    Jump,
    /// High obstacle, duck under it
    Duck,
    /// Only a lane change avoids it
    Dodge,
}

/// Actor state tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunnerAction {
    Run,
    Jumping,
    Ducking,
}

/// True iff `action` is the one `avoid` requires
pub fn avoids(action: RunnerAction, avoid: Avoidance) -> bool {
    matches!(
        (avoid, action),
        (Avoidance::Jump, RunnerAction::Jumping) | (Avoidance::Duck, RunnerAction::Ducking)
    )
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum EntityKind {
    Coin,
    Obstacle { avoid: Avoidance },
}

/// Spawned coin or obstacle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaneEntity {
    pub id: u32,
    pub lane: i8,
    pub depth: f32,
    pub kind: EntityKind,
    pub label: String,
    /// Hit or collected; never resolves twice
    pub resolved: bool,
}

/// Whether `entity` is inside the collision window of an actor in `lane`
pub fn collides(entity: &LaneEntity, lane: i8, player_depth: f32, tolerance: f32) -> bool {
    !entity.resolved && entity.lane == lane && (entity.depth - player_depth).abs() <= tolerance
}

/// Cumulative-probability selection: the first entry whose running sum reaches `roll`.
/// Falls back to the first entry when the weights sum below `roll`.
pub fn pick_weighted<T>(items: &[T], weight: impl Fn(&T) -> f32, roll: f32) -> Option<&T> {
    let mut cumulative = 0.0;
    items
        .iter()
        .find(|item| {
            cumulative += weight(item);
            roll <= cumulative
        })
        .or_else(|| items.first())
}

#[derive(Debug, Clone)]
enum Rules {
    Endurance(DodgerTuning),
    Collect(CollectorTuning),
}

impl Rules {
    fn lane(&self) -> &LaneTuning {
        match self {
            Rules::Endurance(t) => &t.lane,
            Rules::Collect(t) => &t.lane,
        }
    }
}

/// Per-frame presentation of one entity
#[derive(Debug, Clone, Serialize)]
pub struct EntityView {
    pub id: u32,
    pub label: String,
    pub coin: bool,
    /// Action that clears this obstacle
    pub avoid: Option<Avoidance>,
    pub lane: i8,
    pub depth: f32,
    pub screen: Projected,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunnerView {
    pub kind: GameKind,
    pub phase: GamePhase,
    pub level: usize,
    /// Level name (collector) or time-of-day theme (dodger)
    pub stage: String,
    pub lane: i8,
    pub action: RunnerAction,
    pub actor: Projected,
    pub resource: f32,
    pub resource_fraction: f32,
    pub score: u32,
    pub goal: Option<u32>,
    pub distance: f32,
    pub speed: f32,
    pub question: Option<String>,
    pub message: Option<String>,
    pub entities: Vec<EntityView>,
}

/// Endless lane runner in either endurance or coin-goal mode
pub struct RunnerGame {
    rules: Rules,
    projection: Projection,
    rng: Pcg32,
    pub phase: GamePhase,
    /// Collector level or dodger theme index
    pub level: usize,
    pub lane: i8,
    pub action: RunnerAction,
    action_until_ms: f64,
    clock_ms: f64,
    pub speed: f32,
    pub distance: f32,
    last_spawn: f32,
    pub entities: Vec<LaneEntity>,
    next_id: u32,
    pub resource: Meter,
    /// Dodger score or collector coins
    pub score: u32,
    message: Option<String>,
}

impl RunnerGame {
    /// Dodger: starts playing immediately
    pub fn endurance(tuning: DodgerTuning, projection: Projection, seed: u64) -> Self {
        let resource = Meter::full(tuning.max_concentration);
        let speed = tuning.start_speed;
        let mut game = Self::blank(Rules::Endurance(tuning), projection, seed, resource, speed);
        game.phase = GamePhase::Playing;
        game
    }

    /// Collector: opens on the first level's intro banner
    pub fn collector(tuning: CollectorTuning, projection: Projection, seed: u64) -> Self {
        let mut game = Self::blank(
            Rules::Collect(tuning),
            projection,
            seed,
            Meter::full(100.0),
            0.0,
        );
        game.start_collector_level(0);
        game
    }

    fn blank(rules: Rules, projection: Projection, seed: u64, resource: Meter, speed: f32) -> Self {
        Self {
            rules,
            projection,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Intro,
            level: 0,
            lane: 0,
            action: RunnerAction::Run,
            action_until_ms: 0.0,
            clock_ms: 0.0,
            speed,
            distance: 0.0,
            last_spawn: 0.0,
            entities: Vec::new(),
            next_id: 1,
            resource,
            score: 0,
            message: None,
        }
    }

    fn start_collector_level(&mut self, level: usize) {
        let Rules::Collect(t) = &self.rules else {
            return;
        };
        let Some(spec) = t.levels.get(level) else {
            return;
        };
        log::info!("Runner level {} ({}) goal {}", level + 1, spec.name, spec.goal);
        self.speed = spec.speed;
        self.message = Some(spec.name.clone());
        self.level = level;
        self.phase = GamePhase::Intro;
        self.restart_run();
    }

    /// Clear the track and actor state, keeping level/phase
    fn restart_run(&mut self) {
        self.lane = 0;
        self.action = RunnerAction::Run;
        self.action_until_ms = 0.0;
        self.clock_ms = 0.0;
        self.distance = 0.0;
        self.last_spawn = 0.0;
        self.entities.clear();
        self.resource.refill();
        self.score = 0;
        if let Rules::Endurance(t) = &self.rules {
            self.speed = t.start_speed;
            self.level = 0;
        }
    }

    /// Allocate a new entity ID
    fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Place an entity on the track
    pub fn spawn_at(&mut self, lane: i8, depth: f32, kind: EntityKind, label: &str) -> u32 {
        let id = self.next_entity_id();
        self.entities.push(LaneEntity {
            id,
            lane: lane.clamp(-1, 1),
            depth,
            kind,
            label: label.to_string(),
            resolved: false,
        });
        id
    }

    fn spawn(&mut self) {
        let lane = LANES[self.rng.random_range(0..LANES.len())];
        let roll: f32 = self.rng.random();
        let pick: f32 = self.rng.random();
        let (coins, spacing, obstacle) = match &self.rules {
            Rules::Endurance(t) if roll < t.coin_chance => (1, 0.0, None),
            Rules::Endurance(t) => {
                let theme = t.themes.get(self.level).or_else(|| t.themes.last());
                let spec = theme.and_then(|th| pick_obstacle(&th.obstacles, pick));
                (0, 0.0, spec.cloned())
            }
            Rules::Collect(t) if roll < t.coin_row_chance => {
                (t.coin_row_len, t.coin_row_spacing, None)
            }
            Rules::Collect(t) => (0, 0.0, pick_obstacle(&t.obstacles, pick).cloned()),
        };
        // Coin rows trail behind the spawn line
        for i in 0..coins {
            self.spawn_at(lane, -(i as f32) * spacing, EntityKind::Coin, "coin");
        }
        if let Some(spec) = obstacle {
            self.spawn_at(lane, 0.0, EntityKind::Obstacle { avoid: spec.avoid }, &spec.name);
        }
    }

    fn handle_controls(&mut self, input: &TickInput, events: &mut Vec<GameEvent>) {
        match input.pressed {
            Some(Direction::Left) => self.lane = (self.lane - 1).max(-1),
            Some(Direction::Right) => self.lane = (self.lane + 1).min(1),
            _ => {}
        }
        if self.action != RunnerAction::Run {
            return;
        }
        let next = if input.jump {
            RunnerAction::Jumping
        } else if input.duck {
            RunnerAction::Ducking
        } else {
            return;
        };
        self.action = next;
        self.action_until_ms = self.clock_ms + f64::from(self.rules.lane().action_ms);
        if next == RunnerAction::Jumping {
            events.push(GameEvent::Sound(SoundEffect::Jump));
        }
    }

    fn advance(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        self.clock_ms += f64::from(dt);
        if self.action != RunnerAction::Run && self.clock_ms >= self.action_until_ms {
            self.action = RunnerAction::Run;
        }

        if let Rules::Endurance(t) = &self.rules {
            self.speed = (self.speed + t.speed_ramp_per_ms * dt).min(t.max_speed);
        }
        self.distance += self.speed * dt / FRAME_MS;

        if let Rules::Endurance(t) = &self.rules {
            let threshold = (self.level + 1) as f32 * t.theme_distance;
            if self.distance > threshold && self.level + 1 < t.themes.len() {
                self.level += 1;
                self.resource.restore(t.theme_restore);
                let name = t.themes[self.level].name.clone();
                log::debug!("Dodger theme -> {}", name);
                events.push(GameEvent::Sound(SoundEffect::LevelUp));
                events.push(GameEvent::Message(name.clone()));
                self.message = Some(name);
            }
        }
    }

    fn resolve_collisions(&mut self, events: &mut Vec<GameEvent>) {
        let lane = self.rules.lane().clone();
        let mut gained = 0;
        let mut damage = 0.0;
        for e in &mut self.entities {
            if !collides(e, self.lane, lane.player_depth, lane.hit_tolerance) {
                continue;
            }
            match e.kind {
                EntityKind::Coin => {
                    e.resolved = true;
                    gained += 1;
                    events.push(GameEvent::Sound(SoundEffect::Coin));
                }
                EntityKind::Obstacle { avoid } => {
                    if avoids(self.action, avoid) {
                        continue;
                    }
                    e.resolved = true;
                    damage += match &self.rules {
                        Rules::Endurance(t) => t.obstacle_damage,
                        Rules::Collect(_) => self.resource.max(),
                    };
                    events.push(GameEvent::Sound(SoundEffect::Error));
                    events.push(GameEvent::Message(format!("Hit {}", e.label)));
                }
            }
        }
        self.entities
            .retain(|e| !(e.resolved && e.kind == EntityKind::Coin));

        match &self.rules {
            Rules::Endurance(t) => {
                self.score += gained * t.coin_score;
                self.resource.restore(gained as f32 * t.coin_restore);
            }
            Rules::Collect(t) => self.score += gained * t.coin_value,
        }
        if damage > 0.0 && self.resource.drain(damage) {
            self.finish(false, events);
        }
    }

    fn check_goal(&mut self, events: &mut Vec<GameEvent>) {
        match &self.rules {
            Rules::Endurance(t) => {
                if t.finish_distance.is_some_and(|d| self.distance >= d) {
                    self.finish(true, events);
                }
            }
            Rules::Collect(t) => {
                let Some(level) = t.levels.get(self.level) else {
                    return;
                };
                if self.score >= level.goal {
                    let question = level.question.clone();
                    if transition(&mut self.phase, GamePhase::Math, events) {
                        events.push(GameEvent::Sound(SoundEffect::Success));
                        events.push(GameEvent::Message(question.clone()));
                        self.message = Some(question);
                    }
                }
            }
        }
    }

    /// End of a run
    fn finish(&mut self, won: bool, events: &mut Vec<GameEvent>) {
        let next = if won { GamePhase::Won } else { GamePhase::Lost };
        if !transition(&mut self.phase, next, events) {
            return;
        }
        if won {
            events.push(GameEvent::Sound(SoundEffect::Win));
        }
        let earned = self.score / 10;
        if matches!(self.rules, Rules::Endurance(_)) && earned > 0 {
            events.push(GameEvent::AwardPoints(earned));
        }
        let text = if won { "You made it!" } else { "Game over" };
        self.message = Some(text.to_string());
    }

    /// Arithmetic gate answer
    pub fn answer(&mut self, value: i64, events: &mut Vec<GameEvent>) {
        if self.phase != GamePhase::Math {
            return;
        }
        let Rules::Collect(t) = &self.rules else {
            return;
        };
        let Some(level) = t.levels.get(self.level) else {
            return;
        };
        if value != level.answer {
            events.push(GameEvent::Sound(SoundEffect::Error));
            events.push(GameEvent::Message("Not quite, try again".to_string()));
            self.message = Some("Not quite, try again".to_string());
            return;
        }
        let (points, delay) = (t.level_points, t.advance_delay_ms);
        transition(&mut self.phase, GamePhase::LevelComplete, events);
        events.push(GameEvent::Sound(SoundEffect::LevelUp));
        events.push(GameEvent::AwardPoints(points));
        events.push(GameEvent::Message("Correct!".to_string()));
        events.push(GameEvent::Schedule {
            delay_ms: delay,
            transition: Transition::NextLevel,
        });
        self.message = Some("Correct!".to_string());
    }

    fn retry(&mut self, events: &mut Vec<GameEvent>) {
        self.restart_run();
        transition(&mut self.phase, GamePhase::Playing, events);
        self.message = None;
    }
}

fn pick_obstacle(table: &[ObstacleSpec], roll: f32) -> Option<&ObstacleSpec> {
    pick_weighted(table, |o| o.weight, roll)
}

impl MiniGame for RunnerGame {
    fn kind(&self) -> GameKind {
        match self.rules {
            Rules::Endurance(_) => GameKind::Dodger,
            Rules::Collect(_) => GameKind::Collector,
        }
    }

    fn phase(&self) -> GamePhase {
        self.phase
    }

    fn step(&mut self, input: &TickInput, dt_ms: f32, events: &mut Vec<GameEvent>) {
        if input.pause && toggle_pause(&mut self.phase, events) {
            return;
        }
        match self.phase {
            GamePhase::Intro if input.confirm => {
                transition(&mut self.phase, GamePhase::Playing, events);
                self.message = None;
                return;
            }
            GamePhase::Lost if input.confirm => {
                self.retry(events);
                return;
            }
            GamePhase::Math => {
                if let Some(value) = input.answer {
                    self.answer(value, events);
                }
                return;
            }
            GamePhase::Playing => {}
            _ => return,
        }

        self.handle_controls(input, events);

        // 1. Clock and speed
        self.advance(dt_ms, events);

        // 2. Spawn
        let gap = self.rules.lane().spawn_gap;
        if self.distance - self.last_spawn > gap {
            self.spawn();
            self.last_spawn = self.distance;
        }

        // 3. Move
        let step = self.speed * dt_ms / self.rules.lane().ms_per_depth;
        for e in &mut self.entities {
            e.depth += step;
        }

        // 4. Cull
        let cull = self.rules.lane().cull_depth;
        self.entities.retain(|e| e.depth < cull);

        // 5. Collide
        self.resolve_collisions(events);

        // 6. Terminal
        if self.phase == GamePhase::Playing {
            self.check_goal(events);
        }
    }

    fn apply(&mut self, transition_kind: Transition, events: &mut Vec<GameEvent>) {
        let Transition::NextLevel = transition_kind;
        if self.phase != GamePhase::LevelComplete {
            return;
        }
        let Rules::Collect(t) = &self.rules else {
            return;
        };
        let next = self.level + 1;
        if next >= t.levels.len() {
            let points = t.final_points;
            if transition(&mut self.phase, GamePhase::Won, events) {
                events.push(GameEvent::Sound(SoundEffect::Win));
                events.push(GameEvent::AwardPoints(points));
                self.message = Some("All levels complete!".to_string());
            }
            return;
        }
        transition(&mut self.phase, GamePhase::Intro, events);
        self.start_collector_level(next);
    }

    fn snapshot(&self) -> Snapshot {
        let lane = self.rules.lane();
        let (stage, goal, question) = match &self.rules {
            Rules::Endurance(t) => (
                t.themes
                    .get(self.level)
                    .map(|th| th.name.clone())
                    .unwrap_or_default(),
                None,
                None,
            ),
            Rules::Collect(t) => {
                let level = t.levels.get(self.level);
                (
                    level.map(|l| l.name.clone()).unwrap_or_default(),
                    level.map(|l| l.goal),
                    level
                        .filter(|_| self.phase == GamePhase::Math)
                        .map(|l| l.question.clone()),
                )
            }
        };
        let mut entities: Vec<EntityView> = self
            .entities
            .iter()
            .filter(|e| !e.resolved || e.kind != EntityKind::Coin)
            .map(|e| EntityView {
                id: e.id,
                label: e.label.clone(),
                coin: e.kind == EntityKind::Coin,
                avoid: match e.kind {
                    EntityKind::Obstacle { avoid } => Some(avoid),
                    EntityKind::Coin => None,
                },
                lane: e.lane,
                depth: e.depth,
                screen: self.projection.project(e.lane, e.depth),
            })
            .collect();
        entities.sort_by_key(|e| (e.screen.layer, e.id));

        Snapshot::Runner(RunnerView {
            kind: self.kind(),
            phase: self.phase,
            level: self.level,
            stage,
            lane: self.lane,
            action: self.action,
            actor: self.projection.project(self.lane, lane.player_depth),
            resource: self.resource.value(),
            resource_fraction: self.resource.fraction(),
            score: self.score,
            goal,
            distance: self.distance,
            speed: self.speed,
            question,
            message: self.message.clone(),
            entities,
        })
    }

    fn reset(&mut self, events: &mut Vec<GameEvent>) {
        log::info!("Runner reset");
        self.message = None;
        match self.rules {
            Rules::Endurance(_) => {
                self.restart_run();
                if self.phase != GamePhase::Playing {
                    let from = self.phase;
                    self.phase = GamePhase::Playing;
                    events.push(GameEvent::PhaseChanged {
                        from,
                        to: GamePhase::Playing,
                    });
                }
            }
            Rules::Collect(_) => {
                let from = self.phase;
                self.start_collector_level(0);
                events.push(GameEvent::PhaseChanged {
                    from,
                    to: self.phase,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT_MS;
    use crate::sim::events::played;
    use crate::tuning::Tuning;

    fn quiet_dodger() -> RunnerGame {
        let mut t = Tuning::default().dodger;
        t.lane.spawn_gap = f32::MAX;
        t.speed_ramp_per_ms = 0.0;
        t.finish_distance = None;
        RunnerGame::endurance(t, Projection::default(), 1)
    }

    fn quiet_collector() -> RunnerGame {
        let mut t = Tuning::default().collector;
        t.lane.spawn_gap = f32::MAX;
        t.levels.truncate(2);
        t.levels[0].goal = 10;
        t.levels[1].goal = 10;
        RunnerGame::collector(t, Projection::default(), 1)
    }

    fn run(game: &mut RunnerGame, input: &TickInput, ticks: usize) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for _ in 0..ticks {
            game.step(input, SIM_DT_MS, &mut events);
        }
        events
    }

    fn errors(events: &[GameEvent]) -> usize {
        events
            .iter()
            .filter(|e| **e == GameEvent::Sound(SoundEffect::Error))
            .count()
    }

    #[test]
    fn test_pick_weighted_cumulative() {
        let table = [("a", 0.35), ("b", 0.30), ("c", 0.20), ("d", 0.15)];
        let w = |t: &(&str, f32)| t.1;
        assert_eq!(pick_weighted(&table, w, 0.0).unwrap().0, "a");
        assert_eq!(pick_weighted(&table, w, 0.35).unwrap().0, "a");
        assert_eq!(pick_weighted(&table, w, 0.36).unwrap().0, "b");
        assert_eq!(pick_weighted(&table, w, 0.84).unwrap().0, "c");
        assert_eq!(pick_weighted(&table, w, 0.99).unwrap().0, "d");
        let empty: [(&str, f32); 0] = [];
        assert!(pick_weighted(&empty, w, 0.5).is_none());
        // Underweight table falls back to the first entry
        let light = [("x", 0.1), ("y", 0.1)];
        assert_eq!(pick_weighted(&light, w, 0.9).unwrap().0, "x");
    }

    #[test]
    fn test_avoidance_policy() {
        use Avoidance::*;
        use RunnerAction::*;
        assert!(avoids(Jumping, Jump));
        assert!(avoids(Ducking, Duck));
        assert!(!avoids(Run, Jump));
        assert!(!avoids(Ducking, Jump));
        assert!(!avoids(Jumping, Duck));
        assert!(!avoids(Jumping, Dodge));
        assert!(!avoids(Ducking, Dodge));
    }

    #[test]
    fn test_low_obstacle_hits_idle_runner_once() {
        let mut game = quiet_dodger();
        game.spawn_at(0, 0.0, EntityKind::Obstacle { avoid: Avoidance::Jump }, "low");
        // ~1.17 depth per tick at speed 0.7; run well past the cull line
        let events = run(&mut game, &TickInput::default(), 120);
        assert_eq!(game.resource.value(), 75.0);
        assert_eq!(errors(&events), 1);
        assert!(game.entities.is_empty());
        assert_eq!(game.phase, GamePhase::Playing);
    }

    #[test]
    fn test_jumping_clears_low_obstacle() {
        let mut game = quiet_dodger();
        game.spawn_at(0, 80.0, EntityKind::Obstacle { avoid: Avoidance::Jump }, "low");
        let jump = TickInput {
            jump: true,
            ..Default::default()
        };
        let mut events = run(&mut game, &jump, 1);
        events.extend(run(&mut game, &TickInput::default(), 30));
        assert_eq!(game.resource.value(), 100.0);
        assert_eq!(errors(&events), 0);
        assert!(played(&events, SoundEffect::Jump));
    }

    #[test]
    fn test_jump_does_not_clear_high_obstacle() {
        let mut game = quiet_dodger();
        game.spawn_at(0, 80.0, EntityKind::Obstacle { avoid: Avoidance::Duck }, "high");
        let jump = TickInput {
            jump: true,
            ..Default::default()
        };
        let mut events = run(&mut game, &jump, 1);
        events.extend(run(&mut game, &TickInput::default(), 30));
        assert_eq!(game.resource.value(), 75.0);
        assert_eq!(errors(&events), 1);
    }

    #[test]
    fn test_other_lane_is_safe() {
        let mut game = quiet_dodger();
        game.spawn_at(1, 0.0, EntityKind::Obstacle { avoid: Avoidance::Dodge }, "wall");
        let events = run(&mut game, &TickInput::default(), 120);
        assert_eq!(errors(&events), 0);
    }

    #[test]
    fn test_coin_restores_and_scores() {
        let mut game = quiet_dodger();
        game.resource.drain(30.0);
        game.spawn_at(0, 80.0, EntityKind::Coin, "coin");
        let events = run(&mut game, &TickInput::default(), 30);
        assert_eq!(game.score, 10);
        assert_eq!(game.resource.value(), 75.0);
        assert!(played(&events, SoundEffect::Coin));
    }

    #[test]
    fn test_depletion_loses_once() {
        let mut game = quiet_dodger();
        for lane_depth in [0.0, -20.0, -40.0, -60.0, -80.0] {
            game.spawn_at(0, lane_depth, EntityKind::Obstacle { avoid: Avoidance::Dodge }, "wall");
        }
        game.score = 55;
        let events = run(&mut game, &TickInput::default(), 240);
        assert_eq!(game.phase, GamePhase::Lost);
        assert_eq!(game.resource.value(), 0.0);
        let losses = events
            .iter()
            .filter(|e| matches!(e, GameEvent::PhaseChanged { to: GamePhase::Lost, .. }))
            .count();
        assert_eq!(losses, 1);
        assert_eq!(events.iter().filter(|e| **e == GameEvent::AwardPoints(5)).count(), 1);
    }

    #[test]
    fn test_scoreless_loss_awards_nothing() {
        let mut game = quiet_dodger();
        for lane_depth in [0.0, -20.0, -40.0, -60.0] {
            game.spawn_at(0, lane_depth, EntityKind::Obstacle { avoid: Avoidance::Dodge }, "wall");
        }
        game.score = 9;
        let events = run(&mut game, &TickInput::default(), 240);
        assert_eq!(game.phase, GamePhase::Lost);
        assert!(!events.iter().any(|e| matches!(e, GameEvent::AwardPoints(_))));
    }

    #[test]
    fn test_lane_changes_clamp() {
        let mut game = quiet_dodger();
        let left = TickInput {
            pressed: Some(Direction::Left),
            ..Default::default()
        };
        run(&mut game, &left, 3);
        assert_eq!(game.lane, -1);
    }

    #[test]
    fn test_theme_advances_with_distance() {
        let mut t = Tuning::default().dodger;
        t.theme_distance = 5.0;
        t.finish_distance = None;
        let mut game = RunnerGame::endurance(t, Projection::default(), 3);
        game.resource.drain(50.0);
        let events = run(&mut game, &TickInput::default(), 10);
        assert_eq!(game.level, 1);
        assert_eq!(game.resource.value(), 70.0);
        assert!(played(&events, SoundEffect::LevelUp));
    }

    #[test]
    fn test_spawner_keeps_gap() {
        let mut t = Tuning::default().dodger;
        t.obstacle_damage = 0.0;
        let mut game = RunnerGame::endurance(t, Projection::default(), 8);
        run(&mut game, &TickInput::default(), 600);
        // 600 frames at ~0.7-0.9 speed spawn one entity per 40 distance
        assert!(game.next_id > 5);
        for pair in game.entities.windows(2) {
            assert!(pair[0].id < pair[1].id);
        }
    }

    #[test]
    fn test_collector_flow_to_math_and_next_level() {
        let mut game = quiet_collector();
        assert_eq!(game.phase, GamePhase::Intro);
        let confirm = TickInput {
            confirm: true,
            ..Default::default()
        };
        run(&mut game, &confirm, 1);
        assert_eq!(game.phase, GamePhase::Playing);

        game.spawn_at(0, 85.0, EntityKind::Coin, "coin");
        let events = run(&mut game, &TickInput::default(), 5);
        assert_eq!(game.phase, GamePhase::Math);
        assert!(played(&events, SoundEffect::Success));
        let Snapshot::Runner(view) = game.snapshot() else {
            panic!("runner snapshot expected");
        };
        assert!(view.question.is_some());

        // Gameplay input is ignored during the gate
        let left = TickInput {
            pressed: Some(Direction::Left),
            ..Default::default()
        };
        run(&mut game, &left, 1);
        assert_eq!(game.lane, 0);

        let wrong = TickInput {
            answer: Some(7),
            ..Default::default()
        };
        let events = run(&mut game, &wrong, 1);
        assert_eq!(game.phase, GamePhase::Math);
        assert_eq!(errors(&events), 1);

        let right = TickInput {
            answer: Some(50),
            ..Default::default()
        };
        let events = run(&mut game, &right, 1);
        assert_eq!(game.phase, GamePhase::LevelComplete);
        assert!(events.contains(&GameEvent::AwardPoints(20)));
        assert!(events.contains(&GameEvent::Schedule {
            delay_ms: 1500,
            transition: Transition::NextLevel
        }));

        let mut events = Vec::new();
        game.apply(Transition::NextLevel, &mut events);
        assert_eq!(game.phase, GamePhase::Intro);
        assert_eq!(game.level, 1);
        assert_eq!(game.score, 0);
    }

    #[test]
    fn test_collector_last_level_wins() {
        let mut game = quiet_collector();
        game.level = 1;
        game.phase = GamePhase::LevelComplete;
        let mut events = Vec::new();
        game.apply(Transition::NextLevel, &mut events);
        assert_eq!(game.phase, GamePhase::Won);
        assert!(events.contains(&GameEvent::AwardPoints(100)));
        assert!(played(&events, SoundEffect::Win));

        // Won is terminal: a stray transition changes nothing
        let mut events = Vec::new();
        game.apply(Transition::NextLevel, &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn test_collector_crash_is_fatal_and_retry_keeps_level() {
        let mut game = quiet_collector();
        game.level = 1;
        game.phase = GamePhase::Playing;
        game.spawn_at(0, 85.0, EntityKind::Obstacle { avoid: Avoidance::Dodge }, "wall");
        run(&mut game, &TickInput::default(), 2);
        assert_eq!(game.phase, GamePhase::Lost);

        let confirm = TickInput {
            confirm: true,
            ..Default::default()
        };
        run(&mut game, &confirm, 1);
        assert_eq!(game.phase, GamePhase::Playing);
        assert_eq!(game.level, 1);
        assert!(game.entities.is_empty());
    }

    #[test]
    fn test_pause_freezes_track() {
        let mut game = quiet_dodger();
        game.spawn_at(0, 10.0, EntityKind::Coin, "coin");
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        run(&mut game, &pause, 1);
        assert_eq!(game.phase, GamePhase::Paused);
        run(&mut game, &TickInput::default(), 20);
        assert_eq!(game.entities[0].depth, 10.0);
    }
}
