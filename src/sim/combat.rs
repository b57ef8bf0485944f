//! Side-scrolling brawler
//!
//! Per-frame units: gravity, velocity and walk speed are expressed per 60 Hz frame and
//! scaled by `dt / FRAME_MS`. Strikes land after a short wind-up on the sim clock; range,
//! facing and blocking are re-checked at the moment a strike lands.

use std::str::FromStr;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::events::{GameEvent, Transition};
use super::input::{Direction, TickInput};
use super::meter::Meter;
use super::phase::{GamePhase, toggle_pause, transition};
use super::{GameKind, MiniGame, Snapshot};
use crate::audio::SoundEffect;
use crate::consts::FRAME_MS;
use crate::tuning::BrawlTuning;

/// Player attack buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackKind {
    /// Short, fast jab
    Quick,
    /// Block with a small push-back hit
    Guard,
    /// Long reach, slow recovery
    Heavy,
}

impl FromStr for AttackKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "quick" => Ok(AttackKind::Quick),
            "guard" => Ok(AttackKind::Guard),
            "heavy" => Ok(AttackKind::Heavy),
            _ => Err(format!("unknown attack '{s}'")),
        }
    }
}

/// Current action/state tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FighterAction {
    Idle,
    Walking,
    Jumping,
    Attacking,
    /// Incoming strikes deal no damage
    Blocking,
    Hurt,
}

#[derive(Debug, Clone, Serialize)]
pub struct Fighter {
    pub pos: Vec2,
    pub vel: Vec2,
    /// +1 faces right, -1 faces left
    pub facing: f32,
    pub grounded: bool,
    pub action: FighterAction,
    pub action_until_ms: f64,
    /// Next time an attack may start
    pub cooldown_until_ms: f64,
    pub last_attack: Option<AttackKind>,
    pub health: Meter,
}

impl Fighter {
    pub fn new(x: f32, ground_y: f32, facing: f32, health: f32) -> Self {
        Self {
            pos: Vec2::new(x, ground_y),
            vel: Vec2::ZERO,
            facing,
            grounded: true,
            action: FighterAction::Idle,
            action_until_ms: 0.0,
            cooldown_until_ms: 0.0,
            last_attack: None,
            health: Meter::full(health),
        }
    }

    fn can_act(&self, now: f64) -> bool {
        self.action != FighterAction::Hurt && now >= self.cooldown_until_ms
    }
}

/// Ground and walls
#[derive(Debug, Clone, Copy)]
pub struct Arena {
    pub gravity: f32,
    pub ground_y: f32,
    pub max_x: f32,
}

impl Arena {
    pub fn from_tuning(t: &BrawlTuning) -> Self {
        Self {
            gravity: t.gravity,
            ground_y: t.ground_y,
            max_x: (t.arena_width - t.sprite_width).max(0.0),
        }
    }
}

/// Gravity, position integration, ground contact and wall clamp
pub fn integrate(f: &mut Fighter, arena: &Arena, frames: f32) {
    f.vel.y += arena.gravity * frames;
    f.pos += f.vel * frames;
    if f.pos.y >= arena.ground_y {
        f.pos.y = arena.ground_y;
        f.vel.y = 0.0;
        f.grounded = true;
        if f.action == FighterAction::Jumping {
            f.action = FighterAction::Idle;
        }
    } else {
        f.grounded = false;
    }
    f.pos.x = f.pos.x.clamp(0.0, arena.max_x);
}

/// Defender within `range` and on the side the attacker faces
pub fn in_strike_zone(attacker: &Fighter, defender: &Fighter, range: f32) -> bool {
    let dx = defender.pos.x - attacker.pos.x;
    dx.abs() < range && dx * attacker.facing >= 0.0
}

/// Damage after the defender's stance at resolution time
pub fn resolve_strike(defender: FighterAction, damage: f32) -> f32 {
    if defender == FighterAction::Blocking {
        0.0
    } else {
        damage.max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    Player,
    Enemy,
}

/// Strike in flight between activation and impact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingStrike {
    pub by: Side,
    pub damage: f32,
    pub range: f32,
    pub lands_at_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BrawlView {
    pub phase: GamePhase,
    pub round: usize,
    pub enemy_name: String,
    pub player: Fighter,
    pub enemy: Fighter,
    pub message: Option<String>,
}

pub struct BrawlGame {
    tuning: BrawlTuning,
    arena: Arena,
    rng: Pcg32,
    pub phase: GamePhase,
    pub round: usize,
    clock_ms: f64,
    pub player: Fighter,
    pub enemy: Fighter,
    pub strikes: Vec<PendingStrike>,
    message: Option<String>,
}

impl BrawlGame {
    pub fn new(tuning: BrawlTuning, seed: u64) -> Self {
        let arena = Arena::from_tuning(&tuning);
        let player = Fighter::new(tuning.player_start_x, arena.ground_y, 1.0, tuning.player_health);
        let enemy = player.clone();
        let mut game = Self {
            tuning,
            arena,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Playing,
            round: 0,
            clock_ms: 0.0,
            player,
            enemy,
            strikes: Vec::new(),
            message: None,
        };
        game.start_round(0);
        game
    }

    fn start_round(&mut self, round: usize) {
        let t = &self.tuning;
        let Some(spec) = t.enemies.get(round) else {
            return;
        };
        log::info!("Brawl round {} vs {} ({} hp)", round + 1, spec.name, spec.health);
        self.player = Fighter::new(t.player_start_x, t.ground_y, 1.0, t.player_health);
        self.enemy = Fighter::new(t.enemy_start_x, t.ground_y, -1.0, spec.health);
        self.message = Some(spec.name.clone());
        self.round = round;
        self.strikes.clear();
    }

    pub fn enemy_name(&self) -> &str {
        self.tuning
            .enemies
            .get(self.round)
            .map_or("", |e| e.name.as_str())
    }

    fn expire_actions(f: &mut Fighter, now: f64) {
        let timed = matches!(
            f.action,
            FighterAction::Attacking | FighterAction::Blocking | FighterAction::Hurt
        );
        if timed && now >= f.action_until_ms {
            f.action = if f.grounded {
                FighterAction::Idle
            } else {
                FighterAction::Jumping
            };
        }
    }

    fn player_controls(&mut self, input: &TickInput, events: &mut Vec<GameEvent>) {
        let t = &self.tuning;
        let p = &mut self.player;
        if p.action == FighterAction::Hurt {
            p.vel.x = 0.0;
            return;
        }

        match input.held {
            Some(dir @ (Direction::Left | Direction::Right)) => {
                let sign = dir.lateral() as f32;
                p.vel.x = sign * t.walk_speed;
                p.facing = sign;
                if p.action == FighterAction::Idle {
                    p.action = FighterAction::Walking;
                }
            }
            _ => {
                p.vel.x = 0.0;
                if p.action == FighterAction::Walking {
                    p.action = FighterAction::Idle;
                }
            }
        }

        if input.jump && p.grounded {
            p.vel.y = t.jump_impulse;
            p.grounded = false;
            if matches!(p.action, FighterAction::Idle | FighterAction::Walking) {
                p.action = FighterAction::Jumping;
            }
            events.push(GameEvent::Sound(SoundEffect::Jump));
        }

        if let Some(kind) = input.attack {
            self.player_attack(kind, events);
        }
    }

    fn player_attack(&mut self, kind: AttackKind, events: &mut Vec<GameEvent>) {
        let now = self.clock_ms;
        if !self.player.can_act(now) {
            return;
        }
        let Some(spec) = self.tuning.attack(kind).cloned() else {
            return;
        };
        let p = &mut self.player;
        p.cooldown_until_ms = now + f64::from(spec.cooldown_ms);
        p.action_until_ms = p.cooldown_until_ms;
        p.last_attack = Some(kind);
        p.action = if kind == AttackKind::Guard {
            FighterAction::Blocking
        } else {
            FighterAction::Attacking
        };
        events.push(GameEvent::Sound(spec.sound));

        if kind == AttackKind::Guard {
            let dx = self.enemy.pos.x - self.player.pos.x;
            if dx.abs() < self.tuning.guard_push_range {
                self.enemy.pos.x = (self.enemy.pos.x + self.player.facing * self.tuning.guard_push)
                    .clamp(0.0, self.arena.max_x);
            }
        }

        // Whiffs never schedule a strike
        if in_strike_zone(&self.player, &self.enemy, spec.range) {
            self.strikes.push(PendingStrike {
                by: Side::Player,
                damage: spec.damage,
                range: spec.range,
                lands_at_ms: now + f64::from(self.tuning.player_windup_ms),
            });
        }
    }

    /// Approach until in range, then attack off cooldown with the enemy's aggression
    fn enemy_think(&mut self) {
        let now = self.clock_ms;
        let t = &self.tuning;
        let Some(spec) = t.enemies.get(self.round) else {
            return;
        };
        let e = &mut self.enemy;
        if e.action == FighterAction::Hurt {
            e.vel.x = 0.0;
            return;
        }
        let dx = self.player.pos.x - e.pos.x;
        if dx != 0.0 {
            e.facing = dx.signum();
        }

        if dx.abs() > t.engage_range {
            e.vel.x = e.facing * spec.speed * t.approach_factor;
            if e.action == FighterAction::Idle {
                e.action = FighterAction::Walking;
            }
            return;
        }

        e.vel.x = 0.0;
        if e.action == FighterAction::Walking {
            e.action = FighterAction::Idle;
        }
        if !e.can_act(now) {
            return;
        }
        let commit: f32 = self.rng.random();
        if commit >= spec.aggression {
            return;
        }
        e.action = FighterAction::Attacking;
        e.action_until_ms = now + f64::from(t.enemy_windup_ms);
        e.cooldown_until_ms = now + f64::from(t.enemy_cooldown_ms);
        self.strikes.push(PendingStrike {
            by: Side::Enemy,
            damage: spec.damage,
            range: t.enemy_strike_range,
            lands_at_ms: now + f64::from(t.enemy_windup_ms),
        });
    }

    /// Apply one strike. Returns true when it empties the defender.
    fn land(&mut self, strike: PendingStrike, events: &mut Vec<GameEvent>) -> bool {
        let now = self.clock_ms;
        let stun = f64::from(self.tuning.stun_ms);
        let (attacker, defender) = match strike.by {
            Side::Player => (&self.player, &mut self.enemy),
            Side::Enemy => (&self.enemy, &mut self.player),
        };
        if !in_strike_zone(attacker, defender, strike.range) {
            return false;
        }

        let dealt = resolve_strike(defender.action, strike.damage);
        let sound = match strike.by {
            Side::Player => SoundEffect::Hit,
            Side::Enemy if dealt == 0.0 => SoundEffect::Shield,
            Side::Enemy => SoundEffect::Damage,
        };
        events.push(GameEvent::Sound(sound));
        if dealt <= 0.0 {
            return false;
        }

        let emptied = defender.health.drain(dealt);
        defender.action = FighterAction::Hurt;
        defender.action_until_ms = now + stun;
        defender.cooldown_until_ms = defender.cooldown_until_ms.max(now + stun);
        defender.vel.x = 0.0;
        emptied
    }

    fn resolve_due_strikes(&mut self, events: &mut Vec<GameEvent>) {
        let now = self.clock_ms;
        let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.strikes)
            .into_iter()
            .partition(|s| s.lands_at_ms <= now);
        self.strikes = pending;

        for strike in due {
            if self.phase != GamePhase::Playing {
                break;
            }
            if !self.land(strike, events) {
                continue;
            }
            match strike.by {
                Side::Player => self.round_won(events),
                Side::Enemy => {
                    if transition(&mut self.phase, GamePhase::Lost, events) {
                        events.push(GameEvent::Message("You were defeated".to_string()));
                        self.message = Some("You were defeated".to_string());
                    }
                }
            }
        }
    }

    fn round_won(&mut self, events: &mut Vec<GameEvent>) {
        let name = self.enemy_name().to_string();
        if self.round + 1 >= self.tuning.enemies.len() {
            if transition(&mut self.phase, GamePhase::Won, events) {
                events.push(GameEvent::Sound(SoundEffect::Win));
                events.push(GameEvent::AwardPoints(self.tuning.victory_points));
                self.message = Some("Every rival defeated!".to_string());
            }
            return;
        }
        if transition(&mut self.phase, GamePhase::LevelComplete, events) {
            let text = format!("{name} defeated!");
            events.push(GameEvent::Message(text.clone()));
            events.push(GameEvent::Schedule {
                delay_ms: self.tuning.round_delay_ms,
                transition: Transition::NextLevel,
            });
            self.message = Some(text);
        }
    }
}

impl MiniGame for BrawlGame {
    fn kind(&self) -> GameKind {
        GameKind::Brawl
    }

    fn phase(&self) -> GamePhase {
        self.phase
    }

    fn step(&mut self, input: &TickInput, dt_ms: f32, events: &mut Vec<GameEvent>) {
        if input.pause && toggle_pause(&mut self.phase, events) {
            return;
        }
        match self.phase {
            GamePhase::Lost if input.confirm => {
                self.start_round(0);
                transition(&mut self.phase, GamePhase::Playing, events);
                return;
            }
            GamePhase::Playing => {}
            _ => return,
        }

        self.clock_ms += f64::from(dt_ms);
        let now = self.clock_ms;
        Self::expire_actions(&mut self.player, now);
        Self::expire_actions(&mut self.enemy, now);

        self.player_controls(input, events);
        self.enemy_think();

        let frames = dt_ms / FRAME_MS;
        integrate(&mut self.player, &self.arena, frames);
        integrate(&mut self.enemy, &self.arena, frames);

        self.resolve_due_strikes(events);
    }

    fn apply(&mut self, transition_kind: Transition, events: &mut Vec<GameEvent>) {
        let Transition::NextLevel = transition_kind;
        if self.phase != GamePhase::LevelComplete {
            return;
        }
        self.start_round(self.round + 1);
        if transition(&mut self.phase, GamePhase::Playing, events) {
            events.push(GameEvent::Sound(SoundEffect::LevelUp));
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::Brawl(BrawlView {
            phase: self.phase,
            round: self.round,
            enemy_name: self.enemy_name().to_string(),
            player: self.player.clone(),
            enemy: self.enemy.clone(),
            message: self.message.clone(),
        })
    }

    fn reset(&mut self, events: &mut Vec<GameEvent>) {
        let from = self.phase;
        self.start_round(0);
        self.phase = GamePhase::Playing;
        events.push(GameEvent::PhaseChanged {
            from,
            to: GamePhase::Playing,
        });
    }
}
