//! Data-driven game balance
//!
//! Every level/theme table lives here as plain serde data with built-in defaults.
//! A JSON document may override any subset; missing fields keep their defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audio::SoundEffect;
use crate::sim::combat::AttackKind;
use crate::sim::lane::Avoidance;
use crate::sim::maze::{MIN_SIZE, MazeParams, Mechanic};
use crate::sim::projection::Projection;

/// Errors raised when loading or validating tuning tables.
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("invalid tuning json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{table} must contain at least one entry")]
    EmptyTable { table: &'static str },
    #[error("maze level {index} size {size} must be odd and at least 5")]
    InvalidMazeSize { index: usize, size: usize },
    #[error("{field} = {value} must be between 0.0 and 1.0")]
    OutOfUnitRange { field: String, value: f32 },
    #[error("{table} weights sum to {total}, above 1.0")]
    WeightsExceedOne { table: String, total: f32 },
    #[error("{field} = {value} must be positive")]
    NotPositive { field: String, value: f32 },
    #[error("{field} = {value} must be between {min} and {max}")]
    OutOfBounds {
        field: String,
        value: i64,
        min: i64,
        max: i64,
    },
    #[error("{field} = {value} must not be negative")]
    Negative { field: String, value: f32 },
    #[error("attack table has no entry for {0:?}")]
    MissingAttack(AttackKind),
}

/// All game balance tables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub maze: MazeTuning,
    pub chase: ChaseTuning,
    pub dodger: DodgerTuning,
    pub collector: CollectorTuning,
    pub brawl: BrawlTuning,
    pub projection: Projection,
}

impl Tuning {
    /// Overlay a JSON document on the defaults and validate the result
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        self.maze.validate()?;
        self.chase.validate()?;
        self.dodger.validate()?;
        self.collector.validate()?;
        self.brawl.validate()
    }
}

fn unit(field: impl Into<String>, value: f32) -> Result<(), TuningError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TuningError::OutOfUnitRange {
            field: field.into(),
            value,
        })
    }
}

fn positive(field: impl Into<String>, value: f32) -> Result<(), TuningError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(TuningError::NotPositive {
            field: field.into(),
            value,
        })
    }
}

fn non_negative(field: impl Into<String>, value: f32) -> Result<(), TuningError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(TuningError::Negative {
            field: field.into(),
            value,
        })
    }
}

fn weights(table: impl Into<String>, obstacles: &[ObstacleSpec]) -> Result<(), TuningError> {
    let table = table.into();
    for o in obstacles {
        unit(format!("{table}.{}", o.name), o.weight)?;
    }
    let total: f32 = obstacles.iter().map(|o| o.weight).sum();
    if total > 1.0 + 1e-4 {
        return Err(TuningError::WeightsExceedOne { table, total });
    }
    Ok(())
}

// === Maze traversal ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MazeLevel {
    pub name: String,
    pub size: usize,
    pub mechanic: Mechanic,
    #[serde(default)]
    pub params: MazeParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MazeTuning {
    pub levels: Vec<MazeLevel>,
    /// Awarded once per goal reached
    pub level_points: u32,
}

impl Default for MazeTuning {
    fn default() -> Self {
        let level = |name: &str, mechanic, params| MazeLevel {
            name: name.to_string(),
            size: 15,
            mechanic,
            params,
        };
        Self {
            levels: vec![
                level("Faith", Mechanic::None, MazeParams::default()),
                level("Prayer", Mechanic::Illusion, MazeParams::default()),
                level(
                    "Charity",
                    Mechanic::CoinGate,
                    MazeParams {
                        braid_factor: 0.7,
                        ..Default::default()
                    },
                ),
                level("Fasting", Mechanic::Slow, MazeParams::default()),
                level("Pilgrimage", Mechanic::Portal, MazeParams::default()),
            ],
            level_points: 30,
        }
    }
}

impl MazeTuning {
    fn validate(&self) -> Result<(), TuningError> {
        if self.levels.is_empty() {
            return Err(TuningError::EmptyTable {
                table: "maze.levels",
            });
        }
        for (index, level) in self.levels.iter().enumerate() {
            if level.size < MIN_SIZE || level.size % 2 == 0 {
                return Err(TuningError::InvalidMazeSize {
                    index,
                    size: level.size,
                });
            }
            let p = &level.params;
            unit(format!("maze.levels[{index}].braid_factor"), p.braid_factor)?;
            unit(format!("maze.levels[{index}].illusion_ratio"), p.illusion_ratio)?;
            unit(format!("maze.levels[{index}].slow_ratio"), p.slow_ratio)?;
            unit(
                format!("maze.levels[{index}].slow_skip_chance"),
                p.slow_skip_chance,
            )?;
        }
        Ok(())
    }
}

// === Maze chase ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaseTuning {
    pub size: usize,
    pub braid_factor: f32,
    pub actor_step_ms: f32,
    pub pursuer_base_step_ms: f32,
    /// Pursuers speed up by this much per level
    pub pursuer_step_per_level: f32,
    pub pursuer_min_step_ms: f32,
    pub base_food: usize,
    pub food_per_level: usize,
    pub base_pursuers: usize,
    /// Chance a pursuer steps greedily toward the actor instead of at random
    pub chase_bias: f32,
    pub freeze_ms: f32,
    /// Pursuers spawn within this many cells of the bottom-right corner
    pub spawn_region: i32,
    pub placement_attempts: u32,
    pub food_score: u32,
    pub level_points: u32,
    pub final_points: u32,
    pub max_level: u32,
    pub advance_delay_ms: u32,
}

impl Default for ChaseTuning {
    fn default() -> Self {
        Self {
            size: 15,
            braid_factor: 0.7,
            actor_step_ms: 300.0,
            pursuer_base_step_ms: 500.0,
            pursuer_step_per_level: 30.0,
            pursuer_min_step_ms: 150.0,
            base_food: 10,
            food_per_level: 2,
            base_pursuers: 3,
            chase_bias: 0.4,
            freeze_ms: 5000.0,
            spawn_region: 4,
            placement_attempts: 100,
            food_score: 10,
            level_points: 20,
            final_points: 100,
            max_level: 6,
            advance_delay_ms: 1000,
        }
    }
}

impl ChaseTuning {
    fn validate(&self) -> Result<(), TuningError> {
        if self.size < MIN_SIZE || self.size % 2 == 0 {
            return Err(TuningError::InvalidMazeSize {
                index: 0,
                size: self.size,
            });
        }
        unit("chase.braid_factor", self.braid_factor)?;
        unit("chase.chase_bias", self.chase_bias)?;
        positive("chase.actor_step_ms", self.actor_step_ms)?;
        positive("chase.pursuer_min_step_ms", self.pursuer_min_step_ms)?;
        // The spawn square must fit inside the outer wall ring
        let inner = self.size as i64 - 2;
        if !(1..=inner).contains(&i64::from(self.spawn_region)) {
            return Err(TuningError::OutOfBounds {
                field: "chase.spawn_region".to_string(),
                value: i64::from(self.spawn_region),
                min: 1,
                max: inner,
            });
        }
        positive("chase.max_level", self.max_level as f32)
    }

    pub fn pursuer_step_ms(&self, level: u32) -> f32 {
        (self.pursuer_base_step_ms - self.pursuer_step_per_level * level as f32)
            .max(self.pursuer_min_step_ms)
    }
}

// === Lane runners ===

/// Lane geometry shared by both runner variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneTuning {
    pub player_depth: f32,
    /// Entities at or past this depth are culled
    pub cull_depth: f32,
    /// Distance travelled between spawns
    pub spawn_gap: f32,
    /// Half-width of the collision window around the player depth
    pub hit_tolerance: f32,
    /// Milliseconds per depth unit at speed 1
    pub ms_per_depth: f32,
    /// Jump/duck duration
    pub action_ms: f32,
}

impl Default for LaneTuning {
    fn default() -> Self {
        Self {
            player_depth: 90.0,
            cull_depth: 110.0,
            spawn_gap: 40.0,
            hit_tolerance: 5.0,
            ms_per_depth: 10.0,
            action_ms: 600.0,
        }
    }
}

impl LaneTuning {
    fn validate(&self, table: &str) -> Result<(), TuningError> {
        positive(format!("{table}.spawn_gap"), self.spawn_gap)?;
        positive(format!("{table}.ms_per_depth"), self.ms_per_depth)?;
        positive(format!("{table}.cull_depth"), self.cull_depth)?;
        positive(format!("{table}.action_ms"), self.action_ms)?;
        non_negative(format!("{table}.hit_tolerance"), self.hit_tolerance)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSpec {
    pub name: String,
    pub avoid: Avoidance,
    /// Selection probability within its table
    pub weight: f32,
}

impl ObstacleSpec {
    fn new(name: &str, avoid: Avoidance, weight: f32) -> Self {
        Self {
            name: name.to_string(),
            avoid,
            weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DodgerTheme {
    pub name: String,
    pub obstacles: Vec<ObstacleSpec>,
}

/// Endurance runner: a concentration meter drains on hits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DodgerTuning {
    pub lane: LaneTuning,
    pub max_concentration: f32,
    pub start_speed: f32,
    pub speed_ramp_per_ms: f32,
    pub max_speed: f32,
    pub coin_chance: f32,
    pub coin_score: u32,
    pub coin_restore: f32,
    pub obstacle_damage: f32,
    /// Distance per theme advance
    pub theme_distance: f32,
    pub theme_restore: f32,
    /// Reaching this distance wins the run
    pub finish_distance: Option<f32>,
    pub themes: Vec<DodgerTheme>,
}

impl Default for DodgerTuning {
    fn default() -> Self {
        use Avoidance::*;
        let theme = |name: &str, obstacles| DodgerTheme {
            name: name.to_string(),
            obstacles,
        };
        Self {
            lane: LaneTuning::default(),
            max_concentration: 100.0,
            start_speed: 0.7,
            speed_ramp_per_ms: 0.00005,
            max_speed: 1.5,
            coin_chance: 0.2,
            coin_score: 10,
            coin_restore: 5.0,
            obstacle_damage: 25.0,
            theme_distance: 500.0,
            theme_restore: 20.0,
            finish_distance: Some(2500.0),
            themes: vec![
                theme(
                    "Fajr",
                    vec![
                        ObstacleSpec::new("Giant Pillow", Duck, 0.35),
                        ObstacleSpec::new("Blocking Bed", Jump, 0.30),
                        ObstacleSpec::new("Snooze Button", Dodge, 0.20),
                        ObstacleSpec::new("Whisper of Laziness", Dodge, 0.15),
                    ],
                ),
                theme(
                    "Dhuhr",
                    vec![
                        ObstacleSpec::new("Paper Stack", Jump, 0.40),
                        ObstacleSpec::new("Smartphone", Duck, 0.25),
                        ObstacleSpec::new("Coworker", Dodge, 0.20),
                        ObstacleSpec::new("Whisper of Money", Dodge, 0.15),
                    ],
                ),
                theme(
                    "Maghrib",
                    vec![
                        ObstacleSpec::new("Speeding Car", Dodge, 0.35),
                        ObstacleSpec::new("Red Light", Jump, 0.30),
                        ObstacleSpec::new("Crowd", Duck, 0.20),
                        ObstacleSpec::new("Whisper of Anger", Dodge, 0.15),
                    ],
                ),
                theme(
                    "Isha",
                    vec![
                        ObstacleSpec::new("Mental Fog", Dodge, 0.40),
                        ObstacleSpec::new("Slow Shadow", Duck, 0.25),
                        ObstacleSpec::new("Stumbling Stone", Jump, 0.20),
                        ObstacleSpec::new("Whisper of Doubt", Dodge, 0.15),
                    ],
                ),
            ],
        }
    }
}

impl DodgerTuning {
    fn validate(&self) -> Result<(), TuningError> {
        if self.themes.is_empty() {
            return Err(TuningError::EmptyTable {
                table: "dodger.themes",
            });
        }
        self.lane.validate("dodger.lane")?;
        positive("dodger.max_concentration", self.max_concentration)?;
        positive("dodger.start_speed", self.start_speed)?;
        positive("dodger.max_speed", self.max_speed)?;
        positive("dodger.theme_distance", self.theme_distance)?;
        unit("dodger.coin_chance", self.coin_chance)?;
        for theme in &self.themes {
            if theme.obstacles.is_empty() {
                return Err(TuningError::EmptyTable {
                    table: "dodger.themes.obstacles",
                });
            }
            weights(format!("dodger.{}", theme.name), &theme.obstacles)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectorLevel {
    pub name: String,
    pub theme: String,
    /// Coins needed to reach the arithmetic gate
    pub goal: u32,
    pub speed: f32,
    pub question: String,
    pub answer: i64,
}

/// Coin-goal runner: obstacles are fatal, each level ends in a question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorTuning {
    pub lane: LaneTuning,
    pub coin_row_chance: f32,
    pub coin_row_len: usize,
    pub coin_row_spacing: f32,
    pub coin_value: u32,
    pub level_points: u32,
    pub final_points: u32,
    pub advance_delay_ms: u32,
    pub obstacles: Vec<ObstacleSpec>,
    pub levels: Vec<CollectorLevel>,
}

impl Default for CollectorTuning {
    fn default() -> Self {
        let level = |name: &str, theme: &str, goal, speed, question: &str, answer| CollectorLevel {
            name: name.to_string(),
            theme: theme.to_string(),
            goal,
            speed,
            question: question.to_string(),
            answer,
        };
        Self {
            lane: LaneTuning {
                hit_tolerance: 8.0,
                ms_per_depth: 16.0,
                action_ms: 700.0,
                ..Default::default()
            },
            coin_row_chance: 0.4,
            coin_row_len: 3,
            coin_row_spacing: 8.0,
            coin_value: 10,
            level_points: 20,
            final_points: 100,
            advance_delay_ms: 1500,
            obstacles: vec![
                ObstacleSpec::new("Low Barrier", Avoidance::Jump, 1.0 / 3.0),
                ObstacleSpec::new("High Beam", Avoidance::Duck, 1.0 / 3.0),
                ObstacleSpec::new("Full Wall", Avoidance::Dodge, 1.0 / 3.0),
            ],
            levels: vec![
                level("Neon City", "NEON", 200, 0.6, "What is 2.5% of 2000 (zakat)?", 50),
                level("Halal Sunset", "SUNSET", 400, 0.7, "You have 4000 coins. The zakat is...", 100),
                level(
                    "Zakat Highway",
                    "NEON",
                    600,
                    0.8,
                    "3000 saved - 1000 debt = 2000. Your zakat is...",
                    50,
                ),
                level("Urban Oasis", "DAY", 800, 0.9, "Zakat al-Fitr: 3 people x 10 coins. Total:", 30),
                level("Light Speed", "NEON", 1000, 1.0, "10000 coins divided by 40 is:", 250),
                level("Golden City", "GOLD", 1200, 1.1, "Zakat al-Fitr: 6 people x 15 coins. Total:", 90),
                level("Ummah Empire", "GOLD", 1500, 1.2, "Business: 40,000 coins. 2.5% is...", 1000),
                level(
                    "Pure Heart",
                    "SUNSET",
                    2000,
                    1.4,
                    "Zakat if you have less than the minimum (nisab)? (1 = yes, 0 = no)",
                    0,
                ),
            ],
        }
    }
}

impl CollectorTuning {
    fn validate(&self) -> Result<(), TuningError> {
        if self.levels.is_empty() {
            return Err(TuningError::EmptyTable {
                table: "collector.levels",
            });
        }
        if self.obstacles.is_empty() {
            return Err(TuningError::EmptyTable {
                table: "collector.obstacles",
            });
        }
        self.lane.validate("collector.lane")?;
        unit("collector.coin_row_chance", self.coin_row_chance)?;
        weights("collector.obstacles", &self.obstacles)?;
        for level in &self.levels {
            positive(format!("collector.{}.speed", level.name), level.speed)?;
        }
        Ok(())
    }
}

// === Brawler ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackSpec {
    pub kind: AttackKind,
    pub range: f32,
    pub damage: f32,
    pub cooldown_ms: f32,
    pub sound: SoundEffect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySpec {
    pub name: String,
    pub health: f32,
    /// Walk speed in px/frame; enemies approach at `approach_factor` of it
    pub speed: f32,
    pub damage: f32,
    /// Chance per ready frame that the enemy commits to an attack
    pub aggression: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrawlTuning {
    /// px/frame²
    pub gravity: f32,
    /// Initial vertical velocity of a jump (negative is up)
    pub jump_impulse: f32,
    /// px/frame
    pub walk_speed: f32,
    pub ground_y: f32,
    pub arena_width: f32,
    pub sprite_width: f32,
    pub player_health: f32,
    pub player_start_x: f32,
    pub enemy_start_x: f32,
    pub approach_factor: f32,
    /// Enemies stop walking inside this distance
    pub engage_range: f32,
    pub enemy_strike_range: f32,
    pub enemy_cooldown_ms: f32,
    pub enemy_windup_ms: f32,
    pub player_windup_ms: f32,
    pub stun_ms: f32,
    pub guard_push: f32,
    pub guard_push_range: f32,
    pub round_delay_ms: u32,
    pub victory_points: u32,
    pub attacks: Vec<AttackSpec>,
    pub enemies: Vec<EnemySpec>,
}

impl Default for BrawlTuning {
    fn default() -> Self {
        let enemy = |name: &str, health, speed, damage, aggression| EnemySpec {
            name: name.to_string(),
            health,
            speed,
            damage,
            aggression,
        };
        Self {
            gravity: 0.8,
            jump_impulse: -15.0,
            walk_speed: 5.0,
            ground_y: 300.0,
            arena_width: 800.0,
            sprite_width: 50.0,
            player_health: 100.0,
            player_start_x: 100.0,
            enemy_start_x: 600.0,
            approach_factor: 0.5,
            engage_range: 60.0,
            enemy_strike_range: 80.0,
            enemy_cooldown_ms: 1500.0,
            enemy_windup_ms: 200.0,
            player_windup_ms: 100.0,
            stun_ms: 500.0,
            guard_push: 10.0,
            guard_push_range: 120.0,
            round_delay_ms: 2000,
            victory_points: 50,
            attacks: vec![
                AttackSpec {
                    kind: AttackKind::Quick,
                    range: 80.0,
                    damage: 8.0,
                    cooldown_ms: 300.0,
                    sound: SoundEffect::Happy,
                },
                AttackSpec {
                    kind: AttackKind::Guard,
                    range: 100.0,
                    damage: 2.0,
                    cooldown_ms: 600.0,
                    sound: SoundEffect::Shield,
                },
                AttackSpec {
                    kind: AttackKind::Heavy,
                    range: 150.0,
                    damage: 15.0,
                    cooldown_ms: 1000.0,
                    sound: SoundEffect::Spirit,
                },
            ],
            enemies: vec![
                enemy("Laziness", 100.0, 2.0, 5.0, 0.6),
                enemy("Anger", 150.0, 3.0, 8.0, 0.8),
                enemy("Ego", 200.0, 4.0, 10.0, 1.0),
            ],
        }
    }
}

impl BrawlTuning {
    pub fn attack(&self, kind: AttackKind) -> Option<&AttackSpec> {
        self.attacks.iter().find(|a| a.kind == kind)
    }

    fn validate(&self) -> Result<(), TuningError> {
        if self.enemies.is_empty() {
            return Err(TuningError::EmptyTable {
                table: "brawl.enemies",
            });
        }
        for kind in [AttackKind::Quick, AttackKind::Guard, AttackKind::Heavy] {
            if self.attack(kind).is_none() {
                return Err(TuningError::MissingAttack(kind));
            }
        }
        positive("brawl.arena_width", self.arena_width - self.sprite_width)?;
        positive("brawl.player_health", self.player_health)?;
        for e in &self.enemies {
            positive(format!("brawl.{}.health", e.name), e.health)?;
            unit(format!("brawl.{}.aggression", e.name), e.aggression)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        Tuning::default().validate().unwrap();
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "chase": { "max_level": 3 } }"#).unwrap();
        assert_eq!(tuning.chase.max_level, 3);
        assert_eq!(tuning.chase.freeze_ms, 5000.0);
        assert_eq!(tuning.maze.levels.len(), 5);
    }

    #[test]
    fn test_round_trip_defaults() {
        let json = Tuning::default().to_json().unwrap();
        assert_eq!(Tuning::from_json(&json).unwrap(), Tuning::default());
    }

    #[test]
    fn test_rejects_even_maze() {
        let err = Tuning::from_json(
            r#"{ "maze": { "levels": [ { "name": "Even", "size": 14, "mechanic": "None" } ] } }"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TuningError::InvalidMazeSize { index: 0, size: 14 }
        ));
    }

    #[test]
    fn test_rejects_overweight_table() {
        let mut tuning = Tuning::default();
        tuning.collector.obstacles[0].weight = 0.9;
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::WeightsExceedOne { .. })
        ));
    }

    #[test]
    fn test_rejects_missing_attack() {
        let mut tuning = Tuning::default();
        tuning.brawl.attacks.retain(|a| a.kind != AttackKind::Guard);
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::MissingAttack(AttackKind::Guard))
        ));
    }

    #[test]
    fn test_rejects_spawn_region_outside_arena() {
        for region in [0, -3, 14] {
            let json = format!(r#"{{ "chase": {{ "spawn_region": {region} }} }}"#);
            assert!(matches!(
                Tuning::from_json(&json),
                Err(TuningError::OutOfBounds { min: 1, max: 13, .. })
            ));
        }
        assert!(Tuning::from_json(r#"{ "chase": { "spawn_region": 13 } }"#).is_ok());
    }

    #[test]
    fn test_rejects_negative_hit_tolerance() {
        let mut tuning = Tuning::default();
        tuning.dodger.lane.hit_tolerance = -1.0;
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::Negative { .. })
        ));
        tuning.dodger.lane.hit_tolerance = 0.0;
        tuning.validate().unwrap();
    }

    #[test]
    fn test_rejects_zero_action_time() {
        let mut tuning = Tuning::default();
        tuning.collector.lane.action_ms = 0.0;
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::NotPositive { .. })
        ));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            Tuning::from_json("{ not json"),
            Err(TuningError::Parse(_))
        ));
    }

    #[test]
    fn test_pursuers_speed_up_per_level() {
        let chase = ChaseTuning::default();
        assert_eq!(chase.pursuer_step_ms(1), 470.0);
        assert_eq!(chase.pursuer_step_ms(6), 320.0);
        assert_eq!(chase.pursuer_step_ms(100), 150.0);
    }
}
