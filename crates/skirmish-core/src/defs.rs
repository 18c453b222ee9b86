//! Static game data: enemy types, their behaviour state machines, waves and
//! difficulty scaling. Loaded once per session and never mutated.

use serde::{Deserialize, Serialize};

use crate::constants::MIN_SCALE;

/// Unscaled enemy statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyStats {
    pub speed: f32,
    pub health: f32,
    pub damage: f32,
    pub detection_range: f32,
    pub attack_range: f32,
    pub score_value: u32,
    #[serde(default = "default_radius")]
    pub radius: f32,
    #[serde(default = "default_attack_cooldown")]
    pub attack_cooldown_ms: f64,
}

fn default_radius() -> f32 {
    14.0
}

fn default_attack_cooldown() -> f64 {
    1000.0
}

/// Boolean predicate over an AI entity, the player and optional range
/// parameters. Distances are compared squared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    Always,
    /// Player within the enemy's detection range.
    PlayerDetected,
    /// Player within the enemy's attack range.
    PlayerInAttackRange,
    /// Player within an explicit range.
    PlayerWithin { range: f32 },
    /// Player farther than an explicit range.
    PlayerBeyond { range: f32 },
    /// Unobstructed line of sight to the player.
    LineOfSight,
    /// Health fraction at or below a threshold.
    HealthBelow { fraction: f32 },
    /// Time spent in the current state, in milliseconds.
    StateElapsed { ms: f64 },
    Not { condition: Box<Condition> },
    And { conditions: Vec<Condition> },
    Or { conditions: Vec<Condition> },
}

impl Condition {
    pub fn and(self, other: Condition) -> Condition {
        match self {
            Condition::And { mut conditions } => {
                conditions.push(other);
                Condition::And { conditions }
            }
            first => Condition::And {
                conditions: vec![first, other],
            },
        }
    }

    pub fn or(self, other: Condition) -> Condition {
        match self {
            Condition::Or { mut conditions } => {
                conditions.push(other);
                Condition::Or { conditions }
            }
            first => Condition::Or {
                conditions: vec![first, other],
            },
        }
    }

    pub fn negate(self) -> Condition {
        Condition::Not {
            condition: Box::new(self),
        }
    }
}

/// Movement pattern parameters bound to a state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PatternDef {
    Idle,
    Pursue {
        #[serde(default = "one")]
        speed_factor: f32,
        #[serde(default)]
        stop_distance: f32,
    },
    Retreat {
        #[serde(default = "one")]
        speed_factor: f32,
        min_distance: f32,
        max_distance: f32,
    },
    Search {
        #[serde(default = "one")]
        speed_factor: f32,
        radius: f32,
    },
}

fn one() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDef {
    pub name: String,
    pub pattern: PatternDef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionDef {
    pub from: String,
    pub to: String,
    pub condition: Condition,
}

/// Movement state machine. Transitions are evaluated in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateMachineDef {
    pub initial: String,
    pub states: Vec<StateDef>,
    #[serde(default)]
    pub transitions: Vec<TransitionDef>,
}

impl StateMachineDef {
    pub fn state(&self, name: &str) -> Option<&StateDef> {
        self.states.iter().find(|s| s.name == name)
    }

    pub fn transitions_from<'a>(&'a self, state: &'a str) -> impl Iterator<Item = &'a TransitionDef> {
        self.transitions.iter().filter(move |t| t.from == state)
    }

    /// Names referenced by transitions or `initial` that have no state definition.
    pub fn undefined_states(&self) -> Vec<&str> {
        let mut missing: Vec<&str> = std::iter::once(self.initial.as_str())
            .chain(self.transitions.iter().flat_map(|t| [t.from.as_str(), t.to.as_str()]))
            .filter(|name| self.state(name).is_none())
            .collect();
        missing.sort_unstable();
        missing.dedup();
        missing
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyTypeDef {
    pub id: String,
    #[serde(default)]
    pub sprite: Option<String>,
    pub stats: EnemyStats,
    pub behavior: StateMachineDef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveEnemy {
    pub type_id: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveDef {
    pub enemies: Vec<WaveEnemy>,
    /// Delay between consecutive spawns within the wave.
    pub spawn_delay_ms: f64,
    /// Delay after the wave is cleared before the next wave may start.
    pub wave_delay_ms: f64,
}

impl WaveDef {
    pub fn total_enemies(&self) -> u32 {
        self.enemies.iter().map(|e| e.count).sum()
    }

    /// Spawn order: each entry's enemies in declaration order.
    pub fn spawn_queue(&self) -> Vec<String> {
        self.enemies
            .iter()
            .flat_map(|e| std::iter::repeat(e.type_id.clone()).take(e.count as usize))
            .collect()
    }
}

/// Difficulty scaling applied at spawn time.
///
/// `stat = type_stat * base * (1 + wave_scaling * (wave - 1)) * (1 + player_scaling * (level - 1))`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingConfig {
    pub base_health: f32,
    pub base_damage: f32,
    pub base_speed: f32,
    pub wave_scaling: f32,
    pub player_scaling: f32,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            base_health: 1.0,
            base_damage: 1.0,
            base_speed: 1.0,
            wave_scaling: 0.1,
            player_scaling: 0.05,
        }
    }
}

/// Scaled stats for one spawned enemy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledStats {
    pub health: f32,
    pub damage: f32,
    pub speed: f32,
}

impl ScalingConfig {
    /// Clamp multipliers to valid values: bases to at least `MIN_SCALE`,
    /// growth rates to non-negative.
    pub fn sanitized(&self) -> Self {
        Self {
            base_health: clamp_base(self.base_health),
            base_damage: clamp_base(self.base_damage),
            base_speed: clamp_base(self.base_speed),
            wave_scaling: clamp_rate(self.wave_scaling),
            player_scaling: clamp_rate(self.player_scaling),
        }
    }

    /// Combined difficulty multiplier for a 1-based wave index and player level.
    pub fn factor(&self, wave_index: u32, player_level: u32) -> f32 {
        let s = self.sanitized();
        let wave_steps = wave_index.saturating_sub(1) as f32;
        let level_steps = player_level.saturating_sub(1) as f32;
        (1.0 + s.wave_scaling * wave_steps) * (1.0 + s.player_scaling * level_steps)
    }

    pub fn scale(&self, stats: &EnemyStats, wave_index: u32, player_level: u32) -> ScaledStats {
        let s = self.sanitized();
        let factor = self.factor(wave_index, player_level);
        ScaledStats {
            health: stats.health * s.base_health * factor,
            damage: stats.damage * s.base_damage * factor,
            speed: stats.speed * s.base_speed * factor,
        }
    }
}

fn clamp_base(value: f32) -> f32 {
    if value.is_finite() {
        value.max(MIN_SCALE)
    } else {
        1.0
    }
}

fn clamp_rate(value: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}
