//! Session configuration loaded from JSON.
//!
//! Every section has defaults, so a config file only needs the fields it
//! changes. Invalid numbers are clamped by `sanitized()` rather than
//! rejected, and each clamp is logged.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::warn;

use skirmish_core::constants::*;
use skirmish_core::defs::{
    Condition, EnemyStats, EnemyTypeDef, PatternDef, ScalingConfig, StateDef, StateMachineDef, TransitionDef,
    WaveDef, WaveEnemy,
};
use skirmish_core::types::{degrees_to_radians, WorldBounds};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Spawn position; the world centre when absent.
    pub spawn: Option<Vec2>,
    pub level: u32,
    pub max_health: f32,
    pub regen_rate: f32,
    pub radius: f32,
    pub max_speed: f32,
    pub acceleration: f32,
    /// Turn rate in degrees per second, converted to radians at load.
    pub rotation_speed_deg: f32,
    pub weapon_damage: f32,
    pub weapon_cooldown_ms: f64,
    pub automatic_fire: bool,
    pub projectile_speed: f32,
    pub projectile_lifetime_ms: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            spawn: None,
            level: 1,
            max_health: PLAYER_MAX_HEALTH,
            regen_rate: 0.0,
            radius: PLAYER_RADIUS,
            max_speed: CONTROLLER_MAX_SPEED,
            acceleration: CONTROLLER_ACCELERATION,
            rotation_speed_deg: CONTROLLER_ROTATION_SPEED.to_degrees(),
            weapon_damage: PLAYER_WEAPON_DAMAGE,
            weapon_cooldown_ms: PLAYER_WEAPON_COOLDOWN_MS,
            automatic_fire: true,
            projectile_speed: PROJECTILE_SPEED,
            projectile_lifetime_ms: PROJECTILE_LIFETIME_MS,
        }
    }
}

impl PlayerConfig {
    pub fn rotation_speed(&self) -> f32 {
        degrees_to_radians(self.rotation_speed_deg)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    pub resolution_strength: f32,
    pub debug: bool,
    /// Layer pairs that push each other apart.
    pub enabled_pairs: Vec<[u8; 2]>,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            resolution_strength: COLLISION_RESOLUTION_STRENGTH,
            debug: false,
            enabled_pairs: vec![
                [LAYER_PLAYER, LAYER_ENEMY],
                [LAYER_ENEMY, LAYER_ENEMY],
                [LAYER_PLAYER, LAYER_OBSTACLE],
                [LAYER_ENEMY, LAYER_OBSTACLE],
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstacleConfig {
    pub position: Vec2,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// RNG seed. Same seed and inputs give the same session.
    pub seed: u64,
    pub world: WorldBounds,
    pub player: PlayerConfig,
    pub collision: CollisionConfig,
    pub enemies: Vec<EnemyTypeDef>,
    pub waves: Vec<WaveDef>,
    pub scaling: ScalingConfig,
    /// Start the next wave automatically once its delay has elapsed.
    pub auto_advance_waves: bool,
    pub obstacles: Vec<ObstacleConfig>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            world: WorldBounds::default(),
            player: PlayerConfig::default(),
            collision: CollisionConfig::default(),
            enemies: vec![basic_enemy()],
            waves: vec![
                WaveDef {
                    enemies: vec![WaveEnemy {
                        type_id: "basic".into(),
                        count: 5,
                    }],
                    spawn_delay_ms: 2000.0,
                    wave_delay_ms: 5000.0,
                },
                WaveDef {
                    enemies: vec![WaveEnemy {
                        type_id: "basic".into(),
                        count: 8,
                    }],
                    spawn_delay_ms: 1500.0,
                    wave_delay_ms: 5000.0,
                },
            ],
            scaling: ScalingConfig::default(),
            auto_advance_waves: false,
            obstacles: Vec::new(),
        }
    }
}

/// Built-in melee enemy: wanders, chases on sight, stops to attack in range.
pub fn basic_enemy() -> EnemyTypeDef {
    EnemyTypeDef {
        id: "basic".into(),
        sprite: Some("enemy_basic".into()),
        stats: EnemyStats {
            speed: 120.0,
            health: 50.0,
            damage: 10.0,
            detection_range: 400.0,
            attack_range: 36.0,
            score_value: 100,
            radius: 14.0,
            attack_cooldown_ms: 1000.0,
        },
        behavior: StateMachineDef {
            initial: "patrol".into(),
            states: vec![
                StateDef {
                    name: "patrol".into(),
                    pattern: PatternDef::Search {
                        speed_factor: 0.4,
                        radius: 150.0,
                    },
                },
                StateDef {
                    name: "chase".into(),
                    pattern: PatternDef::Pursue {
                        speed_factor: 1.0,
                        stop_distance: 24.0,
                    },
                },
                StateDef {
                    name: "attack".into(),
                    pattern: PatternDef::Idle,
                },
            ],
            transitions: vec![
                TransitionDef {
                    from: "patrol".into(),
                    to: "chase".into(),
                    condition: Condition::PlayerDetected.and(Condition::LineOfSight),
                },
                TransitionDef {
                    from: "chase".into(),
                    to: "attack".into(),
                    condition: Condition::PlayerInAttackRange,
                },
                TransitionDef {
                    from: "chase".into(),
                    to: "patrol".into(),
                    condition: Condition::PlayerDetected.negate(),
                },
                TransitionDef {
                    from: "attack".into(),
                    to: "chase".into(),
                    condition: Condition::PlayerInAttackRange.negate(),
                },
            ],
        },
    }
}

impl GameConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Clamp every invalid number to its nearest valid value, logging each fix.
    pub fn sanitized(&self) -> Self {
        let mut config = self.clone();

        let world = config.world.sanitized();
        if world != config.world {
            warn!(before = ?config.world, after = ?world, "world bounds clamped");
            config.world = world;
        }

        let scaling = config.scaling.sanitized();
        if scaling != config.scaling {
            warn!(before = ?config.scaling, after = ?scaling, "scaling multipliers clamped");
            config.scaling = scaling;
        }

        let strength = config.collision.resolution_strength;
        let clamped = if strength.is_finite() {
            strength.clamp(0.0, 1.0)
        } else {
            COLLISION_RESOLUTION_STRENGTH
        };
        if clamped != strength {
            warn!(strength, clamped, "collision resolution strength clamped");
            config.collision.resolution_strength = clamped;
        }

        let player = &mut config.player;
        player.level = clamp_warn_u32("player.level", player.level, 1);
        player.max_health = clamp_warn("player.max_health", player.max_health, 1.0);
        player.regen_rate = clamp_warn("player.regen_rate", player.regen_rate, 0.0);
        player.radius = clamp_warn("player.radius", player.radius, 0.0);
        player.max_speed = clamp_warn("player.max_speed", player.max_speed, 0.0);
        player.acceleration = clamp_warn("player.acceleration", player.acceleration, 0.0);
        player.rotation_speed_deg = clamp_warn("player.rotation_speed_deg", player.rotation_speed_deg, 0.0);
        player.weapon_damage = clamp_warn("player.weapon_damage", player.weapon_damage, 0.0);
        player.weapon_cooldown_ms = clamp_warn_ms("player.weapon_cooldown_ms", player.weapon_cooldown_ms, MIN_COOLDOWN_MS);
        player.projectile_speed = clamp_warn("player.projectile_speed", player.projectile_speed, 0.0);
        player.projectile_lifetime_ms =
            clamp_warn_ms("player.projectile_lifetime_ms", player.projectile_lifetime_ms, 0.0);

        for enemy in &mut config.enemies {
            let stats = &mut enemy.stats;
            stats.speed = clamp_warn("enemy.speed", stats.speed, 0.0);
            stats.health = clamp_warn("enemy.health", stats.health, 1.0);
            stats.damage = clamp_warn("enemy.damage", stats.damage, 0.0);
            stats.detection_range = clamp_warn("enemy.detection_range", stats.detection_range, 0.0);
            stats.attack_range = clamp_warn("enemy.attack_range", stats.attack_range, 0.0);
            stats.radius = clamp_warn("enemy.radius", stats.radius, 0.0);
            stats.attack_cooldown_ms = clamp_warn_ms("enemy.attack_cooldown_ms", stats.attack_cooldown_ms, MIN_COOLDOWN_MS);
            let undefined = enemy.behavior.undefined_states();
            if !undefined.is_empty() {
                warn!(enemy = %enemy.id, ?undefined, "behaviour references undeclared states");
            }
        }

        for wave in &mut config.waves {
            wave.spawn_delay_ms = clamp_warn_ms("wave.spawn_delay_ms", wave.spawn_delay_ms, 0.0);
            wave.wave_delay_ms = clamp_warn_ms("wave.wave_delay_ms", wave.wave_delay_ms, 0.0);
            for entry in &wave.enemies {
                if !config.enemies.iter().any(|e| e.id == entry.type_id) {
                    warn!(type_id = %entry.type_id, "wave references unknown enemy type");
                }
            }
        }

        for obstacle in &mut config.obstacles {
            obstacle.radius = clamp_warn("obstacle.radius", obstacle.radius, 0.0);
        }

        config
    }
}

fn clamp_warn(field: &'static str, value: f32, min: f32) -> f32 {
    let clamped = if value.is_finite() { value.max(min) } else { min };
    if clamped != value {
        warn!(field, value, clamped, "config value clamped");
    }
    clamped
}

fn clamp_warn_ms(field: &'static str, value: f64, min: f64) -> f64 {
    let clamped = if value.is_finite() { value.max(min) } else { min };
    if clamped != value {
        warn!(field, value, clamped, "config value clamped");
    }
    clamped
}

fn clamp_warn_u32(field: &'static str, value: u32, min: u32) -> u32 {
    if value < min {
        warn!(field, value, min, "config value clamped");
        min
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = GameConfig::from_json_str(r#"{ "seed": 7, "player": { "max_health": 250.0 } }"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.player.max_health, 250.0);
        assert_eq!(config.player.weapon_cooldown_ms, PLAYER_WEAPON_COOLDOWN_MS);
        assert_eq!(config.enemies.len(), 1);
    }

    #[test]
    fn sanitize_clamps_invalid_numbers() {
        let mut config = GameConfig::default();
        config.player.weapon_cooldown_ms = -5.0;
        config.collision.resolution_strength = 3.0;
        config.scaling.base_health = 0.0;
        config.waves[0].spawn_delay_ms = f64::NAN;

        let clean = config.sanitized();
        assert_eq!(clean.player.weapon_cooldown_ms, MIN_COOLDOWN_MS);
        assert_eq!(clean.collision.resolution_strength, 1.0);
        assert!(clean.scaling.base_health > 0.0);
        assert_eq!(clean.waves[0].spawn_delay_ms, 0.0);
    }

    #[test]
    fn rotation_speed_converts_to_radians() {
        let config = PlayerConfig {
            rotation_speed_deg: 180.0,
            ..PlayerConfig::default()
        };
        assert!((config.rotation_speed() - std::f32::consts::PI).abs() < 1e-5);
    }

    #[test]
    fn bad_json_is_a_parse_error() {
        let err = GameConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = GameConfig::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
