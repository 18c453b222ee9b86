//! Entity factories for the player, enemies and obstacles.

use glam::Vec2;

use skirmish_ai::fsm::initial_brain;
use skirmish_core::components::*;
use skirmish_core::constants::*;
use skirmish_core::defs::{EnemyTypeDef, ScaledStats};

use crate::config::{ObstacleConfig, PlayerConfig};
use crate::ecs::entity::EntityBuilder;

/// The player: controller driven by input, an automatic ranged weapon.
pub fn build_player(config: &PlayerConfig, position: Vec2) -> EntityBuilder {
    let controller = CharacterController {
        acceleration: config.acceleration,
        rotation_speed: config.rotation_speed(),
        ..CharacterController::default()
    }
    .with_max_speed(config.max_speed);

    let weapon = Weapon::new(config.weapon_damage, 0.0, config.weapon_cooldown_ms)
        .with_projectile(ProjectileSpec {
            speed: config.projectile_speed,
            damage: config.weapon_damage,
            lifetime_ms: config.projectile_lifetime_ms,
            ..ProjectileSpec::default()
        })
        .automatic(config.automatic_fire);

    EntityBuilder::new()
        .with(Player { level: config.level.max(1) })
        .with(Transform::new(position, 0.0))
        .with(Health::new(config.max_health).with_regen(config.regen_rate))
        .with(controller)
        .with(Collider::new(config.radius, LAYER_PLAYER))
        .with(weapon)
        .with(Sprite::new("player"))
}

/// An enemy of `def`'s type with already scaled stats. Returns `None` if the
/// type's state machine has no valid initial state.
pub fn build_enemy(
    def: &EnemyTypeDef,
    scaled: &ScaledStats,
    position: Vec2,
    wave: u32,
    now_ms: f64,
) -> Option<EntityBuilder> {
    let brain = initial_brain(&def.behavior, position, now_ms)?;
    let stats = &def.stats;

    Some(
        EntityBuilder::new()
            .with(Enemy {
                type_id: def.id.clone(),
                damage: scaled.damage,
                speed: scaled.speed,
                detection_range: stats.detection_range,
                attack_range: stats.attack_range,
                score_value: stats.score_value,
                wave,
            })
            .with(Transform::new(position, 0.0))
            .with(Health::new(scaled.health))
            .with(CharacterController::default().with_max_speed(scaled.speed))
            .with(Collider::new(stats.radius, LAYER_ENEMY))
            .with(Weapon::new(scaled.damage, stats.attack_range, stats.attack_cooldown_ms))
            .with(brain)
            .with(Sprite::new(def.sprite.clone().unwrap_or_else(|| def.id.clone()))),
    )
}

/// A static circular obstacle: blocks movement and line of sight.
pub fn build_obstacle(config: &ObstacleConfig) -> EntityBuilder {
    EntityBuilder::new()
        .with(Obstacle)
        .with(Transform::new(config.position, 0.0))
        .with(Collider::new(config.radius, LAYER_OBSTACLE).immovable())
        .with(Sprite::new("obstacle"))
}
