//! Weapons, projectiles and health regeneration.

use glam::Vec2;

use skirmish_core::components::{
    CharacterController, Collider, ComponentKind, Enemy, Health, Projectile, ProjectileSpec, Sprite, Transform,
    Weapon,
};
use skirmish_core::constants::LAYER_ENEMY;
use skirmish_core::events::GameEvent;
use skirmish_core::types::EntityId;

use crate::ecs::entity::EntityBuilder;
use crate::ecs::system::{DamageRequest, System, SystemContext, SystemMembers};

const COMBAT_REQUIRED: &[ComponentKind] = &[ComponentKind::Transform, ComponentKind::Weapon];
const PROJECTILE_REQUIRED: &[ComponentKind] = &[ComponentKind::Transform, ComponentKind::Projectile];
const HEALTH_REQUIRED: &[ComponentKind] = &[ComponentKind::Health];

/// Player fire and enemy contact attacks.
///
/// The player's weapon fires while the fire button is held (automatic) or
/// once per press. Enemies hit the player whenever it is inside their attack
/// range and their weapon is off cooldown.
#[derive(Default)]
pub struct CombatSystem {
    members: SystemMembers,
}

impl CombatSystem {
    pub fn new() -> Self {
        Self::default()
    }
}

impl System for CombatSystem {
    fn name(&self) -> &'static str {
        "combat"
    }

    fn required_components(&self) -> &'static [ComponentKind] {
        COMBAT_REQUIRED
    }

    fn members(&self) -> &SystemMembers {
        &self.members
    }

    fn members_mut(&mut self) -> &mut SystemMembers {
        &mut self.members
    }

    fn fixed_update(&mut self, ctx: &mut SystemContext<'_>, _dt: f32) {
        let now = ctx.now_ms();
        let player_id = ctx.entities.player();
        let player_pos = ctx.player_position();

        if let Some(id) = player_id.filter(|id| self.members.contains(*id)) {
            fire_player_weapon(ctx, id, now);
        }

        let (Some(player_id), Some(player_pos)) = (player_id, player_pos) else {
            return;
        };

        for id in self.members.snapshot() {
            if id == player_id {
                continue;
            }
            let Some(entity) = ctx.entities.get_mut(id) else {
                continue;
            };
            let Some(reach) = entity.get::<Enemy>().map(|e| e.attack_range) else {
                continue;
            };
            let Some(position) = entity.get::<Transform>().map(|t| t.position) else {
                continue;
            };
            let to_player = player_pos - position;
            if to_player.length_squared() > reach * reach {
                continue;
            }
            let Some(weapon) = entity.get_mut::<Weapon>() else {
                continue;
            };
            if weapon.fire(now, to_player) {
                ctx.damage.push(DamageRequest {
                    target: player_id,
                    source: Some(id),
                    amount: weapon.damage,
                });
            }
        }
    }
}

fn fire_player_weapon(ctx: &mut SystemContext<'_>, id: EntityId, now: f64) {
    let automatic = ctx
        .entities
        .get(id)
        .and_then(|e| e.get::<Weapon>())
        .is_some_and(|w| w.automatic);
    let triggered = if automatic {
        ctx.input.state().fire_held
    } else {
        ctx.input.consume_fire_press()
    };
    if !triggered {
        return;
    }

    let Some(entity) = ctx.entities.get_mut(id) else {
        return;
    };
    let Some(transform) = entity.get::<Transform>().copied() else {
        return;
    };
    let aim = entity
        .get::<CharacterController>()
        .map_or(Vec2::ZERO, |c| c.aim_direction);
    let direction = if aim != Vec2::ZERO {
        aim.normalize_or_zero()
    } else {
        transform.forward()
    };
    let body_radius = entity.get::<Collider>().map_or(0.0, |c| c.radius);

    let Some(weapon) = entity.get_mut::<Weapon>() else {
        return;
    };
    if !weapon.fire(now, direction) {
        return;
    }
    let spec = weapon.projectile.unwrap_or(ProjectileSpec {
        damage: weapon.damage,
        ..ProjectileSpec::default()
    });

    ctx.commands.spawn(projectile(id, transform.position, direction, body_radius, &spec));
    ctx.events.push(GameEvent::WeaponFired { entity: id, direction });
}

/// Projectile launched from the edge of the shooter's body.
pub fn projectile(owner: EntityId, origin: Vec2, direction: Vec2, body_radius: f32, spec: &ProjectileSpec) -> EntityBuilder {
    let position = origin + direction * (body_radius + spec.size);
    EntityBuilder::new()
        .with(Transform::new(position, skirmish_core::types::heading_of(direction)))
        .with(Projectile {
            owner,
            velocity: direction * spec.speed,
            damage: spec.damage,
            radius: spec.size,
            remaining_ms: spec.lifetime_ms,
            target_layer: LAYER_ENEMY,
        })
        .with(Sprite::new("projectile"))
}

/// Moves projectiles, expires them and queues their damage on contact.
#[derive(Default)]
pub struct ProjectileSystem {
    members: SystemMembers,
}

impl ProjectileSystem {
    pub fn new() -> Self {
        Self::default()
    }
}

impl System for ProjectileSystem {
    fn name(&self) -> &'static str {
        "projectile"
    }

    fn required_components(&self) -> &'static [ComponentKind] {
        PROJECTILE_REQUIRED
    }

    fn members(&self) -> &SystemMembers {
        &self.members
    }

    fn members_mut(&mut self) -> &mut SystemMembers {
        &mut self.members
    }

    fn fixed_update(&mut self, ctx: &mut SystemContext<'_>, dt: f32) {
        let dt_ms = dt as f64 * 1000.0;

        // (id, position, radius, layer) of every damageable collider.
        let targets: Vec<(EntityId, Vec2, f32, u8)> = ctx
            .entities
            .iter()
            .filter(|e| e.get::<Health>().is_some_and(|h| !h.is_dead()))
            .filter_map(|e| {
                let collider = e.get::<Collider>()?;
                Some((e.id(), e.get::<Transform>()?.position, collider.radius, collider.layer))
            })
            .collect();

        for id in self.members.snapshot() {
            let Some(entity) = ctx.entities.get_mut(id) else {
                continue;
            };
            let Some(mut projectile) = entity.get::<Projectile>().copied() else {
                continue;
            };
            let Some(transform) = entity.get_mut::<Transform>() else {
                continue;
            };

            transform.translate(projectile.velocity * dt);
            let position = transform.position;
            projectile.remaining_ms -= dt_ms;
            if let Some(slot) = entity.get_mut::<Projectile>() {
                *slot = projectile;
            }

            if projectile.remaining_ms <= 0.0 || !ctx.bounds.contains(position) {
                ctx.commands.despawn(id);
                continue;
            }

            let hit = targets.iter().find(|(target, center, radius, layer)| {
                *target != projectile.owner
                    && *layer == projectile.target_layer
                    && center.distance_squared(position) < (radius + projectile.radius).powi(2)
            });
            let Some(&(target, ..)) = hit else {
                continue;
            };

            ctx.damage.push(DamageRequest {
                target,
                source: Some(projectile.owner),
                amount: projectile.damage,
            });
            ctx.commands.despawn(id);
        }
    }
}

/// Applies damage queued by other systems this tick, then regenerates.
///
/// Requests aimed at entities outside this system's members are dropped.
#[derive(Default)]
pub struct HealthSystem {
    members: SystemMembers,
}

impl HealthSystem {
    pub fn new() -> Self {
        Self::default()
    }
}

impl System for HealthSystem {
    fn name(&self) -> &'static str {
        "health"
    }

    fn required_components(&self) -> &'static [ComponentKind] {
        HEALTH_REQUIRED
    }

    fn members(&self) -> &SystemMembers {
        &self.members
    }

    fn members_mut(&mut self) -> &mut SystemMembers {
        &mut self.members
    }

    fn fixed_update(&mut self, ctx: &mut SystemContext<'_>, dt: f32) {
        for request in std::mem::take(ctx.damage) {
            if !self.members.contains(request.target) {
                continue;
            }
            let Some(health) = ctx.entities.get_mut(request.target).and_then(|e| e.get_mut::<Health>()) else {
                continue;
            };
            if health.is_dead() {
                continue;
            }
            let amount = health.damage(request.amount);
            ctx.events.push(GameEvent::Damaged {
                target: request.target,
                source: request.source,
                amount,
            });
        }

        for id in self.members.snapshot() {
            if let Some(health) = ctx.entities.get_mut(id).and_then(|e| e.get_mut::<Health>()) {
                health.update(dt);
            }
        }
    }
}
