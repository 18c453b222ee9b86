//! Builds the read-only render snapshot from the world.

use skirmish_core::components::{AiBrain, ComponentKind, Health, Sprite, Transform};
use skirmish_core::state::{EntityView, EntityViewKind, RenderSnapshot, ScoreView, WaveView};

use crate::ecs::entity::Entity;
use crate::ecs::world::World;

pub fn build_snapshot(world: &World, wave: WaveView, score: ScoreView, alpha: f32, force_redraw: bool) -> RenderSnapshot {
    let time = world.time();
    RenderSnapshot {
        tick: time.tick,
        elapsed_ms: time.elapsed_ms,
        alpha,
        wave,
        score,
        entities: world.entities().iter().filter_map(entity_view).collect(),
        force_redraw,
    }
}

fn entity_view(entity: &Entity) -> Option<EntityView> {
    let transform = entity.get::<Transform>()?;
    Some(EntityView {
        id: entity.id(),
        kind: view_kind(entity),
        position: transform.position,
        rotation: transform.rotation,
        sprite: entity.get::<Sprite>().map(|s| s.tag.clone()),
        health_fraction: entity.get::<Health>().map(Health::fraction),
        ai_state: entity.get::<AiBrain>().map(|b| b.state.clone()),
    })
}

fn view_kind(entity: &Entity) -> EntityViewKind {
    if entity.has(ComponentKind::Player) {
        EntityViewKind::Player
    } else if entity.has(ComponentKind::Enemy) {
        EntityViewKind::Enemy
    } else if entity.has(ComponentKind::Projectile) {
        EntityViewKind::Projectile
    } else if entity.has(ComponentKind::Obstacle) {
        EntityViewKind::Obstacle
    } else {
        EntityViewKind::Other
    }
}
