//! Enemy AI: runs each enemy's behaviour state machine and turns the active
//! movement pattern into controller intent for the next tick.

use std::sync::Arc;

use glam::Vec2;
use tracing::debug;

use skirmish_ai::condition::AiContext;
use skirmish_ai::fsm::{evaluate_brain, state_needs_line_of_sight};
use skirmish_ai::los::{has_line_of_sight, Occluder};
use skirmish_ai::pattern::{steer, SteerContext};
use skirmish_core::components::{
    AiBrain, CharacterController, Collider, ComponentKind, Enemy, Health, Transform,
};

use crate::ecs::system::{System, SystemContext, SystemMembers};
use crate::enemy_manager::EnemyCatalog;

const REQUIRED: &[ComponentKind] = &[
    ComponentKind::Transform,
    ComponentKind::CharacterController,
    ComponentKind::Enemy,
    ComponentKind::AiBrain,
];

pub struct AiBehaviorSystem {
    members: SystemMembers,
    catalog: Arc<EnemyCatalog>,
}

impl AiBehaviorSystem {
    pub fn new(catalog: Arc<EnemyCatalog>) -> Self {
        Self {
            members: SystemMembers::new(),
            catalog,
        }
    }
}

impl System for AiBehaviorSystem {
    fn name(&self) -> &'static str {
        "ai_behavior"
    }

    fn required_components(&self) -> &'static [ComponentKind] {
        REQUIRED
    }

    fn members(&self) -> &SystemMembers {
        &self.members
    }

    fn members_mut(&mut self) -> &mut SystemMembers {
        &mut self.members
    }

    fn fixed_update(&mut self, ctx: &mut SystemContext<'_>, _dt: f32) {
        let player = ctx.player_position();
        let now = ctx.now_ms();

        let occluders: Vec<Occluder> = ctx
            .entities
            .iter()
            .filter(|e| e.has(ComponentKind::Obstacle))
            .filter_map(|e| {
                Some(Occluder {
                    center: e.get::<Transform>()?.position,
                    radius: e.get::<Collider>()?.radius,
                })
            })
            .collect();

        for id in self.members.snapshot() {
            let Some(entity) = ctx.entities.get_mut(id) else {
                continue;
            };
            let (Some(transform), Some(enemy), Some(brain)) = (
                entity.get::<Transform>().copied(),
                entity.get::<Enemy>(),
                entity.get::<AiBrain>(),
            ) else {
                continue;
            };
            let Some(def) = self.catalog.get(&enemy.type_id) else {
                continue;
            };
            let machine = &def.behavior;
            let mut brain = brain.clone();

            let line_of_sight = match player {
                Some(target) if state_needs_line_of_sight(machine, &brain.state) => {
                    has_line_of_sight(transform.position, target, &occluders)
                }
                _ => false,
            };
            let ai = AiContext {
                position: transform.position,
                player,
                detection_range: enemy.detection_range,
                attack_range: enemy.attack_range,
                line_of_sight,
                health_fraction: entity.get::<Health>().map_or(1.0, Health::fraction),
                elapsed_in_state_ms: now - brain.entered_ms,
            };

            let update = evaluate_brain(machine, &brain, &ai, transform.position);
            if update.changed {
                debug!(entity = %id, from = %brain.state, to = %update.new_state, "ai transition");
                brain.state = update.new_state;
                if let Some(pattern) = update.new_pattern {
                    brain.pattern = pattern;
                }
                brain.entered_ms = now;
            }

            let move_intent = steer(
                &mut brain.pattern,
                &SteerContext {
                    position: transform.position,
                    player,
                },
            );
            let aim_intent = match player {
                Some(target) if ai.player_distance_sq().is_some_and(|d| d <= ai.detection_range.powi(2)) => {
                    (target - transform.position).normalize_or_zero()
                }
                _ => Vec2::ZERO,
            };

            if let Some(slot) = entity.get_mut::<AiBrain>() {
                *slot = brain;
            }
            if let Some(controller) = entity.get_mut::<CharacterController>() {
                controller.set_move_intent(move_intent);
                controller.set_aim_intent(aim_intent);
            }
        }
    }
}
