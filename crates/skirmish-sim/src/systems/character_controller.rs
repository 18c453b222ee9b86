//! Character controller: integrates movement intent into velocity and
//! position, enforces the controller's boundary policy, and turns bodies
//! toward their aim.

use glam::Vec2;
use tracing::warn;

use skirmish_core::components::{BoundaryBehavior, CharacterController, ComponentKind, Transform};
use skirmish_core::constants::{SAFETY_CLAMP_DISTANCE, SAFE_RESET_POSITION};
use skirmish_core::events::GameEvent;
use skirmish_core::types::{heading_of, rotate_towards, WorldBounds};

use crate::ecs::system::{System, SystemContext, SystemMembers};

/// Velocity below this speed snaps to rest while braking.
const REST_SPEED: f32 = 0.5;

const REQUIRED: &[ComponentKind] = &[ComponentKind::Transform, ComponentKind::CharacterController];

pub struct CharacterControllerSystem {
    members: SystemMembers,
    safety_distance: f32,
}

impl CharacterControllerSystem {
    pub fn new() -> Self {
        Self {
            members: SystemMembers::new(),
            safety_distance: SAFETY_CLAMP_DISTANCE,
        }
    }

    /// Override the runaway threshold (distance from the origin).
    pub fn with_safety_distance(mut self, distance: f32) -> Self {
        self.safety_distance = if distance.is_finite() && distance > 0.0 {
            distance
        } else {
            SAFETY_CLAMP_DISTANCE
        };
        self
    }
}

impl Default for CharacterControllerSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for CharacterControllerSystem {
    fn name(&self) -> &'static str {
        "character_controller"
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

    fn fixed_update(&mut self, ctx: &mut SystemContext<'_>, dt: f32) {
        ctx.input.drain();
        let input = *ctx.input.state();
        let player = ctx.entities.player();
        let bounds = ctx.bounds;

        for id in self.members.snapshot() {
            let Some(entity) = ctx.entities.get_mut(id) else {
                continue;
            };
            let Some(mut controller) = entity.get::<CharacterController>().copied() else {
                continue;
            };
            let Some(mut transform) = entity.get::<Transform>().copied() else {
                continue;
            };

            if Some(id) == player {
                controller.set_move_intent(input.move_intent);
                controller.set_aim_intent(input.aim_intent);
            }

            integrate_velocity(&mut controller, dt);
            transform.translate(controller.velocity * dt);
            apply_boundary(&mut transform, &mut controller, &bounds);

            if let Some(reset) = safety_clamp(&mut transform, &mut controller, self.safety_distance) {
                warn!(entity = %id, reset, "runaway position clamped");
                ctx.events.push(GameEvent::SafetyClamp { entity: id, reset });
            }

            face_intent(&mut transform, &controller, dt);

            if let Some(slot) = entity.get_mut::<CharacterController>() {
                *slot = controller;
            }
            if let Some(slot) = entity.get_mut::<Transform>() {
                *slot = transform;
            }
        }
    }
}

/// Accelerate toward `move_direction * max_speed`, or brake with friction
/// when there is no intent. Speed never exceeds `max_speed`.
pub fn integrate_velocity(controller: &mut CharacterController, dt: f32) {
    let intent = controller.move_direction;
    if intent != Vec2::ZERO {
        let target = intent * controller.max_speed;
        let max_change = controller.acceleration * dt;
        controller.velocity += (target - controller.velocity).clamp_length_max(max_change);
        controller.last_move_direction = intent.normalize_or_zero();
    } else {
        let damping = (1.0 - controller.friction * dt).max(0.0);
        controller.velocity *= damping;
        if controller.velocity.length_squared() < REST_SPEED * REST_SPEED {
            controller.velocity = Vec2::ZERO;
        }
    }
    controller.velocity = controller.velocity.clamp_length_max(controller.max_speed);
    if !controller.velocity.is_finite() {
        controller.velocity = Vec2::ZERO;
    }
}

pub fn apply_boundary(transform: &mut Transform, controller: &mut CharacterController, bounds: &WorldBounds) {
    match controller.boundary {
        BoundaryBehavior::Clamp => {
            let clamped = bounds.clamp(transform.position);
            // Zero the velocity component that pushed into the edge.
            if clamped.x != transform.position.x {
                controller.velocity.x = 0.0;
            }
            if clamped.y != transform.position.y {
                controller.velocity.y = 0.0;
            }
            transform.set_position(clamped);
        }
        BoundaryBehavior::Wrap => transform.set_position(bounds.wrap(transform.position)),
        BoundaryBehavior::Free => {}
    }
}

/// Pull a runaway body back toward the origin. Returns `Some(reset)` when a
/// correction happened, `reset` being true if the body was teleported to the
/// safe position rather than rescaled.
pub fn safety_clamp(transform: &mut Transform, controller: &mut CharacterController, threshold: f32) -> Option<bool> {
    let position = transform.position;
    if !position.is_finite() || position.length_squared() > (2.0 * threshold).powi(2) {
        transform.set_position(Vec2::new(SAFE_RESET_POSITION.0, SAFE_RESET_POSITION.1));
        controller.velocity = Vec2::ZERO;
        return Some(true);
    }
    if position.length_squared() > threshold * threshold {
        transform.set_position(position.normalize_or_zero() * threshold);
        controller.velocity = Vec2::ZERO;
        return Some(false);
    }
    None
}

/// Turn toward the aim direction, or the last movement direction when not
/// aiming, by at most `rotation_speed * dt`.
pub fn face_intent(transform: &mut Transform, controller: &CharacterController, dt: f32) {
    let facing = if controller.aim_direction != Vec2::ZERO {
        controller.aim_direction
    } else {
        controller.last_move_direction
    };
    if facing == Vec2::ZERO {
        return;
    }
    let target = heading_of(facing);
    transform.set_rotation(rotate_towards(transform.rotation, target, controller.rotation_speed * dt));
}
