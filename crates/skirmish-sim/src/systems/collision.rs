//! Circle-vs-circle overlap resolution with a layer filter.
//!
//! Every fixed tick the system tests all pairs of members (O(n²)), pushes
//! overlapping bodies apart along the contact normal, and then clamps every
//! member into the padded world bounds.

use std::collections::BTreeMap;

use glam::Vec2;

use skirmish_core::components::{BoundaryBehavior, CharacterController, Collider, ComponentKind, Transform};
use skirmish_core::constants::{
    COLLISION_LAYER_COUNT, COLLISION_RESOLUTION_STRENGTH, LAYER_ENEMY, LAYER_OBSTACLE, LAYER_PLAYER,
};
use skirmish_core::types::EntityId;

use crate::ecs::system::{System, SystemContext, SystemMembers};

const REQUIRED: &[ComponentKind] = &[ComponentKind::Transform, ComponentKind::Collider];

/// Symmetric matrix of layer pairs that collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerMatrix {
    rows: [u32; COLLISION_LAYER_COUNT],
}

impl LayerMatrix {
    /// No layer pair collides.
    pub fn empty() -> Self {
        Self {
            rows: [0; COLLISION_LAYER_COUNT],
        }
    }

    pub fn set(&mut self, a: u8, b: u8, enabled: bool) {
        let (a, b) = (layer_index(a), layer_index(b));
        if enabled {
            self.rows[a] |= 1 << b;
            self.rows[b] |= 1 << a;
        } else {
            self.rows[a] &= !(1 << b);
            self.rows[b] &= !(1 << a);
        }
    }

    pub fn collides(&self, a: u8, b: u8) -> bool {
        self.rows[layer_index(a)] & (1 << layer_index(b)) != 0
    }
}

impl Default for LayerMatrix {
    /// Player, enemies and obstacles push each other; projectiles are left to
    /// the projectile system.
    fn default() -> Self {
        let mut matrix = Self::empty();
        matrix.set(LAYER_PLAYER, LAYER_ENEMY, true);
        matrix.set(LAYER_ENEMY, LAYER_ENEMY, true);
        matrix.set(LAYER_PLAYER, LAYER_OBSTACLE, true);
        matrix.set(LAYER_ENEMY, LAYER_OBSTACLE, true);
        matrix
    }
}

fn layer_index(layer: u8) -> usize {
    (layer as usize).min(COLLISION_LAYER_COUNT - 1)
}

/// One resolved overlap, recorded when debugging is enabled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub a: EntityId,
    pub b: EntityId,
    /// Unit vector from `a` toward `b`.
    pub normal: Vec2,
    pub penetration: f32,
}

#[derive(Debug, Clone, Copy)]
struct Body {
    id: EntityId,
    position: Vec2,
    radius: f32,
    layer: u8,
    immovable: bool,
}

pub struct CollisionSystem {
    members: SystemMembers,
    layers: LayerMatrix,
    resolution_strength: f32,
    debug: bool,
    contacts: Vec<Contact>,
}

impl CollisionSystem {
    pub fn new() -> Self {
        Self {
            members: SystemMembers::new(),
            layers: LayerMatrix::default(),
            resolution_strength: COLLISION_RESOLUTION_STRENGTH,
            debug: false,
            contacts: Vec::new(),
        }
    }

    pub fn set_layer_collision(&mut self, a: u8, b: u8, enabled: bool) {
        self.layers.set(a, b, enabled);
    }

    pub fn layers(&self) -> &LayerMatrix {
        &self.layers
    }

    pub fn set_layers(&mut self, layers: LayerMatrix) {
        self.layers = layers;
    }

    /// Fraction of penetration removed per tick, clamped to `[0, 1]`.
    pub fn set_resolution_strength(&mut self, strength: f32) {
        self.resolution_strength = if strength.is_finite() {
            strength.clamp(0.0, 1.0)
        } else {
            COLLISION_RESOLUTION_STRENGTH
        };
    }

    pub fn resolution_strength(&self) -> f32 {
        self.resolution_strength
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
        if !debug {
            self.contacts.clear();
        }
    }

    /// Contacts found in the last tick. Empty unless debugging is enabled.
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Position corrections for one pass over `bodies`, keyed by entity.
    fn resolve(&mut self, bodies: &[Body]) -> BTreeMap<EntityId, Vec2> {
        let mut corrections: BTreeMap<EntityId, Vec2> = BTreeMap::new();
        if self.debug {
            self.contacts.clear();
        }

        for (i, a) in bodies.iter().enumerate() {
            for b in &bodies[i + 1..] {
                if !self.layers.collides(a.layer, b.layer) {
                    continue;
                }
                let delta = b.position - a.position;
                let reach = a.radius + b.radius;
                let dist_sq = delta.length_squared();
                if dist_sq >= reach * reach {
                    continue;
                }

                let dist = dist_sq.sqrt();
                // Coincident centres have no direction; separate along +X.
                let normal = if dist > f32::EPSILON { delta / dist } else { Vec2::X };
                let penetration = reach - dist;

                if self.debug {
                    self.contacts.push(Contact {
                        a: a.id,
                        b: b.id,
                        normal,
                        penetration,
                    });
                }

                let push = normal * penetration * self.resolution_strength;
                match (a.immovable, b.immovable) {
                    (true, true) => {}
                    (true, false) => *corrections.entry(b.id).or_default() += push,
                    (false, true) => *corrections.entry(a.id).or_default() -= push,
                    (false, false) => {
                        *corrections.entry(a.id).or_default() -= push * 0.5;
                        *corrections.entry(b.id).or_default() += push * 0.5;
                    }
                }
            }
        }
        corrections
    }
}

impl Default for CollisionSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for CollisionSystem {
    fn name(&self) -> &'static str {
        "collision"
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
        let bodies: Vec<Body> = self
            .members
            .snapshot()
            .into_iter()
            .filter_map(|id| {
                let entity = ctx.entities.get(id)?;
                let transform = entity.get::<Transform>()?;
                let collider = entity.get::<Collider>()?;
                Some(Body {
                    id,
                    position: transform.position,
                    radius: collider.radius,
                    layer: collider.layer,
                    immovable: collider.immovable,
                })
            })
            .collect();

        let corrections = self.resolve(&bodies);

        for body in &bodies {
            let Some(entity) = ctx.entities.get_mut(body.id) else {
                continue;
            };
            let wraps = entity
                .get::<CharacterController>()
                .is_some_and(|c| c.boundary == BoundaryBehavior::Wrap);
            let Some(transform) = entity.get_mut::<Transform>() else {
                continue;
            };
            if let Some(offset) = corrections.get(&body.id) {
                transform.translate(*offset);
            }
            if !wraps {
                transform.set_position(ctx.bounds.clamp(transform.position));
            }
        }
    }
}
