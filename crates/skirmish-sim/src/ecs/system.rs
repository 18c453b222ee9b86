//! The `System` trait and the per-system membership set.
//!
//! A system declares the component kinds it requires. The world routes an
//! entity to a system only if the entity carries every required kind; the
//! system then sees that entity in its `SystemMembers` until it is removed.

use std::any::Any;
use std::collections::{BTreeSet, VecDeque};

use glam::Vec2;

use skirmish_core::components::{ComponentKind, Health, Player, Transform};
use skirmish_core::events::GameEvent;
use skirmish_core::input::{AxisAction, ButtonAction, InputEvent};
use skirmish_core::types::{EntityId, SimTime, WorldBounds};

use crate::ecs::entity::Entity;
use crate::ecs::world::{CommandBuffer, EntityStore};
use crate::enemy_manager::EnemyManager;

/// Downcasting support so callers can reach a concrete system inside the world.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub trait System: AsAny {
    fn name(&self) -> &'static str;

    /// Component kinds an entity must carry to be routed here. An empty set
    /// marks a system that is not entity-driven; it receives no members.
    fn required_components(&self) -> &'static [ComponentKind];

    fn members(&self) -> &SystemMembers;

    fn members_mut(&mut self) -> &mut SystemMembers;

    /// Called after `entity` joined this system's members.
    fn on_entity_added(&mut self, _entity: &Entity) {}

    /// Called after `id` left this system's members.
    fn on_entity_removed(&mut self, _id: EntityId) {}

    /// Fixed-rate step with a constant `dt` in seconds.
    fn fixed_update(&mut self, ctx: &mut SystemContext<'_>, dt: f32);

    /// Variable-rate step, once per rendered frame.
    fn update(&mut self, _ctx: &mut SystemContext<'_>, _dt: f32) {}
}

/// Ids of the entities routed to a system, ordered by id.
#[derive(Debug, Clone, Default)]
pub struct SystemMembers {
    ids: BTreeSet<EntityId>,
}

impl SystemMembers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: EntityId) -> bool {
        self.ids.insert(id)
    }

    pub fn remove(&mut self, id: EntityId) -> bool {
        self.ids.remove(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Copy of the current ids. Iterate this instead of the live set so
    /// members may be removed mid-iteration.
    pub fn snapshot(&self) -> Vec<EntityId> {
        self.ids.iter().copied().collect()
    }
}

/// Latest value of every input, retained until superseded.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputState {
    pub move_intent: Vec2,
    pub aim_intent: Vec2,
    pub fire_held: bool,
    /// Set by a fire press; cleared once a semi-automatic weapon consumes it.
    pub fire_pressed: bool,
}

/// Input events queued between ticks plus the retained state they build.
#[derive(Debug, Clone, Default)]
pub struct InputBuffer {
    queue: VecDeque<InputEvent>,
    state: InputState,
}

impl InputBuffer {
    pub fn push(&mut self, event: InputEvent) {
        self.queue.push_back(event);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Apply queued events in arrival order.
    pub fn drain(&mut self) {
        while let Some(event) = self.queue.pop_front() {
            match event {
                InputEvent::AxisChanged { action, value } => match action {
                    AxisAction::Move => self.state.move_intent = value.intent(),
                    AxisAction::Aim => self.state.aim_intent = value.intent(),
                },
                InputEvent::ActionStarted {
                    action: ButtonAction::Fire,
                } => {
                    self.state.fire_held = true;
                    self.state.fire_pressed = true;
                }
                InputEvent::ActionEnded {
                    action: ButtonAction::Fire,
                } => self.state.fire_held = false,
            }
        }
    }

    pub fn state(&self) -> &InputState {
        &self.state
    }

    pub fn consume_fire_press(&mut self) -> bool {
        std::mem::take(&mut self.state.fire_pressed)
    }
}

/// Damage a system wants applied to an entity it does not own. The health
/// system applies queued damage later in the same tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageRequest {
    pub target: EntityId,
    pub source: Option<EntityId>,
    pub amount: f32,
}

/// Everything a system may touch during an update.
///
/// Systems only mutate components of their own members. Effects on other
/// entities go through `commands` or `damage`.
pub struct SystemContext<'a> {
    pub entities: &'a mut EntityStore,
    pub commands: &'a mut CommandBuffer,
    pub damage: &'a mut Vec<DamageRequest>,
    pub events: &'a mut Vec<GameEvent>,
    pub enemies: &'a mut EnemyManager,
    pub input: &'a mut InputBuffer,
    pub time: SimTime,
    pub bounds: WorldBounds,
}

impl SystemContext<'_> {
    pub fn now_ms(&self) -> f64 {
        self.time.elapsed_ms
    }

    /// Position of the live player, if any.
    pub fn player_position(&self) -> Option<Vec2> {
        let player = self.entities.get(self.entities.player()?)?;
        if player.get::<Health>().is_some_and(|h| h.is_dead()) {
            return None;
        }
        player.get::<Transform>().map(|t| t.position)
    }

    pub fn player_level(&self) -> u32 {
        self.entities
            .player()
            .and_then(|id| self.entities.get(id))
            .and_then(|e| e.get::<Player>())
            .map_or(1, |p| p.level.max(1))
    }
}
