use std::collections::BTreeMap;

use glam::Vec2;
use tracing::{debug, info};

use skirmish_core::components::{Component, ComponentKind, Enemy, Health, Player, Transform};
use skirmish_core::events::GameEvent;
use skirmish_core::input::InputEvent;
use skirmish_core::types::{EntityId, SimTime, WorldBounds};

use super::entity::{Entity, EntityAllocator, EntityBuilder};
use super::system::{DamageRequest, InputBuffer, System, SystemContext};
use crate::enemy_manager::EnemyManager;

/// Every live entity, ordered by id.
#[derive(Debug, Default)]
pub struct EntityStore {
    entities: BTreeMap<EntityId, Entity>,
    player: Option<EntityId>,
}

impl EntityStore {
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    /// The player entity, if one has been added and not removed.
    pub fn player(&self) -> Option<EntityId> {
        self.player
    }

    fn insert(&mut self, entity: Entity) {
        if entity.has(ComponentKind::Player) {
            self.player = Some(entity.id());
        }
        self.entities.insert(entity.id(), entity);
    }

    fn remove(&mut self, id: EntityId) -> Option<Entity> {
        if self.player == Some(id) {
            self.player = None;
        }
        self.entities.remove(&id)
    }
}

/// Structural change requested by a system during an update.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Spawn(EntityBuilder),
    Despawn(EntityId),
}

/// Commands are applied by the world after the issuing system returns.
#[derive(Debug, Default)]
pub struct CommandBuffer {
    commands: Vec<Command>,
}

impl CommandBuffer {
    pub fn spawn(&mut self, builder: EntityBuilder) {
        self.commands.push(Command::Spawn(builder));
    }

    pub fn despawn(&mut self, id: EntityId) {
        self.commands.push(Command::Despawn(id));
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn take(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }
}

/// Owner of all entities and the ordered system list.
///
/// Only the world adds or removes entities. Systems see entities through a
/// `SystemContext` and queue structural changes in its `CommandBuffer`.
pub struct World {
    allocator: EntityAllocator,
    store: EntityStore,
    systems: Vec<Box<dyn System>>,
    commands: CommandBuffer,
    damage: Vec<DamageRequest>,
    events: Vec<GameEvent>,
    input: InputBuffer,
    enemies: EnemyManager,
    time: SimTime,
    bounds: WorldBounds,
    force_redraw: bool,
    player_defeated: bool,
}

impl World {
    pub fn new(bounds: WorldBounds, enemies: EnemyManager) -> Self {
        Self {
            allocator: EntityAllocator::new(),
            store: EntityStore::default(),
            systems: Vec::new(),
            commands: CommandBuffer::default(),
            damage: Vec::new(),
            events: Vec::new(),
            input: InputBuffer::default(),
            enemies,
            time: SimTime::default(),
            bounds: bounds.sanitized(),
            force_redraw: false,
            player_defeated: false,
        }
    }

    /// Append a system. Systems run in registration order every tick.
    /// Entities already in the world are routed to it immediately.
    pub fn add_system(&mut self, system: impl System + 'static) {
        let mut system: Box<dyn System> = Box::new(system);
        for entity in self.store.iter() {
            route(&mut *system, entity);
        }
        self.systems.push(system);
    }

    pub fn system_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|s| s.name()).collect()
    }

    pub fn system<T: System + 'static>(&self) -> Option<&T> {
        self.systems
            .iter()
            .find_map(|s| (**s).as_any().downcast_ref::<T>())
    }

    pub fn system_mut<T: System + 'static>(&mut self) -> Option<&mut T> {
        self.systems
            .iter_mut()
            .find_map(|s| (**s).as_any_mut().downcast_mut::<T>())
    }

    /// Add an entity and route it to every system whose required kinds it carries.
    pub fn add_entity(&mut self, builder: EntityBuilder) -> EntityId {
        let id = self.allocator.allocate();
        let entity = builder.into_entity(id);

        for system in self.systems.iter_mut() {
            route(&mut **system, &entity);
        }
        self.store.insert(entity);
        self.register_enemy(id);
        self.flush_enemy_events();
        id
    }

    /// Remove an entity from the world and from every system holding it.
    /// Returns false if the id is stale.
    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.store.remove(id) else {
            return false;
        };
        for system in self.systems.iter_mut() {
            if system.members_mut().remove(id) {
                system.on_entity_removed(id);
            }
        }
        if self.enemies.is_active(id) {
            let killed = entity.get::<Health>().is_some_and(|h| h.is_dead());
            let score_value = entity.get::<Enemy>().map_or(0, |e| e.score_value);
            self.enemies.unregister(id, killed, score_value);
        }
        self.allocator.deallocate(id);
        self.flush_enemy_events();
        true
    }

    /// Attach a component, re-routing the entity if its kind set changed.
    /// Returns the replaced component of the same kind, if any.
    pub fn insert_component(&mut self, id: EntityId, component: impl Into<Component>) -> Option<Component> {
        let component = component.into();
        let kind = component.kind();
        let previous = self.store.get_mut(id)?.insert(component);
        if kind == ComponentKind::Player {
            self.store.player = Some(id);
        }
        if matches!(kind, ComponentKind::Enemy | ComponentKind::Transform) {
            self.register_enemy(id);
            self.flush_enemy_events();
        }
        self.reroute(id);
        previous
    }

    pub fn remove_component(&mut self, id: EntityId, kind: ComponentKind) -> Option<Component> {
        let removed = self.store.get_mut(id)?.remove(kind);
        if kind == ComponentKind::Player && self.store.player == Some(id) {
            self.store.player = None;
        }
        if kind == ComponentKind::Enemy && removed.is_some() {
            self.enemies.unregister(id, false, 0);
            self.flush_enemy_events();
        }
        if removed.is_some() {
            self.reroute(id);
        }
        removed
    }

    /// Track `id` in the enemy registry once it carries both `Enemy` and `Transform`.
    fn register_enemy(&mut self, id: EntityId) {
        let Some(entity) = self.store.get(id) else {
            return;
        };
        if let (Some(enemy), Some(transform)) = (entity.get::<Enemy>(), entity.get::<Transform>()) {
            self.enemies.register(id, &enemy.type_id, transform.position);
        }
    }

    fn reroute(&mut self, id: EntityId) {
        let Some(entity) = self.store.get(id) else {
            return;
        };
        for system in self.systems.iter_mut() {
            let required = system.required_components();
            let wanted = !required.is_empty() && entity.has_all(required);
            let member = system.members().contains(id);
            if wanted && !member {
                system.members_mut().insert(id);
                system.on_entity_added(entity);
            } else if !wanted && member {
                system.members_mut().remove(id);
                system.on_entity_removed(id);
            }
        }
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.store.get(id)
    }

    /// Mutable access to an entity's components. The kind set cannot change
    /// through this handle; use `insert_component`/`remove_component`.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.store.get_mut(id)
    }

    pub fn entities(&self) -> &EntityStore {
        &self.store
    }

    pub fn entity_count(&self) -> usize {
        self.store.len()
    }

    pub fn player(&self) -> Option<EntityId> {
        self.store.player()
    }

    pub fn player_position(&self) -> Option<Vec2> {
        let player = self.store.get(self.store.player()?)?;
        player.get::<Transform>().map(|t| t.position)
    }

    /// Queue an input event for the next tick.
    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    pub fn input(&self) -> &InputBuffer {
        &self.input
    }

    pub fn enemies(&self) -> &EnemyManager {
        &self.enemies
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    /// Run one fixed tick: every system in order, applying each system's
    /// queued commands before the next one runs, then sweep dead entities.
    pub fn fixed_update(&mut self, dt: f32) {
        for index in 0..self.systems.len() {
            let mut ctx = SystemContext {
                entities: &mut self.store,
                commands: &mut self.commands,
                damage: &mut self.damage,
                events: &mut self.events,
                enemies: &mut self.enemies,
                input: &mut self.input,
                time: self.time,
                bounds: self.bounds,
            };
            self.systems[index].fixed_update(&mut ctx, dt);
            self.apply_commands();
        }
        if !self.damage.is_empty() {
            debug!(requests = self.damage.len(), "damage dropped: no health system consumed it");
            self.damage.clear();
        }
        self.sweep_dead();
        self.time.advance(dt);
    }

    /// Run the variable-rate hook of every system once.
    pub fn update(&mut self, dt: f32) {
        for index in 0..self.systems.len() {
            let mut ctx = SystemContext {
                entities: &mut self.store,
                commands: &mut self.commands,
                damage: &mut self.damage,
                events: &mut self.events,
                enemies: &mut self.enemies,
                input: &mut self.input,
                time: self.time,
                bounds: self.bounds,
            };
            self.systems[index].update(&mut ctx, dt);
            self.apply_commands();
        }
    }

    fn apply_commands(&mut self) {
        for command in self.commands.take() {
            match command {
                Command::Spawn(builder) => {
                    self.add_entity(builder);
                }
                Command::Despawn(id) => {
                    self.remove_entity(id);
                }
            }
        }
    }

    /// Remove every dead entity except the player. A dead player stays in the
    /// world and emits `PlayerDefeated` once.
    fn sweep_dead(&mut self) {
        let dead: Vec<EntityId> = self
            .store
            .iter()
            .filter(|e| e.get::<Health>().is_some_and(|h| h.is_dead()))
            .map(|e| e.id())
            .collect();

        for id in dead {
            let is_player = self.store.get(id).is_some_and(|e| e.has(ComponentKind::Player));
            if is_player {
                if !self.player_defeated {
                    self.player_defeated = true;
                    info!(entity = %id, "player defeated");
                    self.events.push(GameEvent::PlayerDefeated { entity: id });
                }
                continue;
            }
            self.remove_entity(id);
        }
    }

    pub fn player_defeated(&self) -> bool {
        self.player_defeated
    }

    /// Level of the player, 1 when there is none.
    pub fn player_level(&self) -> u32 {
        self.store
            .player()
            .and_then(|id| self.store.get(id))
            .and_then(|e| e.get::<Player>())
            .map_or(1, |p| p.level.max(1))
    }

    fn flush_enemy_events(&mut self) {
        self.events.extend(self.enemies.drain_events());
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn request_redraw(&mut self) {
        self.force_redraw = true;
    }

    /// Read and clear the redraw request.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.force_redraw)
    }

    /// Restore clock state from a save.
    pub(crate) fn set_time(&mut self, time: SimTime) {
        self.time = time;
    }
}

/// Add `entity` to `system` if it carries every required kind.
fn route(system: &mut dyn System, entity: &Entity) {
    let required = system.required_components();
    if required.is_empty() {
        return;
    }
    let missing = entity.missing(required);
    if missing.is_empty() {
        system.members_mut().insert(entity.id());
        system.on_entity_added(entity);
    } else if let Some(missing) = rejection_diagnostic(required, missing) {
        debug!(
            system = system.name(),
            entity = %entity.id(),
            ?missing,
            "entity rejected: missing required components"
        );
    }
}

/// Kinds to report for a rejected entity. Only partial matches are reported:
/// an entity sharing no kind with a system was never meant for it, and
/// logging those would flag nearly every entity against every system.
fn rejection_diagnostic(required: &[ComponentKind], missing: Vec<ComponentKind>) -> Option<Vec<ComponentKind>> {
    (!missing.is_empty() && missing.len() < required.len()).then_some(missing)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: &[ComponentKind] = &[ComponentKind::Transform, ComponentKind::Health];

    #[test]
    fn partial_match_is_reported() {
        assert_eq!(
            rejection_diagnostic(REQUIRED, vec![ComponentKind::Health]),
            Some(vec![ComponentKind::Health])
        );
    }

    #[test]
    fn disjoint_and_full_matches_are_not_reported() {
        assert_eq!(rejection_diagnostic(REQUIRED, REQUIRED.to_vec()), None);
        assert_eq!(rejection_diagnostic(REQUIRED, Vec::new()), None);
    }
}
