use std::collections::BTreeMap;

use skirmish_core::components::{Component, ComponentData, ComponentKind};
pub use skirmish_core::types::EntityId;

pub struct EntityAllocator {
    generations: Vec<u32>,
    free_indices: Vec<u32>,
    next_index: u32,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self {
            generations: Vec::new(),
            free_indices: Vec::new(),
            next_index: 0,
        }
    }

    pub fn allocate(&mut self) -> EntityId {
        if let Some(index) = self.free_indices.pop() {
            let generation = self.generations[index as usize];
            EntityId::new(index, generation)
        } else {
            let index = self.next_index;
            self.next_index += 1;
            self.generations.push(0);
            EntityId::new(index, 0)
        }
    }

    pub fn deallocate(&mut self, id: EntityId) {
        if self.is_alive(id) {
            self.generations[id.index as usize] += 1;
            self.free_indices.push(id.index);
        }
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        (id.index as usize) < self.generations.len()
            && self.generations[id.index as usize] == id.generation
            && !self.free_indices.contains(&id.index)
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Components for an entity that has not been added to a world yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityBuilder {
    components: BTreeMap<ComponentKind, Component>,
}

impl EntityBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component, replacing any existing one of the same kind.
    pub fn with(mut self, component: impl Into<Component>) -> Self {
        let component = component.into();
        self.components.insert(component.kind(), component);
        self
    }

    pub fn has(&self, kind: ComponentKind) -> bool {
        self.components.contains_key(&kind)
    }

    pub fn get<T: ComponentData>(&self) -> Option<&T> {
        self.components.get(&T::KIND).and_then(T::from_component)
    }

    pub(crate) fn into_entity(self, id: EntityId) -> Entity {
        Entity {
            id,
            components: self.components,
        }
    }
}

/// An identifier plus at most one component per kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: EntityId,
    components: BTreeMap<ComponentKind, Component>,
}

impl Entity {
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn has(&self, kind: ComponentKind) -> bool {
        self.components.contains_key(&kind)
    }

    pub fn has_all(&self, kinds: &[ComponentKind]) -> bool {
        kinds.iter().all(|k| self.has(*k))
    }

    /// Kinds from `kinds` this entity lacks.
    pub fn missing(&self, kinds: &[ComponentKind]) -> Vec<ComponentKind> {
        kinds.iter().copied().filter(|k| !self.has(*k)).collect()
    }

    pub fn kinds(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        self.components.keys().copied()
    }

    pub fn get<T: ComponentData>(&self) -> Option<&T> {
        self.components.get(&T::KIND).and_then(T::from_component)
    }

    pub fn get_mut<T: ComponentData>(&mut self) -> Option<&mut T> {
        self.components
            .get_mut(&T::KIND)
            .and_then(T::from_component_mut)
    }

    /// Insert a component, returning the one it replaced.
    pub(crate) fn insert(&mut self, component: Component) -> Option<Component> {
        self.components.insert(component.kind(), component)
    }

    pub(crate) fn remove(&mut self, kind: ComponentKind) -> Option<Component> {
        self.components.remove(&kind)
    }

    pub fn components(&self) -> impl Iterator<Item = &Component> + '_ {
        self.components.values()
    }
}
