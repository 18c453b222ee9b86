//! Enemy catalog and the per-session registry of live enemies.
//!
//! One `EnemyManager` exists per session. It is owned by the `World` and
//! handed to systems through their context, so there is no global instance.

use std::collections::BTreeMap;

use glam::Vec2;

use skirmish_core::defs::EnemyTypeDef;
use skirmish_core::events::GameEvent;
use skirmish_core::types::EntityId;

/// Immutable table of enemy type definitions, keyed by type id.
#[derive(Debug, Clone, Default)]
pub struct EnemyCatalog {
    types: BTreeMap<String, EnemyTypeDef>,
}

impl EnemyCatalog {
    pub fn new(defs: impl IntoIterator<Item = EnemyTypeDef>) -> Self {
        Self {
            types: defs.into_iter().map(|d| (d.id.clone(), d)).collect(),
        }
    }

    pub fn get(&self, type_id: &str) -> Option<&EnemyTypeDef> {
        self.types.get(type_id)
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.types.contains_key(type_id)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}

/// Registry of live enemies with per-type counts.
///
/// Registration and removal queue `EnemySpawned`, `EnemyDied` and
/// `AllEnemiesDefeated` notifications; the world forwards them into the
/// session event stream.
#[derive(Debug, Default)]
pub struct EnemyManager {
    active: BTreeMap<EntityId, String>,
    counts: BTreeMap<String, u32>,
    pending: Vec<GameEvent>,
    total_spawned: u32,
    total_killed: u32,
}

impl EnemyManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a newly added enemy. Registering the same id twice is ignored.
    pub fn register(&mut self, id: EntityId, type_id: &str, position: Vec2) -> bool {
        if self.active.contains_key(&id) {
            return false;
        }
        self.active.insert(id, type_id.to_string());
        *self.counts.entry(type_id.to_string()).or_insert(0) += 1;
        self.total_spawned += 1;
        self.pending.push(GameEvent::EnemySpawned {
            entity: id,
            type_id: type_id.to_string(),
            position,
        });
        true
    }

    /// Stop tracking an enemy. `killed` enemies emit `EnemyDied` with their
    /// score value; the registry reaching zero emits `AllEnemiesDefeated`.
    pub fn unregister(&mut self, id: EntityId, killed: bool, score_value: u32) -> bool {
        let Some(type_id) = self.active.remove(&id) else {
            return false;
        };
        if let Some(count) = self.counts.get_mut(&type_id) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.counts.remove(&type_id);
            }
        }
        if killed {
            self.total_killed += 1;
            self.pending.push(GameEvent::EnemyDied {
                entity: id,
                type_id,
                score_value,
            });
        }
        if self.active.is_empty() {
            self.pending.push(GameEvent::AllEnemiesDefeated);
        }
        true
    }

    pub fn is_active(&self, id: EntityId) -> bool {
        self.active.contains_key(&id)
    }

    pub fn active_count(&self) -> u32 {
        self.active.len() as u32
    }

    pub fn count_of(&self, type_id: &str) -> u32 {
        self.counts.get(type_id).copied().unwrap_or(0)
    }

    pub fn active_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.active.keys().copied()
    }

    pub fn total_spawned(&self) -> u32 {
        self.total_spawned
    }

    pub fn total_killed(&self) -> u32 {
        self.total_killed
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Forget every enemy without emitting notifications.
    pub fn clear(&mut self) {
        self.active.clear();
        self.counts.clear();
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> EntityId {
        EntityId::new(n, 0)
    }

    #[test]
    fn counts_by_type() {
        let mut manager = EnemyManager::new();
        manager.register(id(1), "basic", Vec2::ZERO);
        manager.register(id(2), "basic", Vec2::ZERO);
        manager.register(id(3), "runner", Vec2::ZERO);
        assert!(!manager.register(id(3), "runner", Vec2::ZERO));

        assert_eq!(manager.active_count(), 3);
        assert_eq!(manager.count_of("basic"), 2);
        assert_eq!(manager.count_of("runner"), 1);
        assert_eq!(manager.count_of("tank"), 0);
    }

    #[test]
    fn all_defeated_fires_when_registry_empties() {
        let mut manager = EnemyManager::new();
        manager.register(id(1), "basic", Vec2::ZERO);
        manager.register(id(2), "basic", Vec2::ZERO);
        manager.drain_events();

        manager.unregister(id(1), true, 10);
        let events = manager.drain_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], GameEvent::EnemyDied { score_value: 10, .. }));

        manager.unregister(id(2), true, 10);
        let events = manager.drain_events();
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, GameEvent::AllEnemiesDefeated))
                .count(),
            1
        );

        assert!(!manager.unregister(id(2), true, 10));
        assert!(manager.drain_events().is_empty());
        assert_eq!(manager.total_killed(), 2);
    }

    #[test]
    fn despawn_without_kill_emits_no_death() {
        let mut manager = EnemyManager::new();
        manager.register(id(1), "basic", Vec2::ZERO);
        manager.drain_events();
        manager.unregister(id(1), false, 10);
        let events = manager.drain_events();
        assert_eq!(events, vec![GameEvent::AllEnemiesDefeated]);
    }
}
