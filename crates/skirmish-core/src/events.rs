//! Events emitted by the simulation for scoring, audio and UI feedback.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::types::EntityId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    WaveStarted {
        wave: u32,
        enemy_count: u32,
    },
    /// Every enemy of the wave has been spawned and defeated.
    WaveCompleted { wave: u32 },
    EnemySpawned {
        entity: EntityId,
        type_id: String,
        position: Vec2,
    },
    EnemyDied {
        entity: EntityId,
        type_id: String,
        score_value: u32,
    },
    /// The live-enemy registry dropped to zero.
    AllEnemiesDefeated,
    WeaponFired {
        entity: EntityId,
        direction: Vec2,
    },
    Damaged {
        target: EntityId,
        source: Option<EntityId>,
        amount: f32,
    },
    PlayerDefeated { entity: EntityId },
    /// A body escaped far outside the world and was pulled back.
    SafetyClamp { entity: EntityId, reset: bool },
}
