//! Render snapshot: the committed state a renderer needs, with no
//! simulation internals.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::types::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityViewKind {
    Player,
    Enemy,
    Projectile,
    Obstacle,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    pub id: EntityId,
    pub kind: EntityViewKind,
    pub position: Vec2,
    /// Radians.
    pub rotation: f32,
    pub sprite: Option<String>,
    /// `None` for entities without health.
    pub health_fraction: Option<f32>,
    /// AI state name, for debug overlays.
    pub ai_state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaveView {
    /// 1-based index of the current or last wave; 0 before the first.
    pub wave: u32,
    pub total_waves: u32,
    pub active: bool,
    pub remaining_to_spawn: u32,
    pub enemies_alive: u32,
    /// Milliseconds until the next wave becomes eligible.
    pub next_wave_in_ms: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreView {
    pub score: u64,
    pub kills: u32,
    pub waves_completed: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderSnapshot {
    pub tick: u64,
    pub elapsed_ms: f64,
    /// Interpolation factor between the last two fixed ticks.
    pub alpha: f32,
    pub wave: WaveView,
    pub score: ScoreView,
    pub entities: Vec<EntityView>,
    /// Set when debug tooling requested a redraw since the last snapshot.
    pub force_redraw: bool,
}
