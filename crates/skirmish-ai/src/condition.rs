//! Transition condition evaluation.
//!
//! Conditions are evaluated against a read-only snapshot of the AI entity and
//! the player. Distance checks compare squared lengths.

use glam::Vec2;

use skirmish_core::defs::Condition;

/// Everything a condition may look at for one AI entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiContext {
    pub position: Vec2,
    /// `None` when there is no live player.
    pub player: Option<Vec2>,
    pub detection_range: f32,
    pub attack_range: f32,
    /// Precomputed visibility between this entity and the player.
    pub line_of_sight: bool,
    pub health_fraction: f32,
    pub elapsed_in_state_ms: f64,
}

impl AiContext {
    pub fn player_distance_sq(&self) -> Option<f32> {
        self.player.map(|p| p.distance_squared(self.position))
    }

    fn player_within(&self, range: f32) -> bool {
        self.player_distance_sq()
            .is_some_and(|d_sq| d_sq <= range * range)
    }

    fn player_beyond(&self, range: f32) -> bool {
        self.player_distance_sq()
            .is_some_and(|d_sq| d_sq > range * range)
    }
}

pub fn evaluate(condition: &Condition, ctx: &AiContext) -> bool {
    match condition {
        Condition::Always => true,
        Condition::PlayerDetected => ctx.player_within(ctx.detection_range),
        Condition::PlayerInAttackRange => ctx.player_within(ctx.attack_range),
        Condition::PlayerWithin { range } => ctx.player_within(*range),
        Condition::PlayerBeyond { range } => ctx.player_beyond(*range),
        Condition::LineOfSight => ctx.player.is_some() && ctx.line_of_sight,
        Condition::HealthBelow { fraction } => ctx.health_fraction <= *fraction,
        Condition::StateElapsed { ms } => ctx.elapsed_in_state_ms >= *ms,
        Condition::Not { condition } => !evaluate(condition, ctx),
        Condition::And { conditions } => conditions.iter().all(|c| evaluate(c, ctx)),
        Condition::Or { conditions } => conditions.iter().any(|c| evaluate(c, ctx)),
    }
}

/// Whether a condition tree contains a line-of-sight check, so callers can
/// skip the occlusion test when nothing reads it.
pub fn needs_line_of_sight(condition: &Condition) -> bool {
    match condition {
        Condition::LineOfSight => true,
        Condition::Not { condition } => needs_line_of_sight(condition),
        Condition::And { conditions } | Condition::Or { conditions } => {
            conditions.iter().any(needs_line_of_sight)
        }
        _ => false,
    }
}
