//! Movement patterns.
//!
//! Each pattern turns the entity's and the player's positions into a desired
//! move direction with magnitude in `[0, 1]`. The only state a pattern keeps
//! is what its own instance owns (the patrol waypoint for `Search`).

use glam::Vec2;

use skirmish_core::components::MovementPattern;
use skirmish_core::constants::PATROL_ARRIVE_DISTANCE;
use skirmish_core::defs::PatternDef;
use skirmish_core::types::direction_of;

/// Golden angle in radians; spreads successive patrol waypoints evenly.
const GOLDEN_ANGLE: f32 = 2.399_963;

/// Inputs for one steering step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteerContext {
    pub position: Vec2,
    pub player: Option<Vec2>,
}

/// Build a pattern instance for a state being entered at `origin`.
pub fn instantiate(def: &PatternDef, origin: Vec2) -> MovementPattern {
    match *def {
        PatternDef::Idle => MovementPattern::Idle,
        PatternDef::Pursue {
            speed_factor,
            stop_distance,
        } => MovementPattern::Pursue {
            speed_factor: unit(speed_factor),
            stop_distance: stop_distance.max(0.0),
        },
        PatternDef::Retreat {
            speed_factor,
            min_distance,
            max_distance,
        } => {
            let min_distance = min_distance.max(0.0);
            MovementPattern::Retreat {
                speed_factor: unit(speed_factor),
                min_distance,
                max_distance: max_distance.max(min_distance),
            }
        }
        PatternDef::Search {
            speed_factor,
            radius,
        } => {
            let radius = radius.max(0.0);
            MovementPattern::Search {
                speed_factor: unit(speed_factor),
                center: origin,
                radius,
                waypoint: 0,
                target: patrol_point(origin, radius, 0),
            }
        }
    }
}

fn unit(factor: f32) -> f32 {
    if factor.is_finite() {
        factor.clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// Compute the desired move direction, advancing patrol state if needed.
pub fn steer(pattern: &mut MovementPattern, ctx: &SteerContext) -> Vec2 {
    match pattern {
        MovementPattern::Idle => Vec2::ZERO,
        MovementPattern::Pursue {
            speed_factor,
            stop_distance,
        } => {
            let Some(player) = ctx.player else {
                return Vec2::ZERO;
            };
            let to_player = player - ctx.position;
            if to_player.length_squared() <= *stop_distance * *stop_distance {
                return Vec2::ZERO;
            }
            to_player.normalize_or_zero() * *speed_factor
        }
        MovementPattern::Retreat {
            speed_factor,
            min_distance,
            max_distance,
        } => {
            let Some(player) = ctx.player else {
                return Vec2::ZERO;
            };
            let away = ctx.position - player;
            let dist_sq = away.length_squared();
            if dist_sq < *min_distance * *min_distance {
                let dir = away.normalize_or_zero();
                let dir = if dir == Vec2::ZERO { Vec2::X } else { dir };
                dir * *speed_factor
            } else if dist_sq > *max_distance * *max_distance {
                -away.normalize_or_zero() * *speed_factor
            } else {
                Vec2::ZERO
            }
        }
        MovementPattern::Search {
            speed_factor,
            center,
            radius,
            waypoint,
            target,
        } => {
            if ctx.position.distance_squared(*target) <= PATROL_ARRIVE_DISTANCE * PATROL_ARRIVE_DISTANCE {
                *waypoint = waypoint.wrapping_add(1);
                *target = patrol_point(*center, *radius, *waypoint);
            }
            (*target - ctx.position).normalize_or_zero() * *speed_factor
        }
    }
}

/// Deterministic patrol waypoint `n` inside a circle.
pub fn patrol_point(center: Vec2, radius: f32, n: u32) -> Vec2 {
    // Alternate between the outer ring and half radius so the walk crosses the area.
    let ring = if n % 2 == 0 { 1.0 } else { 0.5 };
    center + direction_of(n as f32 * GOLDEN_ANGLE) * radius * ring
}
