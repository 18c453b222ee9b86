//! Fundamental geometric and simulation types.
//!
//! Rotation is tracked in radians everywhere in the simulation. Angles grow
//! counter-clockwise from the +X axis, matching `Vec2::to_angle`.

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Generational entity identifier.
///
/// The index is recycled after despawn; the generation is bumped so a stale id
/// never refers to the entity that reuses its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId {
    pub index: u32,
    pub generation: u32,
}

impl EntityId {
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E{}g{}", self.index, self.generation)
    }
}

/// Simulation time tracking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimTime {
    /// Fixed ticks run so far.
    pub tick: u64,
    /// Elapsed simulation time in milliseconds.
    pub elapsed_ms: f64,
}

impl SimTime {
    /// Advance by one fixed tick of `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        self.tick += 1;
        self.elapsed_ms += dt as f64 * 1000.0;
    }
}

/// Wrap an angle into `(-PI, PI]`.
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Signed shortest rotation taking `from` to `to`.
pub fn shortest_angle_delta(from: f32, to: f32) -> f32 {
    wrap_angle(to - from)
}

/// Rotate `current` toward `target` by at most `max_step` radians.
pub fn rotate_towards(current: f32, target: f32, max_step: f32) -> f32 {
    let delta = shortest_angle_delta(current, target);
    let step = delta.clamp(-max_step.abs(), max_step.abs());
    wrap_angle(current + step)
}

/// Heading of a direction vector in radians. Zero vector maps to zero.
pub fn heading_of(direction: Vec2) -> f32 {
    if direction == Vec2::ZERO {
        0.0
    } else {
        direction.to_angle()
    }
}

/// Unit vector for a heading in radians.
pub fn direction_of(angle: f32) -> Vec2 {
    Vec2::from_angle(angle)
}

/// Clamp an input axis so its magnitude lies in `[0, 1]`.
/// Non-finite input collapses to zero.
pub fn clamp_axis(value: Vec2) -> Vec2 {
    if !value.is_finite() {
        return Vec2::ZERO;
    }
    value.clamp_length_max(1.0)
}

pub fn degrees_to_radians(degrees: f32) -> f32 {
    degrees.to_radians()
}

pub fn radians_to_degrees(radians: f32) -> f32 {
    radians.to_degrees()
}

/// Rectangular play field `[0, width] x [0, height]` with an inner padding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub width: f32,
    pub height: f32,
    pub padding: f32,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            width: crate::constants::WORLD_WIDTH,
            height: crate::constants::WORLD_HEIGHT,
            padding: crate::constants::WORLD_PADDING,
        }
    }
}

impl WorldBounds {
    pub fn new(width: f32, height: f32, padding: f32) -> Self {
        Self {
            width,
            height,
            padding,
        }
        .sanitized()
    }

    /// Clamp dimensions to positive values and padding so the inner area is
    /// never inverted.
    pub fn sanitized(&self) -> Self {
        let width = if self.width.is_finite() { self.width.max(1.0) } else { 1.0 };
        let height = if self.height.is_finite() { self.height.max(1.0) } else { 1.0 };
        let max_padding = width.min(height) / 2.0;
        let padding = if self.padding.is_finite() {
            self.padding.clamp(0.0, max_padding)
        } else {
            0.0
        };
        Self {
            width,
            height,
            padding,
        }
    }

    pub fn min(&self) -> Vec2 {
        Vec2::splat(self.padding)
    }

    pub fn max(&self) -> Vec2 {
        Vec2::new(self.width - self.padding, self.height - self.padding)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Clamp a position into `[padding, dimension - padding]` on each axis.
    pub fn clamp(&self, position: Vec2) -> Vec2 {
        position.clamp(self.min(), self.max())
    }

    pub fn contains(&self, position: Vec2) -> bool {
        position.cmpge(self.min()).all() && position.cmple(self.max()).all()
    }

    /// Wrap a position around the padded area.
    pub fn wrap(&self, position: Vec2) -> Vec2 {
        let min = self.min();
        let size = (self.max() - min).max(Vec2::splat(f32::EPSILON));
        Vec2::new(
            min.x + (position.x - min.x).rem_euclid(size.x),
            min.y + (position.y - min.y).rem_euclid(size.y),
        )
    }
}
