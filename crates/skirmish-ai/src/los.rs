//! Line-of-sight against circular occluders.

use glam::Vec2;

/// A circle that blocks vision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Occluder {
    pub center: Vec2,
    pub radius: f32,
}

/// Returns true if the segment `from -> to` does not pass through any occluder.
///
/// Occluders containing either endpoint are ignored so an entity standing
/// against (or inside) a wall can still see out.
pub fn has_line_of_sight(from: Vec2, to: Vec2, occluders: &[Occluder]) -> bool {
    occluders.iter().all(|o| !blocks(o, from, to))
}

fn blocks(occluder: &Occluder, from: Vec2, to: Vec2) -> bool {
    let r_sq = occluder.radius * occluder.radius;
    if from.distance_squared(occluder.center) <= r_sq || to.distance_squared(occluder.center) <= r_sq {
        return false;
    }
    distance_sq_to_segment(occluder.center, from, to) < r_sq
}

/// Squared distance from `point` to the segment `a -> b`.
pub fn distance_sq_to_segment(point: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return point.distance_squared(a);
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    point.distance_squared(a + ab * t)
}
