//! Fixed-timestep accumulator.
//!
//! Frame time is accumulated and consumed in whole fixed steps, so the
//! simulation advances identically regardless of frame rate. When a frame
//! would need more than `max_steps` ticks the excess time is dropped.

use skirmish_core::constants::{DT, MAX_STEPS_PER_FRAME};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedTimestep {
    step: f32,
    accumulator: f32,
    max_steps: u32,
}

impl Default for FixedTimestep {
    fn default() -> Self {
        Self::new(DT, MAX_STEPS_PER_FRAME)
    }
}

impl FixedTimestep {
    pub fn new(step: f32, max_steps: u32) -> Self {
        Self {
            step: if step.is_finite() && step > 0.0 { step } else { DT },
            accumulator: 0.0,
            max_steps: max_steps.max(1),
        }
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    /// Add `frame_dt` seconds and return how many fixed ticks to run now.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        if frame_dt.is_finite() && frame_dt > 0.0 {
            self.accumulator += frame_dt;
        }
        let mut steps = 0;
        while self.accumulator >= self.step && steps < self.max_steps {
            self.accumulator -= self.step;
            steps += 1;
        }
        if steps == self.max_steps && self.accumulator >= self.step {
            // Spiral of death guard: drop the backlog.
            self.accumulator %= self.step;
        }
        steps
    }

    /// Fraction of a step left in the accumulator, for render interpolation.
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.step).clamp(0.0, 1.0)
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_partial_frames() {
        let mut timestep = FixedTimestep::new(0.1, 5);
        assert_eq!(timestep.advance(0.05), 0);
        assert_eq!(timestep.advance(0.06), 1);
        assert!(timestep.alpha() < 0.2);
    }

    #[test]
    fn caps_steps_and_drops_backlog() {
        let mut timestep = FixedTimestep::new(0.1, 3);
        assert_eq!(timestep.advance(10.0), 3);
        assert!(timestep.alpha() < 1.0);
        assert_eq!(timestep.advance(0.0), 0);
    }

    #[test]
    fn ignores_invalid_frame_times() {
        let mut timestep = FixedTimestep::default();
        assert_eq!(timestep.advance(f32::NAN), 0);
        assert_eq!(timestep.advance(-1.0), 0);
    }
}
