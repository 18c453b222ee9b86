//! Input events pushed by the device layer.
//!
//! Events may arrive at any real-time instant between fixed ticks; they are
//! queued and drained at the next tick boundary.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::constants::INPUT_DEADZONE;
use crate::types::clamp_axis;

/// Analog axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisAction {
    Move,
    Aim,
}

/// Digital buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ButtonAction {
    Fire,
}

/// One axis reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisValue {
    /// Raw device value.
    pub value: Vec2,
    /// Unit direction, or zero.
    pub normalized: Vec2,
    /// Magnitude in `[0, 1]`.
    pub magnitude: f32,
}

impl AxisValue {
    /// Sticks resting inside the deadzone read as released.
    pub fn from_raw(value: Vec2) -> Self {
        let clamped = clamp_axis(value);
        if clamped.length() < INPUT_DEADZONE {
            return Self {
                value,
                normalized: Vec2::ZERO,
                magnitude: 0.0,
            };
        }
        Self {
            value,
            normalized: clamped.normalize_or_zero(),
            magnitude: clamped.length(),
        }
    }

    /// Direction scaled by magnitude, `|v| <= 1`.
    pub fn intent(&self) -> Vec2 {
        clamp_axis(self.normalized * self.magnitude.clamp(0.0, 1.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InputEvent {
    AxisChanged { action: AxisAction, value: AxisValue },
    ActionStarted { action: ButtonAction },
    ActionEnded { action: ButtonAction },
}

impl InputEvent {
    pub fn movement(direction: Vec2) -> Self {
        InputEvent::AxisChanged {
            action: AxisAction::Move,
            value: AxisValue::from_raw(direction),
        }
    }

    pub fn aim(direction: Vec2) -> Self {
        InputEvent::AxisChanged {
            action: AxisAction::Aim,
            value: AxisValue::from_raw(direction),
        }
    }
}
