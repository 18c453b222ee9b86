//! Concrete systems, in the order a session registers them:
//! controller, collision, AI, combat, projectiles, health, wave spawning.
//!
//! Each system keeps only its own configuration and membership; all entity
//! state lives in components.

pub mod ai_behavior;
pub mod character_controller;
pub mod collision;
pub mod combat;
pub mod snapshot;
pub mod wave_spawn;
