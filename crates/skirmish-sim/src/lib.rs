//! Simulation runtime for SKIRMISH.
//!
//! Owns the entity/component/system framework, runs systems at a fixed tick
//! rate, and produces render snapshots for the frontend.

pub mod config;
pub mod ecs;
pub mod enemy_manager;
pub mod engine;
pub mod persistence;
pub mod scheduler;
pub mod systems;
pub mod world_setup;

pub use config::{ConfigError, GameConfig};
pub use engine::Session;
pub use skirmish_core as core;

#[cfg(test)]
mod tests;
