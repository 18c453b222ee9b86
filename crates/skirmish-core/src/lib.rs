//! Core types and definitions for the SKIRMISH simulation.
//!
//! This crate defines the vocabulary shared across all other crates:
//! components, enemy and wave definitions, input and game events,
//! render snapshots, persistence records, and constants.
//! It has no dependency on the ECS runtime.

pub mod components;
pub mod constants;
pub mod defs;
pub mod events;
pub mod input;
pub mod records;
pub mod state;
pub mod types;
