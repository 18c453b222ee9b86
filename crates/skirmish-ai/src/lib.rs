//! Enemy AI for SKIRMISH.
//!
//! Implements condition evaluation, line-of-sight, movement patterns and
//! the behaviour state machine step. Pure functions over plain data, no
//! ECS dependency.

pub mod condition;
pub mod fsm;
pub mod los;
pub mod pattern;

pub use skirmish_core as core;
