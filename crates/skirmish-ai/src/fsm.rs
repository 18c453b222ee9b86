//! Behaviour state machine step.
//!
//! Transitions leaving the current state are tried in declaration order; the
//! first whose condition holds fires. Transitions to undeclared states are
//! skipped.

use glam::Vec2;

use skirmish_core::components::{AiBrain, MovementPattern};
use skirmish_core::defs::{StateMachineDef, TransitionDef};

use crate::condition::{evaluate, needs_line_of_sight, AiContext};
use crate::pattern::instantiate;

/// Result of one state machine step.
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorUpdate {
    pub new_state: String,
    /// Fresh pattern for the new state, present only when the state changed.
    pub new_pattern: Option<MovementPattern>,
    pub changed: bool,
}

/// Find the first transition out of `current` whose condition holds.
pub fn select_transition<'a>(
    machine: &'a StateMachineDef,
    current: &str,
    ctx: &AiContext,
) -> Option<&'a TransitionDef> {
    machine
        .transitions
        .iter()
        .filter(|t| t.from == current && machine.state(&t.to).is_some())
        .find(|t| evaluate(&t.condition, ctx))
}

/// Evaluate the machine for one entity. `position` seeds the entered pattern.
pub fn evaluate_brain(
    machine: &StateMachineDef,
    brain: &AiBrain,
    ctx: &AiContext,
    position: Vec2,
) -> BehaviorUpdate {
    match select_transition(machine, &brain.state, ctx) {
        Some(transition) => BehaviorUpdate {
            new_state: transition.to.clone(),
            new_pattern: machine
                .state(&transition.to)
                .map(|state| instantiate(&state.pattern, position)),
            changed: true,
        },
        None => BehaviorUpdate {
            new_state: brain.state.clone(),
            new_pattern: None,
            changed: false,
        },
    }
}

/// Brain for a freshly spawned entity, in the machine's initial state.
/// Returns `None` if the initial state is not declared.
pub fn initial_brain(machine: &StateMachineDef, position: Vec2, now_ms: f64) -> Option<AiBrain> {
    let state = machine.state(&machine.initial)?;
    Some(AiBrain {
        state: state.name.clone(),
        pattern: instantiate(&state.pattern, position),
        entered_ms: now_ms,
    })
}

/// Whether any transition out of `state` reads line of sight.
pub fn state_needs_line_of_sight(machine: &StateMachineDef, state: &str) -> bool {
    machine
        .transitions_from(state)
        .any(|t| needs_line_of_sight(&t.condition))
}
