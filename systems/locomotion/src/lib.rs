#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Input-driven locomotion system that arbitrates steps and interactions.
//!
//! The system is pure: it consumes world events and immutable views, probes
//! the cell each settled character faces through an injected closure, and
//! emits step or interaction commands for the world to validate. All timing
//! state (pivot buffer, in-flight motion) lives in the world; the system only
//! reads the decision-ready snapshot fields.

use tilewalk_core::{CellCoord, CharacterView, Command, Event, Obstruction};

/// Pure system that reacts to ticks and emits movement commands.
#[derive(Debug, Default)]
pub struct Locomotion;

impl Locomotion {
    /// Creates a new locomotion system.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Consumes world events and immutable views to emit commands.
    ///
    /// Decisions are made once per observed tick, for every settled
    /// character, in identifier order. A latched interaction together with
    /// any obstruction ahead dispatches the interaction and forfeits the
    /// step; a character facing a wall never tries to walk into it.
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        characters: &CharacterView,
        probe: F,
        out: &mut Vec<Command>,
    ) where
        F: Fn(CellCoord) -> Option<Obstruction>,
    {
        if !events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }))
        {
            return;
        }

        for snapshot in characters.iter() {
            if !snapshot.is_settled() {
                continue;
            }

            // A facing step off the zero edge has no cell to probe; treat it
            // as the perimeter, which is as solid as any wall.
            let obstruction = match snapshot.facing.step_from(snapshot.cell) {
                Some(ahead) => probe(ahead),
                None => Some(Obstruction::Edge),
            };

            if snapshot.interaction_queued && obstruction.is_some() {
                out.push(Command::Interact {
                    character: snapshot.id,
                });
                continue;
            }

            // Commit only once the world has turned the character toward the
            // active hold; a direction change observed after a flight settles
            // must first pass through a turn tick and a fresh pivot wait.
            let holding_forward = snapshot.active_direction == Some(snapshot.facing);
            if holding_forward && obstruction.is_none() && snapshot.ready_to_step {
                out.push(Command::Step {
                    character: snapshot.id,
                    direction: snapshot.facing,
                });
            }
        }
    }
}
