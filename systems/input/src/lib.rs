#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Translation from level-sampled input frames to edge-triggered commands.
//!
//! Adapters poll their input devices once per frame and hand the resulting
//! [`InputSample`] to an [`InputTranslator`], which compares it against the
//! previous frame and emits press/release commands for the world. Keeping the
//! edge detection here, outside any window code, makes the input protocol
//! testable the same way every other system is.

use tilewalk_core::{CharacterId, Command, Direction, Event};

/// Level state of every bound input, captured once per frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputSample {
    /// Whether the up binding is held.
    pub north: bool,
    /// Whether the right binding is held.
    pub east: bool,
    /// Whether the down binding is held.
    pub south: bool,
    /// Whether the left binding is held.
    pub west: bool,
    /// Whether the sprint modifier is held.
    pub sprint: bool,
    /// Whether the interaction button is held.
    pub interact: bool,
}

impl InputSample {
    /// Reports whether the binding for the provided direction is held.
    #[must_use]
    pub const fn direction_held(&self, direction: Direction) -> bool {
        match direction {
            Direction::North => self.north,
            Direction::East => self.east,
            Direction::South => self.south,
            Direction::West => self.west,
        }
    }
}

/// Stateful translator that turns input samples into world commands.
#[derive(Debug)]
pub struct InputTranslator {
    character: CharacterId,
    previous: InputSample,
    skip_frame: bool,
}

impl InputTranslator {
    /// Creates a translator feeding input to the provided character.
    #[must_use]
    pub fn new(character: CharacterId) -> Self {
        Self {
            character,
            previous: InputSample::default(),
            skip_frame: false,
        }
    }

    /// Consumes the previous frame's events and the current sample, emitting
    /// edge-triggered commands.
    ///
    /// When input suppression is lifted the translator drops one full frame
    /// and resets its edge baseline: direction keys still physically held
    /// re-register as fresh presses on the following frame, while an
    /// interaction button that never came up is treated as the same stale
    /// press and stays consumed until it is released and pressed again.
    pub fn handle(&mut self, events: &[Event], sample: InputSample, out: &mut Vec<Command>) {
        for event in events {
            if let Event::InputSuppressionChanged {
                character,
                suppressed: false,
            } = event
            {
                if *character == self.character {
                    self.skip_frame = true;
                }
            }
        }

        if self.skip_frame {
            self.skip_frame = false;
            self.previous = InputSample {
                interact: sample.interact,
                ..InputSample::default()
            };
            return;
        }

        for direction in Direction::ALL {
            let was_held = self.previous.direction_held(direction);
            let is_held = sample.direction_held(direction);
            if is_held && !was_held {
                out.push(Command::PressDirection {
                    character: self.character,
                    direction,
                });
            } else if was_held && !is_held {
                out.push(Command::ReleaseDirection {
                    character: self.character,
                    direction,
                });
            }
        }

        if sample.interact && !self.previous.interact {
            out.push(Command::QueueInteraction {
                character: self.character,
            });
        }

        if sample.sprint != self.previous.sprint {
            out.push(Command::SetSprint {
                character: self.character,
                held: sample.sprint,
            });
        }

        self.previous = sample;
    }
}
