//! TOML room layouts compiled into world setup commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;
use tilewalk_core::{
    CellCoord, CellRect, CellRectSize, Command, Direction, PropKind, StepTiming, TriggerTarget,
};

/// Room description loaded from a TOML file.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub(crate) struct RoomLayout {
    /// Number of cell columns in the room.
    pub(crate) columns: u32,
    /// Number of cell rows in the room.
    pub(crate) rows: u32,
    /// Side length of a tile in window pixels.
    #[serde(default = "default_tile_length")]
    pub(crate) tile_length: f32,
    /// Characters spawned into the room, in identifier order.
    #[serde(default)]
    pub(crate) characters: Vec<CharacterEntry>,
    /// Props placed into the room.
    #[serde(default)]
    pub(crate) props: Vec<PropEntry>,
    /// Trigger zones registered in the room.
    #[serde(default)]
    pub(crate) zones: Vec<ZoneEntry>,
}

fn default_tile_length() -> f32 {
    48.0
}

/// Character spawn description within a layout.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub(crate) struct CharacterEntry {
    pub(crate) column: u32,
    pub(crate) row: u32,
    pub(crate) facing: Direction,
}

/// Prop description within a layout.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub(crate) struct PropEntry {
    pub(crate) kind: PropKind,
    pub(crate) column: u32,
    pub(crate) row: u32,
    /// Text shown when an interactive prop is used.
    #[serde(default)]
    pub(crate) text: Option<String>,
}

/// Zone description within a layout.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub(crate) struct ZoneEntry {
    pub(crate) column: u32,
    pub(crate) row: u32,
    pub(crate) width: u32,
    pub(crate) height: u32,
    /// Lifecycle target handle; omit to register an inert zone.
    #[serde(default)]
    pub(crate) target: Option<u32>,
}

/// Errors produced when a layout fails validation.
#[derive(Debug, Error, PartialEq)]
pub(crate) enum LayoutError {
    /// The layout declared a grid without any cells.
    #[error("layout grid must have at least one column and one row")]
    EmptyGrid,
    /// The layout spawned nobody to control.
    #[error("layout must spawn at least one character")]
    NoCharacters,
}

impl RoomLayout {
    /// Loads and validates a layout from the provided TOML file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read layout file {}", path.display()))?;
        let layout: Self = toml::from_str(&text)
            .with_context(|| format!("failed to parse layout file {}", path.display()))?;
        layout.validate()?;
        Ok(layout)
    }

    /// Built-in room used when no layout file is provided.
    pub(crate) fn demo() -> Self {
        Self {
            columns: 12,
            rows: 10,
            tile_length: 48.0,
            characters: vec![CharacterEntry {
                column: 2,
                row: 2,
                facing: Direction::South,
            }],
            props: vec![
                PropEntry {
                    kind: PropKind::Sign,
                    column: 4,
                    row: 2,
                    text: Some("The meadow path continues south.".to_owned()),
                },
                PropEntry {
                    kind: PropKind::Boulder,
                    column: 6,
                    row: 5,
                    text: None,
                },
                PropEntry {
                    kind: PropKind::Chest,
                    column: 9,
                    row: 7,
                    text: Some("The chest is empty.".to_owned()),
                },
            ],
            zones: vec![
                ZoneEntry {
                    column: 0,
                    row: 6,
                    width: 4,
                    height: 4,
                    target: Some(1),
                },
                ZoneEntry {
                    column: 8,
                    row: 0,
                    width: 4,
                    height: 3,
                    target: Some(2),
                },
            ],
        }
    }

    fn validate(&self) -> Result<(), LayoutError> {
        if self.columns == 0 || self.rows == 0 {
            return Err(LayoutError::EmptyGrid);
        }
        if self.characters.is_empty() {
            return Err(LayoutError::NoCharacters);
        }
        Ok(())
    }

    /// Compiles the layout into the command batch that builds the room.
    ///
    /// Zones and props register before characters so spawn-time zone
    /// occupancy and placement validation see the finished room.
    pub(crate) fn setup_commands(&self, timing: StepTiming) -> Vec<Command> {
        let mut commands = vec![
            Command::ConfigureGrid {
                columns: self.columns,
                rows: self.rows,
                tile_length: self.tile_length,
            },
            Command::ConfigureStepTiming { timing },
        ];

        for zone in &self.zones {
            commands.push(Command::AddZone {
                region: CellRect::from_origin_and_size(
                    CellCoord::new(zone.column, zone.row),
                    CellRectSize::new(zone.width, zone.height),
                ),
                target: zone.target.map(TriggerTarget::new),
            });
        }
        for prop in &self.props {
            commands.push(Command::PlaceProp {
                kind: prop.kind,
                cell: CellCoord::new(prop.column, prop.row),
            });
        }
        for character in &self.characters {
            commands.push(Command::SpawnCharacter {
                cell: CellCoord::new(character.column, character.row),
                facing: character.facing,
            });
        }

        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_layout_passes_validation() {
        assert_eq!(RoomLayout::demo().validate(), Ok(()));
    }

    #[test]
    fn layouts_without_characters_are_rejected() {
        let mut layout = RoomLayout::demo();
        layout.characters.clear();
        assert_eq!(layout.validate(), Err(LayoutError::NoCharacters));
    }

    #[test]
    fn toml_layout_round_trips_into_commands() {
        let layout: RoomLayout = toml::from_str(
            r#"
            columns = 6
            rows = 5

            [[characters]]
            column = 1
            row = 1
            facing = "East"

            [[props]]
            kind = "Sign"
            column = 3
            row = 1
            text = "Hello."

            [[zones]]
            column = 0
            row = 3
            width = 6
            height = 2
            target = 7
            "#,
        )
        .expect("layout parses");
        assert_eq!(layout.tile_length, 48.0, "tile length defaults");

        let commands = layout.setup_commands(StepTiming::default());
        assert!(matches!(
            commands[0],
            Command::ConfigureGrid {
                columns: 6,
                rows: 5,
                ..
            }
        ));
        assert!(matches!(commands[2], Command::AddZone { .. }));
        assert!(matches!(
            commands[3],
            Command::PlaceProp {
                kind: PropKind::Sign,
                ..
            }
        ));
        assert!(matches!(
            commands[4],
            Command::SpawnCharacter {
                facing: Direction::East,
                ..
            }
        ));
    }
}
