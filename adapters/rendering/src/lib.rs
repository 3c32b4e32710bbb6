#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Tilewalk adapters.

use std::f32::consts::{FRAC_PI_2, PI};
use std::time::Duration;

use anyhow::Result as AnyResult;
use glam::Vec2;
use thiserror::Error;
use tilewalk_core::{CellCoord, CellRect, CharacterId, CharacterSnapshot, Direction, PropKind};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns the same color with the provided alpha channel.
    #[must_use]
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            ..self
        }
    }
}

/// Describes the square cell grid that composes the play area.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileGridPresentation {
    /// Number of columns contained in the grid.
    pub columns: u32,
    /// Number of rows contained in the grid.
    pub rows: u32,
    /// Side length of a single tile expressed in world units.
    pub tile_length: f32,
    /// Color used when drawing grid lines.
    pub line_color: Color,
}

impl TileGridPresentation {
    /// Creates a new tile grid descriptor.
    ///
    /// Returns an error when `tile_length` is not positive.
    pub fn new(
        columns: u32,
        rows: u32,
        tile_length: f32,
        line_color: Color,
    ) -> Result<Self, RenderingError> {
        if tile_length <= 0.0 {
            return Err(RenderingError::InvalidTileLength { tile_length });
        }

        Ok(Self {
            columns,
            rows,
            tile_length,
            line_color,
        })
    }

    /// Calculates the total width of the grid.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.columns as f32 * self.tile_length
    }

    /// Calculates the total height of the grid.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.rows as f32 * self.tile_length
    }
}

/// Orientation applied when a facing sprite is drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteInstance {
    /// Clockwise rotation in radians, zero pointing north.
    pub rotation: f32,
}

impl SpriteInstance {
    /// Creates a sprite instance with the provided rotation.
    #[must_use]
    pub const fn new(rotation: f32) -> Self {
        Self { rotation }
    }
}

/// Four-entry lookup mapping a facing direction to its sprite.
///
/// A missing entry is a configuration problem, not a failure: the lookup
/// reports it once and the backend simply skips the facing marker for that
/// direction afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct FacingSprites {
    entries: [Option<SpriteInstance>; 4],
    warned: [bool; 4],
}

impl FacingSprites {
    /// Creates a lookup from explicit per-direction entries.
    #[must_use]
    pub const fn new(
        north: Option<SpriteInstance>,
        east: Option<SpriteInstance>,
        south: Option<SpriteInstance>,
        west: Option<SpriteInstance>,
    ) -> Self {
        Self {
            entries: [north, east, south, west],
            warned: [false; 4],
        }
    }

    /// Creates a complete lookup whose sprites rotate with the facing.
    #[must_use]
    pub const fn aligned() -> Self {
        Self::new(
            Some(SpriteInstance::new(0.0)),
            Some(SpriteInstance::new(FRAC_PI_2)),
            Some(SpriteInstance::new(PI)),
            Some(SpriteInstance::new(PI + FRAC_PI_2)),
        )
    }

    /// Resolves the sprite for the provided facing direction.
    ///
    /// Reports a configuration warning the first time an absent entry is
    /// consulted, then stays silent for that slot.
    pub fn sprite_for(&mut self, facing: Direction) -> Option<SpriteInstance> {
        let index = match facing {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        };
        let entry = self.entries[index];
        if entry.is_none() && !self.warned[index] {
            self.warned[index] = true;
            tracing::warn!(?facing, "no sprite configured for facing direction");
        }
        entry
    }
}

/// Computes a character's continuous position in cell units.
///
/// While a step is in flight the body interpolates between the origin and
/// the reserved destination; the logical occupancy already sits on the
/// destination, which is exactly why the two are presented separately.
#[must_use]
pub fn position_in_cells(snapshot: &CharacterSnapshot) -> Vec2 {
    let target = cell_to_vec(snapshot.cell);
    match snapshot.motion {
        None => target,
        Some(motion) => cell_to_vec(motion.from).lerp(target, motion.progress()),
    }
}

fn cell_to_vec(cell: CellCoord) -> Vec2 {
    Vec2::new(cell.column() as f32, cell.row() as f32)
}

/// In-game character rendered at a continuous cell-space position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CharacterPresentation {
    /// Identifier of the presented character.
    pub id: CharacterId,
    /// Continuous position expressed in cell units.
    pub position: Vec2,
    /// Direction the character is facing.
    pub facing: Direction,
    /// Fill color of the character's body.
    pub body: Color,
    /// Whether the sprint modifier is active, for the speed accent.
    pub sprinting: bool,
}

/// Prop rendered as a filled cell marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PropPresentation {
    /// Cell occupied by the prop.
    pub cell: CellCoord,
    /// Type of the prop, which selects its visual.
    pub kind: PropKind,
}

/// Trigger zone rendered as a tinted region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZonePresentation {
    /// Region of cells covered by the zone.
    pub region: CellRect,
    /// Whether a lifecycle target is attached; inert zones draw dimmer.
    pub has_target: bool,
}

/// Modal dialog drawn over the scene while input is suppressed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DialogPresentation {
    /// Text shown inside the dialog box.
    pub text: String,
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct FrameInput {
    /// Whether the up binding is held.
    pub up_held: bool,
    /// Whether the right binding is held.
    pub right_held: bool,
    /// Whether the down binding is held.
    pub down_held: bool,
    /// Whether the left binding is held.
    pub left_held: bool,
    /// Whether the sprint modifier is held.
    pub sprint_held: bool,
    /// Whether the interaction button is held.
    pub interact_held: bool,
}

/// Scene description combining the grid, zones, props, and characters.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Cell grid that composes the play area.
    pub tile_grid: TileGridPresentation,
    /// Trigger zones drawn underneath everything else.
    pub zones: Vec<ZonePresentation>,
    /// Props drawn on their cells.
    pub props: Vec<PropPresentation>,
    /// Characters drawn at continuous positions.
    pub characters: Vec<CharacterPresentation>,
    /// Facing-direction sprite lookup consulted by the backend.
    pub facing_sprites: FacingSprites,
    /// Modal dialog drawn over the scene, if one is open.
    pub dialog: Option<DialogPresentation>,
}

impl Scene {
    /// Creates a new scene descriptor.
    #[must_use]
    pub fn new(
        tile_grid: TileGridPresentation,
        zones: Vec<ZonePresentation>,
        props: Vec<PropPresentation>,
        characters: Vec<CharacterPresentation>,
        facing_sprites: FacingSprites,
        dialog: Option<DialogPresentation>,
    ) -> Self {
        Self {
            tile_grid,
            zones,
            props,
            characters,
            facing_sprites,
            dialog,
        }
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Tilewalk scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// per-frame input captured by the adapter, and may mutate the scene
    /// before it is rendered.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, Error, PartialEq)]
pub enum RenderingError {
    /// Tile length must be positive to avoid a degenerate grid.
    #[error("tile_length must be positive (received {tile_length})")]
    InvalidTileLength {
        /// Provided tile length that failed validation.
        tile_length: f32,
    },
}
