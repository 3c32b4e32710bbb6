#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tilewalk controller.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Tilewalk.";

/// Cardinal movement directions available to characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// Every direction in clockwise order starting from north.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Returns the cell one step away in this direction.
    ///
    /// Yields `None` when the step would leave the grid on the zero edge;
    /// the upper bounds are enforced by the world, which knows the grid size.
    #[must_use]
    pub fn step_from(self, cell: CellCoord) -> Option<CellCoord> {
        match self {
            Direction::North => cell
                .row()
                .checked_sub(1)
                .map(|row| CellCoord::new(cell.column(), row)),
            Direction::East => Some(CellCoord::new(cell.column() + 1, cell.row())),
            Direction::South => Some(CellCoord::new(cell.column(), cell.row() + 1)),
            Direction::West => cell
                .column()
                .checked_sub(1)
                .map(|column| CellCoord::new(column, cell.row())),
        }
    }
}

/// Ordered collection of currently-held directions.
///
/// The queue preserves press order and never holds duplicates; the most
/// recently pressed direction is the active one. Releasing a direction
/// removes it wherever it sits, so releasing the newest press reverts the
/// active direction to the older hold.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirectionQueue {
    held: Vec<Direction>,
}

impl DirectionQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a direction press, appending it unless it is already held.
    pub fn press(&mut self, direction: Direction) {
        if !self.held.contains(&direction) {
            self.held.push(direction);
        }
    }

    /// Records a direction release, removing the direction wherever it sits.
    pub fn release(&mut self, direction: Direction) {
        self.held.retain(|held| *held != direction);
    }

    /// Returns the most recently pressed direction still held, if any.
    #[must_use]
    pub fn active(&self) -> Option<Direction> {
        self.held.last().copied()
    }

    /// Number of directions currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.held.len()
    }

    /// Reports whether no direction is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// Drops every held direction, used when input is suppressed.
    pub fn clear(&mut self) {
        self.held.clear();
    }
}

/// Unique identifier assigned to a character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CharacterId(u32);

impl CharacterId {
    /// Creates a new character identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a prop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropId(u32);

impl PropId {
    /// Creates a new prop identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a trigger zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneId(u32);

impl ZoneId {
    /// Creates a new zone identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Handle routed to collaborators when a zone lifecycle event fires.
///
/// Zones without a trigger target are valid but inert; the world reports a
/// configuration warning for them instead of emitting lifecycle events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TriggerTarget(u32);

impl TriggerTarget {
    /// Creates a new trigger target handle with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }
}

/// Axis-aligned rectangle expressed in cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    origin: CellCoord,
    size: CellRectSize,
}

impl CellRect {
    /// Constructs a rectangle from an origin cell and size.
    #[must_use]
    pub const fn from_origin_and_size(origin: CellCoord, size: CellRectSize) -> Self {
        Self { origin, size }
    }

    /// Upper-left cell that anchors the rectangle.
    #[must_use]
    pub const fn origin(&self) -> CellCoord {
        self.origin
    }

    /// Dimensions of the rectangle measured in whole cells.
    #[must_use]
    pub const fn size(&self) -> CellRectSize {
        self.size
    }

    /// Reports whether the provided cell lies inside the rectangle.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        let column = cell.column();
        let row = cell.row();
        column >= self.origin.column()
            && row >= self.origin.row()
            && column < self.origin.column().saturating_add(self.size.width())
            && row < self.origin.row().saturating_add(self.size.height())
    }

    /// Reports whether two rectangles share at least one cell.
    #[must_use]
    pub const fn intersects(&self, other: &CellRect) -> bool {
        let self_right = self.origin.column().saturating_add(self.size.width());
        let self_bottom = self.origin.row().saturating_add(self.size.height());
        let other_right = other.origin.column().saturating_add(other.size.width());
        let other_bottom = other.origin.row().saturating_add(other.size.height());

        self.origin.column() < other_right
            && other.origin.column() < self_right
            && self.origin.row() < other_bottom
            && other.origin.row() < self_bottom
    }
}

/// Size of a [`CellRect`] measured in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRectSize {
    width: u32,
    height: u32,
}

impl CellRectSize {
    /// Creates a new size descriptor with explicit dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width of the rectangle in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the rectangle in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }
}

/// Types of props that can occupy a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropKind {
    /// Solid scenery with no interaction behavior.
    Boulder,
    /// Readable sign; interacting opens its text.
    Sign,
    /// Openable chest.
    Chest,
}

impl PropKind {
    /// Reports whether props of this kind respond to interaction.
    #[must_use]
    pub const fn is_interactive(self) -> bool {
        match self {
            Self::Boulder => false,
            Self::Sign | Self::Chest => true,
        }
    }
}

/// Step cadence configuration applied to every character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepTiming {
    step: Duration,
    sprint_step: Duration,
    pivot_buffer: Duration,
}

impl StepTiming {
    /// Creates a new timing configuration.
    #[must_use]
    pub const fn new(step: Duration, sprint_step: Duration, pivot_buffer: Duration) -> Self {
        Self {
            step,
            sprint_step,
            pivot_buffer,
        }
    }

    /// Seconds a normal step takes to cross one cell.
    #[must_use]
    pub const fn step(&self) -> Duration {
        self.step
    }

    /// Seconds a sprinting step takes to cross one cell.
    #[must_use]
    pub const fn sprint_step(&self) -> Duration {
        self.sprint_step
    }

    /// Grace period after a direction change before a step may commit.
    #[must_use]
    pub const fn pivot_buffer(&self) -> Duration {
        self.pivot_buffer
    }

    /// Selects the step duration for the provided sprint state.
    #[must_use]
    pub const fn step_for(&self, sprinting: bool) -> Duration {
        if sprinting {
            self.sprint_step
        } else {
            self.step
        }
    }
}

impl Default for StepTiming {
    fn default() -> Self {
        Self {
            step: Duration::from_millis(250),
            sprint_step: Duration::from_millis(125),
            pivot_buffer: Duration::from_millis(125),
        }
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Configures the world's tile grid using the provided dimensions.
    ConfigureGrid {
        /// Number of cell columns laid out in the grid.
        columns: u32,
        /// Number of cell rows laid out in the grid.
        rows: u32,
        /// Length of each square tile measured in world units.
        tile_length: f32,
    },
    /// Updates the step and pivot cadence applied to every character.
    ConfigureStepTiming {
        /// Timing values that replace the current configuration.
        timing: StepTiming,
    },
    /// Requests that a new character join the grid at the provided cell.
    SpawnCharacter {
        /// Cell the character should initially occupy.
        cell: CellCoord,
        /// Direction the character should initially face.
        facing: Direction,
    },
    /// Requests placement of a prop on the provided cell.
    PlaceProp {
        /// Type of prop to place.
        kind: PropKind,
        /// Cell the prop should occupy.
        cell: CellCoord,
    },
    /// Requests registration of a trigger zone covering the provided region.
    AddZone {
        /// Region of cells covered by the zone.
        region: CellRect,
        /// Lifecycle handler routed zone events, if one is attached.
        target: Option<TriggerTarget>,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Records that a directional input transitioned to held.
    PressDirection {
        /// Character whose input changed.
        character: CharacterId,
        /// Direction that became held.
        direction: Direction,
    },
    /// Records that a directional input transitioned to released.
    ReleaseDirection {
        /// Character whose input changed.
        character: CharacterId,
        /// Direction that was released.
        direction: Direction,
    },
    /// Latches a pending interaction from an edge-triggered press.
    QueueInteraction {
        /// Character that pressed the interaction input.
        character: CharacterId,
    },
    /// Updates whether the sprint modifier is held.
    SetSprint {
        /// Character whose sprint state changed.
        character: CharacterId,
        /// Whether the modifier is currently held.
        held: bool,
    },
    /// Enables or disables input processing for a character.
    SetInputSuppressed {
        /// Character whose input processing changed.
        character: CharacterId,
        /// Whether input should be suppressed.
        suppressed: bool,
    },
    /// Requests that a character commit a single step in a direction.
    Step {
        /// Character attempting to move.
        character: CharacterId,
        /// Direction of travel for the attempted step.
        direction: Direction,
    },
    /// Requests dispatch of the latched interaction to the prop ahead.
    Interact {
        /// Character attempting to interact.
        character: CharacterId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a character joined the grid.
    CharacterSpawned {
        /// Identifier assigned to the new character.
        character: CharacterId,
        /// Cell the character occupies after spawning.
        cell: CellCoord,
        /// Direction the character faces after spawning.
        facing: Direction,
    },
    /// Reports that a character spawn request was rejected.
    SpawnRejected {
        /// Cell provided in the spawn request.
        cell: CellCoord,
        /// Specific reason the spawn failed.
        reason: PlacementError,
    },
    /// Confirms that a prop was placed into the world.
    PropPlaced {
        /// Identifier assigned to the prop by the world.
        prop: PropId,
        /// Type of prop that was placed.
        kind: PropKind,
        /// Cell occupied by the prop.
        cell: CellCoord,
    },
    /// Reports that a prop placement request was rejected.
    PropRejected {
        /// Type of prop requested for placement.
        kind: PropKind,
        /// Cell provided in the placement request.
        cell: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a trigger zone was registered.
    ZoneAdded {
        /// Identifier assigned to the zone by the world.
        zone: ZoneId,
        /// Region of cells covered by the zone.
        region: CellRect,
    },
    /// Reports that a zone registration request was rejected.
    ZoneRejected {
        /// Region provided in the registration request.
        region: CellRect,
        /// Specific reason the registration failed.
        reason: PlacementError,
    },
    /// Announces that a character's facing direction changed.
    FacingChanged {
        /// Character that turned.
        character: CharacterId,
        /// Direction the character now faces.
        facing: Direction,
    },
    /// Confirms that a step was committed and the destination cell reserved.
    StepCommitted {
        /// Character that started moving.
        character: CharacterId,
        /// Cell the character is leaving.
        from: CellCoord,
        /// Cell reserved as the step destination.
        to: CellCoord,
        /// Direction of travel.
        direction: Direction,
    },
    /// Confirms that an in-flight step settled on its destination cell.
    StepCompleted {
        /// Character that finished moving.
        character: CharacterId,
        /// Cell the character now occupies.
        cell: CellCoord,
    },
    /// Reports that a step request was rejected.
    StepRejected {
        /// Character that attempted to move.
        character: CharacterId,
        /// Direction of the attempted step.
        direction: Direction,
        /// Specific reason the step failed.
        reason: StepError,
    },
    /// Reports that a settled character entered a trigger zone.
    ZoneEntered {
        /// Character that entered the zone.
        character: CharacterId,
        /// Zone that was entered.
        zone: ZoneId,
        /// Lifecycle handler attached to the zone.
        target: TriggerTarget,
    },
    /// Reports that a settled character left a trigger zone.
    ZoneExited {
        /// Character that left the zone.
        character: CharacterId,
        /// Zone that was left.
        zone: ZoneId,
        /// Lifecycle handler attached to the zone.
        target: TriggerTarget,
    },
    /// Reports that a settled character remained inside a trigger zone.
    ZoneStayed {
        /// Character that stayed in the zone.
        character: CharacterId,
        /// Zone the character remains inside.
        zone: ZoneId,
        /// Lifecycle handler attached to the zone.
        target: TriggerTarget,
    },
    /// Confirms that a latched interaction reached an interactive prop.
    PropInteracted {
        /// Character that interacted.
        character: CharacterId,
        /// Prop that received the interaction.
        prop: PropId,
        /// Type of the prop that received the interaction.
        kind: PropKind,
    },
    /// Announces that input suppression toggled for a character.
    InputSuppressionChanged {
        /// Character whose input processing changed.
        character: CharacterId,
        /// Whether input is now suppressed.
        suppressed: bool,
    },
    /// Publishes a refreshed travel report from the analytics system.
    AnalyticsUpdated {
        /// Counters accumulated since the world was created.
        report: TravelReport,
    },
}

/// Reasons a spawn, prop, or zone request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The requested cell or region extends beyond the configured grid.
    OutOfBounds,
    /// The requested cell is already occupied by a character or prop.
    Occupied,
    /// The requested region overlaps an existing zone.
    Overlapping,
}

/// Reasons a step request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepError {
    /// The character referenced by the request does not exist.
    UnknownCharacter,
    /// The character is mid-flight and cannot commit another step.
    NotSettled,
    /// The destination lies outside the configured grid.
    OutOfBounds,
    /// A solid prop occupies the destination cell.
    Obstructed,
    /// Another character occupies or has reserved the destination cell.
    Occupied,
}

/// Solid occupant of the cell directly ahead of a character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Obstruction {
    /// The cell ahead lies beyond the grid perimeter.
    Edge,
    /// A prop occupies the cell ahead.
    Prop {
        /// Identifier of the blocking prop.
        prop: PropId,
        /// Type of the blocking prop.
        kind: PropKind,
    },
    /// Another character occupies or has reserved the cell ahead.
    Character(CharacterId),
}

/// Counters accumulated by the analytics system.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TravelReport {
    /// Steps that reserved a destination cell.
    pub steps_committed: u64,
    /// Steps that settled on their destination cell.
    pub steps_completed: u64,
    /// Step requests the world rejected.
    pub steps_rejected: u64,
    /// Interactions dispatched to props.
    pub interactions: u64,
    /// Zone enter events fired.
    pub zone_entries: u64,
    /// Zone exit events fired.
    pub zone_exits: u64,
}

/// Immutable representation of an in-flight step used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MotionSnapshot {
    /// Cell the character is moving away from.
    pub from: CellCoord,
    /// Time accumulated toward the step so far.
    pub elapsed: Duration,
    /// Total duration locked in for this step when it was committed.
    pub step_time: Duration,
}

impl MotionSnapshot {
    /// Fraction of the step already travelled, in the range `0.0..=1.0`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.step_time.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / self.step_time.as_secs_f32()).clamp(0.0, 1.0)
    }
}

/// Immutable representation of a single character's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharacterSnapshot {
    /// Unique identifier assigned to the character.
    pub id: CharacterId,
    /// Reserved cell; equals the standing cell while settled.
    pub cell: CellCoord,
    /// Direction the character is facing.
    pub facing: Direction,
    /// In-flight step, if one is underway.
    pub motion: Option<MotionSnapshot>,
    /// Most recently pressed direction still held, if any.
    pub active_direction: Option<Direction>,
    /// Indicates whether the pivot gate permits committing a step.
    pub ready_to_step: bool,
    /// Indicates whether an interaction press is latched.
    pub interaction_queued: bool,
    /// Indicates whether the sprint modifier is held.
    pub sprinting: bool,
}

impl CharacterSnapshot {
    /// Reports whether the character is settled on its cell.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        self.motion.is_none()
    }
}

/// Read-only snapshot describing all characters on the grid.
#[derive(Clone, Debug, Default)]
pub struct CharacterView {
    snapshots: Vec<CharacterSnapshot>,
}

impl CharacterView {
    /// Creates a new character view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<CharacterSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &CharacterSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot captured for the provided character.
    #[must_use]
    pub fn get(&self, character: CharacterId) -> Option<&CharacterSnapshot> {
        self.snapshots
            .iter()
            .find(|snapshot| snapshot.id == character)
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<CharacterSnapshot> {
        self.snapshots
    }
}

/// Read-only view into the dense occupancy grid.
///
/// A cell holds the identifier of the character standing on it or moving
/// into it; reservations are indistinguishable from settled occupancy on
/// purpose, so probes treat a destination as taken before arrival.
#[derive(Clone, Copy, Debug)]
pub struct OccupancyView<'a> {
    cells: &'a [Option<CharacterId>],
    columns: u32,
    rows: u32,
}

impl<'a> OccupancyView<'a> {
    /// Captures a new occupancy view backed by the provided cell slice.
    #[must_use]
    pub fn new(cells: &'a [Option<CharacterId>], columns: u32, rows: u32) -> Self {
        Self {
            cells,
            columns,
            rows,
        }
    }

    /// Returns the character occupying or reserving the provided cell.
    #[must_use]
    pub fn occupant(&self, cell: CellCoord) -> Option<CharacterId> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    /// Reports whether the cell is currently free for traversal.
    #[must_use]
    pub fn is_free(&self, cell: CellCoord) -> bool {
        self.index(cell).map_or(true, |index| {
            self.cells.get(index).copied().unwrap_or(None).is_none()
        })
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn in_bounds(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Provides the dimensions of the underlying occupancy grid.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}
