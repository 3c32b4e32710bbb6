#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Tilewalk.
//!
//! The world owns the character arena, the dense occupancy grid that doubles
//! as the cell reservation marker, and the prop and zone registries. All
//! mutation flows through [`apply`]; all observation flows through [`query`].
//! Committing a step moves the occupancy marker to the destination cell
//! immediately, so every other character's probe treats the cell as taken for
//! the whole flight.

mod props;
mod triggers;

use std::time::Duration;

use tilewalk_core::{
    CellCoord, CharacterId, Command, Direction, DirectionQueue, Event, PlacementError, StepError,
    StepTiming, WELCOME_BANNER,
};

use crate::props::PropRegistry;
use crate::triggers::{ZoneRegistry, ZoneTracker};

const DEFAULT_GRID_COLUMNS: u32 = 12;
const DEFAULT_GRID_ROWS: u32 = 10;
const DEFAULT_TILE_LENGTH: f32 = 48.0;

/// Describes the discrete cell layout of the playable area.
#[derive(Debug)]
pub struct TileGrid {
    columns: u32,
    rows: u32,
    tile_length: f32,
}

impl TileGrid {
    pub(crate) const fn new(columns: u32, rows: u32, tile_length: f32) -> Self {
        Self {
            columns,
            rows,
            tile_length,
        }
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Side length of a single square tile expressed in world units.
    #[must_use]
    pub const fn tile_length(&self) -> f32 {
        self.tile_length
    }

    /// Total width of the grid measured in world units.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.columns as f32 * self.tile_length
    }

    /// Total height of the grid measured in world units.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.rows as f32 * self.tile_length
    }
}

/// Represents the authoritative Tilewalk world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    grid: TileGrid,
    timing: StepTiming,
    characters: Vec<Character>,
    next_character_id: u32,
    occupancy: OccupancyGrid,
    props: PropRegistry,
    zones: ZoneRegistry,
    tick_index: u64,
}

impl World {
    /// Creates a new Tilewalk world ready for simulation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            banner: WELCOME_BANNER,
            grid: TileGrid::new(DEFAULT_GRID_COLUMNS, DEFAULT_GRID_ROWS, DEFAULT_TILE_LENGTH),
            timing: StepTiming::default(),
            characters: Vec::new(),
            next_character_id: 0,
            occupancy: OccupancyGrid::new(DEFAULT_GRID_COLUMNS, DEFAULT_GRID_ROWS),
            props: PropRegistry::new(),
            zones: ZoneRegistry::new(),
            tick_index: 0,
        }
    }

    fn character_index(&self, character: CharacterId) -> Option<usize> {
        self.characters.iter().position(|entry| entry.id == character)
    }

    fn character_mut(&mut self, character: CharacterId) -> Option<&mut Character> {
        self.characters.iter_mut().find(|entry| entry.id == character)
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureGrid {
            columns,
            rows,
            tile_length,
        } => {
            world.grid = TileGrid::new(columns, rows, tile_length);
            world.occupancy = OccupancyGrid::new(columns, rows);
            world.characters.clear();
            world.next_character_id = 0;
            world.props.clear();
            world.zones.clear();
        }
        Command::ConfigureStepTiming { timing } => {
            world.timing = timing;
        }
        Command::SpawnCharacter { cell, facing } => {
            spawn_character(world, cell, facing, out_events);
        }
        Command::PlaceProp { kind, cell } => {
            if !in_bounds(cell, &world.grid) {
                out_events.push(Event::PropRejected {
                    kind,
                    cell,
                    reason: PlacementError::OutOfBounds,
                });
            } else if world.props.prop_at(cell).is_some() || !world.occupancy.can_enter(cell) {
                out_events.push(Event::PropRejected {
                    kind,
                    cell,
                    reason: PlacementError::Occupied,
                });
            } else {
                let prop = world.props.register(kind, cell);
                out_events.push(Event::PropPlaced { prop, kind, cell });
            }
        }
        Command::AddZone { region, target } => {
            if !region_in_bounds(region, &world.grid) {
                out_events.push(Event::ZoneRejected {
                    region,
                    reason: PlacementError::OutOfBounds,
                });
            } else {
                match world.zones.register(region, target) {
                    Ok(zone) => out_events.push(Event::ZoneAdded { zone, region }),
                    Err(reason) => out_events.push(Event::ZoneRejected { region, reason }),
                }
            }
        }
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });

            for character in world.characters.iter_mut() {
                advance_character(character, &mut world.zones, dt, out_events);
            }
        }
        Command::PressDirection {
            character,
            direction,
        } => {
            if let Some(entry) = world.character_mut(character) {
                if !entry.input_blocked() {
                    entry.queue.press(direction);
                }
            }
        }
        Command::ReleaseDirection {
            character,
            direction,
        } => {
            if let Some(entry) = world.character_mut(character) {
                if !entry.input_blocked() {
                    entry.queue.release(direction);
                }
            }
        }
        Command::QueueInteraction { character } => {
            if let Some(entry) = world.character_mut(character) {
                if !entry.input_blocked() {
                    entry.interaction_queued = true;
                }
            }
        }
        Command::SetSprint { character, held } => {
            if let Some(entry) = world.character_mut(character) {
                entry.sprinting = held;
            }
        }
        Command::SetInputSuppressed {
            character,
            suppressed,
        } => {
            if let Some(entry) = world.character_mut(character) {
                if entry.suppressed != suppressed {
                    entry.suppressed = suppressed;
                    if suppressed {
                        entry.queue.clear();
                        entry.interaction_queued = false;
                    } else {
                        entry.guard_ticks = 1;
                    }
                    out_events.push(Event::InputSuppressionChanged {
                        character,
                        suppressed,
                    });
                }
            }
        }
        Command::Step {
            character,
            direction,
        } => {
            resolve_step(world, character, direction, out_events);
        }
        Command::Interact { character } => {
            resolve_interaction(world, character, out_events);
        }
    }
}

fn spawn_character(
    world: &mut World,
    cell: CellCoord,
    facing: Direction,
    out_events: &mut Vec<Event>,
) {
    if !in_bounds(cell, &world.grid) {
        out_events.push(Event::SpawnRejected {
            cell,
            reason: PlacementError::OutOfBounds,
        });
        return;
    }
    if !world.occupancy.can_enter(cell) || world.props.prop_at(cell).is_some() {
        out_events.push(Event::SpawnRejected {
            cell,
            reason: PlacementError::Occupied,
        });
        return;
    }

    let id = CharacterId::new(world.next_character_id);
    world.next_character_id = world.next_character_id.wrapping_add(1);
    world.characters.push(Character {
        id,
        cell,
        facing,
        queue: DirectionQueue::new(),
        motion: None,
        pivot: Duration::ZERO,
        interaction_queued: false,
        sprinting: false,
        suppressed: false,
        guard_ticks: 0,
        tracker: ZoneTracker::starting_inside(world.zones.zone_at(cell)),
    });
    world.occupancy.occupy(id, cell);
    out_events.push(Event::CharacterSpawned {
        character: id,
        cell,
        facing,
    });
}

/// Advances one character through a single tick.
///
/// In-flight motion accrues time first; the settled bookkeeping (facing from
/// the queue, pivot accumulation, idle resets) runs only while no motion is
/// underway, so a step committed this frame starts accruing on the next tick.
fn advance_character(
    character: &mut Character,
    zones: &mut ZoneRegistry,
    dt: Duration,
    out_events: &mut Vec<Event>,
) {
    if let Some(motion) = character.motion.as_mut() {
        motion.elapsed = motion.elapsed.saturating_add(dt).min(motion.step_time);
        let arrived = motion.elapsed == motion.step_time;
        // The body crosses the cell boundary at the midpoint of the flight;
        // overlap samples are buffered, never acted on here.
        let dominant = if motion.elapsed.saturating_mul(2) >= motion.step_time {
            character.cell
        } else {
            motion.from
        };
        character.tracker.observe(zones.zone_at(dominant));

        if arrived {
            character.motion = None;
            out_events.push(Event::StepCompleted {
                character: character.id,
                cell: character.cell,
            });
            triggers::reconcile(&mut character.tracker, zones, character.id, out_events);
        }
    } else {
        if character.queue.is_empty() {
            // Idle without input re-arms the pivot gate for the next press.
            character.pivot = Duration::ZERO;
        } else if let Some(desired) = character.queue.active() {
            if desired != character.facing {
                character.facing = desired;
                character.pivot = Duration::ZERO;
                out_events.push(Event::FacingChanged {
                    character: character.id,
                    facing: desired,
                });
            } else {
                character.pivot = character.pivot.saturating_add(dt);
            }
        }
        character.tracker.observe(zones.zone_at(character.cell));
    }

    if character.guard_ticks > 0 {
        character.guard_ticks -= 1;
    }
}

fn resolve_step(
    world: &mut World,
    character: CharacterId,
    direction: Direction,
    out_events: &mut Vec<Event>,
) {
    let reject = |reason: StepError, out_events: &mut Vec<Event>| {
        out_events.push(Event::StepRejected {
            character,
            direction,
            reason,
        });
    };

    let Some(index) = world.character_index(character) else {
        reject(StepError::UnknownCharacter, out_events);
        return;
    };
    if world.characters[index].motion.is_some() {
        reject(StepError::NotSettled, out_events);
        return;
    }

    let from = world.characters[index].cell;
    let destination = match direction.step_from(from) {
        Some(cell) if in_bounds(cell, &world.grid) => cell,
        _ => {
            reject(StepError::OutOfBounds, out_events);
            return;
        }
    };
    if world.props.prop_at(destination).is_some() {
        reject(StepError::Obstructed, out_events);
        return;
    }
    if !world.occupancy.can_enter(destination) {
        reject(StepError::Occupied, out_events);
        return;
    }

    // Reserve the destination before any interpolation happens: the marker
    // jumps ahead of the body so concurrent probes already see it taken.
    let step_time = world.timing.step_for(world.characters[index].sprinting);
    let entry = &mut world.characters[index];
    if entry.facing != direction {
        entry.facing = direction;
        out_events.push(Event::FacingChanged {
            character,
            facing: direction,
        });
    }
    entry.motion = Some(Motion {
        from,
        elapsed: Duration::ZERO,
        step_time,
    });
    entry.cell = destination;
    world.occupancy.vacate(from);
    world.occupancy.occupy(character, destination);
    out_events.push(Event::StepCommitted {
        character,
        from,
        to: destination,
        direction,
    });
}

fn resolve_interaction(world: &mut World, character: CharacterId, out_events: &mut Vec<Event>) {
    let Some(index) = world.character_index(character) else {
        return;
    };
    let entry = &world.characters[index];
    if entry.motion.is_some() {
        return;
    }
    let Some(ahead) = entry.facing.step_from(entry.cell) else {
        return;
    };

    // A solid but inert obstruction leaves the latch set so the press may be
    // consumed later, once an interactive prop is the thing being faced.
    if let Some((prop, kind)) = world.props.dispatch_at(ahead) {
        world.characters[index].interaction_queued = false;
        out_events.push(Event::PropInteracted {
            character,
            prop,
            kind,
        });
    }
}

fn in_bounds(cell: CellCoord, grid: &TileGrid) -> bool {
    cell.column() < grid.columns() && cell.row() < grid.rows()
}

fn region_in_bounds(region: tilewalk_core::CellRect, grid: &TileGrid) -> bool {
    let size = region.size();
    if size.width() == 0 || size.height() == 0 {
        return false;
    }
    let origin = region.origin();
    origin.column().saturating_add(size.width()) <= grid.columns()
        && origin.row().saturating_add(size.height()) <= grid.rows()
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use tilewalk_core::{
        CellCoord, CellRect, CharacterSnapshot, CharacterView, MotionSnapshot, Obstruction,
        OccupancyView, PropId, PropKind, StepTiming, ZoneId,
    };

    use super::{TileGrid, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the world's tile grid definition.
    #[must_use]
    pub fn tile_grid(world: &World) -> &TileGrid {
        &world.grid
    }

    /// Retrieves the step cadence currently applied to new commits.
    #[must_use]
    pub fn step_timing(world: &World) -> StepTiming {
        world.timing
    }

    /// Number of ticks the world has processed since creation.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Captures a read-only view of the characters on the grid.
    #[must_use]
    pub fn character_view(world: &World) -> CharacterView {
        let snapshots = world
            .characters
            .iter()
            .map(|entry| CharacterSnapshot {
                id: entry.id,
                cell: entry.cell,
                facing: entry.facing,
                motion: entry.motion.map(|motion| MotionSnapshot {
                    from: motion.from,
                    elapsed: motion.elapsed,
                    step_time: motion.step_time,
                }),
                active_direction: entry.queue.active(),
                ready_to_step: entry.pivot >= world.timing.pivot_buffer(),
                interaction_queued: entry.interaction_queued,
                sprinting: entry.sprinting,
            })
            .collect();
        CharacterView::from_snapshots(snapshots)
    }

    /// Exposes a read-only view of the dense occupancy grid.
    #[must_use]
    pub fn occupancy_view(world: &World) -> OccupancyView<'_> {
        let (columns, rows) = world.occupancy.dimensions();
        OccupancyView::new(world.occupancy.cells(), columns, rows)
    }

    /// Builds the obstacle probe used by the locomotion system.
    ///
    /// Probing any cell reports the solid occupant a step into it would
    /// collide with: the grid perimeter, a prop, or another character's
    /// occupied or reserved cell.
    #[must_use]
    pub fn obstruction_probe(world: &World) -> impl Fn(CellCoord) -> Option<Obstruction> + '_ {
        let (columns, rows) = world.occupancy.dimensions();
        move |cell| {
            if cell.column() >= columns || cell.row() >= rows {
                return Some(Obstruction::Edge);
            }
            if let Some(prop) = world.props.prop_at(cell) {
                return Some(Obstruction::Prop {
                    prop: prop.id,
                    kind: prop.kind,
                });
            }
            world.occupancy.occupant(cell).map(Obstruction::Character)
        }
    }

    /// Immutable representation of a single prop used for presentation.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct PropSnapshot {
        /// Identifier allocated to the prop by the world.
        pub id: PropId,
        /// Type of the prop.
        pub kind: PropKind,
        /// Cell occupied by the prop.
        pub cell: CellCoord,
    }

    /// Enumerates the props currently placed in the world.
    #[must_use]
    pub fn prop_view(world: &World) -> Vec<PropSnapshot> {
        world
            .props
            .iter()
            .map(|prop| PropSnapshot {
                id: prop.id,
                kind: prop.kind,
                cell: prop.cell,
            })
            .collect()
    }

    /// Immutable representation of a single zone used for presentation.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ZoneSnapshot {
        /// Identifier allocated to the zone by the world.
        pub id: ZoneId,
        /// Region of cells covered by the zone.
        pub region: CellRect,
        /// Indicates whether a lifecycle target is attached.
        pub has_target: bool,
    }

    /// Enumerates the zones currently registered in the world.
    #[must_use]
    pub fn zone_view(world: &World) -> Vec<ZoneSnapshot> {
        world
            .zones
            .iter()
            .map(|zone| ZoneSnapshot {
                id: zone.id,
                region: zone.region,
                has_target: zone.target.is_some(),
            })
            .collect()
    }
}

#[derive(Debug)]
struct Character {
    id: CharacterId,
    /// Reserved cell; equals the standing cell while settled.
    cell: CellCoord,
    facing: Direction,
    queue: DirectionQueue,
    motion: Option<Motion>,
    pivot: Duration,
    interaction_queued: bool,
    sprinting: bool,
    suppressed: bool,
    guard_ticks: u8,
    tracker: ZoneTracker,
}

impl Character {
    fn input_blocked(&self) -> bool {
        self.suppressed || self.guard_ticks > 0
    }
}

#[derive(Clone, Copy, Debug)]
struct Motion {
    from: CellCoord,
    elapsed: Duration,
    /// Locked at commit time; sprint toggles never alter a flight underway.
    step_time: Duration,
}

#[derive(Clone, Debug)]
struct OccupancyGrid {
    columns: u32,
    rows: u32,
    cells: Vec<Option<CharacterId>>,
}

impl OccupancyGrid {
    fn new(columns: u32, rows: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            cells: vec![None; capacity],
        }
    }

    fn can_enter(&self, cell: CellCoord) -> bool {
        self.index(cell).map_or(true, |index| {
            self.cells.get(index).copied().unwrap_or(None).is_none()
        })
    }

    fn occupant(&self, cell: CellCoord) -> Option<CharacterId> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    fn occupy(&mut self, character: CharacterId, cell: CellCoord) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = Some(character);
            }
        }
    }

    fn vacate(&mut self, cell: CellCoord) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = None;
            }
        }
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

    fn cells(&self) -> &[Option<CharacterId>] {
        &self.cells
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilewalk_core::{CellRect, CellRectSize, PropKind, TriggerTarget};

    const TICK: Duration = Duration::from_millis(125);

    fn configured_world(columns: u32, rows: u32) -> World {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureGrid {
                columns,
                rows,
                tile_length: 1.0,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::ConfigureStepTiming {
                timing: StepTiming::new(
                    Duration::from_millis(250),
                    Duration::from_millis(125),
                    Duration::from_millis(125),
                ),
            },
            &mut events,
        );
        world
    }

    fn spawn(world: &mut World, cell: CellCoord, facing: Direction) -> CharacterId {
        let mut events = Vec::new();
        apply(world, Command::SpawnCharacter { cell, facing }, &mut events);
        match events.last() {
            Some(Event::CharacterSpawned { character, .. }) => *character,
            other => panic!("expected spawn confirmation, got {other:?}"),
        }
    }

    fn tick(world: &mut World, dt: Duration) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, Command::Tick { dt }, &mut events);
        events
    }

    fn snapshot(world: &World, character: CharacterId) -> tilewalk_core::CharacterSnapshot {
        *query::character_view(world)
            .get(character)
            .expect("character snapshot present")
    }

    #[test]
    fn spawning_occupies_the_cell() {
        let mut world = configured_world(4, 4);
        let character = spawn(&mut world, CellCoord::new(1, 1), Direction::South);

        let occupancy = query::occupancy_view(&world);
        assert_eq!(occupancy.occupant(CellCoord::new(1, 1)), Some(character));

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnCharacter {
                cell: CellCoord::new(1, 1),
                facing: Direction::North,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::SpawnRejected {
                cell: CellCoord::new(1, 1),
                reason: PlacementError::Occupied,
            }]
        );
    }

    #[test]
    fn spawning_outside_the_grid_is_rejected() {
        let mut world = configured_world(3, 3);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnCharacter {
                cell: CellCoord::new(3, 0),
                facing: Direction::South,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::SpawnRejected {
                cell: CellCoord::new(3, 0),
                reason: PlacementError::OutOfBounds,
            }]
        );
    }

    #[test]
    fn prop_placement_validates_cell() {
        let mut world = configured_world(4, 4);
        let character = spawn(&mut world, CellCoord::new(0, 0), Direction::South);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceProp {
                kind: PropKind::Sign,
                cell: CellCoord::new(2, 2),
            },
            &mut events,
        );
        assert!(matches!(events[0], Event::PropPlaced { .. }));

        events.clear();
        apply(
            &mut world,
            Command::PlaceProp {
                kind: PropKind::Boulder,
                cell: CellCoord::new(0, 0),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::PropRejected {
                kind: PropKind::Boulder,
                cell: CellCoord::new(0, 0),
                reason: PlacementError::Occupied,
            }]
        );
        let _ = character;
    }

    #[test]
    fn zone_registration_validates_region() {
        let mut world = configured_world(6, 6);
        let region = CellRect::from_origin_and_size(CellCoord::new(0, 0), CellRectSize::new(2, 2));

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::AddZone {
                region,
                target: Some(TriggerTarget::new(1)),
            },
            &mut events,
        );
        assert!(matches!(events[0], Event::ZoneAdded { .. }));

        events.clear();
        apply(
            &mut world,
            Command::AddZone {
                region: CellRect::from_origin_and_size(CellCoord::new(1, 1), CellRectSize::new(2, 2)),
                target: None,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::ZoneRejected {
                region: CellRect::from_origin_and_size(CellCoord::new(1, 1), CellRectSize::new(2, 2)),
                reason: PlacementError::Overlapping,
            }]
        );

        events.clear();
        apply(
            &mut world,
            Command::AddZone {
                region: CellRect::from_origin_and_size(CellCoord::new(5, 5), CellRectSize::new(2, 1)),
                target: None,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::ZoneRejected {
                region: CellRect::from_origin_and_size(CellCoord::new(5, 5), CellRectSize::new(2, 1)),
                reason: PlacementError::OutOfBounds,
            }]
        );
    }

    #[test]
    fn facing_updates_from_active_direction_on_tick() {
        let mut world = configured_world(4, 4);
        let character = spawn(&mut world, CellCoord::new(1, 1), Direction::South);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PressDirection {
                character,
                direction: Direction::East,
            },
            &mut events,
        );
        let events = tick(&mut world, TICK);

        assert!(events.contains(&Event::FacingChanged {
            character,
            facing: Direction::East,
        }));
        assert_eq!(snapshot(&world, character).facing, Direction::East);
        // The turn tick itself never satisfies the pivot gate.
        assert!(!snapshot(&world, character).ready_to_step);
    }

    #[test]
    fn pivot_gate_opens_after_buffer_elapses_on_aligned_hold() {
        let mut world = configured_world(4, 4);
        let character = spawn(&mut world, CellCoord::new(1, 1), Direction::South);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PressDirection {
                character,
                direction: Direction::South,
            },
            &mut events,
        );
        let _ = tick(&mut world, TICK);

        assert!(snapshot(&world, character).ready_to_step);
    }

    #[test]
    fn releasing_input_rearms_the_pivot_gate() {
        let mut world = configured_world(4, 4);
        let character = spawn(&mut world, CellCoord::new(1, 1), Direction::South);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PressDirection {
                character,
                direction: Direction::South,
            },
            &mut events,
        );
        let _ = tick(&mut world, TICK);
        assert!(snapshot(&world, character).ready_to_step);

        apply(
            &mut world,
            Command::ReleaseDirection {
                character,
                direction: Direction::South,
            },
            &mut events,
        );
        let _ = tick(&mut world, TICK);
        assert!(!snapshot(&world, character).ready_to_step);
    }

    #[test]
    fn committed_step_reserves_destination_before_arrival() {
        let mut world = configured_world(4, 4);
        let character = spawn(&mut world, CellCoord::new(1, 1), Direction::South);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Step {
                character,
                direction: Direction::South,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::StepCommitted {
                character,
                from: CellCoord::new(1, 1),
                to: CellCoord::new(1, 2),
                direction: Direction::South,
            }]
        );

        // Mid-flight: the origin is free, the destination already taken.
        let occupancy = query::occupancy_view(&world);
        assert!(occupancy.is_free(CellCoord::new(1, 1)));
        assert_eq!(occupancy.occupant(CellCoord::new(1, 2)), Some(character));
        assert!(!snapshot(&world, character).is_settled());
    }

    #[test]
    fn motion_completes_after_exact_step_time() {
        let mut world = configured_world(4, 4);
        let character = spawn(&mut world, CellCoord::new(1, 1), Direction::South);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Step {
                character,
                direction: Direction::South,
            },
            &mut events,
        );

        let first = tick(&mut world, TICK);
        assert!(!first.iter().any(|event| matches!(event, Event::StepCompleted { .. })));

        let second = tick(&mut world, TICK);
        assert!(second.contains(&Event::StepCompleted {
            character,
            cell: CellCoord::new(1, 2),
        }));
        assert!(snapshot(&world, character).is_settled());
    }

    #[test]
    fn step_into_prop_or_edge_or_reservation_is_rejected() {
        let mut world = configured_world(3, 3);
        let character = spawn(&mut world, CellCoord::new(0, 0), Direction::South);
        let other = spawn(&mut world, CellCoord::new(1, 1), Direction::South);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceProp {
                kind: PropKind::Boulder,
                cell: CellCoord::new(0, 1),
            },
            &mut events,
        );

        events.clear();
        apply(
            &mut world,
            Command::Step {
                character,
                direction: Direction::South,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::StepRejected {
                character,
                direction: Direction::South,
                reason: StepError::Obstructed,
            }]
        );

        events.clear();
        apply(
            &mut world,
            Command::Step {
                character,
                direction: Direction::North,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::StepRejected {
                character,
                direction: Direction::North,
                reason: StepError::OutOfBounds,
            }]
        );

        // The other character reserves (1, 0) by committing toward it; the
        // reservation blocks a competing step for the whole flight.
        events.clear();
        apply(
            &mut world,
            Command::Step {
                character: other,
                direction: Direction::North,
            },
            &mut events,
        );
        assert!(matches!(events[0], Event::StepCommitted { .. }));

        events.clear();
        apply(
            &mut world,
            Command::Step {
                character,
                direction: Direction::East,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::StepRejected {
                character,
                direction: Direction::East,
                reason: StepError::Occupied,
            }]
        );
    }

    #[test]
    fn step_while_mid_flight_is_rejected() {
        let mut world = configured_world(4, 4);
        let character = spawn(&mut world, CellCoord::new(1, 1), Direction::South);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Step {
                character,
                direction: Direction::South,
            },
            &mut events,
        );
        events.clear();
        apply(
            &mut world,
            Command::Step {
                character,
                direction: Direction::South,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::StepRejected {
                character,
                direction: Direction::South,
                reason: StepError::NotSettled,
            }]
        );
    }

    #[test]
    fn sprint_locks_step_time_at_commit() {
        let mut world = configured_world(4, 4);
        let character = spawn(&mut world, CellCoord::new(1, 1), Direction::South);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SetSprint {
                character,
                held: true,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::Step {
                character,
                direction: Direction::South,
            },
            &mut events,
        );
        // Releasing sprint mid-flight must not stretch the flight underway.
        apply(
            &mut world,
            Command::SetSprint {
                character,
                held: false,
            },
            &mut events,
        );

        let events = tick(&mut world, TICK);
        assert!(events.contains(&Event::StepCompleted {
            character,
            cell: CellCoord::new(1, 2),
        }));
    }

    #[test]
    fn zone_events_wait_for_motion_to_complete() {
        let mut world = configured_world(4, 4);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::AddZone {
                region: CellRect::from_origin_and_size(CellCoord::new(1, 2), CellRectSize::new(1, 1)),
                target: Some(TriggerTarget::new(7)),
            },
            &mut events,
        );
        let character = spawn(&mut world, CellCoord::new(1, 1), Direction::South);

        events.clear();
        apply(
            &mut world,
            Command::Step {
                character,
                direction: Direction::South,
            },
            &mut events,
        );

        // Halfway in, the overlap sample already points at the zone, but no
        // lifecycle event may fire until the flight settles.
        let first = tick(&mut world, TICK);
        assert!(!first
            .iter()
            .any(|event| matches!(event, Event::ZoneEntered { .. })));

        let second = tick(&mut world, TICK);
        let entered = second
            .iter()
            .position(|event| matches!(event, Event::ZoneEntered { .. }));
        let completed = second
            .iter()
            .position(|event| matches!(event, Event::StepCompleted { .. }));
        assert!(entered.is_some());
        assert!(completed.is_some());
    }

    #[test]
    fn crossing_between_zones_enters_before_exiting() {
        let mut world = configured_world(4, 4);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::AddZone {
                region: CellRect::from_origin_and_size(CellCoord::new(1, 1), CellRectSize::new(1, 1)),
                target: Some(TriggerTarget::new(1)),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::AddZone {
                region: CellRect::from_origin_and_size(CellCoord::new(1, 2), CellRectSize::new(1, 1)),
                target: Some(TriggerTarget::new(2)),
            },
            &mut events,
        );
        let character = spawn(&mut world, CellCoord::new(1, 1), Direction::South);

        // Settle inside the first zone so its enter has already fired.
        events.clear();
        apply(
            &mut world,
            Command::Step {
                character,
                direction: Direction::East,
            },
            &mut events,
        );
        let _ = tick(&mut world, TICK);
        let _ = tick(&mut world, TICK);
        apply(
            &mut world,
            Command::Step {
                character,
                direction: Direction::West,
            },
            &mut events,
        );
        let _ = tick(&mut world, TICK);
        let settled = tick(&mut world, TICK);
        assert!(settled
            .iter()
            .any(|event| matches!(event, Event::ZoneEntered { zone, .. } if zone.get() == 0)));

        // Now cross into the adjacent zone: enter the new one first.
        apply(
            &mut world,
            Command::Step {
                character,
                direction: Direction::South,
            },
            &mut events,
        );
        let _ = tick(&mut world, TICK);
        let crossing = tick(&mut world, TICK);
        let entered = crossing
            .iter()
            .position(|event| matches!(event, Event::ZoneEntered { .. }))
            .expect("enter fired");
        let exited = crossing
            .iter()
            .position(|event| matches!(event, Event::ZoneExited { .. }))
            .expect("exit fired");
        assert!(entered < exited, "enter must precede exit");
    }

    #[test]
    fn staying_inside_a_zone_fires_stay_per_completed_step() {
        let mut world = configured_world(6, 4);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::AddZone {
                region: CellRect::from_origin_and_size(CellCoord::new(0, 1), CellRectSize::new(6, 1)),
                target: Some(TriggerTarget::new(5)),
            },
            &mut events,
        );
        let character = spawn(&mut world, CellCoord::new(0, 1), Direction::East);

        let mut stays = 0;
        let mut enters = 0;
        for direction in [Direction::East, Direction::East, Direction::East] {
            events.clear();
            apply(&mut world, Command::Step { character, direction }, &mut events);
            let _ = tick(&mut world, TICK);
            let settled = tick(&mut world, TICK);
            enters += settled
                .iter()
                .filter(|event| matches!(event, Event::ZoneEntered { .. }))
                .count();
            stays += settled
                .iter()
                .filter(|event| matches!(event, Event::ZoneStayed { .. }))
                .count();
        }

        assert_eq!(enters, 1, "enter fires only on the first settled step");
        assert_eq!(stays, 2, "every later step inside the zone is a stay");
    }

    #[test]
    fn suppression_clears_input_and_guards_one_tick() {
        let mut world = configured_world(4, 4);
        let character = spawn(&mut world, CellCoord::new(1, 1), Direction::South);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PressDirection {
                character,
                direction: Direction::South,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::QueueInteraction { character },
            &mut events,
        );
        assert!(snapshot(&world, character).interaction_queued);

        events.clear();
        apply(
            &mut world,
            Command::SetInputSuppressed {
                character,
                suppressed: true,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::InputSuppressionChanged {
                character,
                suppressed: true,
            }]
        );
        let current = snapshot(&world, character);
        assert_eq!(current.active_direction, None);
        assert!(!current.interaction_queued);

        // Re-enable; a stale press in the same batch must be swallowed.
        apply(
            &mut world,
            Command::SetInputSuppressed {
                character,
                suppressed: false,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::QueueInteraction { character },
            &mut events,
        );
        assert!(!snapshot(&world, character).interaction_queued);

        // After one tick the guard releases and sampling resumes.
        let _ = tick(&mut world, TICK);
        apply(
            &mut world,
            Command::QueueInteraction { character },
            &mut events,
        );
        assert!(snapshot(&world, character).interaction_queued);
    }

    #[test]
    fn suppression_does_not_cancel_motion_in_flight() {
        let mut world = configured_world(4, 4);
        let character = spawn(&mut world, CellCoord::new(1, 1), Direction::South);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Step {
                character,
                direction: Direction::South,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::SetInputSuppressed {
                character,
                suppressed: true,
            },
            &mut events,
        );

        let _ = tick(&mut world, TICK);
        let settled = tick(&mut world, TICK);
        assert!(settled.contains(&Event::StepCompleted {
            character,
            cell: CellCoord::new(1, 2),
        }));
    }

    #[test]
    fn interaction_dispatch_clears_latch_for_interactive_props() {
        let mut world = configured_world(4, 4);
        let character = spawn(&mut world, CellCoord::new(1, 1), Direction::South);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceProp {
                kind: PropKind::Sign,
                cell: CellCoord::new(1, 2),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::QueueInteraction { character },
            &mut events,
        );

        events.clear();
        apply(&mut world, Command::Interact { character }, &mut events);
        assert!(matches!(
            events[0],
            Event::PropInteracted {
                kind: PropKind::Sign,
                ..
            }
        ));
        assert!(!snapshot(&world, character).interaction_queued);
    }

    #[test]
    fn interaction_with_inert_prop_keeps_latch() {
        let mut world = configured_world(4, 4);
        let character = spawn(&mut world, CellCoord::new(1, 1), Direction::South);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceProp {
                kind: PropKind::Boulder,
                cell: CellCoord::new(1, 2),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::QueueInteraction { character },
            &mut events,
        );

        events.clear();
        apply(&mut world, Command::Interact { character }, &mut events);
        assert!(events.is_empty());
        assert!(snapshot(&world, character).interaction_queued);
    }

    #[test]
    fn reconfiguring_the_grid_clears_the_room() {
        let mut world = configured_world(4, 4);
        let _ = spawn(&mut world, CellCoord::new(1, 1), Direction::South);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureGrid {
                columns: 6,
                rows: 6,
                tile_length: 2.0,
            },
            &mut events,
        );

        assert_eq!(query::tile_grid(&world).columns(), 6);
        assert!(query::character_view(&world).iter().next().is_none());
        assert!(query::occupancy_view(&world).is_free(CellCoord::new(1, 1)));
    }

    #[test]
    fn probe_reports_edge_prop_and_reservation() {
        let mut world = configured_world(3, 3);
        let character = spawn(&mut world, CellCoord::new(0, 0), Direction::South);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceProp {
                kind: PropKind::Chest,
                cell: CellCoord::new(1, 0),
            },
            &mut events,
        );

        let probe = query::obstruction_probe(&world);
        assert_eq!(probe(CellCoord::new(0, 3)), Some(tilewalk_core::Obstruction::Edge));
        assert!(matches!(
            probe(CellCoord::new(1, 0)),
            Some(tilewalk_core::Obstruction::Prop {
                kind: PropKind::Chest,
                ..
            })
        ));
        assert_eq!(
            probe(CellCoord::new(0, 0)),
            Some(tilewalk_core::Obstruction::Character(character))
        );
        assert_eq!(probe(CellCoord::new(2, 2)), None);
    }
}
