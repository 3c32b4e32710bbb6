#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Tilewalk experience.
//!
//! The binary wires the authoritative world, the input translator, the
//! locomotion system, and the analytics system into a fixed-tick driver
//! loop, presented either through the macroquad backend or as a headless
//! event trace.

mod config;
mod layout;

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use tilewalk_core::{CellCoord, CharacterId, Command, Event, PropId, PropKind, StepTiming};
use tilewalk_rendering::{
    position_in_cells, CharacterPresentation, Color, DialogPresentation, FacingSprites,
    Presentation, PropPresentation, RenderingBackend, Scene, TileGridPresentation,
    ZonePresentation,
};
use tilewalk_rendering_macroquad::{KeyBindings, MacroquadBackend};
use tilewalk_system_analytics::{Analytics, Config as AnalyticsConfig};
use tilewalk_system_input::{InputSample, InputTranslator};
use tilewalk_system_locomotion::Locomotion;
use tilewalk_world::{self as world, query, World};

use crate::config::Settings;
use crate::layout::RoomLayout;

/// Fixed simulation tick driven by the frame loop.
const SIM_TICK: Duration = Duration::from_micros(16_667);

const CLEAR_COLOR: Color = Color::from_rgb_u8(0x1a, 0x1c, 0x20);
const GRID_LINE_COLOR: Color = Color::from_rgb_u8(0x3c, 0x40, 0x48);

const CHARACTER_COLORS: [Color; 4] = [
    Color::from_rgb_u8(0x2f, 0x95, 0x32),
    Color::from_rgb_u8(0xc8, 0x2a, 0x36),
    Color::from_rgb_u8(0xff, 0xc1, 0x07),
    Color::from_rgb_u8(0x58, 0x47, 0xff),
];

/// Tile-grid character controller demo.
#[derive(Debug, Parser)]
#[command(name = "tilewalk")]
struct Args {
    /// Path to a TOML room layout; the built-in demo room is used otherwise.
    #[arg(long)]
    layout: Option<PathBuf>,
    /// Path to a TOML settings file for timings and key bindings.
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Run without a window for the given number of fixed ticks and print
    /// the event trace of a scripted southward walk.
    #[arg(long)]
    headless: Option<u32>,
    /// Render as fast as possible instead of synchronising with the display.
    #[arg(long)]
    no_vsync: bool,
}

/// Entry point for the Tilewalk command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let settings = match &args.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let layout = match &args.layout {
        Some(path) => RoomLayout::load(path)?,
        None => RoomLayout::demo(),
    };

    let mut world = World::new();
    let mut events = Vec::new();
    let mut sign_texts = HashMap::new();
    build_room(
        &mut world,
        &layout,
        settings.step_timing(),
        &mut events,
        &mut sign_texts,
    );

    let Some(player) = query::character_view(&world).iter().next().map(|s| s.id) else {
        bail!("no character could be spawned from the layout");
    };

    println!("{}", query::welcome_banner(&world));

    match args.headless {
        Some(ticks) => {
            run_headless(world, events, player, ticks);
            Ok(())
        }
        None => run_windowed(world, events, player, &settings, sign_texts, !args.no_vsync),
    }
}

/// Applies the layout's setup commands and records sign/chest dialog text
/// for every prop that was actually placed.
fn build_room(
    world: &mut World,
    layout: &RoomLayout,
    timing: StepTiming,
    out_events: &mut Vec<Event>,
    sign_texts: &mut HashMap<PropId, String>,
) {
    for command in layout.setup_commands(timing) {
        let placed_cell = match &command {
            Command::PlaceProp { cell, .. } => Some(*cell),
            _ => None,
        };
        let before = out_events.len();
        world::apply(world, command, out_events);

        if let (Some(cell), Some(Event::PropPlaced { prop, .. })) =
            (placed_cell, out_events.get(before))
        {
            let entry = layout
                .props
                .iter()
                .find(|prop| CellCoord::new(prop.column, prop.row) == cell);
            if let Some(text) = entry.and_then(|entry| entry.text.clone()) {
                let _ = sign_texts.insert(*prop, text);
            }
        }
    }
}

/// Runs the fixed-tick loop without a window, printing the event trace of a
/// scripted southward hold. Useful for determinism checks and debugging.
fn run_headless(mut world: World, carry: Vec<Event>, player: CharacterId, ticks: u32) {
    let mut locomotion = Locomotion::new();
    let mut analytics = Analytics::new(AnalyticsConfig::new(Duration::from_secs(1)));

    for event in &carry {
        println!("[setup] {event:?}");
    }

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::PressDirection {
            character: player,
            direction: tilewalk_core::Direction::South,
        },
        &mut events,
    );

    for tick in 1..=ticks {
        let mut frame_events = Vec::new();
        world::apply(&mut world, Command::Tick { dt: SIM_TICK }, &mut frame_events);

        let view = query::character_view(&world);
        let mut commands = Vec::new();
        locomotion.handle(
            &frame_events,
            &view,
            query::obstruction_probe(&world),
            &mut commands,
        );
        for command in commands {
            world::apply(&mut world, command, &mut frame_events);
        }

        let mut published = Vec::new();
        analytics.handle(&frame_events, &mut published);
        frame_events.extend(published);

        for event in &frame_events {
            if !matches!(event, Event::TimeAdvanced { .. }) {
                println!("[{tick:>5}] {event:?}");
            }
        }
    }

    let report = analytics.report();
    println!("[done] {report:?}");
}

/// Runs the windowed experience through the macroquad backend.
fn run_windowed(
    mut world: World,
    initial_events: Vec<Event>,
    player: CharacterId,
    settings: &Settings,
    sign_texts: HashMap<PropId, String>,
    vsync: bool,
) -> Result<()> {
    let bindings = KeyBindings::from_names(
        &settings.bindings.up,
        &settings.bindings.down,
        &settings.bindings.left,
        &settings.bindings.right,
        &settings.bindings.sprint,
        &settings.bindings.interact,
    )?;
    let backend = MacroquadBackend::new()
        .with_vsync(vsync)
        .with_bindings(bindings);

    let scene = build_scene(&world)?;
    let presentation = Presentation::new("Tilewalk", CLEAR_COLOR, scene);

    let mut translator = InputTranslator::new(player);
    let mut locomotion = Locomotion::new();
    let mut analytics = Analytics::new(AnalyticsConfig::new(settings.report_interval()));
    let mut carry_events = initial_events;
    let mut accumulator = Duration::ZERO;
    let mut previous_interact_held = false;
    let mut dialog_text: Option<String> = None;

    backend.run(presentation, move |dt, input, scene| {
        let mut events = Vec::new();
        let interact_edge = input.interact_held && !previous_interact_held;
        previous_interact_held = input.interact_held;

        if dialog_text.is_some() {
            // The modal owns input; the interact key dismisses it and the
            // world's one-tick guard swallows that same press.
            if interact_edge {
                dialog_text = None;
                world::apply(
                    &mut world,
                    Command::SetInputSuppressed {
                        character: player,
                        suppressed: false,
                    },
                    &mut events,
                );
            }
        } else {
            let sample = InputSample {
                north: input.up_held,
                east: input.right_held,
                south: input.down_held,
                west: input.left_held,
                sprint: input.sprint_held,
                interact: input.interact_held,
            };
            let mut commands = Vec::new();
            translator.handle(&carry_events, sample, &mut commands);
            for command in commands {
                world::apply(&mut world, command, &mut events);
            }
        }

        accumulator = accumulator.saturating_add(dt);
        while accumulator >= SIM_TICK {
            accumulator -= SIM_TICK;
            world::apply(&mut world, Command::Tick { dt: SIM_TICK }, &mut events);

            let view = query::character_view(&world);
            let mut commands = Vec::new();
            locomotion.handle(&events, &view, query::obstruction_probe(&world), &mut commands);
            for command in commands {
                world::apply(&mut world, command, &mut events);
            }
        }

        let interacted = events.iter().find_map(|event| match event {
            Event::PropInteracted {
                character,
                prop,
                kind,
            } if *character == player => Some((*prop, *kind)),
            _ => None,
        });
        if let Some((prop, kind)) = interacted {
            dialog_text = Some(
                sign_texts
                    .get(&prop)
                    .cloned()
                    .unwrap_or_else(|| default_dialog_text(kind).to_owned()),
            );
            world::apply(
                &mut world,
                Command::SetInputSuppressed {
                    character: player,
                    suppressed: true,
                },
                &mut events,
            );
        }

        let mut published = Vec::new();
        analytics.handle(&events, &mut published);
        for event in &published {
            if let Event::AnalyticsUpdated { report } = event {
                tracing::info!(?report, "travel report");
            }
        }
        events.extend(published);

        scene.characters = character_presentations(&world);
        scene.dialog = dialog_text
            .as_ref()
            .map(|text| DialogPresentation { text: text.clone() });

        carry_events = events;
    })
}

fn build_scene(world: &World) -> Result<Scene> {
    let grid = query::tile_grid(world);
    let tile_grid = TileGridPresentation::new(
        grid.columns(),
        grid.rows(),
        grid.tile_length(),
        GRID_LINE_COLOR,
    )?;

    let zones = query::zone_view(world)
        .iter()
        .map(|zone| ZonePresentation {
            region: zone.region,
            has_target: zone.has_target,
        })
        .collect();
    let props = query::prop_view(world)
        .iter()
        .map(|prop| PropPresentation {
            cell: prop.cell,
            kind: prop.kind,
        })
        .collect();

    Ok(Scene::new(
        tile_grid,
        zones,
        props,
        character_presentations(world),
        FacingSprites::aligned(),
        None,
    ))
}

fn character_presentations(world: &World) -> Vec<CharacterPresentation> {
    query::character_view(world)
        .iter()
        .enumerate()
        .map(|(index, snapshot)| CharacterPresentation {
            id: snapshot.id,
            position: position_in_cells(snapshot),
            facing: snapshot.facing,
            body: CHARACTER_COLORS[index % CHARACTER_COLORS.len()],
            sprinting: snapshot.sprinting,
        })
        .collect()
}

fn default_dialog_text(kind: PropKind) -> &'static str {
    match kind {
        PropKind::Sign => "The sign is blank.",
        PropKind::Chest => "The chest is empty.",
        PropKind::Boulder => "It doesn't budge.",
    }
}
