#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Tilewalk.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in containerised CI environments. To keep
//! `cargo test` usable everywhere we depend on macroquad without its default
//! `audio` feature.

use anyhow::{bail, Result};
use glam::Vec2;
use macroquad::color::Color as MacroquadColor;
use macroquad::input::{is_key_down, is_key_pressed, KeyCode};
use macroquad::math::Vec2 as MacroquadVec2;
use macroquad::shapes::{draw_circle, draw_line, draw_rectangle, draw_triangle};
use macroquad::text::draw_text;
use std::time::Duration;
use tilewalk_core::PropKind;
use tilewalk_rendering::{
    Color, FrameInput, Presentation, RenderingBackend, Scene, TileGridPresentation,
};

const WINDOW_MARGIN: f32 = 24.0;
const DIALOG_HEIGHT: f32 = 96.0;

/// Mapping from logical actions to physical keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyBindings {
    /// Key that holds the northward direction.
    pub up: KeyCode,
    /// Key that holds the southward direction.
    pub down: KeyCode,
    /// Key that holds the westward direction.
    pub left: KeyCode,
    /// Key that holds the eastward direction.
    pub right: KeyCode,
    /// Key that holds the sprint modifier.
    pub sprint: KeyCode,
    /// Key that triggers interactions and dismisses dialogs.
    pub interact: KeyCode,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            up: KeyCode::Up,
            down: KeyCode::Down,
            left: KeyCode::Left,
            right: KeyCode::Right,
            sprint: KeyCode::LeftShift,
            interact: KeyCode::Space,
        }
    }
}

impl KeyBindings {
    /// Builds a binding set from the key names used in settings files.
    pub fn from_names(
        up: &str,
        down: &str,
        left: &str,
        right: &str,
        sprint: &str,
        interact: &str,
    ) -> Result<Self> {
        Ok(Self {
            up: key_from_name(up)?,
            down: key_from_name(down)?,
            left: key_from_name(left)?,
            right: key_from_name(right)?,
            sprint: key_from_name(sprint)?,
            interact: key_from_name(interact)?,
        })
    }
}

fn key_from_name(name: &str) -> Result<KeyCode> {
    let key = match name {
        "Up" => KeyCode::Up,
        "Down" => KeyCode::Down,
        "Left" => KeyCode::Left,
        "Right" => KeyCode::Right,
        "W" => KeyCode::W,
        "A" => KeyCode::A,
        "S" => KeyCode::S,
        "D" => KeyCode::D,
        "E" => KeyCode::E,
        "Z" => KeyCode::Z,
        "X" => KeyCode::X,
        "Space" => KeyCode::Space,
        "Enter" => KeyCode::Enter,
        "LeftShift" => KeyCode::LeftShift,
        "RightShift" => KeyCode::RightShift,
        "LeftControl" => KeyCode::LeftControl,
        other => bail!("unrecognised key name in bindings: {other}"),
    };
    Ok(key)
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    bindings: KeyBindings,
}

impl Default for MacroquadBackend {
    fn default() -> Self {
        Self {
            swap_interval: None,
            bindings: KeyBindings::default(),
        }
    }
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to either synchronise presentation with the
    /// display refresh rate or render as fast as possible.
    #[must_use]
    pub fn with_vsync(mut self, enabled: bool) -> Self {
        self.swap_interval = Some(if enabled { 1 } else { 0 });
        self
    }

    /// Replaces the default key bindings.
    #[must_use]
    pub fn with_bindings(mut self, bindings: KeyBindings) -> Self {
        self.bindings = bindings;
        self
    }
}

fn poll_input(bindings: &KeyBindings) -> FrameInput {
    FrameInput {
        up_held: is_key_down(bindings.up),
        right_held: is_key_down(bindings.right),
        down_held: is_key_down(bindings.down),
        left_held: is_key_down(bindings.left),
        sprint_held: is_key_down(bindings.sprint),
        interact_held: is_key_down(bindings.interact),
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            bindings,
        } = self;
        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: (scene.tile_grid.width() + 2.0 * WINDOW_MARGIN) as i32,
            window_height: (scene.tile_grid.height() + 2.0 * WINDOW_MARGIN + DIALOG_HEIGHT) as i32,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let background = to_macroquad_color(clear_color);
            let mut scene = scene;

            loop {
                if is_key_pressed(KeyCode::Escape) || is_key_pressed(KeyCode::Q) {
                    break;
                }

                macroquad::window::clear_background(background);

                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));
                let frame_input = poll_input(&bindings);

                update_scene(frame_dt, frame_input, &mut scene);
                draw_scene(&mut scene);

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

fn draw_scene(scene: &mut Scene) {
    let grid = scene.tile_grid;
    let origin = Vec2::splat(WINDOW_MARGIN);
    let tile = grid.tile_length;

    for zone in &scene.zones {
        let top_left = origin
            + Vec2::new(
                zone.region.origin().column() as f32,
                zone.region.origin().row() as f32,
            ) * tile;
        let tint = if zone.has_target {
            Color::from_rgb_u8(0x3a, 0xc5, 0x6f).with_alpha(0.25)
        } else {
            Color::from_rgb_u8(0x9a, 0x9a, 0x9a).with_alpha(0.15)
        };
        draw_rectangle(
            top_left.x,
            top_left.y,
            zone.region.size().width() as f32 * tile,
            zone.region.size().height() as f32 * tile,
            to_macroquad_color(tint),
        );
    }

    draw_grid_lines(&grid, origin);

    for prop in &scene.props {
        let top_left =
            origin + Vec2::new(prop.cell.column() as f32, prop.cell.row() as f32) * tile;
        let inset = tile * 0.1;
        draw_rectangle(
            top_left.x + inset,
            top_left.y + inset,
            tile - 2.0 * inset,
            tile - 2.0 * inset,
            to_macroquad_color(prop_color(prop.kind)),
        );
    }

    for character in &scene.characters {
        let center = origin + (character.position + Vec2::splat(0.5)) * tile;
        let radius = if character.sprinting {
            tile * 0.42
        } else {
            tile * 0.38
        };
        draw_circle(
            center.x,
            center.y,
            radius,
            to_macroquad_color(character.body),
        );

        // The facing marker is the sprite lookup's job; a missing entry
        // degrades to a plain body.
        if let Some(sprite) = scene.facing_sprites.sprite_for(character.facing) {
            let heading = Vec2::new(sprite.rotation.sin(), -sprite.rotation.cos());
            let across = Vec2::new(-heading.y, heading.x);
            let tip = center + heading * tile * 0.46;
            let left = center + across * tile * 0.16 + heading * tile * 0.12;
            let right = center - across * tile * 0.16 + heading * tile * 0.12;
            draw_triangle(
                to_macroquad_vec(tip),
                to_macroquad_vec(left),
                to_macroquad_vec(right),
                to_macroquad_color(Color::from_rgb_u8(0xff, 0xff, 0xff)),
            );
        }
    }

    if let Some(dialog) = &scene.dialog {
        let top = WINDOW_MARGIN + grid.height() + WINDOW_MARGIN * 0.5;
        draw_rectangle(
            WINDOW_MARGIN,
            top,
            grid.width(),
            DIALOG_HEIGHT,
            to_macroquad_color(Color::from_rgb_u8(0x12, 0x12, 0x1a).with_alpha(0.9)),
        );
        let _ = draw_text(
            &dialog.text,
            WINDOW_MARGIN + 12.0,
            top + 32.0,
            24.0,
            to_macroquad_color(Color::from_rgb_u8(0xf0, 0xf0, 0xf0)),
        );
    }
}

fn draw_grid_lines(grid: &TileGridPresentation, origin: Vec2) {
    let color = to_macroquad_color(grid.line_color);
    let width = grid.width();
    let height = grid.height();

    for column in 0..=grid.columns {
        let x = origin.x + column as f32 * grid.tile_length;
        draw_line(x, origin.y, x, origin.y + height, 1.0, color);
    }
    for row in 0..=grid.rows {
        let y = origin.y + row as f32 * grid.tile_length;
        draw_line(origin.x, y, origin.x + width, y, 1.0, color);
    }
}

fn prop_color(kind: PropKind) -> Color {
    match kind {
        PropKind::Boulder => Color::from_rgb_u8(0x6e, 0x6e, 0x76),
        PropKind::Sign => Color::from_rgb_u8(0xb0, 0x7d, 0x3c),
        PropKind::Chest => Color::from_rgb_u8(0xd9, 0xa8, 0x21),
    }
}

fn to_macroquad_color(color: Color) -> MacroquadColor {
    MacroquadColor::new(color.red, color.green, color.blue, color.alpha)
}

fn to_macroquad_vec(value: Vec2) -> MacroquadVec2 {
    MacroquadVec2::new(value.x, value.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names_resolve_to_key_codes() {
        let bindings = KeyBindings::from_names("W", "S", "A", "D", "LeftShift", "E")
            .expect("all names are known");
        assert_eq!(bindings.up, KeyCode::W);
        assert_eq!(bindings.interact, KeyCode::E);
    }

    #[test]
    fn unknown_key_name_is_rejected() {
        assert!(KeyBindings::from_names("Up", "Down", "Left", "Right", "Shift", "Space").is_err());
    }

    #[test]
    fn prop_kinds_have_distinct_visuals() {
        assert_ne!(prop_color(PropKind::Boulder), prop_color(PropKind::Sign));
        assert_ne!(prop_color(PropKind::Sign), prop_color(PropKind::Chest));
    }
}
