#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Tile Slide.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.

use anyhow::Result;
use glam::Vec2;
use log::{debug, info};
use macroquad::{
    input::{
        is_key_pressed, is_mouse_button_pressed, is_mouse_button_released, mouse_position,
        simulate_mouse_with_touch, touches, KeyCode, MouseButton, TouchPhase,
    },
    shapes::draw_rectangle,
    text::{draw_text, measure_text},
};
use std::time::Duration;
use tile_slide_core::{InputKey, PointerDrag};
use tile_slide_rendering::{
    Color, FrameInput, GridPresentation, Presentation, RenderingBackend, Scene, TilePresentation,
};

/// Fraction of the shorter screen edge occupied by the board.
const BOARD_SCREEN_FRACTION: f32 = 0.9;

/// Veil drawn over the board while a notice is shown.
const NOTICE_VEIL: Color = Color::new(0.0, 0.0, 0.0, 0.55);

/// Color of notice text.
const NOTICE_TEXT: Color = Color::new(1.0, 1.0, 1.0, 1.0);

/// Pairs a press position with its release so a completed gesture becomes a drag.
///
/// Mouse and touch input each own a tracker; a release without a preceding press
/// produces nothing.
#[doc(hidden)]
#[derive(Clone, Copy, Debug, Default)]
pub struct DragTracker {
    pressed_at: Option<(f32, f32)>,
}

impl DragTracker {
    /// Records the position where a press began, replacing any unfinished press.
    pub fn press(&mut self, position: (f32, f32)) {
        self.pressed_at = Some(position);
    }

    /// Completes the current press, returning the drag it described.
    pub fn release(&mut self, position: (f32, f32)) -> Option<PointerDrag> {
        self.pressed_at
            .take()
            .map(|start| PointerDrag::new(start, position))
    }

    /// Abandons the current press without producing a drag.
    pub fn cancel(&mut self) {
        self.pressed_at = None;
    }

    /// Reports whether a press is waiting for its release.
    #[must_use]
    pub fn is_pressed(&self) -> bool {
        self.pressed_at.is_some()
    }
}

/// Snapshot of edge-triggered keyboard input observed during a single frame.
#[derive(Clone, Debug, Default)]
struct KeyboardShortcuts {
    /// `Escape` quits the game loop.
    quit_requested: bool,
    /// Directional keys pressed this frame.
    keys: Vec<InputKey>,
}

impl KeyboardShortcuts {
    fn poll() -> Self {
        let quit_requested = is_key_pressed(KeyCode::Escape);
        let keys = [
            (KeyCode::Up, InputKey::ArrowUp),
            (KeyCode::Down, InputKey::ArrowDown),
            (KeyCode::Left, InputKey::ArrowLeft),
            (KeyCode::Right, InputKey::ArrowRight),
            (KeyCode::W, InputKey::Character('w')),
            (KeyCode::A, InputKey::Character('a')),
            (KeyCode::S, InputKey::Character('s')),
            (KeyCode::D, InputKey::Character('d')),
        ]
        .into_iter()
        .filter(|(code, _)| is_key_pressed(*code))
        .map(|(_, key)| key)
        .collect();

        Self {
            quit_requested,
            keys,
        }
    }
}

/// Press trackers for every pointer source.
#[derive(Clone, Copy, Debug, Default)]
struct PointerTrackers {
    mouse: DragTracker,
    touch: DragTracker,
}

impl PointerTrackers {
    fn poll(&mut self) -> Option<PointerDrag> {
        if is_mouse_button_pressed(MouseButton::Left) {
            self.mouse.press(mouse_position());
        }
        let mouse_drag = if is_mouse_button_released(MouseButton::Left) {
            self.mouse.release(mouse_position())
        } else {
            None
        };

        let mut touch_drag = None;
        for touch in touches() {
            let position = (touch.position.x, touch.position.y);
            match touch.phase {
                TouchPhase::Started => self.touch.press(position),
                TouchPhase::Ended => touch_drag = touch_drag.or(self.touch.release(position)),
                TouchPhase::Cancelled => self.touch.cancel(),
                TouchPhase::Moved | TouchPhase::Stationary => {}
            }
        }

        mouse_drag.or(touch_drag)
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self { swap_interval } = self;

        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: 600,
            window_height: 600,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        info!("opening {}x{} window", config.window_width, config.window_height);
        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let mut pointers = PointerTrackers::default();
            let background = to_macroquad_color(clear_color);
            simulate_mouse_with_touch(false);

            loop {
                let keyboard = KeyboardShortcuts::poll();
                let quit_requested = keyboard.quit_requested;

                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));
                let frame_input = FrameInput {
                    keys: keyboard.keys,
                    drag: pointers.poll(),
                    quit: quit_requested,
                };
                update_scene(frame_dt, frame_input, &mut scene);
                if quit_requested {
                    debug!("escape pressed, leaving render loop");
                    break;
                }

                macroquad::window::clear_background(background);
                let metrics = SceneMetrics::from_grid(
                    &scene.grid,
                    macroquad::window::screen_width(),
                    macroquad::window::screen_height(),
                );
                draw_board(&scene.grid, &metrics);
                draw_tiles(&scene.tiles, &scene.grid, &metrics);
                if let Some(notice) = &scene.notice {
                    draw_notice(notice, &scene.grid, &metrics);
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

/// Screen-space placement of the board for the current window size.
#[derive(Clone, Copy, Debug, PartialEq)]
struct SceneMetrics {
    scale: f32,
    offset: Vec2,
}

impl SceneMetrics {
    fn from_grid(grid: &GridPresentation, screen_width: f32, screen_height: f32) -> Self {
        let side = grid.side_length();
        let available = screen_width.min(screen_height).max(0.0) * BOARD_SCREEN_FRACTION;
        let scale = if side <= f32::EPSILON {
            1.0
        } else {
            available / side
        };

        let scaled = side * scale;
        let offset = Vec2::new(
            ((screen_width - scaled) * 0.5).max(0.0),
            ((screen_height - scaled) * 0.5).max(0.0),
        );

        Self { scale, offset }
    }

    /// Screen position of a board-local point.
    fn to_screen(&self, local: Vec2) -> Vec2 {
        self.offset + local * self.scale
    }
}

/// Square drawn for a tile, shrunk around its cell center while spawning.
fn tile_rectangle(
    tile: &TilePresentation,
    grid: &GridPresentation,
    metrics: &SceneMetrics,
) -> (Vec2, f32) {
    let cell = grid.cell_length * metrics.scale;
    let center = metrics.to_screen(grid.cell_origin(tile.position)) + Vec2::splat(cell * 0.5);
    let side = cell * tile.scale.clamp(0.0, 1.0);
    (center - Vec2::splat(side * 0.5), side)
}

/// Font size for a tile label; longer numbers get smaller text so they fit.
fn label_font_size(label: &str, side: f32) -> u16 {
    let digits = label.chars().count().max(2) as f32;
    (side * 1.1 / digits).clamp(1.0, f32::from(u16::MAX)) as u16
}

fn draw_board(grid: &GridPresentation, metrics: &SceneMetrics) {
    let origin = metrics.to_screen(Vec2::ZERO);
    let side = grid.side_length() * metrics.scale;
    draw_rectangle(origin.x, origin.y, side, side, to_macroquad_color(grid.board_color));

    let cell = grid.cell_length * metrics.scale;
    let cell_color = to_macroquad_color(grid.cell_color);
    let cells = grid.size.get();
    for row in 0..cells {
        for column in 0..cells {
            let corner = metrics.to_screen(grid.cell_origin(Vec2::new(column as f32, row as f32)));
            draw_rectangle(corner.x, corner.y, cell, cell, cell_color);
        }
    }
}

fn draw_tiles(tiles: &[TilePresentation], grid: &GridPresentation, metrics: &SceneMetrics) {
    for tile in tiles {
        let (corner, side) = tile_rectangle(tile, grid, metrics);
        if side <= f32::EPSILON {
            continue;
        }
        draw_rectangle(
            corner.x,
            corner.y,
            side,
            side,
            to_macroquad_color(tile.colors.background),
        );

        let label = tile.value.get().to_string();
        let font_size = label_font_size(&label, side);
        let dimensions = measure_text(&label, None, font_size, 1.0);
        let center = corner + Vec2::splat(side * 0.5);
        draw_text(
            &label,
            center.x - dimensions.width * 0.5,
            center.y - dimensions.height * 0.5 + dimensions.offset_y,
            f32::from(font_size),
            to_macroquad_color(tile.colors.text),
        );
    }
}

fn draw_notice(notice: &str, grid: &GridPresentation, metrics: &SceneMetrics) {
    let origin = metrics.to_screen(Vec2::ZERO);
    let side = grid.side_length() * metrics.scale;
    draw_rectangle(origin.x, origin.y, side, side, to_macroquad_color(NOTICE_VEIL));

    let font_size = (side * 0.12).clamp(1.0, f32::from(u16::MAX)) as u16;
    let dimensions = measure_text(notice, None, font_size, 1.0);
    draw_text(
        notice,
        origin.x + (side - dimensions.width) * 0.5,
        origin.y + (side - dimensions.height) * 0.5 + dimensions.offset_y,
        f32::from(font_size),
        to_macroquad_color(NOTICE_TEXT),
    );
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}
