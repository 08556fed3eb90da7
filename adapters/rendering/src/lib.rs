#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Tile Slide adapters.

mod animation;

use anyhow::Result as AnyResult;
use glam::Vec2;
use std::{error::Error, fmt, time::Duration};
use tile_slide_core::{GridSize, InputKey, PointerDrag, TileId, TileValue};

pub use self::animation::{AnimationCompletion, AnimationSettings, TileAnimations};

/// Hue shared by every tile, in degrees.
pub const TILE_HUE: f32 = 200.0;

/// Saturation shared by every tile, in the range 0.0..=1.0.
pub const TILE_SATURATION: f32 = 0.5;

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

    /// Creates an opaque color from hue (degrees), saturation and lightness (0.0..=1.0).
    #[must_use]
    pub fn from_hsl(hue: f32, saturation: f32, lightness: f32) -> Self {
        let saturation = saturation.clamp(0.0, 1.0);
        let lightness = lightness.clamp(0.0, 1.0);
        let hue = hue.rem_euclid(360.0) / 30.0;
        let amplitude = saturation * lightness.min(1.0 - lightness);
        let channel = |offset: f32| {
            let k = (offset + hue) % 12.0;
            lightness - amplitude * (k - 3.0).min(9.0 - k).clamp(-1.0, 1.0)
        };

        Self::new(channel(0.0), channel(8.0), channel(4.0), 1.0)
    }
}

/// Background and label colors used for a single tile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileColors {
    /// Fill color of the tile body.
    pub background: Color,
    /// Color of the value label.
    pub text: Color,
}

/// Derives the palette for a tile value.
///
/// Background lightness starts at 100% and drops by 9 percentage points per
/// doubling; labels switch to a light color once the background is darker
/// than 10%.
#[must_use]
pub fn tile_colors(value: TileValue) -> TileColors {
    let lightness = (100.0 - value.exponent() as f32 * 9.0).max(0.0);
    let text_lightness = if lightness < 10.0 { 90.0 } else { 10.0 };

    TileColors {
        background: Color::from_hsl(TILE_HUE, TILE_SATURATION, lightness / 100.0),
        text: Color::from_hsl(TILE_HUE, TILE_SATURATION, text_lightness / 100.0),
    }
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Keys pressed during this frame, in the order they were observed.
    pub keys: Vec<InputKey>,
    /// Pointer or touch drag completed during this frame.
    pub drag: Option<PointerDrag>,
    /// Whether the player asked to close the game.
    pub quit: bool,
}

/// Describes the square board that adapters render.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridPresentation {
    /// Number of cells along each edge of the board.
    pub size: GridSize,
    /// Side length of a single cell in screen units.
    pub cell_length: f32,
    /// Spacing between neighbouring cells and around the board edge.
    pub gap: f32,
    /// Fill color of the board behind the cells.
    pub board_color: Color,
    /// Fill color of an empty cell.
    pub cell_color: Color,
}

impl GridPresentation {
    /// Board color used when nothing else is configured.
    pub const DEFAULT_BOARD_COLOR: Color = Color::from_rgb_u8(0xcc, 0xcc, 0xcc);

    /// Empty cell color used when nothing else is configured.
    pub const DEFAULT_CELL_COLOR: Color = Color::from_rgb_u8(0xaa, 0xaa, 0xaa);

    /// Creates a new board descriptor.
    ///
    /// Returns an error when `cell_length` is not a positive finite number or
    /// `gap` is negative.
    pub fn new(
        size: GridSize,
        cell_length: f32,
        gap: f32,
    ) -> std::result::Result<Self, RenderingError> {
        if !(cell_length.is_finite() && cell_length > 0.0) {
            return Err(RenderingError::InvalidCellLength { cell_length });
        }
        if !(gap.is_finite() && gap >= 0.0) {
            return Err(RenderingError::InvalidGap { gap });
        }

        Ok(Self {
            size,
            cell_length,
            gap,
            board_color: Self::DEFAULT_BOARD_COLOR,
            cell_color: Self::DEFAULT_CELL_COLOR,
        })
    }

    /// Total side length of the board including the outer gap.
    #[must_use]
    pub fn side_length(&self) -> f32 {
        let cells = self.size.get() as f32;
        cells * self.cell_length + (cells + 1.0) * self.gap
    }

    /// Top-left corner, relative to the board origin, of a cell-space position.
    ///
    /// Fractional positions are accepted so in-flight tiles can be placed between cells.
    #[must_use]
    pub fn cell_origin(&self, position: Vec2) -> Vec2 {
        let stride = self.cell_length + self.gap;
        Vec2::splat(self.gap) + position * stride
    }
}

/// Tile as it should appear on the current frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TilePresentation {
    /// Identifier of the tile.
    pub id: TileId,
    /// Value printed on the tile.
    pub value: TileValue,
    /// Position in cell units (`x` is the column, `y` the row).
    pub position: Vec2,
    /// Scale applied around the cell center, reaching 1.0 once fully shown.
    pub scale: f32,
    /// Palette derived from the value.
    pub colors: TileColors,
}

/// Scene description combining the board, its tiles and an optional notice.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Board drawn beneath the tiles.
    pub grid: GridPresentation,
    /// Tiles currently visible, ordered by identifier.
    pub tiles: Vec<TilePresentation>,
    /// Message overlaid on the board, such as the game over notice.
    pub notice: Option<String>,
}

impl Scene {
    /// Creates a new scene descriptor.
    #[must_use]
    pub fn new(grid: GridPresentation, tiles: Vec<TilePresentation>, notice: Option<String>) -> Self {
        Self { grid, tiles, notice }
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

/// Rendering backend capable of presenting Tile Slide scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the elapsed frame time,
    /// per-frame input captured by the adapter, and may mutate the scene before
    /// it is rendered.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Cells must have a positive, finite side length.
    InvalidCellLength {
        /// Provided length that failed validation.
        cell_length: f32,
    },
    /// Gaps between cells cannot be negative.
    InvalidGap {
        /// Provided gap that failed validation.
        gap: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCellLength { cell_length } => {
                write!(f, "cell_length must be positive (received {cell_length})")
            }
            Self::InvalidGap { gap } => {
                write!(f, "gap must not be negative (received {gap})")
            }
        }
    }
}

impl Error for RenderingError {}
