#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tile Slide engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems and
//! presentation layers to react to. Systems consume event streams, query
//! immutable snapshots, and respond exclusively with new command batches.

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Tile Slide.";

/// Message presented to the player once no direction has a legal move.
pub const GAME_OVER_MESSAGE: &str = "Try again!";

/// Number of tiles placed on the board when a session starts.
pub const OPENING_TILE_COUNT: u32 = 2;

/// Commands that express all permissible world mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Rebuilds the board with the provided side length and starts a new session.
    ConfigureGrid {
        /// Number of cells along each edge of the square board.
        size: GridSize,
    },
    /// Requests that every tile slides toward the provided edge.
    Slide {
        /// Edge the tiles travel toward.
        direction: Direction,
    },
    /// Places a freshly generated tile into an empty cell.
    SpawnTile {
        /// Cell that receives the tile.
        cell: CellCoord,
        /// Value carried by the new tile.
        value: TileValue,
    },
    /// Signals that the visual slide of a relocated tile reached its destination.
    FinishTransition {
        /// Tile whose transition completed.
        tile: TileId,
    },
    /// Signals that the appearance animation of a spawned tile completed.
    FinishSpawnAnimation {
        /// Tile whose spawn animation completed.
        tile: TileId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that the board was rebuilt and a new session started.
    GridConfigured {
        /// Side length of the rebuilt board.
        size: GridSize,
    },
    /// Announces that the turn engine entered a new phase.
    PhaseChanged {
        /// Phase that became active.
        phase: TurnPhase,
    },
    /// Reports that a slide request was refused before any mutation happened.
    SlideRejected {
        /// Direction requested by the player.
        direction: Direction,
        /// Reason the slide was refused.
        reason: SlideRejection,
    },
    /// Confirms that a tile changed cells during a slide.
    TileMoved {
        /// Tile that travelled.
        tile: TileId,
        /// Cell the tile occupied before the slide.
        from: CellCoord,
        /// Cell the tile occupies after the slide.
        to: CellCoord,
        /// Whether the tile is queued to merge into the destination's tile.
        merging: bool,
    },
    /// Confirms that two tiles merged once every slide transition settled.
    TilesMerged {
        /// Tile that stays in play and carries the doubled value.
        survivor: TileId,
        /// Tile that was consumed by the merge and removed from play.
        absorbed: TileId,
        /// Cell hosting the merged tile.
        cell: CellCoord,
        /// Value of the surviving tile after the merge.
        value: TileValue,
    },
    /// Requests that a spawning system provides one new tile.
    SpawnRequested,
    /// Confirms that a new tile entered play.
    TileSpawned {
        /// Identifier allocated to the new tile.
        tile: TileId,
        /// Cell that received the tile.
        cell: CellCoord,
        /// Value carried by the tile.
        value: TileValue,
    },
    /// Reports that a spawn request violated the spawn preconditions.
    SpawnRejected {
        /// Cell named by the rejected request.
        cell: CellCoord,
        /// Reason the spawn was refused.
        reason: SpawnRejection,
    },
    /// Announces that no direction has a legal move left.
    GameOver,
}

/// Cardinal directions a slide may travel toward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Tiles travel toward row zero.
    Up,
    /// Tiles travel toward the last row.
    Down,
    /// Tiles travel toward column zero.
    Left,
    /// Tiles travel toward the last column.
    Right,
}

impl Direction {
    /// Every direction in the order used by the terminal check.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Parses the single-letter notation used by scripted replays.
    #[must_use]
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'U' => Some(Self::Up),
            'D' => Some(Self::Down),
            'L' => Some(Self::Left),
            'R' => Some(Self::Right),
            _ => None,
        }
    }
}

/// Phases of the turn state machine driven by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnPhase {
    /// Awaiting the next slide request.
    Idle,
    /// Tiles were relinked and their transitions are still running.
    Sliding,
    /// Queued merges are being resolved.
    Merging,
    /// Awaiting a spawn command for the next tile.
    Spawning,
    /// Checking whether any direction still has a legal move.
    TerminalCheck,
    /// No legal move remains; the phase is absorbing.
    GameOver,
}

/// Visual state of a single tile as tracked by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileMotion {
    /// The tile rests in its cell.
    Idle,
    /// The tile is playing its appearance animation.
    Spawning,
    /// The tile slides toward an empty destination cell.
    Moving,
    /// The tile slides into a cell whose tile it will merge with.
    Merging,
}

/// Reasons a slide request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlideRejection {
    /// A previous turn has not finished yet.
    TurnInProgress,
    /// No tile can travel in the requested direction.
    NoLegalMove,
    /// The session ended because no direction has a legal move.
    GameOver,
}

/// Reasons a spawn request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnRejection {
    /// The turn engine is not waiting for a new tile.
    NotAwaitingSpawn,
    /// The requested cell lies outside the board.
    OutOfBounds,
    /// The requested cell already holds a tile.
    Occupied,
}

/// Side length of the square board, measured in cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridSize(u32);

impl GridSize {
    /// Smallest supported board edge.
    pub const MIN: u32 = 2;
    /// Largest supported board edge.
    pub const MAX: u32 = 8;
    /// Board edge used by the default configuration.
    pub const DEFAULT: GridSize = GridSize(4);

    /// Creates a grid size, returning `None` outside `MIN..=MAX`.
    #[must_use]
    pub const fn new(cells: u32) -> Option<Self> {
        if cells >= Self::MIN && cells <= Self::MAX {
            Some(Self(cells))
        } else {
            None
        }
    }

    /// Number of cells along each edge.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Total number of cells on the board.
    #[must_use]
    pub const fn cell_count(&self) -> usize {
        (self.0 * self.0) as usize
    }

    /// Reports whether the coordinate lies on the board.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.0 && cell.row() < self.0
    }

    /// Row-major index of the provided cell, if it lies on the board.
    #[must_use]
    pub const fn index_of(&self, cell: CellCoord) -> Option<usize> {
        if self.contains(cell) {
            Some((cell.row() * self.0 + cell.column()) as usize)
        } else {
            None
        }
    }
}

impl Default for GridSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Location of a single board cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new cell coordinate.
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
}

/// Unique identifier assigned to a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(u32);

impl TileId {
    /// Creates a new tile identifier with the provided numeric value.
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

/// Face value carried by a tile. Always a power of two no smaller than two.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileValue(u32);

impl TileValue {
    /// Smallest spawnable value.
    pub const TWO: TileValue = TileValue(2);
    /// Larger spawnable value.
    pub const FOUR: TileValue = TileValue(4);

    /// Creates a tile value, returning `None` unless `value` is a power of two above one.
    #[must_use]
    pub const fn new(value: u32) -> Option<Self> {
        if value >= 2 && value.is_power_of_two() {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Numeric face value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Base-two exponent of the value (`2` yields `1`).
    #[must_use]
    pub const fn exponent(&self) -> u32 {
        self.0.trailing_zeros()
    }

    /// Value produced when two tiles of this value merge. Saturates at the largest power of two.
    #[must_use]
    pub const fn doubled(&self) -> Self {
        match self.0.checked_mul(2) {
            Some(value) => Self(value),
            None => Self(self.0),
        }
    }
}

/// Key identity reported by input adapters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputKey {
    /// Up arrow key.
    ArrowUp,
    /// Down arrow key.
    ArrowDown,
    /// Left arrow key.
    ArrowLeft,
    /// Right arrow key.
    ArrowRight,
    /// Key producing a printable character.
    Character(char),
    /// Any other key.
    Other,
}

/// Pointer or touch displacement captured between press and release.
///
/// Coordinates are screen-space, with `y` growing downward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerDrag {
    /// Position where the press started.
    pub start: (f32, f32),
    /// Position where the press ended.
    pub end: (f32, f32),
}

impl PointerDrag {
    /// Creates a drag descriptor from start and end positions.
    #[must_use]
    pub const fn new(start: (f32, f32), end: (f32, f32)) -> Self {
        Self { start, end }
    }

    /// Horizontal and vertical displacement from start to end.
    #[must_use]
    pub fn displacement(&self) -> (f32, f32) {
        (self.end.0 - self.start.0, self.end.1 - self.start.1)
    }
}

/// Immutable representation of a single tile's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileSnapshot {
    /// Unique identifier assigned to the tile.
    pub id: TileId,
    /// Face value of the tile.
    pub value: TileValue,
    /// Cell the tile is linked to.
    pub cell: CellCoord,
    /// Visual state tracked for the tile.
    pub motion: TileMotion,
    /// Whether the tile waits in a cell's merge slot.
    pub pending_merge: bool,
}

/// Read-only snapshot describing all tiles in play.
#[derive(Clone, Debug, Default)]
pub struct TileView {
    snapshots: Vec<TileSnapshot>,
}

impl TileView {
    /// Creates a new tile view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TileSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tile snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &TileSnapshot> {
        self.snapshots.iter()
    }

    /// Number of tiles captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view captured no tiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TileSnapshot> {
        self.snapshots
    }
}
