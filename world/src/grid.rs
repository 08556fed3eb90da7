//! Spatial index over the board cells and the arena that owns every tile.

use std::collections::BTreeMap;

use rand::Rng;
use thiserror::Error;
use tile_slide_core::{CellCoord, Direction, GridSize, TileId, TileMotion, TileValue};

/// Failures surfaced by grid lookups.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum GridError {
    /// Every cell holds a tile, so no position can host a new one.
    #[error("no empty cell is available for a new tile")]
    NoEmptyCell,
}

/// Game piece owned by exactly one cell at a time.
#[derive(Clone, Debug)]
pub(crate) struct Tile {
    pub(crate) id: TileId,
    pub(crate) value: TileValue,
    pub(crate) cell: CellCoord,
    pub(crate) motion: TileMotion,
}

/// Arena holding every tile in play, keyed by generated identifiers.
#[derive(Clone, Debug, Default)]
pub(crate) struct TileArena {
    next_id: u32,
    tiles: BTreeMap<TileId, Tile>,
}

impl TileArena {
    /// Creates a tile that starts its spawn animation. Identifiers are never reused.
    pub(crate) fn insert(&mut self, value: TileValue, cell: CellCoord) -> &mut Tile {
        let id = TileId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.tiles.entry(id).or_insert(Tile {
            id,
            value,
            cell,
            motion: TileMotion::Spawning,
        })
    }

    pub(crate) fn get(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.tiles.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: TileId) -> Option<Tile> {
        self.tiles.remove(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    pub(crate) fn clear(&mut self) {
        self.tiles.clear();
    }
}

/// Outcome of resolving a queued merge inside a single cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Merge {
    pub(crate) survivor: TileId,
    pub(crate) absorbed: TileId,
    pub(crate) cell: CellCoord,
    pub(crate) value: TileValue,
}

/// Single board slot holding at most one tile plus one tile queued to merge into it.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    coord: CellCoord,
    linked_tile: Option<TileId>,
    linked_tile_for_merge: Option<TileId>,
}

impl Cell {
    fn new(coord: CellCoord) -> Self {
        Self {
            coord,
            linked_tile: None,
            linked_tile_for_merge: None,
        }
    }

    pub(crate) fn coord(&self) -> CellCoord {
        self.coord
    }

    pub(crate) fn linked_tile(&self) -> Option<TileId> {
        self.linked_tile
    }

    pub(crate) fn linked_tile_for_merge(&self) -> Option<TileId> {
        self.linked_tile_for_merge
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.linked_tile.is_none()
    }

    /// Takes exclusive ownership of the tile and moves it onto this cell.
    pub(crate) fn link_tile(&mut self, tile: &mut Tile) {
        self.linked_tile = Some(tile.id);
        tile.cell = self.coord;
    }

    /// Releases the tile without removing it from play.
    pub(crate) fn unlink_tile(&mut self) -> Option<TileId> {
        self.linked_tile.take()
    }

    /// Queues the tile to merge into the current occupant. Values stay untouched until
    /// [`Cell::merge_tiles`] runs.
    pub(crate) fn link_tile_for_merge(&mut self, tile: &mut Tile) {
        self.linked_tile_for_merge = Some(tile.id);
        tile.cell = self.coord;
    }

    pub(crate) fn has_tile_for_merge(&self) -> bool {
        self.linked_tile_for_merge.is_some()
    }

    /// Reports whether the incoming tile may enter this cell.
    ///
    /// An occupied cell accepts only an equal value and only while its merge slot
    /// is free, which caps every cell at one merge per turn.
    pub(crate) fn can_accept(&self, incoming: &Tile, tiles: &TileArena) -> bool {
        let Some(occupant) = self.linked_tile else {
            return true;
        };

        self.linked_tile_for_merge.is_none()
            && tiles
                .get(occupant)
                .map_or(false, |tile| tile.value == incoming.value)
    }

    /// Doubles the occupant, removes the queued tile from play and clears the merge slot.
    pub(crate) fn merge_tiles(&mut self, tiles: &mut TileArena) -> Option<Merge> {
        let survivor = self.linked_tile?;
        let absorbed = self.linked_tile_for_merge.take()?;
        let _ = tiles.remove(absorbed);
        let tile = tiles.get_mut(survivor)?;
        tile.value = tile.value.doubled();
        tile.motion = TileMotion::Idle;

        Some(Merge {
            survivor,
            absorbed,
            cell: self.coord,
            value: tile.value,
        })
    }
}

/// Fixed square matrix of cells stored in row-major order.
#[derive(Clone, Debug)]
pub(crate) struct Grid {
    size: GridSize,
    cells: Vec<Cell>,
}

impl Grid {
    pub(crate) fn new(size: GridSize) -> Self {
        let edge = size.get();
        let mut cells = Vec::with_capacity(size.cell_count());
        for row in 0..edge {
            for column in 0..edge {
                cells.push(Cell::new(CellCoord::new(column, row)));
            }
        }

        Self { size, cells }
    }

    pub(crate) fn size(&self) -> GridSize {
        self.size
    }

    pub(crate) fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Cell at a row-major index. Indices originate from this grid's groupings.
    pub(crate) fn cell(&self, index: usize) -> &Cell {
        &self.cells[index]
    }

    pub(crate) fn cell_mut(&mut self, index: usize) -> &mut Cell {
        &mut self.cells[index]
    }

    pub(crate) fn cell_at(&self, coord: CellCoord) -> Option<&Cell> {
        self.size.index_of(coord).map(|index| &self.cells[index])
    }

    pub(crate) fn empty_cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.cells
            .iter()
            .filter(|cell| cell.is_empty())
            .map(Cell::coord)
    }

    /// Picks a uniformly random cell that holds no tile.
    pub(crate) fn random_empty_cell<R>(&self, rng: &mut R) -> Result<CellCoord, GridError>
    where
        R: Rng + ?Sized,
    {
        let empty: Vec<CellCoord> = self.empty_cells().collect();
        if empty.is_empty() {
            return Err(GridError::NoEmptyCell);
        }

        Ok(empty[rng.gen_range(0..empty.len())])
    }

    /// Rows ordered left to right; sliding toward index zero moves tiles left.
    pub(crate) fn cells_grouped_by_row(&self) -> Vec<Vec<usize>> {
        self.groups(|major, minor| (minor, major))
    }

    /// Rows ordered right to left; sliding toward index zero moves tiles right.
    pub(crate) fn cells_grouped_by_reversed_row(&self) -> Vec<Vec<usize>> {
        let last = self.size.get() - 1;
        self.groups(|major, minor| (last - minor, major))
    }

    /// Columns ordered top to bottom; sliding toward index zero moves tiles up.
    pub(crate) fn cells_grouped_by_column(&self) -> Vec<Vec<usize>> {
        self.groups(|major, minor| (major, minor))
    }

    /// Columns ordered bottom to top; sliding toward index zero moves tiles down.
    pub(crate) fn cells_grouped_by_reversed_column(&self) -> Vec<Vec<usize>> {
        let last = self.size.get() - 1;
        self.groups(|major, minor| (major, last - minor))
    }

    /// Grouping whose index zero is the far edge in the direction of travel.
    pub(crate) fn groups_toward(&self, direction: Direction) -> Vec<Vec<usize>> {
        match direction {
            Direction::Up => self.cells_grouped_by_column(),
            Direction::Down => self.cells_grouped_by_reversed_column(),
            Direction::Left => self.cells_grouped_by_row(),
            Direction::Right => self.cells_grouped_by_reversed_row(),
        }
    }

    fn groups<F>(&self, coord_for: F) -> Vec<Vec<usize>>
    where
        F: Fn(u32, u32) -> (u32, u32),
    {
        let edge = self.size.get();
        (0..edge)
            .map(|major| {
                (0..edge)
                    .filter_map(|minor| {
                        let (column, row) = coord_for(major, minor);
                        self.size.index_of(CellCoord::new(column, row))
                    })
                    .collect()
            })
            .collect()
    }
}
