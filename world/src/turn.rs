//! Slide, merge and movability rules evaluated over the grid's directional groupings.

use tile_slide_core::{CellCoord, Direction, TileId, TileMotion};

use crate::grid::{Grid, Merge, TileArena};

/// Ownership transfer performed for a single tile during a slide.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Relocation {
    pub(crate) tile: TileId,
    pub(crate) from: CellCoord,
    pub(crate) to: CellCoord,
    pub(crate) merging: bool,
}

/// Reports whether any tile can travel toward `direction`. Never mutates the grid.
pub(crate) fn can_move(grid: &Grid, tiles: &TileArena, direction: Direction) -> bool {
    grid.groups_toward(direction)
        .iter()
        .any(|group| can_move_in_group(grid, tiles, group))
}

fn can_move_in_group(grid: &Grid, tiles: &TileArena, group: &[usize]) -> bool {
    group.windows(2).any(|pair| {
        let target = grid.cell(pair[0]);
        grid.cell(pair[1])
            .linked_tile()
            .and_then(|id| tiles.get(id))
            .map_or(false, |tile| target.can_accept(tile, tiles))
    })
}

/// Relinks every tile as far toward `direction` as the acceptance rules allow.
///
/// Tiles that reach an occupied cell are queued in its merge slot; values change only
/// when [`resolve_merges`] runs.
pub(crate) fn slide(grid: &mut Grid, tiles: &mut TileArena, direction: Direction) -> Vec<Relocation> {
    let mut relocations = Vec::new();
    for group in grid.groups_toward(direction) {
        slide_group(grid, tiles, &group, &mut relocations);
    }
    relocations
}

fn slide_group(
    grid: &mut Grid,
    tiles: &mut TileArena,
    group: &[usize],
    relocations: &mut Vec<Relocation>,
) {
    for position in 1..group.len() {
        let source = group[position];
        let Some(tile_id) = grid.cell(source).linked_tile() else {
            continue;
        };
        let Some(tile) = tiles.get(tile_id) else {
            continue;
        };

        // Farthest slot wins; the scan stops at the first refusal.
        let mut target = None;
        for &candidate in group[..position].iter().rev() {
            if !grid.cell(candidate).can_accept(tile, tiles) {
                break;
            }
            target = Some(candidate);
        }

        let Some(target) = target else {
            continue;
        };

        let from = grid.cell(source).coord();
        let merging = !grid.cell(target).is_empty();
        let Some(tile) = tiles.get_mut(tile_id) else {
            continue;
        };

        if merging {
            grid.cell_mut(target).link_tile_for_merge(tile);
            tile.motion = TileMotion::Merging;
        } else {
            grid.cell_mut(target).link_tile(tile);
            tile.motion = TileMotion::Moving;
        }
        let _ = grid.cell_mut(source).unlink_tile();

        relocations.push(Relocation {
            tile: tile_id,
            from,
            to: tile.cell,
            merging,
        });
    }
}

/// Resolves every queued merge across the whole grid in row-major order.
pub(crate) fn resolve_merges(grid: &mut Grid, tiles: &mut TileArena) -> Vec<Merge> {
    grid.cells_mut()
        .iter_mut()
        .filter(|cell| cell.has_tile_for_merge())
        .filter_map(|cell| cell.merge_tiles(tiles))
        .collect()
}
