#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative board state and turn engine for Tile Slide.
//!
//! The world owns the grid, every cell-to-tile link and the turn state machine.
//! A turn starts with [`Command::Slide`], waits until every relocated tile
//! reports [`Command::FinishTransition`], resolves merges in a single global
//! pass, asks for one new tile through [`Event::SpawnRequested`] and finally
//! checks whether any direction still has a legal move.

mod grid;
mod turn;

use std::collections::BTreeSet;

use log::{debug, info, warn};
use tile_slide_core::{
    CellCoord, Command, Direction, Event, GridSize, SlideRejection, SpawnRejection, TileId,
    TileMotion, TileValue, TurnPhase, OPENING_TILE_COUNT, WELCOME_BANNER,
};

use self::grid::{Grid, TileArena};

pub use self::grid::GridError;

/// Represents the authoritative Tile Slide world state.
#[derive(Clone, Debug)]
pub struct World {
    banner: &'static str,
    grid: Grid,
    tiles: TileArena,
    phase: TurnPhase,
    in_flight: BTreeSet<TileId>,
    pending_spawns: u32,
    last_spawned: Option<TileId>,
}

impl World {
    /// Creates an empty world on the default board. A session starts with
    /// [`Command::ConfigureGrid`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            banner: WELCOME_BANNER,
            grid: Grid::new(GridSize::DEFAULT),
            tiles: TileArena::default(),
            phase: TurnPhase::Idle,
            in_flight: BTreeSet::new(),
            pending_spawns: 0,
            last_spawned: None,
        }
    }

    fn enter_phase(&mut self, phase: TurnPhase, out_events: &mut Vec<Event>) {
        debug!("turn phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
        out_events.push(Event::PhaseChanged { phase });
    }

    fn configure(&mut self, size: GridSize, out_events: &mut Vec<Event>) {
        info!("starting a {0}x{0} session", size.get());
        self.grid = Grid::new(size);
        self.tiles.clear();
        self.in_flight.clear();
        self.last_spawned = None;
        self.pending_spawns = OPENING_TILE_COUNT;
        out_events.push(Event::GridConfigured { size });
        self.enter_phase(TurnPhase::Spawning, out_events);
        out_events.push(Event::SpawnRequested);
    }

    fn slide(&mut self, direction: Direction, out_events: &mut Vec<Event>) {
        let rejection = match self.phase {
            TurnPhase::Idle => None,
            TurnPhase::GameOver => Some(SlideRejection::GameOver),
            _ => Some(SlideRejection::TurnInProgress),
        };
        if let Some(reason) = rejection {
            debug!("slide {direction:?} rejected: {reason:?}");
            out_events.push(Event::SlideRejected { direction, reason });
            return;
        }

        if !turn::can_move(&self.grid, &self.tiles, direction) {
            out_events.push(Event::SlideRejected {
                direction,
                reason: SlideRejection::NoLegalMove,
            });
            return;
        }

        self.enter_phase(TurnPhase::Sliding, out_events);
        for relocation in turn::slide(&mut self.grid, &mut self.tiles, direction) {
            let _ = self.in_flight.insert(relocation.tile);
            out_events.push(Event::TileMoved {
                tile: relocation.tile,
                from: relocation.from,
                to: relocation.to,
                merging: relocation.merging,
            });
        }

        if self.in_flight.is_empty() {
            self.settle_slide(out_events);
        }
    }

    fn finish_transition(&mut self, tile: TileId, out_events: &mut Vec<Event>) {
        if self.phase != TurnPhase::Sliding || !self.in_flight.remove(&tile) {
            debug!("ignoring transition end for tile {}", tile.get());
            return;
        }

        if let Some(tile) = self.tiles.get_mut(tile) {
            tile.motion = TileMotion::Idle;
        }

        if self.in_flight.is_empty() {
            self.settle_slide(out_events);
        }
    }

    fn settle_slide(&mut self, out_events: &mut Vec<Event>) {
        self.enter_phase(TurnPhase::Merging, out_events);
        for merge in turn::resolve_merges(&mut self.grid, &mut self.tiles) {
            out_events.push(Event::TilesMerged {
                survivor: merge.survivor,
                absorbed: merge.absorbed,
                cell: merge.cell,
                value: merge.value,
            });
        }

        self.pending_spawns = 1;
        self.enter_phase(TurnPhase::Spawning, out_events);
        out_events.push(Event::SpawnRequested);
    }

    fn spawn(&mut self, cell: CellCoord, value: TileValue, out_events: &mut Vec<Event>) {
        if let Err(reason) = self.check_spawn(cell) {
            warn!(
                "spawn at ({}, {}) rejected: {reason:?}",
                cell.column(),
                cell.row()
            );
            out_events.push(Event::SpawnRejected { cell, reason });
            return;
        }
        let Some(index) = self.grid.size().index_of(cell) else {
            return;
        };

        let tile = self.tiles.insert(value, cell);
        self.grid.cell_mut(index).link_tile(tile);
        let tile = tile.id;
        out_events.push(Event::TileSpawned { tile, cell, value });

        self.last_spawned = Some(tile);
        self.pending_spawns = self.pending_spawns.saturating_sub(1);
        if self.pending_spawns > 0 {
            out_events.push(Event::SpawnRequested);
            return;
        }

        self.terminal_check(out_events);
    }

    fn check_spawn(&self, cell: CellCoord) -> Result<(), SpawnRejection> {
        if self.phase != TurnPhase::Spawning || self.pending_spawns == 0 {
            return Err(SpawnRejection::NotAwaitingSpawn);
        }

        match self.grid.cell_at(cell) {
            None => Err(SpawnRejection::OutOfBounds),
            Some(slot) if !slot.is_empty() => Err(SpawnRejection::Occupied),
            Some(_) => Ok(()),
        }
    }

    fn terminal_check(&mut self, out_events: &mut Vec<Event>) {
        self.enter_phase(TurnPhase::TerminalCheck, out_events);
        if self.has_legal_move() {
            self.enter_phase(TurnPhase::Idle, out_events);
            return;
        }

        info!("no legal move remains");
        let awaiting_animation = self
            .last_spawned
            .and_then(|id| self.tiles.get(id))
            .map_or(false, |tile| tile.motion == TileMotion::Spawning);
        if !awaiting_animation {
            self.finish_game(out_events);
        }
    }

    fn finish_spawn_animation(&mut self, tile: TileId, out_events: &mut Vec<Event>) {
        let Some(spawned) = self.tiles.get_mut(tile) else {
            debug!("ignoring spawn animation end for missing tile {}", tile.get());
            return;
        };
        if spawned.motion == TileMotion::Spawning {
            spawned.motion = TileMotion::Idle;
        }

        if self.phase == TurnPhase::TerminalCheck && self.last_spawned == Some(tile) {
            self.finish_game(out_events);
        }
    }

    fn finish_game(&mut self, out_events: &mut Vec<Event>) {
        self.enter_phase(TurnPhase::GameOver, out_events);
        out_events.push(Event::GameOver);
    }

    fn has_legal_move(&self) -> bool {
        Direction::ALL
            .iter()
            .any(|direction| turn::can_move(&self.grid, &self.tiles, *direction))
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureGrid { size } => world.configure(size, out_events),
        Command::Slide { direction } => world.slide(direction, out_events),
        Command::SpawnTile { cell, value } => world.spawn(cell, value, out_events),
        Command::FinishTransition { tile } => world.finish_transition(tile, out_events),
        Command::FinishSpawnAnimation { tile } => world.finish_spawn_animation(tile, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::collections::BTreeSet;

    use rand::Rng;
    use tile_slide_core::{
        CellCoord, Direction, GridSize, TileSnapshot, TileValue, TileView, TurnPhase,
    };

    use super::{turn, GridError, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Side length of the active board.
    #[must_use]
    pub fn grid_size(world: &World) -> GridSize {
        world.grid.size()
    }

    /// Phase the turn engine currently occupies.
    #[must_use]
    pub fn phase(world: &World) -> TurnPhase {
        world.phase
    }

    /// Reports whether the world would accept a slide right now.
    #[must_use]
    pub fn accepts_input(world: &World) -> bool {
        world.phase == TurnPhase::Idle
    }

    /// Reports whether any tile can travel toward `direction`.
    #[must_use]
    pub fn can_move(world: &World, direction: Direction) -> bool {
        turn::can_move(&world.grid, &world.tiles, direction)
    }

    /// Reports whether at least one direction has a legal move.
    #[must_use]
    pub fn has_legal_move(world: &World) -> bool {
        world.has_legal_move()
    }

    /// Captures a read-only view of every tile in play, including tiles queued to merge.
    #[must_use]
    pub fn tile_view(world: &World) -> TileView {
        let queued: BTreeSet<_> = world
            .grid
            .cells()
            .iter()
            .filter_map(|cell| cell.linked_tile_for_merge())
            .collect();

        TileView::from_snapshots(
            world
                .tiles
                .iter()
                .map(|tile| TileSnapshot {
                    id: tile.id,
                    value: tile.value,
                    cell: tile.cell,
                    motion: tile.motion,
                    pending_merge: queued.contains(&tile.id),
                })
                .collect(),
        )
    }

    /// Value of the tile owning the provided cell, if any.
    #[must_use]
    pub fn tile_at(world: &World, cell: CellCoord) -> Option<TileValue> {
        world
            .grid
            .cell_at(cell)
            .and_then(|slot| slot.linked_tile())
            .and_then(|id| world.tiles.get(id))
            .map(|tile| tile.value)
    }

    /// Enumerates the cells that hold no tile in row-major order.
    #[must_use]
    pub fn empty_cells(world: &World) -> Vec<CellCoord> {
        world.grid.empty_cells().collect()
    }

    /// Picks a uniformly random empty cell.
    ///
    /// Fails with [`GridError::NoEmptyCell`] when the board is full.
    pub fn random_empty_cell<R>(world: &World, rng: &mut R) -> Result<CellCoord, GridError>
    where
        R: Rng + ?Sized,
    {
        world.grid.random_empty_cell(rng)
    }

    /// Board contents row by row, `None` marking empty cells.
    #[must_use]
    pub fn board_rows(world: &World) -> Vec<Vec<Option<TileValue>>> {
        let edge = world.grid.size().get();
        (0..edge)
            .map(|row| {
                (0..edge)
                    .map(|column| tile_at(world, CellCoord::new(column, row)))
                    .collect()
            })
            .collect()
    }

    /// Number of relocated tiles whose transitions have not completed yet.
    #[must_use]
    pub fn transitions_in_flight(world: &World) -> usize {
        world.in_flight.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    /// Builds an idle world from row-major values, zero marking an empty cell.
    fn world_from_rows(rows: &[&[u32]]) -> World {
        let size = GridSize::new(rows.len() as u32).expect("valid size");
        let mut world = World::new();
        world.grid = Grid::new(size);
        for (row, values) in rows.iter().enumerate() {
            for (column, value) in values.iter().enumerate() {
                let Some(value) = TileValue::new(*value) else {
                    continue;
                };
                let cell = CellCoord::new(column as u32, row as u32);
                let index = size.index_of(cell).expect("cell on board");
                let tile = world.tiles.insert(value, cell);
                tile.motion = TileMotion::Idle;
                world.grid.cell_mut(index).link_tile(tile);
            }
        }
        world
    }

    fn values(world: &World) -> Vec<Vec<u32>> {
        query::board_rows(world)
            .into_iter()
            .map(|row| row.into_iter().map(|value| value.map_or(0, |v| v.get())).collect())
            .collect()
    }

    /// Slides and resolves merges without going through the animation handshake.
    fn slide_and_merge(world: &mut World, direction: Direction) {
        let _ = turn::slide(&mut world.grid, &mut world.tiles, direction);
        let _ = turn::resolve_merges(&mut world.grid, &mut world.tiles);
    }

    fn finish_all_transitions(world: &mut World, events: &mut Vec<Event>) {
        let moving: Vec<TileId> = world.in_flight.iter().copied().collect();
        for tile in moving {
            apply(world, Command::FinishTransition { tile }, events);
        }
    }

    fn tile_set(world: &World) -> BTreeSet<(CellCoord, u32)> {
        world
            .tiles
            .iter()
            .map(|tile| (tile.cell, tile.value.get()))
            .collect()
    }

    #[test]
    fn three_equal_tiles_merge_only_once_per_cell() {
        let mut world = world_from_rows(&[&[2, 2, 2, 0], &[0; 4], &[0; 4], &[0; 4]]);
        slide_and_merge(&mut world, Direction::Left);
        assert_eq!(values(&world)[0], vec![4, 2, 0, 0]);
    }

    #[test]
    fn four_equal_tiles_merge_into_two_pairs() {
        let mut world = world_from_rows(&[&[0; 4], &[2, 2, 2, 2], &[0; 4], &[0; 4]]);
        slide_and_merge(&mut world, Direction::Right);
        assert_eq!(values(&world)[1], vec![0, 0, 4, 4]);
    }

    #[test]
    fn tiles_reach_the_farthest_slot_before_merging() {
        let mut world = world_from_rows(&[&[0, 0, 4, 4], &[0; 4], &[0; 4], &[0; 4]]);
        slide_and_merge(&mut world, Direction::Left);
        assert_eq!(values(&world)[0], vec![8, 0, 0, 0]);
    }

    #[test]
    fn vertical_slides_follow_columns() {
        let mut world = world_from_rows(&[&[2, 0, 0, 0], &[0; 4], &[2, 0, 0, 0], &[4, 0, 0, 0]]);
        slide_and_merge(&mut world, Direction::Down);
        let column: Vec<u32> = values(&world).iter().map(|row| row[0]).collect();
        assert_eq!(column, vec![0, 0, 4, 4]);

        slide_and_merge(&mut world, Direction::Up);
        let column: Vec<u32> = values(&world).iter().map(|row| row[0]).collect();
        assert_eq!(column, vec![4, 4, 0, 0]);
    }

    #[test]
    fn can_move_never_mutates_the_board() {
        let world = world_from_rows(&[&[2, 4, 0, 0], &[2, 0, 0, 8], &[0; 4], &[0; 4]]);
        let before = tile_set(&world);
        for _ in 0..3 {
            for direction in Direction::ALL {
                let _ = query::can_move(&world, direction);
            }
        }
        assert_eq!(tile_set(&world), before);
    }

    #[test]
    fn can_move_matches_whether_a_slide_changes_the_board() {
        let mut rng = ChaCha8Rng::seed_from_u64(0x5eed_0001);
        for _ in 0..200 {
            let edge = rng.gen_range(2..=5);
            let rows: Vec<Vec<u32>> = (0..edge)
                .map(|_| {
                    (0..edge)
                        .map(|_| match rng.gen_range(0..4) {
                            0 => 0,
                            exponent => 1 << exponent,
                        })
                        .collect()
                })
                .collect();
            let borrowed: Vec<&[u32]> = rows.iter().map(Vec::as_slice).collect();
            let world = world_from_rows(&borrowed);

            for direction in Direction::ALL {
                let legal = query::can_move(&world, direction);
                let mut moved = world.clone();
                slide_and_merge(&mut moved, direction);
                assert_eq!(
                    legal,
                    tile_set(&world) != tile_set(&moved),
                    "{rows:?} {direction:?}"
                );
            }
        }
    }

    #[test]
    fn full_board_without_pairs_has_no_legal_move() {
        let world = world_from_rows(&[&[2, 4, 2, 4], &[4, 2, 4, 2], &[2, 4, 2, 4], &[4, 2, 4, 2]]);
        for direction in Direction::ALL {
            assert!(!query::can_move(&world, direction), "{direction:?}");
        }
        assert!(!query::has_legal_move(&world));
    }

    #[test]
    fn slide_rejected_without_mutation_when_no_tile_can_move() {
        let mut world = world_from_rows(&[&[2, 4], &[0, 0]]);
        let before = tile_set(&world);
        let mut events = Vec::new();

        apply(&mut world, Command::Slide { direction: Direction::Left }, &mut events);

        assert_eq!(
            events,
            vec![Event::SlideRejected {
                direction: Direction::Left,
                reason: SlideRejection::NoLegalMove,
            }]
        );
        assert_eq!(tile_set(&world), before);
        assert_eq!(query::phase(&world), TurnPhase::Idle);
    }

    #[test]
    fn merges_wait_for_every_transition() {
        let mut world = world_from_rows(&[&[2, 2, 0], &[0, 0, 4], &[0, 0, 0]]);
        let mut events = Vec::new();

        apply(&mut world, Command::Slide { direction: Direction::Left }, &mut events);
        assert_eq!(query::phase(&world), TurnPhase::Sliding);
        assert_eq!(query::transitions_in_flight(&world), 2);

        let moved: Vec<TileId> = events
            .iter()
            .filter_map(|event| match event {
                Event::TileMoved { tile, .. } => Some(*tile),
                _ => None,
            })
            .collect();
        assert_eq!(moved.len(), 2);

        events.clear();
        apply(&mut world, Command::FinishTransition { tile: moved[0] }, &mut events);
        assert!(events.is_empty());
        assert_eq!(query::tile_at(&world, CellCoord::new(0, 0)), TileValue::new(2));

        apply(&mut world, Command::FinishTransition { tile: moved[1] }, &mut events);
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::TilesMerged { value, .. } if value.get() == 4)));
        assert_eq!(events.last(), Some(&Event::SpawnRequested));
        assert_eq!(query::phase(&world), TurnPhase::Spawning);
        assert_eq!(query::tile_at(&world, CellCoord::new(0, 0)), TileValue::new(4));
    }

    #[test]
    fn slides_are_refused_while_a_turn_is_in_progress() {
        let mut world = world_from_rows(&[&[0, 2], &[0, 0]]);
        let mut events = Vec::new();
        apply(&mut world, Command::Slide { direction: Direction::Left }, &mut events);

        events.clear();
        apply(&mut world, Command::Slide { direction: Direction::Down }, &mut events);
        assert_eq!(
            events,
            vec![Event::SlideRejected {
                direction: Direction::Down,
                reason: SlideRejection::TurnInProgress,
            }]
        );
    }

    #[test]
    fn spawn_preconditions_are_checked() {
        let mut world = World::new();
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::SpawnTile {
                cell: CellCoord::new(0, 0),
                value: TileValue::TWO,
            },
            &mut events,
        );
        assert!(matches!(
            events.as_slice(),
            [Event::SpawnRejected {
                reason: SpawnRejection::NotAwaitingSpawn,
                ..
            }]
        ));

        apply(
            &mut world,
            Command::ConfigureGrid {
                size: GridSize::new(2).expect("valid size"),
            },
            &mut events,
        );
        events.clear();
        apply(
            &mut world,
            Command::SpawnTile {
                cell: CellCoord::new(2, 0),
                value: TileValue::TWO,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::SpawnTile {
                cell: CellCoord::new(1, 1),
                value: TileValue::TWO,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::SpawnTile {
                cell: CellCoord::new(1, 1),
                value: TileValue::FOUR,
            },
            &mut events,
        );

        let reasons: Vec<SpawnRejection> = events
            .iter()
            .filter_map(|event| match event {
                Event::SpawnRejected { reason, .. } => Some(*reason),
                _ => None,
            })
            .collect();
        assert_eq!(
            reasons,
            vec![SpawnRejection::OutOfBounds, SpawnRejection::Occupied]
        );
    }

    #[test]
    fn configure_requests_the_opening_tiles_one_at_a_time() {
        let mut world = World::new();
        let mut events = Vec::new();
        let size = GridSize::new(3).expect("valid size");

        apply(&mut world, Command::ConfigureGrid { size }, &mut events);
        assert_eq!(
            events,
            vec![
                Event::GridConfigured { size },
                Event::PhaseChanged {
                    phase: TurnPhase::Spawning
                },
                Event::SpawnRequested,
            ]
        );

        events.clear();
        apply(
            &mut world,
            Command::SpawnTile {
                cell: CellCoord::new(0, 0),
                value: TileValue::TWO,
            },
            &mut events,
        );
        assert_eq!(events.last(), Some(&Event::SpawnRequested));

        events.clear();
        apply(
            &mut world,
            Command::SpawnTile {
                cell: CellCoord::new(2, 2),
                value: TileValue::FOUR,
            },
            &mut events,
        );
        assert_eq!(
            events.last(),
            Some(&Event::PhaseChanged {
                phase: TurnPhase::Idle
            })
        );
        assert!(query::accepts_input(&world));
    }

    #[test]
    fn game_over_waits_for_the_last_spawn_animation() {
        let mut world = world_from_rows(&[&[2, 4, 8], &[4, 8, 2], &[16, 0, 16]]);
        let mut events = Vec::new();

        apply(&mut world, Command::Slide { direction: Direction::Left }, &mut events);
        finish_all_transitions(&mut world, &mut events);
        assert_eq!(values(&world)[2], vec![32, 0, 0]);

        // Fill the freed cells so that the final spawn leaves no legal move.
        let filler = [
            (CellCoord::new(1, 2), 2),
            (CellCoord::new(2, 2), 4),
        ];
        world.pending_spawns = 2;
        events.clear();
        for (cell, value) in filler {
            apply(
                &mut world,
                Command::SpawnTile {
                    cell,
                    value: TileValue::new(value).expect("power of two"),
                },
                &mut events,
            );
        }

        assert_eq!(query::phase(&world), TurnPhase::TerminalCheck);
        assert!(!events.contains(&Event::GameOver));

        let spawned = world.last_spawned.expect("tile spawned");
        apply(&mut world, Command::FinishSpawnAnimation { tile: spawned }, &mut events);
        assert_eq!(events.last(), Some(&Event::GameOver));
        assert_eq!(query::phase(&world), TurnPhase::GameOver);

        events.clear();
        apply(&mut world, Command::Slide { direction: Direction::Up }, &mut events);
        assert_eq!(
            events,
            vec![Event::SlideRejected {
                direction: Direction::Up,
                reason: SlideRejection::GameOver,
            }]
        );
    }

    #[test]
    fn tile_view_flags_tiles_queued_for_merge() {
        let mut world = world_from_rows(&[&[4, 4], &[0, 0]]);
        let mut events = Vec::new();
        apply(&mut world, Command::Slide { direction: Direction::Left }, &mut events);

        let view = query::tile_view(&world);
        assert_eq!(view.len(), 2);
        let queued: Vec<_> = view.iter().filter(|tile| tile.pending_merge).collect();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].cell, CellCoord::new(0, 0));
        assert_eq!(queued[0].motion, TileMotion::Merging);
    }
}
