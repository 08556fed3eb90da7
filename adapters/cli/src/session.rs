//! Game session that wires the world, its systems and the animation tracker together.

use std::time::Duration;

use log::{debug, info};
use tile_slide_core::{Command, Direction, Event, GridSize, TurnPhase, GAME_OVER_MESSAGE};
use tile_slide_rendering::{AnimationCompletion, FrameInput, Scene, TileAnimations};
use tile_slide_system_input::{direction_for_drag, direction_for_key, Input};
use tile_slide_system_spawning::Spawning;
use tile_slide_world::{self as world, query, World};

/// Upper bound on follow-up rounds while settling a headless turn.
const SETTLE_ROUNDS: usize = 64;

/// Owns every piece of game state for one board.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    spawning: Spawning,
    input: Input,
    animations: TileAnimations,
    unseen_events: Vec<Event>,
}

impl Session {
    /// Creates a session and places the opening tiles.
    pub(crate) fn new(size: GridSize, spawning: Spawning, animations: TileAnimations) -> Self {
        let mut session = Self {
            world: World::new(),
            spawning,
            input: Input::new(),
            animations,
            unseen_events: Vec::new(),
        };
        info!("{}", query::welcome_banner(&session.world));
        session.pump(vec![Command::ConfigureGrid { size }]);
        session
    }

    /// Advances one rendered frame.
    pub(crate) fn step(&mut self, dt: Duration, frame: &FrameInput) {
        if frame.quit {
            info!("player left a {:?} board", query::phase(&self.world));
            return;
        }

        let intents: Vec<Direction> = frame
            .keys
            .iter()
            .filter_map(|key| direction_for_key(*key))
            .chain(frame.drag.and_then(direction_for_drag))
            .collect();
        self.advance(dt, &intents);
    }

    /// Advances animations by `dt`, feeds completions back to the world and offers
    /// the intents to the input system.
    pub(crate) fn advance(&mut self, dt: Duration, intents: &[Direction]) {
        let completions = self
            .animations
            .advance(dt)
            .into_iter()
            .map(|completion| match completion {
                AnimationCompletion::Transition(tile) => Command::FinishTransition { tile },
                AnimationCompletion::Spawn(tile) => Command::FinishSpawnAnimation { tile },
            })
            .collect();
        self.pump(completions);

        let events = std::mem::take(&mut self.unseen_events);
        let mut commands = Vec::new();
        self.input.handle(&events, intents, &mut commands);
        self.pump(commands);
    }

    /// Plays one direction and runs every animation to completion.
    ///
    /// Intended for sessions with instant animations; returns whether the board settled.
    pub(crate) fn play(&mut self, direction: Direction) -> bool {
        self.advance(Duration::ZERO, &[direction]);
        for _ in 0..SETTLE_ROUNDS {
            if self.is_settled() {
                return true;
            }
            self.advance(Duration::ZERO, &[]);
        }
        self.is_settled()
    }

    /// Reports whether no turn or animation is in progress.
    pub(crate) fn is_settled(&self) -> bool {
        let phase = query::phase(&self.world);
        matches!(phase, TurnPhase::Idle | TurnPhase::GameOver)
            && !self.animations.is_animating()
            && self.unseen_events.is_empty()
    }

    /// Reports whether the session reached its terminal state.
    pub(crate) fn is_over(&self) -> bool {
        query::phase(&self.world) == TurnPhase::GameOver
    }

    /// Copies the current tile presentations and notice into the scene.
    pub(crate) fn populate_scene(&self, scene: &mut Scene) {
        scene.tiles = self.animations.presentations();
        scene.notice = self.is_over().then(|| GAME_OVER_MESSAGE.to_owned());
    }

    /// Board rendered as text, one line per row; empty cells print as `.`.
    pub(crate) fn board_text(&self) -> String {
        let rows = query::board_rows(&self.world);
        let width = rows
            .iter()
            .flatten()
            .flatten()
            .map(|value| value.get().to_string().len())
            .max()
            .unwrap_or(1);

        rows.iter()
            .map(|row| {
                row.iter()
                    .map(|cell| match cell {
                        Some(value) => format!("{:>width$}", value.get()),
                        None => format!("{:>width$}", "."),
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Applies commands and routes the resulting events until no system has more to say.
    fn pump(&mut self, mut commands: Vec<Command>) {
        while !commands.is_empty() {
            let mut events = Vec::new();
            for command in commands.drain(..) {
                world::apply(&mut self.world, command, &mut events);
            }

            for event in &events {
                match event {
                    Event::GameOver => info!("{GAME_OVER_MESSAGE}"),
                    Event::TilesMerged { value, .. } => debug!("merged into {}", value.get()),
                    _ => {}
                }
            }

            self.animations.observe(&events);
            self.spawning.handle(&events, &self.world, &mut commands);
            self.unseen_events.extend(events);
        }
    }
}
