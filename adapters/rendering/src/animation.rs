//! Frame-driven tile animations derived from world events.

use std::{collections::BTreeMap, time::Duration};

use glam::Vec2;
use log::warn;
use tile_slide_core::{CellCoord, Event, TileId, TileValue};

use crate::{tile_colors, TilePresentation};

/// Durations applied to tile animations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnimationSettings {
    /// Time a tile takes to travel to its destination cell.
    pub slide: Duration,
    /// Time a freshly spawned tile takes to grow to full size.
    pub spawn: Duration,
}

impl AnimationSettings {
    /// Slide duration used when nothing else is configured.
    pub const DEFAULT_SLIDE: Duration = Duration::from_millis(100);

    /// Spawn duration used when nothing else is configured.
    pub const DEFAULT_SPAWN: Duration = Duration::from_millis(200);

    /// Settings that complete every animation on the next advance.
    pub const INSTANT: AnimationSettings = AnimationSettings {
        slide: Duration::ZERO,
        spawn: Duration::ZERO,
    };

    /// Creates settings from explicit durations.
    #[must_use]
    pub const fn new(slide: Duration, spawn: Duration) -> Self {
        Self { slide, spawn }
    }
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SLIDE, Self::DEFAULT_SPAWN)
    }
}

/// Completion signal reported once an animation finishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimationCompletion {
    /// A tile reached the cell it was sliding toward.
    Transition(TileId),
    /// A freshly spawned tile finished growing.
    Spawn(TileId),
}

/// Progress of a single timed animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Clock {
    elapsed: Duration,
    duration: Duration,
}

impl Clock {
    fn start(duration: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            duration,
        }
    }

    /// Advances the clock and reports whether it ran out.
    fn tick(&mut self, dt: Duration) -> bool {
        self.elapsed = self.elapsed.saturating_add(dt);
        self.elapsed >= self.duration
    }

    fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            return 0.0;
        }
        (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }
}

#[derive(Clone, Copy, Debug)]
struct TileAnimation {
    value: TileValue,
    from: Vec2,
    to: Vec2,
    slide: Option<Clock>,
    spawn: Option<Clock>,
}

impl TileAnimation {
    fn position(&self) -> Vec2 {
        match self.slide {
            Some(clock) => self.from.lerp(self.to, ease_out(clock.progress())),
            None => self.to,
        }
    }

    fn scale(&self) -> f32 {
        self.spawn.map_or(1.0, |clock| ease_out(clock.progress()))
    }
}

/// Tracks the visual state of every tile between world turns.
///
/// Adapters feed world events through [`TileAnimations::observe`] and call
/// [`TileAnimations::advance`] once per frame; the returned completions are
/// translated back into world commands.
#[derive(Clone, Debug, Default)]
pub struct TileAnimations {
    settings: AnimationSettings,
    tiles: BTreeMap<TileId, TileAnimation>,
}

impl TileAnimations {
    /// Creates an empty tracker using the provided durations.
    #[must_use]
    pub fn new(settings: AnimationSettings) -> Self {
        Self {
            settings,
            tiles: BTreeMap::new(),
        }
    }

    /// Durations applied to newly started animations.
    #[must_use]
    pub fn settings(&self) -> AnimationSettings {
        self.settings
    }

    /// Starts, retargets or drops animations in response to world events.
    pub fn observe(&mut self, events: &[Event]) {
        for event in events {
            match *event {
                Event::GridConfigured { .. } => self.tiles.clear(),
                Event::TileSpawned { tile, cell, value } => {
                    let at = cell_position(cell);
                    let _ = self.tiles.insert(
                        tile,
                        TileAnimation {
                            value,
                            from: at,
                            to: at,
                            slide: None,
                            spawn: Some(Clock::start(self.settings.spawn)),
                        },
                    );
                }
                Event::TileMoved { tile, from, to, .. } => {
                    let Some(animation) = self.tiles.get_mut(&tile) else {
                        warn!("tile {} moved before it was spawned", tile.get());
                        continue;
                    };
                    animation.from = cell_position(from);
                    animation.to = cell_position(to);
                    animation.slide = Some(Clock::start(self.settings.slide));
                }
                Event::TilesMerged {
                    survivor,
                    absorbed,
                    value,
                    ..
                } => {
                    let _ = self.tiles.remove(&absorbed);
                    if let Some(animation) = self.tiles.get_mut(&survivor) {
                        animation.value = value;
                    }
                }
                _ => {}
            }
        }
    }

    /// Advances every running animation, returning those that finished.
    ///
    /// Transitions are reported before spawns; each group follows tile identifier order.
    pub fn advance(&mut self, dt: Duration) -> Vec<AnimationCompletion> {
        let mut transitions = Vec::new();
        let mut spawns = Vec::new();

        for (id, animation) in &mut self.tiles {
            if let Some(clock) = animation.slide.as_mut() {
                if clock.tick(dt) {
                    animation.slide = None;
                    transitions.push(AnimationCompletion::Transition(*id));
                }
            }
            if let Some(clock) = animation.spawn.as_mut() {
                if clock.tick(dt) {
                    animation.spawn = None;
                    spawns.push(AnimationCompletion::Spawn(*id));
                }
            }
        }

        transitions.extend(spawns);
        transitions
    }

    /// Reports whether any animation is still running.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.tiles
            .values()
            .any(|animation| animation.slide.is_some() || animation.spawn.is_some())
    }

    /// Current position of a tile in cell units.
    #[must_use]
    pub fn position(&self, tile: TileId) -> Option<Vec2> {
        self.tiles.get(&tile).map(TileAnimation::position)
    }

    /// Current scale of a tile, reaching 1.0 once its spawn animation ends.
    #[must_use]
    pub fn scale(&self, tile: TileId) -> Option<f32> {
        self.tiles.get(&tile).map(TileAnimation::scale)
    }

    /// Presentations for every tracked tile, ordered by identifier.
    #[must_use]
    pub fn presentations(&self) -> Vec<TilePresentation> {
        self.tiles
            .iter()
            .map(|(id, animation)| TilePresentation {
                id: *id,
                value: animation.value,
                position: animation.position(),
                scale: animation.scale(),
                colors: tile_colors(animation.value),
            })
            .collect()
    }
}

/// Cubic ease-out curve mapping linear progress onto a decelerating one.
fn ease_out(t: f32) -> f32 {
    let u = 1.0 - t.clamp(0.0, 1.0);
    1.0 - u * u * u
}

fn cell_position(cell: CellCoord) -> Vec2 {
    Vec2::new(cell.column() as f32, cell.row() as f32)
}
