#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure input system that turns key presses and pointer drags into slide commands.
//!
//! Adapters translate raw device state into [`InputKey`] and [`PointerDrag`]
//! values, map them to directional intents with [`direction_for_key`] and
//! [`direction_for_drag`], and hand the intents to [`Input::handle`]. The system
//! admits at most one slide per turn: intents arriving while a turn is resolving
//! are discarded rather than queued.

use log::{debug, trace};
use tile_slide_core::{Command, Direction, Event, InputKey, PointerDrag, SlideRejection, TurnPhase};

/// Maps a key press to a slide direction. Arrows and `w`/`a`/`s`/`d` are recognised.
#[must_use]
pub fn direction_for_key(key: InputKey) -> Option<Direction> {
    match key {
        InputKey::ArrowUp => Some(Direction::Up),
        InputKey::ArrowDown => Some(Direction::Down),
        InputKey::ArrowLeft => Some(Direction::Left),
        InputKey::ArrowRight => Some(Direction::Right),
        InputKey::Character(letter) => match letter.to_ascii_lowercase() {
            'w' => Some(Direction::Up),
            's' => Some(Direction::Down),
            'a' => Some(Direction::Left),
            'd' => Some(Direction::Right),
            _ => None,
        },
        InputKey::Other => None,
    }
}

/// Maps a completed drag to a slide direction.
///
/// The axis with the strictly greater displacement decides; a drag of equal
/// magnitude on both axes (including no movement at all) is ambiguous and
/// yields no direction. Screen `y` grows downward.
#[must_use]
pub fn direction_for_drag(drag: PointerDrag) -> Option<Direction> {
    let (dx, dy) = drag.displacement();
    let (horizontal, vertical) = (dx.abs(), dy.abs());

    if horizontal > vertical {
        Some(if dx > 0.0 {
            Direction::Right
        } else {
            Direction::Left
        })
    } else if vertical > horizontal {
        Some(if dy > 0.0 {
            Direction::Down
        } else {
            Direction::Up
        })
    } else {
        None
    }
}

/// Admission state of the single pending-slide slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Gate {
    /// No board is ready for input yet, or a submitted slide is still resolving.
    Closed,
    /// The next intent will be forwarded to the world.
    Armed,
    /// The session ended; only a freshly configured board reopens input.
    Finished,
}

/// Input system forwarding at most one slide intent per turn.
#[derive(Debug, Clone)]
pub struct Input {
    gate: Gate,
}

impl Default for Input {
    fn default() -> Self {
        Self::new()
    }
}

impl Input {
    /// Creates an input system that waits for the world to report an idle board.
    #[must_use]
    pub const fn new() -> Self {
        Self { gate: Gate::Closed }
    }

    /// Reports whether the next intent would be forwarded.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.gate == Gate::Armed
    }

    /// Consumes world events and directional intents, emitting slide commands.
    pub fn handle(&mut self, events: &[Event], intents: &[Direction], out: &mut Vec<Command>) {
        for event in events {
            self.observe(event);
        }

        for direction in intents {
            if self.gate != Gate::Armed {
                trace!("discarding {direction:?} intent while {:?}", self.gate);
                continue;
            }

            debug!("submitting slide {direction:?}");
            out.push(Command::Slide {
                direction: *direction,
            });
            self.gate = Gate::Closed;
        }
    }

    fn observe(&mut self, event: &Event) {
        match event {
            Event::GridConfigured { .. } => self.gate = Gate::Closed,
            Event::GameOver => self.gate = Gate::Finished,
            _ if self.gate == Gate::Finished => {}
            Event::PhaseChanged {
                phase: TurnPhase::Idle,
            } => self.gate = Gate::Armed,
            Event::SlideRejected {
                reason: SlideRejection::NoLegalMove | SlideRejection::TurnInProgress,
                ..
            } => self.gate = Gate::Armed,
            _ => {}
        }
    }
}
