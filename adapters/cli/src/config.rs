//! Optional TOML configuration for the command-line adapter.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;
use tile_slide_core::GridSize;
use tile_slide_rendering::AnimationSettings;
use tile_slide_system_spawning::DEFAULT_FOUR_PROBABILITY;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("grid size {0} is outside 2..=8")]
    InvalidSize(u32),
    #[error("four probability {0} is outside 0.0..=1.0")]
    InvalidProbability(f64),
}

/// Complete adapter configuration. Every table and field may be omitted.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GameConfig {
    pub(crate) game: GameSection,
    pub(crate) animation: AnimationSection,
    pub(crate) window: WindowSection,
}

/// `[game]` table.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GameSection {
    pub(crate) size: u32,
    /// Seed for tile spawning; drawn from entropy when absent.
    pub(crate) seed: Option<u64>,
    pub(crate) four_probability: f64,
}

impl Default for GameSection {
    fn default() -> Self {
        Self {
            size: GridSize::DEFAULT.get(),
            seed: None,
            four_probability: DEFAULT_FOUR_PROBABILITY,
        }
    }
}

/// `[animation]` table, durations in milliseconds.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct AnimationSection {
    pub(crate) slide_ms: u64,
    pub(crate) spawn_ms: u64,
}

impl Default for AnimationSection {
    fn default() -> Self {
        Self {
            slide_ms: duration_millis(AnimationSettings::DEFAULT_SLIDE),
            spawn_ms: duration_millis(AnimationSettings::DEFAULT_SPAWN),
        }
    }
}

/// `[window]` table.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct WindowSection {
    pub(crate) title: String,
    pub(crate) vsync: bool,
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            title: "Tile Slide".to_owned(),
            vsync: true,
        }
    }
}

impl GameConfig {
    /// Loads configuration from a TOML file.
    pub(crate) fn from_toml(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Validated board size.
    pub(crate) fn grid_size(&self) -> Result<GridSize, ConfigError> {
        GridSize::new(self.game.size).ok_or(ConfigError::InvalidSize(self.game.size))
    }

    /// Validated probability of spawning a four.
    pub(crate) fn four_probability(&self) -> Result<f64, ConfigError> {
        let probability = self.game.four_probability;
        if (0.0..=1.0).contains(&probability) {
            Ok(probability)
        } else {
            Err(ConfigError::InvalidProbability(probability))
        }
    }

    /// Animation durations described by the `[animation]` table.
    pub(crate) fn animation_settings(&self) -> AnimationSettings {
        AnimationSettings::new(
            Duration::from_millis(self.animation.slide_ms),
            Duration::from_millis(self.animation.spawn_ms),
        )
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
