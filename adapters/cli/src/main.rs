#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Tile Slide experience.

mod config;
mod session;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{info, warn};
use rand::Rng;
use tile_slide_core::{Direction, GridSize, GAME_OVER_MESSAGE};
use tile_slide_rendering::{
    AnimationSettings, Color, GridPresentation, Presentation, RenderingBackend, Scene,
    TileAnimations,
};
use tile_slide_rendering_macroquad::MacroquadBackend;
use tile_slide_system_spawning::{Config as SpawningConfig, Spawning};

use self::{config::GameConfig, session::Session};

/// Side length of a rendered cell before the backend scales the board to the window.
const CELL_LENGTH: f32 = 100.0;

/// Spacing between rendered cells.
const CELL_GAP: f32 = 12.0;

/// Window background behind the board.
const CLEAR_COLOR: Color = Color::from_rgb_u8(0x33, 0x33, 0x33);

/// Command-line arguments accepted by the binary.
#[derive(Parser, Debug)]
#[command(name = "tile-slide", about = "Slide numbered tiles and merge equal neighbours")]
struct CliArgs {
    /// Optional TOML configuration file.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Number of cells along each board edge.
    #[arg(long)]
    size: Option<u32>,
    /// Seed for tile spawning.
    #[arg(long)]
    seed: Option<u64>,
    /// Probability that a spawned tile is a four.
    #[arg(long, value_name = "P")]
    four_probability: Option<f64>,
    /// Render as fast as possible instead of synchronising with the display.
    #[arg(long)]
    no_vsync: bool,
    /// Play the given `U`/`D`/`L`/`R` moves without a window and print the final board.
    #[arg(long, value_name = "MOVES")]
    headless: Option<String>,
}

/// Entry point for the Tile Slide command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = CliArgs::parse();

    let mut config = match &args.config {
        Some(path) => GameConfig::from_toml(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => GameConfig::default(),
    };
    apply_overrides(&mut config, &args);

    let size = config.grid_size()?;
    let four_probability = config.four_probability()?;
    let seed = config.game.seed.unwrap_or_else(|| rand::thread_rng().gen());
    info!("spawning with seed {seed}");
    let spawning = Spawning::new(SpawningConfig::new(seed).with_four_probability(four_probability));

    match args.headless {
        Some(moves) => run_headless(size, spawning, &moves),
        None => run_windowed(&config, size, spawning),
    }
}

fn apply_overrides(config: &mut GameConfig, args: &CliArgs) {
    if let Some(size) = args.size {
        config.game.size = size;
    }
    if let Some(seed) = args.seed {
        config.game.seed = Some(seed);
    }
    if let Some(probability) = args.four_probability {
        config.game.four_probability = probability;
    }
    if args.no_vsync {
        config.window.vsync = false;
    }
}

fn parse_moves(moves: &str) -> Result<Vec<Direction>> {
    moves
        .chars()
        .filter(|letter| !letter.is_whitespace() && *letter != ',')
        .map(|letter| match Direction::from_letter(letter) {
            Some(direction) => Ok(direction),
            None => bail!("unknown move {letter:?}; expected U, D, L or R"),
        })
        .collect()
}

fn run_headless(size: GridSize, spawning: Spawning, moves: &str) -> Result<()> {
    let moves = parse_moves(moves)?;
    let mut session = Session::new(size, spawning, TileAnimations::new(AnimationSettings::INSTANT));

    for (turn, direction) in moves.into_iter().enumerate() {
        if session.is_over() {
            warn!("ignoring moves after game over at move {turn}");
            break;
        }
        if !session.play(direction) {
            bail!("board did not settle after move {turn} ({direction:?})");
        }
    }

    println!("{}", session.board_text());
    if session.is_over() {
        println!("{GAME_OVER_MESSAGE}");
    }
    Ok(())
}

fn run_windowed(config: &GameConfig, size: GridSize, spawning: Spawning) -> Result<()> {
    let mut session = Session::new(
        size,
        spawning,
        TileAnimations::new(config.animation_settings()),
    );

    let grid = GridPresentation::new(size, CELL_LENGTH, CELL_GAP)?;
    let mut scene = Scene::new(grid, Vec::new(), None);
    session.populate_scene(&mut scene);

    let presentation = Presentation::new(config.window.title.clone(), CLEAR_COLOR, scene);
    MacroquadBackend::default()
        .with_vsync(config.window.vsync)
        .run(presentation, move |dt, input, scene| {
            session.step(dt, &input);
            session.populate_scene(scene);
        })
}
