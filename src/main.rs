mod app;
mod assets;
mod audio;
mod render;

use std::path::PathBuf;

use clap::Parser;
use log::{LevelFilter, error, info};
use macroquad::prelude::*;
use tankarena::config::{self, TILE_PIXELS, UI_PANEL_WIDTH};
use tankarena::{Game, SimConfig, logging};

use crate::app::{App, LevelSource};

// --- Command Line Arguments ---
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Embedded stage to start on (1-based).
    #[arg(long, default_value_t = 1)]
    level: usize,

    /// Load a level from a text file instead of the embedded stages.
    #[arg(long)]
    level_file: Option<PathBuf>,

    /// Seed for enemy AI and power-up placement.
    #[arg(long, default_value_t = config::DEFAULT_SEED)]
    seed: u64,

    /// Maximum number of enemies on the field at once.
    #[arg(long, default_value_t = config::MAX_CONCURRENT_ENEMIES)]
    max_enemies: u32,

    /// Debug filter to specify log topics (e.g., "tank,bullet,ai")
    /// Available topics: tank, bullet, ai, collision, state
    #[arg(long)]
    debug_filter: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn window_conf() -> Conf {
    Conf {
        window_title: "Tank Arena".to_owned(),
        window_width: TILE_PIXELS * 13 + UI_PANEL_WIDTH as i32,
        window_height: TILE_PIXELS * 13,
        window_resizable: true,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let args = Args::parse();

    let log_level = match args.log_level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };

    // RUST_LOG takes over from the built-in topic logger when present
    if std::env::var_os("RUST_LOG").is_some() {
        env_logger::init();
    } else if let Err(e) = logging::init_logger(log_level, args.debug_filter) {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }

    info!("Initializing Tank Arena...");

    let sim_config = SimConfig {
        seed: args.seed,
        max_concurrent_enemies: args.max_enemies,
        ..Default::default()
    };
    let source = match args.level_file {
        Some(path) => LevelSource::File(path),
        None => LevelSource::Embedded(args.level.saturating_sub(1)),
    };

    let mut audio = audio::AudioManager::new();
    audio.load_assets().await;

    let mut app = App::new(Game::new(sim_config), source, audio);
    if let Err(e) = app.start() {
        error!("Failed to load level: {}", e);
        return;
    }

    let mut renderer = render::Renderer::new();
    renderer.load_ui_font().await;
    info!("Renderer initialized.");

    if let Err(e) = app.run(&mut renderer).await {
        error!("Game loop failed: {}", e);
    }
}
