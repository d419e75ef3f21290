//! Simulation core for a grid-based tank arena.
//!
//! The library owns the tile map, the entities and every rule that moves or
//! destroys them. Drawing, sound, input polling and level files live in the
//! binary and only talk to [`Game`] through `load_level`, `reset`, `tick` and
//! `snapshot`.

pub mod ai;
pub mod collision;
pub mod config;
pub mod entity;
pub mod error;
pub mod events;
pub mod game;
pub mod level;
pub mod logging;
pub mod movement;
pub mod state;
pub mod tilemap;
pub mod types;
pub mod world;

pub use config::SimConfig;
pub use error::{LevelLoadError, SimError};
pub use events::GameEvent;
pub use game::{Game, PlayerIntent, Snapshot};
pub use level::LevelData;
pub use state::GameStatus;
