//! Configuration constants for the tank arena simulation.

// Grid geometry (all positions are integer sub-tile units)
pub const SUBTILE: i32 = 16; // Sub-tile units along one tile edge
pub const TANK_SIZE: i32 = SUBTILE; // Tanks occupy exactly one tile
pub const BULLET_SIZE: i32 = SUBTILE / 4;
pub const SNAP_STEP: i32 = SUBTILE / 2; // Cross-axis snap applied when a tank turns

// Fixed timestep
pub const TICK_RATE: u32 = 60;
pub const FIXED_DT: f32 = 1.0 / TICK_RATE as f32;
pub const MAX_TICKS_PER_FRAME: u32 = 8; // Prevents a spiral of death on slow frames
pub const MAX_TICK_ELAPSED: f32 = 60.0; // Longest single tick accepted by Game::tick

// Player
pub const PLAYER_SPEED: f32 = 3.0; // Tiles per second
pub const PLAYER_HEALTH: u32 = 1;
pub const PLAYER_LIVES: u32 = 3;
pub const PLAYER_SHOOT_COOLDOWN: f32 = 0.25;
pub const RESPAWN_INVINCIBILITY: f32 = 2.0;
pub const MAX_WEAPON_TIER: u8 = 3;

// Bullets
pub const BULLET_SPEED: f32 = 9.0; // Tiles per second
pub const FAST_BULLET_SPEED: f32 = 13.5;
pub const BULLET_POWER: u8 = 1;
pub const HEAVY_BULLET_POWER: u8 = 2;
pub const STEEL_POWER_THRESHOLD: u8 = 2; // Minimum bullet power that breaks steel

// Ice
pub const ICE_SLIDE_DISTANCE: f32 = 1.0; // Tiles travelled while decelerating to rest

// Enemies and spawning
pub const BASIC_SPEED: f32 = 2.0;
pub const FAST_SPEED: f32 = 4.0;
pub const ARMOR_HEALTH: u32 = 4;
pub const ENEMY_SHOOT_COOLDOWN: f32 = 1.5;
pub const ENEMY_FIRE_RATE: f64 = 1.0; // Expected random shots per second once the cooldown has elapsed
pub const SCORE_BASIC: u32 = 100;
pub const SCORE_FAST: u32 = 200;
pub const SCORE_POWER: u32 = 300;
pub const SCORE_ARMOR: u32 = 400;
pub const MAX_CONCURRENT_ENEMIES: u32 = 4;
pub const SPAWN_INTERVAL: f32 = 3.0;
pub const BONUS_ENEMY_ORDINALS: [u32; 3] = [4, 11, 18];

// Power-ups
pub const HELMET_INVINCIBILITY: f32 = 10.0;
pub const FREEZE_DURATION: f32 = 10.0;

// Enemy AI
pub const AI_SIGHT_RANGE: u32 = 8; // Tiles along a row or column
pub const AI_TURN_INTERVAL_MIN: f32 = 1.0;
pub const AI_TURN_INTERVAL_MAX: f32 = 3.0;
pub const AI_ATTACK_BIAS: f64 = 0.75; // Chance of picking the direction toward the target

pub const DEFAULT_SEED: u64 = 0x7a4c_17e5_0b1e_c17e;

// Display
pub const TILE_PIXELS: i32 = 40;
pub const UI_PANEL_WIDTH: f32 = 220.0;

/// Runtime-tunable simulation settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub seed: u64,
    pub max_concurrent_enemies: u32,
    pub spawn_interval: f32,
    pub player_lives: u32,
    pub respawn_invincibility: f32,
    pub ai_sight_range: u32,
    pub ai_attack_bias: f64,
    /// When set, player bullets destroy the base as well (friendly fire).
    pub player_can_destroy_base: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            seed: DEFAULT_SEED,
            max_concurrent_enemies: MAX_CONCURRENT_ENEMIES,
            spawn_interval: SPAWN_INTERVAL,
            player_lives: PLAYER_LIVES,
            respawn_invincibility: RESPAWN_INVINCIBILITY,
            ai_sight_range: AI_SIGHT_RANGE,
            ai_attack_bias: AI_ATTACK_BIAS,
            player_can_destroy_base: false,
        }
    }
}

/// Converts a speed in tiles per second and an elapsed time into sub-tile units.
pub fn sub_units(tiles_per_sec: f32, dt: f32) -> f32 {
    tiles_per_sec * dt * SUBTILE as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_sub_units_scales_by_tile_resolution() {
        assert_approx_eq!(sub_units(1.0, 1.0), SUBTILE as f32);
        assert_approx_eq!(sub_units(3.0, 0.5), 1.5 * SUBTILE as f32);
        assert_approx_eq!(sub_units(9.0, 0.0), 0.0);
    }

    #[test]
    fn test_default_config_matches_constants() {
        let config = SimConfig::default();
        assert_eq!(config.player_lives, PLAYER_LIVES);
        assert_eq!(config.max_concurrent_enemies, MAX_CONCURRENT_ENEMIES);
        assert!(!config.player_can_destroy_base);
    }
}
