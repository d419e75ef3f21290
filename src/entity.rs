//! Simulation entities: tanks, bullets, the base and power-ups.

use crate::ai::Brain;
use crate::config::{
    self, ARMOR_HEALTH, BASIC_SPEED, BULLET_POWER, BULLET_SIZE, BULLET_SPEED, ENEMY_SHOOT_COOLDOWN,
    FAST_BULLET_SPEED, FAST_SPEED, HEAVY_BULLET_POWER, PLAYER_HEALTH, PLAYER_SHOOT_COOLDOWN,
    PLAYER_SPEED, SUBTILE, TANK_SIZE,
};
use crate::tilemap::TileMap;
use crate::types::{Aabb, Direction, EntityId, Side, TilePos};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnemyKind {
    Basic,
    Fast,
    Power,
    Armor,
}

/// How an enemy decides to pull the trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotPolicy {
    Random,
    /// Random shots plus a guaranteed shot whenever facing a visible target.
    RandomAndAimed,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 4] = [
        EnemyKind::Basic,
        EnemyKind::Fast,
        EnemyKind::Power,
        EnemyKind::Armor,
    ];

    pub fn speed(self) -> f32 {
        match self {
            EnemyKind::Fast => FAST_SPEED,
            _ => BASIC_SPEED,
        }
    }

    pub fn health(self) -> u32 {
        match self {
            EnemyKind::Armor => ARMOR_HEALTH,
            _ => 1,
        }
    }

    pub fn score(self) -> u32 {
        match self {
            EnemyKind::Basic => config::SCORE_BASIC,
            EnemyKind::Fast => config::SCORE_FAST,
            EnemyKind::Power => config::SCORE_POWER,
            EnemyKind::Armor => config::SCORE_ARMOR,
        }
    }

    pub fn bullet_speed(self) -> f32 {
        match self {
            EnemyKind::Power => FAST_BULLET_SPEED,
            _ => BULLET_SPEED,
        }
    }

    pub fn shot_policy(self) -> ShotPolicy {
        match self {
            EnemyKind::Basic | EnemyKind::Fast => ShotPolicy::Random,
            EnemyKind::Power | EnemyKind::Armor => ShotPolicy::RandomAndAimed,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EnemyKind::Basic => "basic",
            EnemyKind::Fast => "fast",
            EnemyKind::Power => "power",
            EnemyKind::Armor => "armor",
        }
    }

    pub fn from_name(name: &str) -> Option<EnemyKind> {
        EnemyKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TankKind {
    Player,
    Enemy(EnemyKind),
}

impl TankKind {
    pub fn side(self) -> Side {
        match self {
            TankKind::Player => Side::Player,
            TankKind::Enemy(_) => Side::Enemy,
        }
    }
}

/// Who supplies the tank's intent, plus the state that only that controller needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Pilot {
    Player { weapon_tier: u8 },
    Enemy { brain: Brain, bonus: bool },
}

/// Requested action for the current tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TankIntent {
    pub direction: Option<Direction>,
    pub shoot: bool,
}

/// Residual motion on ice after the driver lets go.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slide {
    pub direction: Direction,
    /// Sub-tile units per second.
    pub velocity: f32,
    /// Sub-tile units per second squared.
    pub deceleration: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tank {
    pub id: EntityId,
    pub kind: TankKind,
    pub x: i32,
    pub y: i32,
    pub facing: Direction,
    pub speed: f32, // Tiles per second
    pub health: u32,
    pub alive: bool,
    pub active_bullets: u32,
    pub bullet_limit: u32,
    pub shoot_cooldown: f32,
    pub invincibility: f32,
    pub intent: TankIntent,
    pub was_driving: bool,
    /// Set when the last move was clamped by a tile, the boundary or another tank.
    pub blocked: bool,
    pub slide: Option<Slide>,
    pub carry: f32, // Fractional sub-tile travel owed from earlier ticks
    pub pilot: Pilot,
}

impl Tank {
    pub fn new_player(id: EntityId, pos: TilePos, invincibility: f32) -> Self {
        Tank {
            id,
            kind: TankKind::Player,
            x: pos.col * SUBTILE,
            y: pos.row * SUBTILE,
            facing: Direction::Up,
            speed: PLAYER_SPEED,
            health: PLAYER_HEALTH,
            alive: true,
            active_bullets: 0,
            bullet_limit: 1,
            shoot_cooldown: 0.0,
            invincibility,
            intent: TankIntent::default(),
            was_driving: false,
            blocked: false,
            slide: None,
            carry: 0.0,
            pilot: Pilot::Player { weapon_tier: 0 },
        }
    }

    pub fn new_enemy(id: EntityId, kind: EnemyKind, pos: TilePos, brain: Brain, bonus: bool) -> Self {
        Tank {
            id,
            kind: TankKind::Enemy(kind),
            x: pos.col * SUBTILE,
            y: pos.row * SUBTILE,
            facing: Direction::Down,
            speed: kind.speed(),
            health: kind.health(),
            alive: true,
            active_bullets: 0,
            bullet_limit: 1,
            shoot_cooldown: 0.0,
            invincibility: 0.0,
            intent: TankIntent::default(),
            was_driving: false,
            blocked: false,
            slide: None,
            carry: 0.0,
            pilot: Pilot::Enemy { brain, bonus },
        }
    }

    pub fn side(&self) -> Side {
        self.kind.side()
    }

    pub fn is_player(&self) -> bool {
        self.kind == TankKind::Player
    }

    pub fn enemy_kind(&self) -> Option<EnemyKind> {
        match self.kind {
            TankKind::Enemy(kind) => Some(kind),
            TankKind::Player => None,
        }
    }

    pub fn is_bonus(&self) -> bool {
        matches!(self.pilot, Pilot::Enemy { bonus: true, .. })
    }

    pub fn weapon_tier(&self) -> u8 {
        match self.pilot {
            Pilot::Player { weapon_tier } => weapon_tier,
            Pilot::Enemy { .. } => 0,
        }
    }

    /// Raises the player's weapon tier, updating the bullet limit with it.
    pub fn upgrade_weapon(&mut self) {
        if let Pilot::Player { weapon_tier } = &mut self.pilot {
            *weapon_tier = (*weapon_tier + 1).min(config::MAX_WEAPON_TIER);
            self.bullet_limit = if *weapon_tier >= 2 { 2 } else { 1 };
        }
    }

    pub fn is_invincible(&self) -> bool {
        self.invincibility > 0.0
    }

    pub fn aabb(&self) -> Aabb {
        debug_assert!(self.alive, "aabb requested for dead tank {}", self.id);
        Aabb::new(self.x, self.y, TANK_SIZE, TANK_SIZE)
    }

    /// Cell under the tank's centre.
    pub fn center_cell(&self) -> TilePos {
        let (cx, cy) = self.aabb().center();
        TilePos::new(cx.div_euclid(SUBTILE), cy.div_euclid(SUBTILE))
    }

    pub fn can_shoot(&self) -> bool {
        self.alive && self.shoot_cooldown <= 0.0 && self.active_bullets < self.bullet_limit
    }

    pub fn shoot_cooldown_duration(&self) -> f32 {
        match self.kind {
            TankKind::Player => PLAYER_SHOOT_COOLDOWN,
            TankKind::Enemy(_) => ENEMY_SHOOT_COOLDOWN,
        }
    }

    pub fn bullet_speed(&self) -> f32 {
        match self.kind {
            TankKind::Player if self.weapon_tier() >= 1 => FAST_BULLET_SPEED,
            TankKind::Player => BULLET_SPEED,
            TankKind::Enemy(kind) => kind.bullet_speed(),
        }
    }

    pub fn bullet_power(&self) -> u8 {
        if self.weapon_tier() >= 3 {
            HEAVY_BULLET_POWER
        } else {
            BULLET_POWER
        }
    }

    /// Top-left of a bullet centred on the front edge.
    pub fn muzzle(&self) -> (i32, i32) {
        let half = BULLET_SIZE / 2;
        let mid_x = self.x + TANK_SIZE / 2 - half;
        let mid_y = self.y + TANK_SIZE / 2 - half;
        match self.facing {
            Direction::Up => (mid_x, self.y - half),
            Direction::Down => (mid_x, self.y + TANK_SIZE - half),
            Direction::Left => (self.x - half, mid_y),
            Direction::Right => (self.x + TANK_SIZE - half, mid_y),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bullet {
    pub id: EntityId,
    pub owner: EntityId,
    pub side: Side,
    pub direction: Direction,
    pub speed: f32, // Tiles per second
    pub power: u8,
    pub x: i32,
    pub y: i32,
    pub alive: bool,
    pub carry: f32,
    /// Reached the map edge this tick; removed once collisions have had their turn.
    pub exiting: bool,
    /// Box occupied at the start of the latest move.
    pub start: Aabb,
}

impl Bullet {
    pub fn from_tank(id: EntityId, tank: &Tank) -> Self {
        let (x, y) = tank.muzzle();
        Bullet {
            id,
            owner: tank.id,
            side: tank.side(),
            direction: tank.facing,
            speed: tank.bullet_speed(),
            power: tank.bullet_power(),
            x,
            y,
            alive: true,
            carry: 0.0,
            exiting: false,
            start: Aabb::new(x, y, BULLET_SIZE, BULLET_SIZE),
        }
    }

    pub fn aabb(&self) -> Aabb {
        debug_assert!(self.alive, "aabb requested for dead bullet {}", self.id);
        Aabb::new(self.x, self.y, BULLET_SIZE, BULLET_SIZE)
    }

    /// Area swept during the latest move; used for hit tests so fast bullets cannot tunnel.
    pub fn path(&self) -> Aabb {
        self.start.union(&self.aabb())
    }

    /// Distance from the bullet's starting leading edge to `other`; smaller is hit first.
    pub fn distance_to(&self, other: &Aabb) -> i32 {
        self.start.gap_toward(self.direction, other)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Base {
    pub pos: TilePos,
    pub destroyed: bool,
}

impl Base {
    pub fn aabb(&self) -> Aabb {
        TileMap::cell_aabb(self.pos)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerUpKind {
    Star,
    Helmet,
    Tank,
    Grenade,
    Timer,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 5] = [
        PowerUpKind::Star,
        PowerUpKind::Helmet,
        PowerUpKind::Tank,
        PowerUpKind::Grenade,
        PowerUpKind::Timer,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerUp {
    pub kind: PowerUpKind,
    pub pos: TilePos,
}

impl PowerUp {
    pub fn aabb(&self) -> Aabb {
        TileMap::cell_aabb(self.pos)
    }
}
