//! The simulation world: exclusive owner of the tile map and every entity.

use log::debug;

use crate::ai::Brain;
use crate::debug_bullet;
use crate::entity::{Base, Bullet, EnemyKind, PowerUp, Tank, TankIntent};
use crate::level::LevelData;
use crate::tilemap::{Mover, TileMap};
use crate::types::{EntityId, TilePos};

#[derive(Debug, Clone, PartialEq)]
pub struct World {
    pub map: TileMap,
    /// Kept in ascending id order; new tanks are always appended.
    pub tanks: Vec<Tank>,
    pub bullets: Vec<Bullet>,
    pub base: Option<Base>,
    pub power_up: Option<PowerUp>,
    /// Remaining seconds of the enemy freeze.
    pub freeze: f32,
    pub player_spawn: TilePos,
    pub enemy_spawns: Vec<TilePos>,
    next_id: u32,
}

impl World {
    pub fn new(map: TileMap, base: Option<TilePos>, player_spawn: TilePos, enemy_spawns: Vec<TilePos>) -> Self {
        World {
            map,
            tanks: Vec::new(),
            bullets: Vec::new(),
            base: base.map(|pos| Base {
                pos,
                destroyed: false,
            }),
            power_up: None,
            freeze: 0.0,
            player_spawn,
            enemy_spawns,
            next_id: 1,
        }
    }

    pub fn from_level(level: &LevelData) -> Option<Self> {
        let map = level.tile_map()?;
        Some(World::new(
            map,
            level.base,
            level.player_spawn,
            level.enemy_spawns.clone(),
        ))
    }

    pub fn alloc_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn tank(&self, id: EntityId) -> Option<&Tank> {
        self.tanks.iter().find(|t| t.id == id)
    }

    pub fn tank_mut(&mut self, id: EntityId) -> Option<&mut Tank> {
        self.tanks.iter_mut().find(|t| t.id == id)
    }

    /// The living player tank, if any.
    pub fn player(&self) -> Option<&Tank> {
        self.tanks.iter().find(|t| t.alive && t.is_player())
    }

    pub fn player_mut(&mut self) -> Option<&mut Tank> {
        self.tanks.iter_mut().find(|t| t.alive && t.is_player())
    }

    pub fn alive_enemies(&self) -> impl Iterator<Item = &Tank> {
        self.tanks.iter().filter(|t| t.alive && !t.is_player())
    }

    pub fn is_frozen(&self) -> bool {
        self.freeze > 0.0
    }

    /// Drops entities marked dead during the previous tick.
    pub fn purge_dead(&mut self) {
        self.tanks.retain(|t| t.alive);
        self.bullets.retain(|b| b.alive);
    }

    /// Counts down every timer by `dt` seconds.
    pub fn advance_timers(&mut self, dt: f32) {
        for tank in self.tanks.iter_mut().filter(|t| t.alive) {
            tank.shoot_cooldown = (tank.shoot_cooldown - dt).max(0.0);
            tank.invincibility = (tank.invincibility - dt).max(0.0);
        }
        self.freeze = (self.freeze - dt).max(0.0);
    }

    /// Whether a tank placed on `pos` would sit on passable ground without
    /// overlapping any living tank.
    pub fn cell_free_for_tank(&self, pos: TilePos) -> bool {
        if !self.map.passable_for(Mover::Tank, pos) {
            return false;
        }
        let cell = TileMap::cell_aabb(pos);
        !self
            .tanks
            .iter()
            .any(|t| t.alive && t.aabb().intersects(&cell))
    }

    pub fn spawn_player(&mut self, invincibility: f32) -> Option<EntityId> {
        let pos = self.player_spawn;
        if !self.cell_free_for_tank(pos) {
            return None;
        }
        let id = self.alloc_id();
        self.tanks.push(Tank::new_player(id, pos, invincibility));
        debug!("Player tank {} placed at {}", id, pos);
        Some(id)
    }

    pub fn spawn_enemy(&mut self, kind: EnemyKind, pos: TilePos, brain: Brain, bonus: bool) -> EntityId {
        let id = self.alloc_id();
        self.tanks.push(Tank::new_enemy(id, kind, pos, brain, bonus));
        id
    }

    /// Applies the tank's shoot intent. Returns the new bullet's id when a shot
    /// was actually fired.
    pub fn fire(&mut self, index: usize) -> Option<EntityId> {
        let tank = self.tanks.get(index)?;
        if !tank.intent.shoot || !tank.can_shoot() {
            return None;
        }
        let id = self.alloc_id();
        let tank = &mut self.tanks[index];
        let bullet = Bullet::from_tank(id, tank);
        tank.active_bullets += 1;
        tank.shoot_cooldown = tank.shoot_cooldown_duration();
        debug_bullet!(
            id.0,
            "fired by {} heading {:?} at ({}, {})",
            tank.id,
            bullet.direction,
            bullet.x,
            bullet.y
        );
        self.bullets.push(bullet);
        Some(id)
    }

    /// Frees one bullet slot of `owner`. A missing owner is not an error.
    pub fn release_bullet(&mut self, owner: EntityId) {
        if let Some(tank) = self.tank_mut(owner) {
            tank.active_bullets = tank.active_bullets.saturating_sub(1);
        }
    }

    /// Clears every enemy intent; frozen or undecided enemies stay still.
    pub fn clear_enemy_intents(&mut self) {
        for tank in self.tanks.iter_mut().filter(|t| !t.is_player()) {
            tank.intent = TankIntent::default();
        }
    }
}
