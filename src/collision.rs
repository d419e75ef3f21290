//! Collision detection and resolution.
//!
//! Each tick the living bullets are checked against one category at a time in
//! a fixed priority order: tiles, then the base, then opposing tanks, then
//! opposing bullets. A bullet resolves at most once; once marked dead it is
//! skipped by every later category. Bullets that reached the map edge without
//! hitting anything are removed next, and player pickups run last. Outcomes
//! are returned as an ordered event list and never touch the game state directly.

use crate::config::{FREEZE_DURATION, HELMET_INVINCIBILITY};
use crate::{debug_bullet, debug_collision};
use crate::entity::{PowerUpKind, TankKind};
use crate::events::GameEvent;
use crate::tilemap::{DamageResult, TileMap};
use crate::types::Side;
use crate::world::World;

#[derive(Debug, Clone, Copy, Default)]
pub struct CollisionSystem {
    /// Friendly fire on the base.
    pub player_can_destroy_base: bool,
}

impl CollisionSystem {
    pub fn new(player_can_destroy_base: bool) -> Self {
        CollisionSystem {
            player_can_destroy_base,
        }
    }

    /// Resolves every interaction for the tick using post-move positions.
    pub fn resolve(&self, world: &mut World) -> Vec<GameEvent> {
        let mut events = Vec::new();
        self.bullets_vs_tiles(world, &mut events);
        self.bullets_vs_base(world, &mut events);
        self.bullets_vs_tanks(world, &mut events);
        self.bullets_vs_bullets(world, &mut events);
        self.bullets_leaving_map(world);
        self.pickups(world, &mut events);
        events
    }

    fn kill_bullet(world: &mut World, index: usize) {
        world.bullets[index].alive = false;
        let owner = world.bullets[index].owner;
        world.release_bullet(owner);
    }

    fn bullets_vs_tiles(&self, world: &mut World, events: &mut Vec<GameEvent>) {
        for i in 0..world.bullets.len() {
            let bullet = &world.bullets[i];
            if !bullet.alive {
                continue;
            }
            let path = bullet.path();
            // Nearest destructible cell along the path, ties by row then column
            let hit = world
                .map
                .tiles_overlapping(&path)
                .filter(|&pos| world.map.kind(pos).is_some_and(|k| k.is_destructible()))
                .min_by_key(|&pos| (bullet.distance_to(&TileMap::cell_aabb(pos)), pos.row, pos.col));
            let Some(pos) = hit else {
                continue;
            };
            let (id, power) = (bullet.id, bullet.power);
            let kind = world.map.kind(pos);
            Self::kill_bullet(world, i);
            match (world.map.damage(pos, power), kind) {
                (DamageResult::Destroyed, Some(kind)) => {
                    debug_collision!("bullet {} destroyed {:?} at {}", id, kind, pos);
                    events.push(GameEvent::TileDestroyed { pos, kind });
                }
                _ => {
                    debug_collision!("bullet {} absorbed by tile at {}", id, pos);
                    events.push(GameEvent::BulletAbsorbed { bullet: id, pos });
                }
            }
        }
    }

    fn bullets_vs_base(&self, world: &mut World, events: &mut Vec<GameEvent>) {
        let Some(base) = world.base else {
            return;
        };
        let base_box = base.aabb();
        for i in 0..world.bullets.len() {
            let bullet = &world.bullets[i];
            if !bullet.alive || !bullet.path().intersects(&base_box) {
                continue;
            }
            let (id, side) = (bullet.id, bullet.side);
            Self::kill_bullet(world, i);
            let fatal = side == Side::Enemy || self.player_can_destroy_base;
            match world.base.as_mut() {
                Some(base) if fatal && !base.destroyed => {
                    base.destroyed = true;
                    debug_collision!("bullet {} destroyed the base", id);
                    events.push(GameEvent::BaseDestroyed { bullet: id, side });
                }
                _ => events.push(GameEvent::BulletAbsorbed {
                    bullet: id,
                    pos: base.pos,
                }),
            }
        }
    }

    fn bullets_vs_tanks(&self, world: &mut World, events: &mut Vec<GameEvent>) {
        for i in 0..world.bullets.len() {
            let bullet = &world.bullets[i];
            if !bullet.alive {
                continue;
            }
            let path = bullet.path();
            let target_side = bullet.side.opposing();
            let hit = world
                .tanks
                .iter()
                .enumerate()
                .filter(|(_, t)| t.alive && t.side() == target_side && t.aabb().intersects(&path))
                .min_by_key(|(_, t)| (bullet.distance_to(&t.aabb()), t.id))
                .map(|(j, _)| j);
            let Some(j) = hit else {
                continue;
            };
            let (bullet_id, owner) = (bullet.id, bullet.owner);
            let shooter_alive = world.tank(owner).is_some_and(|t| t.alive);
            Self::kill_bullet(world, i);

            let tank = &mut world.tanks[j];
            if tank.is_invincible() {
                debug_collision!("tank {} shrugged off bullet {}", tank.id, bullet_id);
                events.push(GameEvent::ShieldAbsorbed {
                    tank: tank.id,
                    bullet: bullet_id,
                });
                continue;
            }
            tank.health = tank.health.saturating_sub(1);
            if tank.health > 0 {
                events.push(GameEvent::TankHit {
                    tank: tank.id,
                    health: tank.health,
                });
                continue;
            }
            tank.alive = false;
            match tank.kind {
                TankKind::Enemy(kind) => {
                    let score = if shooter_alive { kind.score() } else { 0 };
                    debug_collision!("enemy {} destroyed by bullet {} for {} points", tank.id, bullet_id, score);
                    events.push(GameEvent::EnemyDestroyed {
                        tank: tank.id,
                        kind,
                        score,
                        bonus: tank.is_bonus(),
                    });
                }
                TankKind::Player => {
                    debug_collision!("player {} destroyed by bullet {}", tank.id, bullet_id);
                    events.push(GameEvent::PlayerDestroyed { tank: tank.id });
                }
            }
        }
    }

    fn bullets_vs_bullets(&self, world: &mut World, events: &mut Vec<GameEvent>) {
        for i in 0..world.bullets.len() {
            let bullet = &world.bullets[i];
            if !bullet.alive || bullet.side != Side::Player {
                continue;
            }
            let path = bullet.path();
            let other = world
                .bullets
                .iter()
                .position(|b| b.alive && b.side == Side::Enemy && b.path().intersects(&path));
            let Some(j) = other else {
                continue;
            };
            let (player_bullet, enemy_bullet) = (bullet.id, world.bullets[j].id);
            Self::kill_bullet(world, i);
            Self::kill_bullet(world, j);
            debug_collision!("bullets {} and {} cancelled out", player_bullet, enemy_bullet);
            events.push(GameEvent::BulletsCancelled {
                player_bullet,
                enemy_bullet,
            });
        }
    }

    /// Removes bullets that reached the map edge and were not stopped by anything on the way.
    fn bullets_leaving_map(&self, world: &mut World) {
        for i in 0..world.bullets.len() {
            let bullet = &world.bullets[i];
            if bullet.alive && bullet.exiting {
                debug_bullet!(bullet.id.0, "left the map");
                Self::kill_bullet(world, i);
            }
        }
    }

    fn pickups(&self, world: &mut World, events: &mut Vec<GameEvent>) {
        let Some(power_up) = world.power_up else {
            return;
        };
        let Some(player) = world.player() else {
            return;
        };
        if !player.aabb().intersects(&power_up.aabb()) {
            return;
        }
        let player_id = player.id;
        world.power_up = None;
        debug_collision!("player {} collected {:?}", player_id, power_up.kind);
        events.push(GameEvent::PowerUpCollected {
            kind: power_up.kind,
            tank: player_id,
        });

        match power_up.kind {
            PowerUpKind::Star => {
                if let Some(player) = world.player_mut() {
                    player.upgrade_weapon();
                }
            }
            PowerUpKind::Helmet => {
                if let Some(player) = world.player_mut() {
                    player.invincibility = player.invincibility.max(HELMET_INVINCIBILITY);
                }
            }
            PowerUpKind::Timer => world.freeze = FREEZE_DURATION,
            // Extra lives are counted by the state machine
            PowerUpKind::Tank => {}
            // Clears the field without scoring or dropping further power-ups
            PowerUpKind::Grenade => {
                for tank in world.tanks.iter_mut().filter(|t| t.alive) {
                    if let TankKind::Enemy(kind) = tank.kind {
                        tank.alive = false;
                        events.push(GameEvent::EnemyDestroyed {
                            tank: tank.id,
                            kind,
                            score: 0,
                            bonus: false,
                        });
                    }
                }
            }
        }
    }
}
