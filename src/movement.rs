//! Per-tick motion for tanks and bullets.
//!
//! Tanks are clamped against impassable tiles, the map boundary and other living
//! tanks so that no two tanks ever overlap. Bullets travel their full distance
//! or up to the map edge; stopping and removing them is left to the collision pass.

use crate::config::{BULLET_SIZE, ICE_SLIDE_DISTANCE, SNAP_STEP, SUBTILE, sub_units};
use crate::entity::Slide;
use crate::tilemap::{Mover, TileKind, TileMap};
use crate::types::{Aabb, Direction};
use crate::world::World;
use crate::{debug_bullet, debug_tank};

#[derive(Debug, Default, Clone, Copy)]
pub struct MovementSystem;

impl MovementSystem {
    pub fn new() -> Self {
        MovementSystem
    }

    /// Moves every living tank in id order according to its intent or ice slide.
    pub fn move_tanks(&self, world: &mut World, dt: f32) {
        for i in 0..world.tanks.len() {
            if !world.tanks[i].alive {
                continue;
            }
            world.tanks[i].blocked = false;
            let intent = world.tanks[i].intent;

            let (direction, wanted) = match intent.direction {
                Some(direction) => {
                    if direction != world.tanks[i].facing {
                        if !direction.same_axis(world.tanks[i].facing) {
                            self.snap_cross_axis(world, i, direction);
                        }
                        world.tanks[i].facing = direction;
                    }
                    let tank = &mut world.tanks[i];
                    tank.slide = None;
                    tank.was_driving = true;
                    (direction, sub_units(tank.speed, dt))
                }
                None => {
                    let on_ice = world.map.kind(world.tanks[i].center_cell()) == Some(TileKind::Ice);
                    let tank = &mut world.tanks[i];
                    if tank.slide.is_none() && tank.was_driving && on_ice {
                        let velocity = tank.speed * SUBTILE as f32;
                        let distance = ICE_SLIDE_DISTANCE * SUBTILE as f32;
                        tank.slide = Some(Slide {
                            direction: tank.facing,
                            velocity,
                            deceleration: velocity * velocity / (2.0 * distance),
                        });
                        debug_tank!(tank.id.0, "sliding {:?} on ice", tank.facing);
                    }
                    tank.was_driving = false;
                    match tank.slide.as_mut() {
                        Some(slide) => {
                            let direction = slide.direction;
                            (direction, advance_slide(slide, dt))
                        }
                        None => {
                            tank.carry = 0.0;
                            continue;
                        }
                    }
                }
            };
            if world.tanks[i].slide.is_some_and(|s| s.velocity <= 0.0) {
                world.tanks[i].slide = None;
            }

            let total = wanted + world.tanks[i].carry;
            let travel = total.floor() as i32;
            world.tanks[i].carry = total - travel as f32;
            if travel <= 0 {
                continue;
            }

            let allowed = self.clear_travel(world, i, direction, travel);
            let tank = &mut world.tanks[i];
            if allowed < travel {
                tank.blocked = true;
                tank.carry = 0.0;
                tank.slide = None;
                debug_tank!(tank.id.0, "blocked heading {:?} after {} of {}", direction, allowed, travel);
            }
            let (dx, dy) = direction.delta();
            tank.x += dx * allowed;
            tank.y += dy * allowed;
        }
    }

    /// Moves every living bullet its full distance. A bullet that would leave
    /// the map stops at the edge and is flagged as exiting.
    pub fn move_bullets(&self, world: &mut World, dt: f32) {
        let bounds = world.map.bounds();
        for i in 0..world.bullets.len() {
            let bullet = &mut world.bullets[i];
            if !bullet.alive {
                continue;
            }
            let total = sub_units(bullet.speed, dt) + bullet.carry;
            let travel = total.floor() as i32;
            bullet.carry = total - travel as f32;

            bullet.start = bullet.aabb();
            let (dx, dy) = bullet.direction.delta();
            bullet.x += dx * travel;
            bullet.y += dy * travel;

            if !bounds.contains(&bullet.aabb()) {
                bullet.x = bullet.x.clamp(bounds.x, bounds.right() - BULLET_SIZE);
                bullet.y = bullet.y.clamp(bounds.y, bounds.bottom() - BULLET_SIZE);
                bullet.exiting = true;
                debug_bullet!(bullet.id.0, "reached the map edge");
            }
        }
    }

    /// Largest travel in `0..=travel` that keeps tank `index` off impassable
    /// tiles, inside the map and clear of every other living tank.
    fn clear_travel(&self, world: &World, index: usize, direction: Direction, travel: i32) -> i32 {
        let tank = &world.tanks[index];
        let current = tank.aabb();
        let swept = current.swept(direction, travel);
        let mut allowed = travel;

        for pos in world.map.tiles_overlapping(&swept) {
            if world.map.passable_for(Mover::Tank, pos) {
                continue;
            }
            let gap = current.gap_toward(direction, &TileMap::cell_aabb(pos));
            if gap >= 0 {
                allowed = allowed.min(gap);
            }
        }

        for other in world.tanks.iter().filter(|t| t.alive && t.id != tank.id) {
            let other_box = other.aabb();
            if !other_box.intersects(&swept) {
                continue;
            }
            let gap = current.gap_toward(direction, &other_box);
            if gap >= 0 {
                allowed = allowed.min(gap);
            }
        }

        allowed
    }

    /// Aligns the coordinate across a new direction of travel to the half-tile
    /// grid, provided the aligned box is free.
    fn snap_cross_axis(&self, world: &mut World, index: usize, direction: Direction) {
        let tank = &world.tanks[index];
        let snap = |v: i32| (v + SNAP_STEP / 2).div_euclid(SNAP_STEP) * SNAP_STEP;
        let (x, y) = if direction.is_vertical() {
            (snap(tank.x), tank.y)
        } else {
            (tank.x, snap(tank.y))
        };
        if (x, y) == (tank.x, tank.y) {
            return;
        }
        let snapped = Aabb::new(x, y, tank.aabb().w, tank.aabb().h);
        if self.box_free(world, index, &snapped) {
            let tank = &mut world.tanks[index];
            tank.x = x;
            tank.y = y;
        }
    }

    fn box_free(&self, world: &World, index: usize, aabb: &Aabb) -> bool {
        let id = world.tanks[index].id;
        world
            .map
            .tiles_overlapping(aabb)
            .all(|pos| world.map.passable_for(Mover::Tank, pos))
            && !world
                .tanks
                .iter()
                .any(|t| t.alive && t.id != id && t.aabb().intersects(aabb))
    }
}

/// Distance covered by a decelerating slide during `dt`, updating its velocity.
fn advance_slide(slide: &mut Slide, dt: f32) -> f32 {
    let stop_time = slide.velocity / slide.deceleration;
    if stop_time <= dt {
        let distance = slide.velocity * slide.velocity / (2.0 * slide.deceleration);
        slide.velocity = 0.0;
        distance
    } else {
        let distance = slide.velocity * dt - 0.5 * slide.deceleration * dt * dt;
        slide.velocity -= slide.deceleration * dt;
        distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FIXED_DT, TANK_SIZE};
    use crate::entity::{Bullet, TankIntent};
    use crate::types::{EntityId, TilePos};
    use assert_approx_eq::assert_approx_eq;

    fn world_with(kinds: &[(TilePos, TileKind)]) -> World {
        let mut tiles = vec![TileKind::Empty; 8 * 8];
        for &(pos, kind) in kinds {
            tiles[(pos.row * 8 + pos.col) as usize] = kind;
        }
        let map = TileMap::from_kinds(8, 8, &tiles).unwrap_or_else(|| TileMap::new(8, 8));
        World::new(map, None, TilePos::new(3, 6), Vec::new())
    }

    fn drive(world: &mut World, index: usize, direction: Option<Direction>) {
        world.tanks[index].intent = TankIntent {
            direction,
            shoot: false,
        };
    }

    #[test]
    fn test_tank_stops_flush_against_brick() {
        let mut world = world_with(&[(TilePos::new(3, 4), TileKind::Brick)]);
        world.spawn_player(0.0);
        drive(&mut world, 0, Some(Direction::Up));
        let system = MovementSystem::new();
        for _ in 0..120 {
            system.move_tanks(&mut world, FIXED_DT);
        }
        let tank = &world.tanks[0];
        assert_eq!(tank.y, 5 * SUBTILE);
        assert!(tank.blocked);
    }

    #[test]
    fn test_tank_stays_inside_map() {
        let mut world = world_with(&[]);
        world.spawn_player(0.0);
        drive(&mut world, 0, Some(Direction::Down));
        let system = MovementSystem::new();
        for _ in 0..120 {
            system.move_tanks(&mut world, FIXED_DT);
        }
        assert_eq!(world.tanks[0].y, 8 * SUBTILE - TANK_SIZE);
    }

    #[test]
    fn test_tanks_never_overlap_head_on() {
        let mut world = world_with(&[]);
        world.spawn_player(0.0);
        world.player_spawn = TilePos::new(3, 1);
        world.spawn_player(0.0);
        drive(&mut world, 0, Some(Direction::Up));
        drive(&mut world, 1, Some(Direction::Down));
        let system = MovementSystem::new();
        for _ in 0..200 {
            system.move_tanks(&mut world, FIXED_DT);
            assert!(!world.tanks[0].aabb().intersects(&world.tanks[1].aabb()));
        }
        assert_eq!(world.tanks[0].y - world.tanks[1].y, TANK_SIZE);
    }

    #[test]
    fn test_turning_snaps_to_half_tile() {
        let mut world = world_with(&[]);
        world.spawn_player(0.0);
        world.tanks[0].y = 5 * SUBTILE + 3;
        drive(&mut world, 0, Some(Direction::Left));
        MovementSystem::new().move_tanks(&mut world, FIXED_DT);
        assert_eq!(world.tanks[0].y % SNAP_STEP, 0);
        assert_eq!(world.tanks[0].facing, Direction::Left);
    }

    #[test]
    fn test_ice_slide_decelerates_to_rest() {
        let mut world = world_with(&[
            (TilePos::new(3, 6), TileKind::Ice),
            (TilePos::new(3, 5), TileKind::Ice),
            (TilePos::new(3, 4), TileKind::Ice),
        ]);
        world.spawn_player(0.0);
        let system = MovementSystem::new();
        drive(&mut world, 0, Some(Direction::Up));
        system.move_tanks(&mut world, FIXED_DT);
        let released_at = world.tanks[0].y;
        drive(&mut world, 0, None);
        for _ in 0..120 {
            system.move_tanks(&mut world, FIXED_DT);
        }
        let slid = released_at - world.tanks[0].y;
        assert!(slid > 0, "tank should keep moving on ice");
        assert!(slid <= (ICE_SLIDE_DISTANCE * SUBTILE as f32).ceil() as i32);
        assert!(world.tanks[0].slide.is_none());
    }

    #[test]
    fn test_no_slide_off_ice() {
        let mut world = world_with(&[]);
        world.spawn_player(0.0);
        let system = MovementSystem::new();
        drive(&mut world, 0, Some(Direction::Up));
        system.move_tanks(&mut world, FIXED_DT);
        let y = world.tanks[0].y;
        drive(&mut world, 0, None);
        system.move_tanks(&mut world, FIXED_DT);
        assert_eq!(world.tanks[0].y, y);
    }

    #[test]
    fn test_slide_distance_formula() {
        let mut slide = Slide {
            direction: Direction::Up,
            velocity: 48.0,
            deceleration: 48.0 * 48.0 / 32.0,
        };
        let mut covered = 0.0;
        for _ in 0..60 {
            covered += advance_slide(&mut slide, FIXED_DT);
        }
        assert_approx_eq!(covered, 16.0, 1e-3);
        assert_approx_eq!(slide.velocity, 0.0);
    }

    #[test]
    fn test_bullet_leaving_map_stops_at_edge() {
        let mut world = world_with(&[]);
        world.spawn_player(0.0);
        world.tanks[0].y = 0;
        world.tanks[0].active_bullets = 1;
        let id = world.alloc_id();
        let bullet = Bullet::from_tank(id, &world.tanks[0]);
        world.bullets.push(bullet);
        MovementSystem::new().move_bullets(&mut world, FIXED_DT);
        let bullet = &world.bullets[0];
        assert!(bullet.alive);
        assert!(bullet.exiting);
        assert_eq!(bullet.y, 0);
        assert!(world.map.bounds().contains(&bullet.aabb()));
        // Removal waits for the collision pass
        assert_eq!(world.tanks[0].active_bullets, 1);
    }

    #[test]
    fn test_long_step_path_ends_at_map_edge() {
        let mut world = world_with(&[]);
        world.spawn_player(0.0);
        let id = world.alloc_id();
        let bullet = Bullet::from_tank(id, &world.tanks[0]);
        world.bullets.push(bullet);
        MovementSystem::new().move_bullets(&mut world, 30.0);
        let bullet = &world.bullets[0];
        assert!(bullet.exiting);
        let path = bullet.path();
        assert_eq!(path.y, 0);
        assert!(path.bottom() <= world.map.bounds().bottom());
    }

    #[test]
    fn test_bullets_pass_over_water() {
        let mut world = world_with(&[(TilePos::new(3, 5), TileKind::Water)]);
        world.spawn_player(0.0);
        let id = world.alloc_id();
        let bullet = Bullet::from_tank(id, &world.tanks[0]);
        world.bullets.push(bullet);
        let start_y = world.bullets[0].y;
        MovementSystem::new().move_bullets(&mut world, 0.5);
        assert!(world.bullets[0].alive);
        assert!(world.bullets[0].y < start_y - SUBTILE);
        assert_eq!(world.bullets[0].id, EntityId(2));
    }
}
