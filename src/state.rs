//! Game flow: win/loss status, counters, enemy waves and player respawn.

use std::collections::VecDeque;

use log::info;
use rand::Rng;

use crate::ai::Brain;
use crate::config::{BONUS_ENEMY_ORDINALS, SimConfig};
use crate::debug_state;
use crate::entity::{EnemyKind, PowerUp, PowerUpKind};
use crate::events::GameEvent;
use crate::level::LevelData;
use crate::tilemap::Mover;
use crate::world::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Running,
    Victory,
    GameOver,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        self != GameStatus::Running
    }
}

/// Inputs that can move the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    BaseDestroyed,
    LivesExhausted,
    AllEnemiesCleared,
    Restart,
}

/// The whole transition table. Terminal states only leave on `Restart`.
pub fn next_status(current: GameStatus, trigger: Trigger) -> GameStatus {
    match (current, trigger) {
        (_, Trigger::Restart) => GameStatus::Running,
        (GameStatus::Running, Trigger::BaseDestroyed) => GameStatus::GameOver,
        (GameStatus::Running, Trigger::LivesExhausted) => GameStatus::GameOver,
        (GameStatus::Running, Trigger::AllEnemiesCleared) => GameStatus::Victory,
        (status, _) => status,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameCounters {
    pub lives: u32,
    pub score: u32,
    pub enemies_to_spawn: u32,
    pub enemies_alive: u32,
    pub level_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameStateMachine {
    status: GameStatus,
    counters: GameCounters,
    roster: VecDeque<EnemyKind>,
    spawn_timer: f32,
    spawn_cursor: usize,
    spawned: u32,
    respawn_pending: bool,
    max_concurrent: u32,
    spawn_interval: f32,
    respawn_invincibility: f32,
}

impl GameStateMachine {
    pub fn new(level: &LevelData, config: &SimConfig, lives: u32, score: u32) -> Self {
        let roster: VecDeque<EnemyKind> = level.roster_queue();
        GameStateMachine {
            status: GameStatus::Running,
            counters: GameCounters {
                lives,
                score,
                enemies_to_spawn: roster.len() as u32,
                enemies_alive: 0,
                level_index: level.index,
            },
            roster,
            spawn_timer: 0.0,
            spawn_cursor: 0,
            spawned: 0,
            respawn_pending: false,
            max_concurrent: config.max_concurrent_enemies,
            spawn_interval: config.spawn_interval,
            respawn_invincibility: config.respawn_invincibility,
        }
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn counters(&self) -> GameCounters {
        self.counters
    }

    fn transition(&mut self, trigger: Trigger, events: &mut Vec<GameEvent>) {
        let next = next_status(self.status, trigger);
        if next != self.status {
            info!("Game status {:?} -> {:?} ({:?})", self.status, next, trigger);
            events.push(GameEvent::StatusChanged {
                from: self.status,
                to: next,
            });
            self.status = next;
        }
    }

    /// Applies the tick's collision outcomes. Returns the follow-up events it raised.
    pub fn apply<R: Rng>(&mut self, events: &[GameEvent], world: &mut World, rng: &mut R) -> Vec<GameEvent> {
        let mut raised = Vec::new();
        for event in events {
            match *event {
                GameEvent::BaseDestroyed { .. } => self.transition(Trigger::BaseDestroyed, &mut raised),
                GameEvent::EnemyDestroyed { score, bonus, .. } => {
                    self.counters.score += score;
                    self.counters.enemies_alive = self.counters.enemies_alive.saturating_sub(1);
                    if bonus {
                        if let Some(power_up) = place_power_up(world, rng) {
                            raised.push(GameEvent::PowerUpSpawned {
                                kind: power_up.kind,
                                pos: power_up.pos,
                            });
                        }
                    }
                }
                GameEvent::PlayerDestroyed { .. } => {
                    self.counters.lives = self.counters.lives.saturating_sub(1);
                    debug_state!("player lost a life, {} left", self.counters.lives);
                    if self.counters.lives == 0 {
                        self.transition(Trigger::LivesExhausted, &mut raised);
                    } else {
                        self.respawn_pending = true;
                    }
                }
                GameEvent::PowerUpCollected {
                    kind: PowerUpKind::Tank,
                    ..
                } => self.counters.lives += 1,
                _ => {}
            }
        }
        raised
    }

    /// Per-tick bookkeeping after collisions: player respawn, enemy spawning and
    /// the victory check.
    pub fn update<R: Rng>(&mut self, world: &mut World, dt: f32, rng: &mut R) -> Vec<GameEvent> {
        let mut raised = Vec::new();
        if self.status.is_terminal() {
            return raised;
        }

        if self.respawn_pending {
            if let Some(tank) = world.spawn_player(self.respawn_invincibility) {
                self.respawn_pending = false;
                info!("Player respawned as tank {}", tank);
                raised.push(GameEvent::PlayerRespawned {
                    tank,
                    pos: world.player_spawn,
                });
            } else {
                debug_state!("player respawn deferred, spawn point occupied");
            }
        }

        self.spawn_timer -= dt;
        if self.spawn_timer <= 0.0 {
            if let Some(event) = self.try_spawn_enemy(world, rng) {
                raised.push(event);
                self.spawn_timer = self.spawn_interval;
            }
        }

        if self.counters.enemies_to_spawn == 0 && self.counters.enemies_alive == 0 {
            self.transition(Trigger::AllEnemiesCleared, &mut raised);
        }
        raised
    }

    fn try_spawn_enemy<R: Rng>(&mut self, world: &mut World, rng: &mut R) -> Option<GameEvent> {
        let kind = *self.roster.front()?;
        if self.counters.enemies_alive >= self.max_concurrent {
            return None;
        }
        let points = world.enemy_spawns.len();
        let offset = (0..points).find(|k| {
            let pos = world.enemy_spawns[(self.spawn_cursor + k) % points];
            world.cell_free_for_tank(pos)
        });
        let Some(offset) = offset else {
            debug_state!("enemy spawn deferred, all {} spawn points blocked", points);
            return None;
        };
        let index = (self.spawn_cursor + offset) % points;
        let pos = world.enemy_spawns[index];
        self.roster.pop_front();
        self.spawn_cursor = (index + 1) % points;
        self.spawned += 1;
        self.counters.enemies_to_spawn -= 1;
        self.counters.enemies_alive += 1;

        let bonus = BONUS_ENEMY_ORDINALS.contains(&self.spawned);
        let tank = world.spawn_enemy(kind, pos, Brain::random(rng), bonus);
        info!(
            "Spawned {} enemy {} at {} ({} left to spawn)",
            kind.name(),
            tank,
            pos,
            self.counters.enemies_to_spawn
        );
        Some(GameEvent::EnemySpawned { tank, kind, pos })
    }
}

/// Drops a random power-up on a random tank-passable cell that is not the base,
/// replacing any power-up already on the map.
fn place_power_up<R: Rng>(world: &mut World, rng: &mut R) -> Option<PowerUp> {
    let base = world.base.map(|b| b.pos);
    let cells: Vec<_> = world
        .map
        .iter()
        .map(|(pos, _)| pos)
        .filter(|&pos| world.map.passable_for(Mover::Tank, pos) && Some(pos) != base)
        .collect();
    if cells.is_empty() {
        return None;
    }
    let pos = cells[rng.gen_range(0..cells.len())];
    let kind = PowerUpKind::ALL[rng.gen_range(0..PowerUpKind::ALL.len())];
    let power_up = PowerUp { kind, pos };
    world.power_up = Some(power_up);
    debug_state!("power-up {:?} dropped at {}", kind, pos);
    Some(power_up)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FIXED_DT;
    use crate::tilemap::TileKind;
    use crate::types::{EntityId, Side, TilePos};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn level(roster: Vec<(EnemyKind, u32)>, spawns: Vec<TilePos>) -> LevelData {
        LevelData {
            index: 0,
            name: "test".to_string(),
            width: 6,
            height: 6,
            tiles: vec![TileKind::Empty; 36],
            base: None,
            player_spawn: TilePos::new(2, 5),
            enemy_spawns: spawns,
            roster,
        }
    }

    fn setup(roster: Vec<(EnemyKind, u32)>, config: &SimConfig) -> (GameStateMachine, World) {
        let level = level(roster, vec![TilePos::new(0, 0), TilePos::new(5, 0)]);
        let mut world = World::from_level(&level).unwrap_or_else(|| World::new(
            crate::tilemap::TileMap::new(6, 6),
            None,
            level.player_spawn,
            level.enemy_spawns.clone(),
        ));
        world.spawn_player(0.0);
        let machine = GameStateMachine::new(&level, config, config.player_lives, 0);
        (machine, world)
    }

    #[test]
    fn test_transition_table() {
        use GameStatus::*;
        assert_eq!(next_status(Running, Trigger::BaseDestroyed), GameOver);
        assert_eq!(next_status(Running, Trigger::LivesExhausted), GameOver);
        assert_eq!(next_status(Running, Trigger::AllEnemiesCleared), Victory);
        assert_eq!(next_status(GameOver, Trigger::AllEnemiesCleared), GameOver);
        assert_eq!(next_status(Victory, Trigger::BaseDestroyed), Victory);
        assert_eq!(next_status(GameOver, Trigger::Restart), Running);
        assert_eq!(next_status(Victory, Trigger::Restart), Running);
    }

    #[test]
    fn test_base_destroyed_ends_game_regardless_of_lives() {
        let config = SimConfig::default();
        let (mut machine, mut world) = setup(vec![(EnemyKind::Basic, 2)], &config);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let raised = machine.apply(
            &[GameEvent::BaseDestroyed {
                bullet: EntityId(9),
                side: Side::Enemy,
            }],
            &mut world,
            &mut rng,
        );
        assert_eq!(machine.status(), GameStatus::GameOver);
        assert_eq!(machine.counters().lives, config.player_lives);
        assert_eq!(
            raised,
            vec![GameEvent::StatusChanged {
                from: GameStatus::Running,
                to: GameStatus::GameOver
            }]
        );
    }

    #[test]
    fn test_last_life_lost_is_game_over() {
        let mut config = SimConfig::default();
        config.player_lives = 2;
        let (mut machine, mut world) = setup(vec![(EnemyKind::Basic, 1)], &config);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let lost = [GameEvent::PlayerDestroyed { tank: EntityId(1) }];
        machine.apply(&lost, &mut world, &mut rng);
        assert_eq!(machine.status(), GameStatus::Running);
        assert_eq!(machine.counters().lives, 1);
        machine.apply(&lost, &mut world, &mut rng);
        assert_eq!(machine.status(), GameStatus::GameOver);
        assert_eq!(machine.counters().lives, 0);
    }

    #[test]
    fn test_respawn_waits_for_free_spawn_point() {
        let config = SimConfig::default();
        let (mut machine, mut world) = setup(Vec::new(), &config);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        // The old player tank still sits on the spawn point
        machine.apply(&[GameEvent::PlayerDestroyed { tank: EntityId(1) }], &mut world, &mut rng);
        machine.counters.enemies_to_spawn = 1;
        let raised = machine.update(&mut world, FIXED_DT, &mut rng);
        assert!(!raised.iter().any(|e| matches!(e, GameEvent::PlayerRespawned { .. })));
        world.tanks[0].alive = false;
        world.purge_dead();
        let raised = machine.update(&mut world, FIXED_DT, &mut rng);
        let respawned = raised
            .iter()
            .find_map(|e| match e {
                GameEvent::PlayerRespawned { tank, .. } => Some(*tank),
                _ => None,
            });
        assert!(respawned.is_some_and(|id| id != EntityId(1)), "respawn gets a new id");
        assert!(world.player().is_some_and(|p| p.is_invincible()));
    }

    #[test]
    fn test_spawning_respects_concurrency_and_rotates_points() {
        let mut config = SimConfig::default();
        config.max_concurrent_enemies = 2;
        config.spawn_interval = 0.0;
        let (mut machine, mut world) = setup(vec![(EnemyKind::Basic, 3)], &config);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut spawned = Vec::new();
        for _ in 0..5 {
            for event in machine.update(&mut world, FIXED_DT, &mut rng) {
                if let GameEvent::EnemySpawned { pos, .. } = event {
                    spawned.push(pos);
                }
            }
        }
        assert_eq!(spawned, vec![TilePos::new(0, 0), TilePos::new(5, 0)]);
        assert_eq!(machine.counters().enemies_alive, 2);
        assert_eq!(machine.counters().enemies_to_spawn, 1);
    }

    #[test]
    fn test_blocked_spawn_point_is_skipped_then_deferred() {
        let config = SimConfig::default();
        let (mut machine, mut world) = setup(vec![(EnemyKind::Fast, 1)], &config);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        // Park tanks on both spawn points
        world.player_spawn = TilePos::new(0, 0);
        world.spawn_player(0.0);
        world.player_spawn = TilePos::new(5, 0);
        world.spawn_player(0.0);
        assert!(machine.update(&mut world, FIXED_DT, &mut rng).is_empty());
        assert_eq!(machine.counters().enemies_to_spawn, 1);

        let blocker = world.tanks.len() - 1;
        world.tanks[blocker].alive = false;
        world.purge_dead();
        let raised = machine.update(&mut world, FIXED_DT, &mut rng);
        assert!(matches!(
            raised[0],
            GameEvent::EnemySpawned { pos, kind: EnemyKind::Fast, .. } if pos == TilePos::new(5, 0)
        ));
    }

    #[test]
    fn test_victory_after_last_enemy_destroyed() {
        let config = SimConfig::default();
        let (mut machine, mut world) = setup(vec![(EnemyKind::Basic, 1)], &config);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let raised = machine.update(&mut world, FIXED_DT, &mut rng);
        let tank = raised
            .iter()
            .find_map(|e| match e {
                GameEvent::EnemySpawned { tank, .. } => Some(*tank),
                _ => None,
            })
            .unwrap_or(EntityId(0));
        assert_eq!(machine.status(), GameStatus::Running);
        machine.apply(
            &[GameEvent::EnemyDestroyed {
                tank,
                kind: EnemyKind::Basic,
                score: 100,
                bonus: false,
            }],
            &mut world,
            &mut rng,
        );
        machine.update(&mut world, FIXED_DT, &mut rng);
        assert_eq!(machine.status(), GameStatus::Victory);
        assert_eq!(machine.counters().score, 100);
    }

    #[test]
    fn test_empty_roster_is_immediate_victory() {
        let config = SimConfig::default();
        let (mut machine, mut world) = setup(Vec::new(), &config);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        machine.update(&mut world, FIXED_DT, &mut rng);
        assert_eq!(machine.status(), GameStatus::Victory);
    }

    #[test]
    fn test_bonus_kill_drops_power_up_and_tank_adds_life() {
        let config = SimConfig::default();
        let (mut machine, mut world) = setup(vec![(EnemyKind::Basic, 1)], &config);
        machine.counters.enemies_alive = 1;
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let raised = machine.apply(
            &[GameEvent::EnemyDestroyed {
                tank: EntityId(3),
                kind: EnemyKind::Basic,
                score: 100,
                bonus: true,
            }],
            &mut world,
            &mut rng,
        );
        assert!(matches!(raised[0], GameEvent::PowerUpSpawned { .. }));
        assert!(world.power_up.is_some());
        machine.apply(
            &[GameEvent::PowerUpCollected {
                kind: PowerUpKind::Tank,
                tank: EntityId(1),
            }],
            &mut world,
            &mut rng,
        );
        assert_eq!(machine.counters().lives, config.player_lives + 1);
    }
}
