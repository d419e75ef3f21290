use log::{debug, info, trace};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::ai::EnemyAi;
use crate::collision::CollisionSystem;
use crate::config::{MAX_TICK_ELAPSED, SimConfig};
use crate::entity::{Base, Pilot, PowerUp, TankIntent, TankKind};
use crate::error::SimError;
use crate::events::GameEvent;
use crate::level::LevelData;
use crate::movement::MovementSystem;
use crate::state::{GameCounters, GameStateMachine, GameStatus};
use crate::tilemap::TileMap;
use crate::types::{Direction, EntityId, Side};
use crate::world::World;

/// Player input for one tick. No direction means "stay put, keep facing".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerIntent {
    pub direction: Option<Direction>,
    pub shoot: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TankView {
    pub id: EntityId,
    pub kind: TankKind,
    pub x: i32,
    pub y: i32,
    pub facing: Direction,
    pub health: u32,
    pub invincible: bool,
    pub bonus: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BulletView {
    pub id: EntityId,
    pub side: Side,
    pub x: i32,
    pub y: i32,
    pub direction: Direction,
}

/// Read-only picture of the simulation at the end of a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub map: TileMap,
    pub tanks: Vec<TankView>,
    pub bullets: Vec<BulletView>,
    pub base: Option<Base>,
    pub power_up: Option<PowerUp>,
    pub frozen: bool,
    pub status: GameStatus,
    pub counters: GameCounters,
    pub level_name: String,
}

struct Session {
    level: LevelData,
    world: World,
    state: GameStateMachine,
}

impl Session {
    fn start(level: LevelData, config: &SimConfig, lives: u32, score: u32) -> Result<Self, SimError> {
        let mut world = World::from_level(&level).ok_or(SimError::InvalidState("level grid does not match its size"))?;
        if world.spawn_player(0.0).is_none() {
            return Err(SimError::InvalidState("player spawn is occupied"));
        }
        let state = GameStateMachine::new(&level, config, lives, score);
        Ok(Session { level, world, state })
    }
}

/// The tick driver. Owns the world, the state machine and the random source,
/// and runs the systems in a fixed order every tick.
pub struct Game {
    config: SimConfig,
    session: Option<Session>,
    rng: ChaCha8Rng,
    ai: EnemyAi,
    movement: MovementSystem,
    collisions: CollisionSystem,
}

impl Game {
    pub fn new(config: SimConfig) -> Self {
        Game {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            ai: EnemyAi::new(&config),
            movement: MovementSystem::new(),
            collisions: CollisionSystem::new(config.player_can_destroy_base),
            session: None,
            config,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn is_loaded(&self) -> bool {
        self.session.is_some()
    }

    pub fn status(&self) -> Option<GameStatus> {
        self.session.as_ref().map(|s| s.state.status())
    }

    /// Starts `level`. Lives and score carry over when the previous level was
    /// won. On error the current game is left untouched.
    pub fn load_level(&mut self, level: LevelData) -> Result<(), SimError> {
        level.validate()?;
        let (lives, score) = match &self.session {
            Some(s) if s.state.status() == GameStatus::Victory => {
                let counters = s.state.counters();
                (counters.lives, counters.score)
            }
            _ => (self.config.player_lives, 0),
        };
        let session = Session::start(level, &self.config, lives, score)?;
        info!(
            "Loaded level {} '{}' ({}x{}, {} enemies)",
            session.level.index,
            session.level.name,
            session.level.width,
            session.level.height,
            session.level.total_enemies()
        );
        self.rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.session = Some(session);
        Ok(())
    }

    /// Restarts the current level with fresh counters.
    pub fn reset(&mut self) -> Result<(), SimError> {
        let level = self
            .session
            .as_ref()
            .map(|s| s.level.clone())
            .ok_or(SimError::InvalidState("reset before a level was loaded"))?;
        let session = Session::start(level, &self.config, self.config.player_lives, 0)?;
        info!("Restarting level {}", session.level.index);
        self.rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.session = Some(session);
        Ok(())
    }

    /// Advances the simulation by `elapsed` seconds and returns what happened.
    pub fn tick(&mut self, elapsed: f32, intent: PlayerIntent) -> Result<Vec<GameEvent>, SimError> {
        let session = self
            .session
            .as_mut()
            .ok_or(SimError::InvalidState("tick before a level was loaded"))?;
        if !elapsed.is_finite() || !(0.0..=MAX_TICK_ELAPSED).contains(&elapsed) {
            return Err(SimError::InvalidElapsed(elapsed));
        }
        if elapsed == 0.0 || session.state.status().is_terminal() {
            return Ok(Vec::new());
        }
        let world = &mut session.world;
        trace!("tick dt={:.4}", elapsed);

        world.purge_dead();
        world.advance_timers(elapsed);

        // Intents
        if let Some(player) = world.player_mut() {
            player.intent = TankIntent {
                direction: intent.direction,
                shoot: intent.shoot,
            };
        }
        world.clear_enemy_intents();
        for decision in self.ai.plan(world, elapsed, &mut self.rng) {
            if let Some(tank) = world.tank_mut(decision.tank) {
                tank.intent = decision.intent;
                if let Pilot::Enemy { brain, .. } = &mut tank.pilot {
                    *brain = decision.brain;
                }
            }
        }

        self.movement.move_tanks(world, elapsed);

        let mut events = Vec::new();
        for i in 0..world.tanks.len() {
            if let Some(bullet) = world.fire(i) {
                let tank = &world.tanks[i];
                events.push(GameEvent::ShotFired {
                    tank: tank.id,
                    bullet,
                    side: tank.side(),
                });
            }
        }

        self.movement.move_bullets(world, elapsed);
        events.extend(self.collisions.resolve(world));

        let raised = session.state.apply(&events, &mut session.world, &mut self.rng);
        events.extend(raised);
        let raised = session.state.update(&mut session.world, elapsed, &mut self.rng);
        events.extend(raised);

        if !events.is_empty() {
            debug!("tick produced {} events", events.len());
        }
        Ok(events)
    }

    pub fn snapshot(&self) -> Result<Snapshot, SimError> {
        let session = self
            .session
            .as_ref()
            .ok_or(SimError::InvalidState("snapshot before a level was loaded"))?;
        let world = &session.world;
        Ok(Snapshot {
            map: world.map.clone(),
            tanks: world
                .tanks
                .iter()
                .filter(|t| t.alive)
                .map(|t| TankView {
                    id: t.id,
                    kind: t.kind,
                    x: t.x,
                    y: t.y,
                    facing: t.facing,
                    health: t.health,
                    invincible: t.is_invincible(),
                    bonus: t.is_bonus(),
                })
                .collect(),
            bullets: world
                .bullets
                .iter()
                .filter(|b| b.alive)
                .map(|b| BulletView {
                    id: b.id,
                    side: b.side,
                    x: b.x,
                    y: b.y,
                    direction: b.direction,
                })
                .collect(),
            base: world.base,
            power_up: world.power_up,
            frozen: world.is_frozen(),
            status: session.state.status(),
            counters: session.state.counters(),
            level_name: session.level.name.clone(),
        })
    }

    #[cfg(test)]
    fn world_mut(&mut self) -> &mut World {
        match self.session.as_mut() {
            Some(session) => &mut session.world,
            None => panic!("no level loaded"),
        }
    }
}
