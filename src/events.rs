//! Discrete notifications emitted by a tick, in the order they happened.

use crate::entity::{EnemyKind, PowerUpKind};
use crate::state::GameStatus;
use crate::tilemap::TileKind;
use crate::types::{EntityId, Side, TilePos};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    ShotFired {
        tank: EntityId,
        bullet: EntityId,
        side: Side,
    },
    TileDestroyed {
        pos: TilePos,
        kind: TileKind,
    },
    /// A bullet was consumed without effect: steel below threshold, or a friendly shot on the base.
    BulletAbsorbed {
        bullet: EntityId,
        pos: TilePos,
    },
    BaseDestroyed {
        bullet: EntityId,
        side: Side,
    },
    /// An invincible tank stopped a bullet.
    ShieldAbsorbed {
        tank: EntityId,
        bullet: EntityId,
    },
    TankHit {
        tank: EntityId,
        health: u32,
    },
    /// `score` is zero when the kill earns nothing (dead shooter, grenade).
    EnemyDestroyed {
        tank: EntityId,
        kind: EnemyKind,
        score: u32,
        bonus: bool,
    },
    PlayerDestroyed {
        tank: EntityId,
    },
    BulletsCancelled {
        player_bullet: EntityId,
        enemy_bullet: EntityId,
    },
    EnemySpawned {
        tank: EntityId,
        kind: EnemyKind,
        pos: TilePos,
    },
    PlayerRespawned {
        tank: EntityId,
        pos: TilePos,
    },
    PowerUpSpawned {
        kind: PowerUpKind,
        pos: TilePos,
    },
    PowerUpCollected {
        kind: PowerUpKind,
        tank: EntityId,
    },
    StatusChanged {
        from: GameStatus,
        to: GameStatus,
    },
}
