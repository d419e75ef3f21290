use log::warn;
use macroquad::audio::{Sound, load_sound, play_sound_once};
use tankarena::GameEvent;

async fn load_optional(path: &str, what: &str) -> Option<Sound> {
    load_sound(path)
        .await
        .map_err(|e| {
            warn!("Failed to load {} sound '{}': {}", what, path, e);
            e
        })
        .ok()
}

#[derive(Default)]
pub struct AudioManager {
    fire_sound: Option<Sound>,
    hit_sound: Option<Sound>,
    death_sound: Option<Sound>,
    pickup_sound: Option<Sound>,
}

impl AudioManager {
    pub fn new() -> Self {
        Default::default()
    }

    // Load all sound assets; missing files only cost their sound
    pub async fn load_assets(&mut self) {
        self.fire_sound = load_optional("assets/fire1.ogg", "fire").await;
        self.hit_sound = load_optional("assets/boom1.ogg", "hit").await;
        self.death_sound = load_optional("assets/death1.ogg", "death").await;
        self.pickup_sound = load_optional("assets/pickup1.ogg", "pickup").await;
    }

    fn play(sound: &Option<Sound>) {
        if let Some(sound) = sound {
            play_sound_once(sound);
        }
    }

    /// Plays at most one sound per category for a batch of tick events.
    pub fn play_events(&self, events: &[GameEvent]) {
        let mut fire = false;
        let mut hit = false;
        let mut death = false;
        let mut pickup = false;
        for event in events {
            match event {
                GameEvent::ShotFired { .. } => fire = true,
                GameEvent::TileDestroyed { .. }
                | GameEvent::BulletAbsorbed { .. }
                | GameEvent::ShieldAbsorbed { .. }
                | GameEvent::TankHit { .. } => hit = true,
                GameEvent::EnemyDestroyed { .. }
                | GameEvent::PlayerDestroyed { .. }
                | GameEvent::BaseDestroyed { .. } => death = true,
                GameEvent::PowerUpCollected { .. } => pickup = true,
                _ => {}
            }
        }
        if fire {
            Self::play(&self.fire_sound);
        }
        if hit {
            Self::play(&self.hit_sound);
        }
        if death {
            Self::play(&self.death_sound);
        }
        if pickup {
            Self::play(&self.pickup_sound);
        }
    }
}
