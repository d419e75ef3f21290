use std::error::Error;
use std::path::PathBuf;

use log::{error, info};
use macroquad::prelude::*;
use tankarena::config::{FIXED_DT, MAX_TICKS_PER_FRAME};
use tankarena::types::Direction;
use tankarena::{Game, GameStatus, LevelData, PlayerIntent};

use crate::assets;
use crate::audio::AudioManager;
use crate::render::{Renderer, announcement_for};

/// Where levels come from.
pub enum LevelSource {
    Embedded(usize),
    File(PathBuf),
}

impl LevelSource {
    fn load(&self) -> Result<LevelData, Box<dyn Error>> {
        match self {
            LevelSource::Embedded(index) => match assets::load_embedded_level(*index) {
                Some(level) => Ok(level?),
                None => Err(format!(
                    "no embedded level {} ({} available)",
                    index + 1,
                    assets::level_count()
                )
                .into()),
            },
            LevelSource::File(path) => {
                let text = std::fs::read_to_string(path)?;
                Ok(LevelData::parse(&text)?)
            }
        }
    }

    fn next(&self) -> Option<LevelSource> {
        match self {
            LevelSource::Embedded(index) if index + 1 < assets::level_count() => {
                Some(LevelSource::Embedded(index + 1))
            }
            _ => None,
        }
    }
}

// Most recently listed key wins when several are held: Up, Down, Left, Right
fn read_intent() -> PlayerIntent {
    let held = |keys: [KeyCode; 2]| keys.iter().any(|&k| is_key_down(k));
    let direction = if held([KeyCode::Up, KeyCode::W]) {
        Some(Direction::Up)
    } else if held([KeyCode::Down, KeyCode::S]) {
        Some(Direction::Down)
    } else if held([KeyCode::Left, KeyCode::A]) {
        Some(Direction::Left)
    } else if held([KeyCode::Right, KeyCode::D]) {
        Some(Direction::Right)
    } else {
        None
    };
    PlayerIntent {
        direction,
        shoot: is_key_down(KeyCode::Space),
    }
}

pub struct App {
    game: Game,
    source: LevelSource,
    audio: AudioManager,
    time_accumulator: f32,
}

impl App {
    pub fn new(game: Game, source: LevelSource, audio: AudioManager) -> Self {
        App {
            game,
            source,
            audio,
            time_accumulator: 0.0,
        }
    }

    pub fn start(&mut self) -> Result<(), Box<dyn Error>> {
        let level = self.source.load()?;
        self.game.load_level(level)?;
        Ok(())
    }

    pub async fn run(&mut self, renderer: &mut Renderer) -> Result<(), Box<dyn Error>> {
        info!("Starting main loop...");

        while !Renderer::window_should_close() {
            let status = self.game.status().unwrap_or(GameStatus::Running);
            if status.is_terminal() {
                self.handle_end_keys(status)?;
            }

            // Fixed simulation steps, capped so a stalled frame cannot snowball
            self.time_accumulator += get_frame_time();
            let intent = read_intent();
            let mut ticks = 0;
            while self.time_accumulator >= FIXED_DT && ticks < MAX_TICKS_PER_FRAME {
                self.time_accumulator -= FIXED_DT;
                ticks += 1;
                let events = self.game.tick(FIXED_DT, intent)?;
                self.audio.play_events(&events);
            }
            if ticks == MAX_TICKS_PER_FRAME {
                self.time_accumulator = self.time_accumulator.min(FIXED_DT);
            }

            let snapshot = self.game.snapshot()?;
            let announcement = announcement_for(snapshot.status, self.source.next().is_some());
            renderer.draw_frame(&snapshot, announcement);
            next_frame().await;
        }

        info!("Exiting tank arena.");
        Ok(())
    }

    fn handle_end_keys(&mut self, status: GameStatus) -> Result<(), Box<dyn Error>> {
        if is_key_pressed(KeyCode::R) {
            self.game.reset()?;
            self.time_accumulator = 0.0;
        } else if status == GameStatus::Victory && is_key_pressed(KeyCode::N) {
            if let Some(next) = self.source.next() {
                match next.load() {
                    Ok(level) => {
                        self.game.load_level(level)?;
                        self.source = next;
                        self.time_accumulator = 0.0;
                    }
                    Err(e) => error!("Failed to load next level: {}", e),
                }
            }
        }
        Ok(())
    }
}
