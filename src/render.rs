use macroquad::prelude::*;
use tankarena::config::{SUBTILE, UI_PANEL_WIDTH};
use tankarena::entity::{EnemyKind, PowerUpKind, TankKind};
use tankarena::game::{Snapshot, TankView};
use tankarena::state::GameStatus;
use tankarena::tilemap::{TileKind, TileMap};
use tankarena::types::{Direction, Side};

fn faded_color(mut color: Color, alpha: f32) -> Color {
    color.a *= alpha;
    color
}

fn brighten_color(color: Color, amount: f32) -> Color {
    Color::new(
        (color.r + amount).min(1.0),
        (color.g + amount).min(1.0),
        (color.b + amount).min(1.0),
        color.a,
    )
}

fn tile_color(kind: TileKind) -> Option<Color> {
    match kind {
        TileKind::Empty => None,
        TileKind::Brick => Some(Color::from_rgba(156, 74, 0, 255)),
        TileKind::Steel => Some(Color::from_rgba(180, 180, 190, 255)),
        TileKind::Water => Some(Color::from_rgba(30, 60, 200, 255)),
        TileKind::Bush => Some(Color::from_rgba(30, 130, 30, 230)),
        TileKind::Ice => Some(Color::from_rgba(200, 230, 255, 255)),
        TileKind::Base => Some(GOLD),
    }
}

fn tank_color(kind: TankKind) -> Color {
    match kind {
        TankKind::Player => Color::from_rgba(230, 200, 40, 255),
        TankKind::Enemy(EnemyKind::Basic) => Color::from_rgba(200, 200, 200, 255),
        TankKind::Enemy(EnemyKind::Fast) => Color::from_rgba(120, 200, 220, 255),
        TankKind::Enemy(EnemyKind::Power) => Color::from_rgba(220, 120, 60, 255),
        TankKind::Enemy(EnemyKind::Armor) => Color::from_rgba(60, 160, 80, 255),
    }
}

fn power_up_label(kind: PowerUpKind) -> &'static str {
    match kind {
        PowerUpKind::Star => "*",
        PowerUpKind::Helmet => "H",
        PowerUpKind::Tank => "+",
        PowerUpKind::Grenade => "G",
        PowerUpKind::Timer => "T",
    }
}

// Draws the simulation from snapshots using macroquad
pub struct Renderer {
    ui_font: Option<Font>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer { ui_font: None }
    }

    // Load the custom UI font, falling back to the built-in one
    pub async fn load_ui_font(&mut self) {
        match load_ttf_font("assets/default.ttf").await {
            Ok(font) => self.ui_font = Some(font),
            Err(e) => log::warn!("Failed to load UI font assets/default.ttf: {}", e),
        }
    }

    // Pixels per sub-tile unit, fitted to the arena area of the window
    fn scale(map: &TileMap) -> f32 {
        let arena_w = screen_width() - UI_PANEL_WIDTH;
        let arena_h = screen_height();
        let per_tile = (arena_w / map.width() as f32).min(arena_h / map.height() as f32);
        per_tile / SUBTILE as f32
    }

    pub fn draw_frame(&self, snapshot: &Snapshot, announcement: Option<(&str, &str)>) {
        clear_background(BLACK);
        let scale = Self::scale(&snapshot.map);
        let tile = SUBTILE as f32 * scale;

        // Ground layer; bushes are drawn after the tanks so they hide them
        for (pos, kind) in snapshot.map.iter() {
            if kind == TileKind::Bush {
                continue;
            }
            if let Some(color) = tile_color(kind) {
                let color = match (kind, snapshot.base) {
                    (TileKind::Base, Some(base)) if base.destroyed => Color::from_rgba(90, 20, 20, 255),
                    _ => color,
                };
                draw_rectangle(pos.col as f32 * tile, pos.row as f32 * tile, tile, tile, color);
                if kind == TileKind::Brick {
                    draw_rectangle_lines(pos.col as f32 * tile, pos.row as f32 * tile, tile, tile, 1.0, brighten_color(color, -0.3));
                }
            }
        }

        if let Some(power_up) = snapshot.power_up {
            let x = power_up.pos.col as f32 * tile;
            let y = power_up.pos.row as f32 * tile;
            let blink = (get_time() * 4.0) as i64 % 2 == 0;
            draw_rectangle(x + 2.0, y + 2.0, tile - 4.0, tile - 4.0, faded_color(MAGENTA, if blink { 1.0 } else { 0.5 }));
            draw_text(power_up_label(power_up.kind), x + tile * 0.3, y + tile * 0.75, tile * 0.8, WHITE);
        }

        for tank in &snapshot.tanks {
            Self::draw_tank(tank, scale, snapshot.frozen);
        }

        for bullet in &snapshot.bullets {
            let size = (SUBTILE / 4) as f32 * scale;
            let color = match bullet.side {
                Side::Player => WHITE,
                Side::Enemy => Color::from_rgba(255, 140, 140, 255),
            };
            draw_rectangle(bullet.x as f32 * scale, bullet.y as f32 * scale, size, size, color);
        }

        for (pos, kind) in snapshot.map.iter().filter(|&(_, k)| k == TileKind::Bush) {
            if let Some(color) = tile_color(kind) {
                draw_rectangle(pos.col as f32 * tile, pos.row as f32 * tile, tile, tile, color);
            }
        }

        let arena_w = tile * snapshot.map.width() as f32;
        let arena_h = tile * snapshot.map.height() as f32;
        draw_rectangle_lines(0.0, 0.0, arena_w, arena_h, 2.0, GRAY);

        self.draw_ui_panel(snapshot);

        if let Some((title, hint)) = announcement {
            self.draw_announcement(title, hint);
        }
    }

    fn draw_tank(tank: &TankView, scale: f32, frozen: bool) {
        let size = SUBTILE as f32 * scale;
        let x = tank.x as f32 * scale;
        let y = tank.y as f32 * scale;
        let mut body = tank_color(tank.kind);
        if tank.bonus && (get_time() * 6.0) as i64 % 2 == 0 {
            body = RED;
        }
        if frozen && tank.kind != TankKind::Player {
            body = faded_color(body, 0.6);
        }
        // Armor tanks darken as they lose health
        if let TankKind::Enemy(EnemyKind::Armor) = tank.kind {
            body = brighten_color(body, 0.1 * tank.health as f32 - 0.3);
        }
        draw_rectangle(x + 1.0, y + 1.0, size - 2.0, size - 2.0, body);

        let cx = x + size / 2.0;
        let cy = y + size / 2.0;
        let (dx, dy) = match tank.facing {
            Direction::Up => (0.0, -1.0),
            Direction::Down => (0.0, 1.0),
            Direction::Left => (-1.0, 0.0),
            Direction::Right => (1.0, 0.0),
        };
        draw_line(cx, cy, cx + dx * size * 0.6, cy + dy * size * 0.6, size * 0.15, DARKGRAY);

        if tank.invincible {
            let pulse = 0.5 + 0.5 * (get_time() * 10.0).sin() as f32;
            draw_rectangle_lines(x, y, size, size, 2.0, faded_color(SKYBLUE, pulse));
        }
    }

    fn draw_ui_panel(&self, snapshot: &Snapshot) {
        let panel_x = screen_width() - UI_PANEL_WIDTH;
        draw_rectangle(panel_x, 0.0, UI_PANEL_WIDTH, screen_height(), Color::from_rgba(20, 20, 50, 255));

        let params = TextParams {
            font: self.ui_font.as_ref(),
            font_size: 18,
            color: WHITE,
            ..Default::default()
        };
        let title_params = TextParams {
            font_size: 22,
            color: GOLD,
            ..params.clone()
        };

        let counters = snapshot.counters;
        let mut y = 32.0;
        draw_text_ex(&snapshot.level_name, panel_x + 12.0, y, title_params);
        y += 34.0;
        let lines = [
            format!("Stage  {}", counters.level_index + 1),
            format!("Lives  {}", counters.lives),
            format!("Score  {}", counters.score),
            format!("Enemies left  {}", counters.enemies_to_spawn + counters.enemies_alive),
        ];
        for line in &lines {
            draw_text_ex(line, panel_x + 12.0, y, params.clone());
            y += 26.0;
        }
        if snapshot.frozen {
            draw_text_ex("FROZEN", panel_x + 12.0, y, TextParams { color: SKYBLUE, ..params.clone() });
        }

        let fps_text = format!("FPS: {}", get_fps());
        draw_text_ex(&fps_text, panel_x + 12.0, screen_height() - 12.0, TextParams { font_size: 14, color: GRAY, ..params });
    }

    fn draw_announcement(&self, msg: &str, hint: &str) {
        let rect_width = 420.0;
        let rect_height = 120.0;
        let x = (screen_width() - UI_PANEL_WIDTH) / 2.0 - rect_width / 2.0;
        let y = screen_height() / 2.0 - rect_height / 2.0;
        draw_rectangle(x, y, rect_width, rect_height, Color::from_rgba(0, 0, 0, 180));

        let font_size_announcement = 32.0;
        let announcement_params = TextParams {
            font: self.ui_font.as_ref(),
            font_size: font_size_announcement as u16,
            color: WHITE,
            ..Default::default()
        };
        let text_dims = measure_text(msg, self.ui_font.as_ref(), announcement_params.font_size, 1.0);
        let text_x = x + (rect_width - text_dims.width) / 2.0;
        let text_y = y + (rect_height - font_size_announcement) / 2.0 + font_size_announcement * 0.7;
        draw_text_ex(msg, text_x, text_y, announcement_params);

        let hint_size = 18.0;
        let hint_params = TextParams {
            font: self.ui_font.as_ref(),
            font_size: hint_size as u16,
            color: LIGHTGRAY,
            ..Default::default()
        };
        let hint_dims = measure_text(hint, self.ui_font.as_ref(), hint_params.font_size, 1.0);
        let hint_x = x + (rect_width - hint_dims.width) / 2.0;
        draw_text_ex(hint, hint_x, y + rect_height - hint_size - 10.0, hint_params);
    }

    pub fn window_should_close() -> bool {
        is_key_down(KeyCode::Escape) || is_quit_requested()
    }
}

/// Headline and key hint for a finished game.
pub fn announcement_for(status: GameStatus, has_next_level: bool) -> Option<(&'static str, &'static str)> {
    match status {
        GameStatus::Running => None,
        GameStatus::GameOver => Some(("GAME OVER", "R to restart, ESC to quit")),
        GameStatus::Victory if has_next_level => Some(("STAGE CLEAR", "N for next stage, R to replay")),
        GameStatus::Victory => Some(("YOU WIN", "R to replay, ESC to quit")),
    }
}
