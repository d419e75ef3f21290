//! Level description and its plain-text format.
//!
//! ```text
//! name Brick Fortress
//! size 13 13
//! enemies basic:10 fast:4 power:2 armor:4
//! map
//! S.....S.....S
//! .#.#.#.#.#.#.
//! ...
//! ```

use std::collections::VecDeque;

use crate::entity::EnemyKind;
use crate::error::LevelLoadError;
use crate::tilemap::{Mover, TileKind, TileMap};
use crate::types::TilePos;

/// Everything needed to start a level. Produced by the loader, checked by
/// [`LevelData::validate`] before the simulation accepts it.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelData {
    pub index: usize,
    pub name: String,
    pub width: usize,
    pub height: usize,
    /// Row-major initial tile kinds.
    pub tiles: Vec<TileKind>,
    pub base: Option<TilePos>,
    pub player_spawn: TilePos,
    pub enemy_spawns: Vec<TilePos>,
    /// Enemies in spawn order, as (kind, count) runs.
    pub roster: Vec<(EnemyKind, u32)>,
}

fn tile_for(c: char) -> Option<TileKind> {
    match c {
        '.' | 'P' | 'S' => Some(TileKind::Empty),
        '#' => Some(TileKind::Brick),
        '@' => Some(TileKind::Steel),
        '~' => Some(TileKind::Water),
        '%' => Some(TileKind::Bush),
        '-' => Some(TileKind::Ice),
        'E' => Some(TileKind::Base),
        _ => None,
    }
}

fn syntax(line: usize, message: impl Into<String>) -> LevelLoadError {
    LevelLoadError::Syntax {
        line,
        message: message.into(),
    }
}

impl LevelData {
    /// Parses the text format. The result still has to pass [`validate`](Self::validate).
    pub fn parse(text: &str) -> Result<Self, LevelLoadError> {
        let mut name = String::from("untitled");
        let mut size: Option<(usize, usize)> = None;
        let mut roster = Vec::new();
        let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l.trim_end()));

        // Header
        let mut saw_map = false;
        for (line_no, line) in lines.by_ref() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (keyword, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
            let rest = rest.trim();
            match keyword {
                "name" => name = rest.to_string(),
                "size" => {
                    let dims: Vec<&str> = rest.split_whitespace().collect();
                    let [w, h] = dims.as_slice() else {
                        return Err(syntax(line_no, "expected `size <width> <height>`"));
                    };
                    let w = w.parse::<usize>().map_err(|e| syntax(line_no, format!("bad width: {}", e)))?;
                    let h = h.parse::<usize>().map_err(|e| syntax(line_no, format!("bad height: {}", e)))?;
                    size = Some((w, h));
                }
                "enemies" => {
                    for entry in rest.split_whitespace() {
                        let (kind, count) = entry
                            .split_once(':')
                            .ok_or_else(|| syntax(line_no, format!("expected kind:count, got `{}`", entry)))?;
                        let kind = EnemyKind::from_name(kind)
                            .ok_or_else(|| syntax(line_no, format!("unknown enemy kind `{}`", kind)))?;
                        let count = count
                            .parse::<u32>()
                            .map_err(|e| syntax(line_no, format!("bad enemy count: {}", e)))?;
                        roster.push((kind, count));
                    }
                }
                "map" => {
                    saw_map = true;
                    break;
                }
                other => return Err(syntax(line_no, format!("unknown directive `{}`", other))),
            }
        }
        if !saw_map {
            return Err(syntax(text.lines().count(), "missing `map` section"));
        }
        let (width, height) = size.ok_or_else(|| syntax(1, "missing `size` before `map`"))?;
        if width == 0 || height == 0 {
            return Err(LevelLoadError::EmptyGrid);
        }

        // Grid
        let mut tiles = Vec::with_capacity(width * height);
        let mut base = None;
        let mut player_spawn = None;
        let mut enemy_spawns = Vec::new();
        let mut rows = 0;
        for (line_no, line) in lines {
            if line.trim().is_empty() {
                continue;
            }
            if rows == height {
                return Err(syntax(line_no, format!("more than {} map rows", height)));
            }
            let row: Vec<char> = line.chars().collect();
            if row.len() != width {
                return Err(syntax(
                    line_no,
                    format!("row has {} cells, expected {}", row.len(), width),
                ));
            }
            for (col, c) in row.into_iter().enumerate() {
                let kind = tile_for(c).ok_or_else(|| syntax(line_no, format!("unknown tile `{}`", c)))?;
                let pos = TilePos::new(col as i32, rows as i32);
                match c {
                    'E' => {
                        if base.is_some() {
                            return Err(LevelLoadError::MultipleBases);
                        }
                        base = Some(pos);
                    }
                    'P' => {
                        if player_spawn.is_some() {
                            return Err(syntax(line_no, "more than one player spawn"));
                        }
                        player_spawn = Some(pos);
                    }
                    'S' => enemy_spawns.push(pos),
                    _ => {}
                }
                tiles.push(kind);
            }
            rows += 1;
        }
        if tiles.len() != width * height {
            return Err(LevelLoadError::DimensionMismatch {
                width,
                height,
                found: tiles.len(),
            });
        }
        let player_spawn =
            player_spawn.ok_or_else(|| syntax(text.lines().count(), "map has no player spawn `P`"))?;

        let level = LevelData {
            index: 0,
            name,
            width,
            height,
            tiles,
            base,
            player_spawn,
            enemy_spawns,
            roster,
        };
        level.validate()?;
        Ok(level)
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Checks the level for everything the simulation relies on.
    pub fn validate(&self) -> Result<(), LevelLoadError> {
        if self.width == 0 || self.height == 0 || self.tiles.is_empty() {
            return Err(LevelLoadError::EmptyGrid);
        }
        if self.tiles.len() != self.width * self.height {
            return Err(LevelLoadError::DimensionMismatch {
                width: self.width,
                height: self.height,
                found: self.tiles.len(),
            });
        }
        let map = self.tile_map().ok_or(LevelLoadError::EmptyGrid)?;
        let in_range = |what: &'static str, pos: TilePos| {
            if map.in_bounds(pos) {
                Ok(())
            } else {
                Err(LevelLoadError::OutOfRange {
                    what,
                    pos,
                    width: self.width,
                    height: self.height,
                })
            }
        };

        let mut base_tiles = map.iter().filter(|&(_, k)| k == TileKind::Base).map(|(p, _)| p);
        let first_base = base_tiles.next();
        if base_tiles.next().is_some() {
            return Err(LevelLoadError::MultipleBases);
        }
        match (self.base, first_base) {
            (Some(pos), _) => {
                in_range("Base", pos)?;
                if map.kind(pos) != Some(TileKind::Base) {
                    return Err(LevelLoadError::BaseTileMissing(pos));
                }
            }
            (None, Some(pos)) => return Err(LevelLoadError::UndeclaredBase(pos)),
            (None, None) => {}
        }

        in_range("Player spawn", self.player_spawn)?;
        if !map.passable_for(Mover::Tank, self.player_spawn) {
            return Err(LevelLoadError::SpawnBlocked {
                what: "Player spawn",
                pos: self.player_spawn,
            });
        }
        for &pos in &self.enemy_spawns {
            in_range("Enemy spawn", pos)?;
            if !map.passable_for(Mover::Tank, pos) {
                return Err(LevelLoadError::SpawnBlocked {
                    what: "Enemy spawn",
                    pos,
                });
            }
        }
        if self.total_enemies() > 0 && self.enemy_spawns.is_empty() {
            return Err(LevelLoadError::NoSpawnPoints);
        }
        Ok(())
    }

    pub fn tile_map(&self) -> Option<TileMap> {
        TileMap::from_kinds(self.width, self.height, &self.tiles)
    }

    pub fn total_enemies(&self) -> u32 {
        self.roster.iter().map(|&(_, n)| n).sum()
    }

    /// The roster expanded into individual spawns, in order.
    pub fn roster_queue(&self) -> VecDeque<EnemyKind> {
        self.roster
            .iter()
            .flat_map(|&(kind, n)| std::iter::repeat(kind).take(n as usize))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = "\
# practice arena
name Practice
size 5 4
enemies basic:2 armor:1
map
S...S
.#@~.
..%-.
.PE..
";

    #[test]
    fn test_parse_small_level() {
        let level = match LevelData::parse(SMALL) {
            Ok(level) => level,
            Err(e) => panic!("level should parse: {}", e),
        };
        assert_eq!(level.name, "Practice");
        assert_eq!((level.width, level.height), (5, 4));
        assert_eq!(level.base, Some(TilePos::new(2, 3)));
        assert_eq!(level.player_spawn, TilePos::new(1, 3));
        assert_eq!(level.enemy_spawns, vec![TilePos::new(0, 0), TilePos::new(4, 0)]);
        assert_eq!(level.total_enemies(), 3);
        let queue: Vec<EnemyKind> = level.roster_queue().into_iter().collect();
        assert_eq!(queue, vec![EnemyKind::Basic, EnemyKind::Basic, EnemyKind::Armor]);
        assert_eq!(level.tiles[5 + 1], TileKind::Brick);
        assert_eq!(level.tiles[5 + 2], TileKind::Steel);
        assert_eq!(level.tiles[5 + 3], TileKind::Water);
        assert_eq!(level.tiles[10 + 2], TileKind::Bush);
        assert_eq!(level.tiles[10 + 3], TileKind::Ice);
    }

    #[test]
    fn test_row_width_mismatch_reports_line() {
        let text = "size 3 2\nmap\n...\n.P\n";
        assert_eq!(
            LevelData::parse(text),
            Err(LevelLoadError::Syntax {
                line: 4,
                message: "row has 2 cells, expected 3".to_string()
            })
        );
    }

    #[test]
    fn test_missing_rows_is_dimension_mismatch() {
        let text = "size 3 3\nmap\n.P.\n...\n";
        assert_eq!(
            LevelData::parse(text),
            Err(LevelLoadError::DimensionMismatch {
                width: 3,
                height: 3,
                found: 6
            })
        );
    }

    #[test]
    fn test_unknown_tile_and_kind_are_rejected() {
        assert!(matches!(
            LevelData::parse("size 2 1\nmap\nPx\n"),
            Err(LevelLoadError::Syntax { line: 3, .. })
        ));
        assert!(matches!(
            LevelData::parse("size 2 1\nenemies boss:1\nmap\nPS\n"),
            Err(LevelLoadError::Syntax { line: 2, .. })
        ));
    }

    #[test]
    fn test_two_bases_rejected() {
        assert_eq!(
            LevelData::parse("size 3 1\nmap\nEPE\n"),
            Err(LevelLoadError::MultipleBases)
        );
    }

    #[test]
    fn test_enemies_without_spawn_points_rejected() {
        assert_eq!(
            LevelData::parse("size 2 1\nenemies fast:1\nmap\nP.\n"),
            Err(LevelLoadError::NoSpawnPoints)
        );
    }

    #[test]
    fn test_validate_catches_bad_coordinates() {
        let mut level = match LevelData::parse(SMALL) {
            Ok(level) => level,
            Err(e) => panic!("level should parse: {}", e),
        };
        level.base = Some(TilePos::new(9, 9));
        assert!(matches!(level.validate(), Err(LevelLoadError::OutOfRange { what: "Base", .. })));

        level.base = Some(TilePos::new(0, 1));
        assert_eq!(level.validate(), Err(LevelLoadError::BaseTileMissing(TilePos::new(0, 1))));

        level.base = None;
        assert_eq!(level.validate(), Err(LevelLoadError::UndeclaredBase(TilePos::new(2, 3))));

        level.base = Some(TilePos::new(2, 3));
        level.enemy_spawns.push(TilePos::new(1, 1));
        assert_eq!(
            level.validate(),
            Err(LevelLoadError::SpawnBlocked {
                what: "Enemy spawn",
                pos: TilePos::new(1, 1)
            })
        );

        level.enemy_spawns.pop();
        level.tiles.pop();
        assert!(matches!(level.validate(), Err(LevelLoadError::DimensionMismatch { .. })));
    }
}
