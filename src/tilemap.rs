//! The tile grid and its destruction state.
//!
//! Out-of-range coordinates behave as an impassable boundary for every mover.

use crate::config::{STEEL_POWER_THRESHOLD, SUBTILE};
use crate::types::{Aabb, TilePos};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileKind {
    Empty,
    Brick,
    Steel,
    Water,
    Bush,
    Ice,
    Base,
}

impl TileKind {
    pub fn blocks_tanks(self) -> bool {
        matches!(
            self,
            TileKind::Brick | TileKind::Steel | TileKind::Water | TileKind::Base
        )
    }

    /// Bullet-blocking tiles also consume the bullet.
    pub fn blocks_bullets(self) -> bool {
        matches!(self, TileKind::Brick | TileKind::Steel | TileKind::Base)
    }

    pub fn is_destructible(self) -> bool {
        matches!(self, TileKind::Brick | TileKind::Steel)
    }

    /// Minimum bullet power that destroys this tile, if any power does.
    pub fn destroy_threshold(self) -> Option<u8> {
        match self {
            TileKind::Brick => Some(1),
            TileKind::Steel => Some(STEEL_POWER_THRESHOLD),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub kind: TileKind,
}

/// Entity category asking about passability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mover {
    Tank,
    Bullet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageResult {
    Unchanged,
    Destroyed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileMap {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl TileMap {
    /// An all-empty grid.
    pub fn new(width: usize, height: usize) -> Self {
        TileMap {
            width,
            height,
            cells: vec![Cell { kind: TileKind::Empty }; width * height],
        }
    }

    /// Builds a grid from row-major kinds. Returns `None` when the slice does not
    /// hold exactly `width * height` entries.
    pub fn from_kinds(width: usize, height: usize, kinds: &[TileKind]) -> Option<Self> {
        if kinds.len() != width * height {
            return None;
        }
        Some(TileMap {
            width,
            height,
            cells: kinds.iter().map(|&kind| Cell { kind }).collect(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Map extent in sub-tile units.
    pub fn bounds(&self) -> Aabb {
        Aabb::new(
            0,
            0,
            self.width as i32 * SUBTILE,
            self.height as i32 * SUBTILE,
        )
    }

    pub fn in_bounds(&self, pos: TilePos) -> bool {
        pos.col >= 0
            && pos.row >= 0
            && (pos.col as usize) < self.width
            && (pos.row as usize) < self.height
    }

    fn index(&self, pos: TilePos) -> Option<usize> {
        if self.in_bounds(pos) {
            Some(pos.row as usize * self.width + pos.col as usize)
        } else {
            None
        }
    }

    pub fn cell(&self, pos: TilePos) -> Option<&Cell> {
        self.index(pos).map(|i| &self.cells[i])
    }

    pub fn kind(&self, pos: TilePos) -> Option<TileKind> {
        self.cell(pos).map(|c| c.kind)
    }

    /// Whether `mover` may occupy or cross `pos`. Out-of-range cells are never passable.
    pub fn passable_for(&self, mover: Mover, pos: TilePos) -> bool {
        match self.kind(pos) {
            Some(kind) => match mover {
                Mover::Tank => !kind.blocks_tanks(),
                Mover::Bullet => !kind.blocks_bullets(),
            },
            None => false,
        }
    }

    /// Applies a bullet hit of the given power. Base tiles are never changed here;
    /// their destruction is reported separately.
    pub fn damage(&mut self, pos: TilePos, power: u8) -> DamageResult {
        let Some(i) = self.index(pos) else {
            return DamageResult::Unchanged;
        };
        match self.cells[i].kind.destroy_threshold() {
            Some(threshold) if power >= threshold => {
                self.cells[i].kind = TileKind::Empty;
                DamageResult::Destroyed
            }
            _ => DamageResult::Unchanged,
        }
    }

    /// Cells covered by `aabb`. Cells outside the grid are included so callers
    /// see the boundary; a fresh span is computed on every call.
    pub fn tiles_overlapping(&self, aabb: &Aabb) -> TileSpan {
        if aabb.w <= 0 || aabb.h <= 0 {
            return TileSpan::empty();
        }
        TileSpan::new(
            aabb.x.div_euclid(SUBTILE),
            (aabb.right() - 1).div_euclid(SUBTILE),
            aabb.y.div_euclid(SUBTILE),
            (aabb.bottom() - 1).div_euclid(SUBTILE),
        )
    }

    pub fn cell_aabb(pos: TilePos) -> Aabb {
        Aabb::new(pos.col * SUBTILE, pos.row * SUBTILE, SUBTILE, SUBTILE)
    }

    /// Row-major iteration over every cell with its coordinate.
    pub fn iter(&self) -> impl Iterator<Item = (TilePos, TileKind)> + '_ {
        let width = self.width;
        self.cells.iter().enumerate().map(move |(i, c)| {
            (
                TilePos::new((i % width) as i32, (i / width) as i32),
                c.kind,
            )
        })
    }
}

/// Row-major iterator over an inclusive rectangle of cell coordinates.
#[derive(Debug, Clone)]
pub struct TileSpan {
    min_col: i32,
    max_col: i32,
    max_row: i32,
    col: i32,
    row: i32,
}

impl TileSpan {
    fn new(min_col: i32, max_col: i32, min_row: i32, max_row: i32) -> Self {
        TileSpan {
            min_col,
            max_col,
            max_row,
            col: min_col,
            row: min_row,
        }
    }

    fn empty() -> Self {
        TileSpan::new(0, -1, 0, -1)
    }
}

impl Iterator for TileSpan {
    type Item = TilePos;

    fn next(&mut self) -> Option<TilePos> {
        if self.row > self.max_row || self.min_col > self.max_col {
            return None;
        }
        let pos = TilePos::new(self.col, self.row);
        self.col += 1;
        if self.col > self.max_col {
            self.col = self.min_col;
            self.row += 1;
        }
        Some(pos)
    }
}
