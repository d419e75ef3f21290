//! Shared value types: directions, sides, identifiers, grid coordinates and boxes.

use std::fmt;

/// Cardinal facing / travel direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit step in sub-tile space (y grows downward).
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    pub fn same_axis(self, other: Direction) -> bool {
        self.is_vertical() == other.is_vertical()
    }
}

/// Owner side of a tank or bullet; decides which collision rules apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Player,
    Enemy,
}

impl Side {
    pub fn opposing(self) -> Side {
        match self {
            Side::Player => Side::Enemy,
            Side::Enemy => Side::Player,
        }
    }
}

/// Unique identifier handed out by the world; never reused within a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Grid cell coordinate. Signed so that neighbours of edge cells can be
/// expressed; anything outside the map is an impassable boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TilePos {
    pub col: i32,
    pub row: i32,
}

impl TilePos {
    pub const fn new(col: i32, row: i32) -> Self {
        TilePos { col, row }
    }

    pub fn offset(self, direction: Direction) -> TilePos {
        let (dx, dy) = direction.delta();
        TilePos::new(self.col + dx, self.row + dy)
    }
}

impl fmt::Display for TilePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// Axis-aligned bounding box in sub-tile units, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Aabb {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Aabb {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Aabb { x, y, w, h }
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn center(&self) -> (i32, i32) {
        (self.x + self.w / 2, self.y + self.h / 2)
    }

    /// Overlap test where touching edges do not count.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// True when `other` lies entirely inside `self`.
    pub fn contains(&self, other: &Aabb) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn translated(&self, dx: i32, dy: i32) -> Aabb {
        Aabb::new(self.x + dx, self.y + dy, self.w, self.h)
    }

    /// Smallest box covering both boxes (the swept area of an axis-aligned move).
    pub fn union(&self, other: &Aabb) -> Aabb {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Aabb::new(x, y, right - x, bottom - y)
    }

    /// Box obtained by pushing the leading edge `distance` units toward `direction`.
    pub fn swept(&self, direction: Direction, distance: i32) -> Aabb {
        let (dx, dy) = direction.delta();
        self.union(&self.translated(dx * distance, dy * distance))
    }

    /// Gap between this box's leading edge (facing `direction`) and the near
    /// edge of `other`. Negative when the boxes already overlap on that axis.
    pub fn gap_toward(&self, direction: Direction, other: &Aabb) -> i32 {
        match direction {
            Direction::Up => self.y - other.bottom(),
            Direction::Down => other.y - self.bottom(),
            Direction::Left => self.x - other.right(),
            Direction::Right => other.x - self.right(),
        }
    }
}
