// Grid primitives shared by every layer of the navigation core.
//
// Coordinates are relative to the agent's starting cell: x grows to the right,
// y grows downwards (UP is y - 1).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Chebyshev distance; the visibility radius is a square window.
    pub fn chebyshev(self, other: Position) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    Left,
    Up,
    Right,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Up,
        Direction::Right,
        Direction::Down,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
        }
    }

    /// Wire index used by the game: LEFT=0, UP=1, RIGHT=2, DOWN=3.
    pub fn index(self) -> usize {
        match self {
            Direction::Left => 0,
            Direction::Up => 1,
            Direction::Right => 2,
            Direction::Down => 3,
        }
    }

    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }

    pub fn clockwise(self) -> Self {
        match self {
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
            Direction::Up => Direction::Right,
        }
    }

    pub fn counter_clockwise(self) -> Self {
        self.clockwise().opposite()
    }
}

/// One per-turn decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Move {
    Wait,
    Left,
    Up,
    Right,
    Down,
}

impl Move {
    pub fn direction(self) -> Option<Direction> {
        match self {
            Move::Wait => None,
            Move::Left => Some(Direction::Left),
            Move::Up => Some(Direction::Up),
            Move::Right => Some(Direction::Right),
            Move::Down => Some(Direction::Down),
        }
    }

    /// Game code: WAIT=-1, otherwise the direction index.
    pub fn code(self) -> i8 {
        match self.direction() {
            None => -1,
            Some(d) => d.index() as i8,
        }
    }

    pub fn from_code(code: i8) -> Option<Self> {
        if code == -1 {
            return Some(Move::Wait);
        }
        usize::try_from(code)
            .ok()
            .and_then(Direction::from_index)
            .map(Move::from)
    }
}

impl From<Direction> for Move {
    fn from(dir: Direction) -> Self {
        match dir {
            Direction::Left => Move::Left,
            Direction::Up => Move::Up,
            Direction::Right => Move::Right,
            Direction::Down => Move::Down,
        }
    }
}

/// Inclusive axis-aligned rectangle of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn point(p: Position) -> Self {
        Self::new(p.x, p.y, p.x, p.y)
    }

    pub fn width(&self) -> i32 {
        self.right - self.left + 1
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top + 1
    }

    pub fn is_empty(&self) -> bool {
        self.left > self.right || self.top > self.bottom
    }

    pub fn contains(&self, p: Position) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    pub fn include(&mut self, p: Position) {
        self.left = self.left.min(p.x);
        self.right = self.right.max(p.x);
        self.top = self.top.min(p.y);
        self.bottom = self.bottom.max(p.y);
    }

    pub fn intersect(&self, other: &Rect) -> Rect {
        Rect::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        )
    }

    /// Shrinks every side by `by` cells.
    pub fn inset(&self, by: i32) -> Rect {
        Rect::new(
            self.left + by,
            self.top + by,
            self.right - by,
            self.bottom - by,
        )
    }

    /// Coordinate of the side facing `dir`.
    pub fn side(&self, dir: Direction) -> i32 {
        match dir {
            Direction::Left => self.left,
            Direction::Up => self.top,
            Direction::Right => self.right,
            Direction::Down => self.bottom,
        }
    }

    /// Cells of the side facing `dir`, in ascending coordinate order.
    pub fn edge_cells(&self, dir: Direction) -> Vec<Position> {
        if self.is_empty() {
            return Vec::new();
        }
        match dir {
            Direction::Left | Direction::Right => {
                let x = self.side(dir);
                (self.top..=self.bottom).map(|y| Position::new(x, y)).collect()
            }
            Direction::Up | Direction::Down => {
                let y = self.side(dir);
                (self.left..=self.right).map(|x| Position::new(x, y)).collect()
            }
        }
    }

    /// Cells of the rectangle's outline, without duplicates at the corners.
    pub fn ring_cells(&self) -> Vec<Position> {
        if self.is_empty() {
            return Vec::new();
        }
        let mut out = Vec::new();
        for x in self.left..=self.right {
            out.push(Position::new(x, self.top));
            if self.bottom != self.top {
                out.push(Position::new(x, self.bottom));
            }
        }
        for y in (self.top + 1)..self.bottom {
            out.push(Position::new(self.left, y));
            if self.right != self.left {
                out.push(Position::new(self.right, y));
            }
        }
        out
    }

    pub fn cells(&self) -> impl Iterator<Item = Position> + '_ {
        (self.top..=self.bottom)
            .flat_map(move |y| (self.left..=self.right).map(move |x| Position::new(x, y)))
    }
}
