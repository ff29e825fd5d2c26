//! The agent's picture of the maze in its own start-relative frame.
//!
//! Door beliefs are stored sparsely, keyed by `(cell, direction)`, so the map
//! never preallocates for a maze of unknown extent. Two rectangles bound what is
//! known:
//!
//! - `explored`: every cell any observation has mentioned. Only grows.
//! - `bounds`: every cell the maze can still occupy. Starts at
//!   `[-(map_dim-1), map_dim-1]` on both axes and only shrinks, tightened by
//!   BOUNDARY doors and by the explored extent (the maze is exactly `map_dim`
//!   cells wide and tall).

use hashbrown::HashMap;

use crate::belief::{DoorBelief, DoorState, ObserveOutcome};
use crate::geometry::{Direction, Position, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DoorKey {
    pub cell: Position,
    pub dir: Direction,
}

impl DoorKey {
    pub const fn new(cell: Position, dir: Direction) -> Self {
        Self { cell, dir }
    }

    /// The other half of the same passage, seen from the neighbouring cell.
    pub fn mirror(self) -> Self {
        Self::new(self.cell.step(self.dir), self.dir.opposite())
    }
}

#[derive(Debug, Clone)]
pub struct LocalMap {
    max_period: u32,
    map_dim: u32,
    doors: HashMap<DoorKey, DoorBelief>,
    position: Position,
    explored: Rect,
    bounds: Rect,
}

impl LocalMap {
    pub fn new(max_period: u32, map_dim: u32) -> Self {
        let span = map_dim.max(1) as i32 - 1;
        Self {
            max_period: max_period.max(1),
            map_dim: map_dim.max(1),
            doors: HashMap::new(),
            position: Position::ORIGIN,
            explored: Rect::point(Position::ORIGIN),
            bounds: Rect::new(-span, -span, span, span),
        }
    }

    pub fn max_period(&self) -> u32 {
        self.max_period
    }

    pub fn map_dim(&self) -> u32 {
        self.map_dim
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_position(&mut self, p: Position) {
        self.position = p;
        self.explored.include(p);
        self.refresh_bounds();
    }

    pub fn apply_move(&mut self, dir: Direction) {
        self.set_position(self.position.step(dir));
    }

    /// Cells mentioned by any observation so far.
    pub fn explored(&self) -> Rect {
        self.explored
    }

    /// Cells the maze can still occupy.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn observe(
        &mut self,
        turn: u32,
        cell: Position,
        dir: Direction,
        state: DoorState,
    ) -> ObserveOutcome {
        let max_period = self.max_period;
        let outcome = self
            .doors
            .entry(DoorKey::new(cell, dir))
            .or_insert_with(|| DoorBelief::new(max_period))
            .observe(turn, state);

        self.explored.include(cell);
        if state == DoorState::Boundary {
            match dir {
                Direction::Left => self.bounds.left = self.bounds.left.max(cell.x),
                Direction::Right => self.bounds.right = self.bounds.right.min(cell.x),
                Direction::Up => self.bounds.top = self.bounds.top.max(cell.y),
                Direction::Down => self.bounds.bottom = self.bounds.bottom.min(cell.y),
            }
        }
        self.refresh_bounds();
        outcome
    }

    fn refresh_bounds(&mut self) {
        let span = self.map_dim as i32 - 1;
        let e = self.explored;
        self.bounds.left = self.bounds.left.max(e.right - span);
        self.bounds.right = self.bounds.right.min(e.left + span);
        self.bounds.top = self.bounds.top.max(e.bottom - span);
        self.bounds.bottom = self.bounds.bottom.min(e.top + span);
    }

    pub fn belief(&self, cell: Position, dir: Direction) -> Option<&DoorBelief> {
        self.doors.get(&DoorKey::new(cell, dir))
    }

    /// Both halves of the passage leaving `cell` towards `dir`.
    pub fn passage(
        &self,
        cell: Position,
        dir: Direction,
    ) -> (Option<&DoorBelief>, Option<&DoorBelief>) {
        let key = DoorKey::new(cell, dir);
        (self.doors.get(&key), self.doors.get(&key.mirror()))
    }

    /// True when both halves were seen OPEN on `turn`.
    pub fn is_passage_open_at(&self, cell: Position, dir: Direction, turn: u32) -> bool {
        let (a, b) = self.passage(cell, dir);
        let open = |d: Option<&DoorBelief>| {
            d.and_then(|d| d.observed_at(turn)) == Some(DoorState::Open)
        };
        open(a) && open(b)
    }

    pub fn door_count(&self) -> usize {
        self.doors.len()
    }
}
