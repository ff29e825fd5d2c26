//! Door-period grids: seeded generation and reachability validation.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use timing_maze::geometry::{Direction, Position, Rect};
use timing_maze::prng::Prng;
use tracing::debug;

/// Generation gives up after this many rejected mazes.
const MAX_ATTEMPTS: u64 = 64;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MazeError {
    #[error("map_dim must be at least 2, got {0}")]
    TooSmall(u32),

    #[error("closed_prob must be in [0, 0.2), got {0}")]
    ClosedProbOutOfRange(f64),

    #[error("max_door_frequency must be at least 1")]
    ZeroFrequency,

    #[error("{0:?} is outside the maze")]
    OutOfRange(Position),

    #[error("start and end are the same cell {0:?}")]
    SameStartEnd(Position),

    #[error("door {dir:?} of {cell:?} has period {period}, above the maximum {max}")]
    FrequencyOutOfRange {
        cell: Position,
        dir: Direction,
        period: u32,
        max: u32,
    },

    #[error("boundary door {dir:?} of {cell:?} is not closed")]
    OpenBoundary { cell: Position, dir: Direction },

    #[error("only {reached} of {total} cells are reachable")]
    Unreachable { reached: usize, total: usize },

    #[error("no valid maze after {0} attempts")]
    NoValidMaze(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MazeParams {
    pub map_dim: u32,
    pub max_door_frequency: u32,
    /// Chance that a door is permanently closed.
    pub closed_prob: f64,
    /// Fixed start cell; drawn from the seed when absent.
    pub start: Option<Position>,
    /// Fixed target cell; drawn from the seed when absent.
    pub end: Option<Position>,
}

impl Default for MazeParams {
    fn default() -> Self {
        Self {
            map_dim: 100,
            max_door_frequency: 5,
            closed_prob: 0.02,
            start: None,
            end: None,
        }
    }
}

impl MazeParams {
    pub fn validate(&self) -> Result<(), MazeError> {
        if self.map_dim < 2 {
            return Err(MazeError::TooSmall(self.map_dim));
        }
        if !(0.0..0.2).contains(&self.closed_prob) {
            return Err(MazeError::ClosedProbOutOfRange(self.closed_prob));
        }
        if self.max_door_frequency == 0 {
            return Err(MazeError::ZeroFrequency);
        }
        let bounds = square(self.map_dim as i32);
        for p in [self.start, self.end].into_iter().flatten() {
            if !bounds.contains(p) {
                return Err(MazeError::OutOfRange(p));
            }
        }
        match (self.start, self.end) {
            (Some(s), Some(e)) if s == e => Err(MazeError::SameStartEnd(s)),
            _ => Ok(()),
        }
    }
}

fn square(dim: i32) -> Rect {
    Rect::new(0, 0, dim - 1, dim - 1)
}

/// Period of every half-door, indexed by absolute cell and direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorGrid {
    dim: i32,
    periods: Vec<u32>,
}

impl DoorGrid {
    /// Every door permanently closed.
    pub fn new(dim: u32) -> Self {
        let dim = dim as i32;
        Self {
            dim,
            periods: vec![0; (dim * dim * 4) as usize],
        }
    }

    /// Periods from `f`, with the outer walls forced closed.
    pub fn from_fn(dim: u32, mut f: impl FnMut(Position, Direction) -> u32) -> Self {
        let mut grid = Self::new(dim);
        for cell in grid.bounds().cells() {
            for dir in Direction::ALL {
                grid.set_period(cell, dir, f(cell, dir));
            }
        }
        grid.close_border();
        grid
    }

    pub fn dim(&self) -> u32 {
        self.dim as u32
    }

    pub fn bounds(&self) -> Rect {
        square(self.dim)
    }

    fn index(&self, cell: Position, dir: Direction) -> Option<usize> {
        self.bounds()
            .contains(cell)
            .then(|| ((cell.y * self.dim + cell.x) * 4) as usize + dir.index())
    }

    /// 0 outside the maze.
    pub fn period(&self, cell: Position, dir: Direction) -> u32 {
        self.index(cell, dir)
            .and_then(|i| self.periods.get(i).copied())
            .unwrap_or(0)
    }

    pub fn set_period(&mut self, cell: Position, dir: Direction, period: u32) {
        if let Some(slot) = self.index(cell, dir).and_then(|i| self.periods.get_mut(i)) {
            *slot = period;
        }
    }

    pub fn close_border(&mut self) {
        let b = self.bounds();
        for dir in Direction::ALL {
            for cell in b.edge_cells(dir) {
                self.set_period(cell, dir, 0);
            }
        }
    }

    pub fn is_boundary(&self, cell: Position, dir: Direction) -> bool {
        !self.bounds().contains(cell.step(dir))
    }

    /// Whether this half-door is open on `turn`.
    pub fn is_open(&self, cell: Position, dir: Direction, turn: u32) -> bool {
        let p = self.period(cell, dir);
        p != 0 && turn % p == 0
    }

    /// Both halves open on `turn`, so a step through succeeds.
    pub fn passage_open(&self, cell: Position, dir: Direction, turn: u32) -> bool {
        !self.is_boundary(cell, dir)
            && self.is_open(cell, dir, turn)
            && self.is_open(cell.step(dir), dir.opposite(), turn)
    }

    /// Both halves open together on some turn.
    pub fn ever_open(&self, cell: Position, dir: Direction) -> bool {
        !self.is_boundary(cell, dir)
            && self.period(cell, dir) != 0
            && self.period(cell.step(dir), dir.opposite()) != 0
    }

    /// Cells reachable from `from` through passages that ever open.
    pub fn reachable_from(&self, from: Position) -> usize {
        let b = self.bounds();
        if !b.contains(from) {
            return 0;
        }
        let idx = |p: Position| (p.y * self.dim + p.x) as usize;
        let mut visited = vec![false; (self.dim * self.dim) as usize];
        let mut queue = VecDeque::new();
        visited[idx(from)] = true;
        queue.push_back(from);
        let mut count = 0;
        while let Some(cell) = queue.pop_front() {
            count += 1;
            for dir in Direction::ALL {
                let next = cell.step(dir);
                if self.ever_open(cell, dir) && !visited[idx(next)] {
                    visited[idx(next)] = true;
                    queue.push_back(next);
                }
            }
        }
        count
    }

    /// Periods within `0..=max`, closed walls, every cell reachable.
    pub fn validate(&self, max_door_frequency: u32) -> Result<(), MazeError> {
        for cell in self.bounds().cells() {
            for dir in Direction::ALL {
                let period = self.period(cell, dir);
                if period > max_door_frequency {
                    return Err(MazeError::FrequencyOutOfRange {
                        cell,
                        dir,
                        period,
                        max: max_door_frequency,
                    });
                }
                if self.is_boundary(cell, dir) && period != 0 {
                    return Err(MazeError::OpenBoundary { cell, dir });
                }
            }
        }
        let total = (self.dim * self.dim) as usize;
        let reached = self.reachable_from(Position::ORIGIN);
        if reached != total {
            return Err(MazeError::Unreachable { reached, total });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maze {
    pub doors: DoorGrid,
    pub start: Position,
    pub end: Position,
}

impl Maze {
    pub fn dim(&self) -> u32 {
        self.doors.dim()
    }
}

/// A valid maze for `seed`. Rejected draws are retried with the next seed.
pub fn generate(params: &MazeParams, seed: u64) -> Result<Maze, MazeError> {
    params.validate()?;
    for attempt in 0..MAX_ATTEMPTS {
        let mut rng = Prng::new(seed.wrapping_add(attempt));
        let doors = DoorGrid::from_fn(params.map_dim, |_, _| {
            if rng.next_f64_01() < params.closed_prob {
                0
            } else {
                1 + rng.gen_range_usize(0, params.max_door_frequency as usize) as u32
            }
        });
        if let Err(e) = doors.validate(params.max_door_frequency) {
            debug!("Maze attempt {} for seed {} rejected: {}", attempt, seed, e);
            continue;
        }

        let dim = params.map_dim as i32;
        let cell = |rng: &mut Prng| {
            let i = rng.gen_range_usize(0, (dim * dim) as usize) as i32;
            Position::new(i % dim, i / dim)
        };
        let mut start = params.start.unwrap_or_else(|| cell(&mut rng));
        let mut end = params.end.unwrap_or_else(|| cell(&mut rng));
        while start == end {
            match (params.start, params.end) {
                (_, None) => end = cell(&mut rng),
                (None, Some(_)) => start = cell(&mut rng),
                (Some(s), Some(_)) => return Err(MazeError::SameStartEnd(s)),
            }
        }
        return Ok(Maze { doors, start, end });
    }
    Err(MazeError::NoValidMaze(MAX_ATTEMPTS))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(closed_prob: f64) -> MazeParams {
        MazeParams {
            map_dim: 12,
            max_door_frequency: 4,
            closed_prob,
            ..Default::default()
        }
    }

    #[test]
    fn generated_mazes_validate() {
        for seed in 0..8 {
            let maze = generate(&small(0.15), seed).expect("valid maze");
            assert!(maze.doors.validate(4).is_ok());
            assert_ne!(maze.start, maze.end);
            assert!(maze.doors.bounds().contains(maze.start));
        }
    }

    #[test]
    fn same_seed_same_maze() {
        let a = generate(&small(0.1), 77).expect("valid");
        let b = generate(&small(0.1), 77).expect("valid");
        assert_eq!(a, b);
    }

    #[test]
    fn border_is_closed() {
        let grid = DoorGrid::from_fn(5, |_, _| 2);
        assert_eq!(grid.period(Position::new(0, 3), Direction::Left), 0);
        assert_eq!(grid.period(Position::new(4, 4), Direction::Down), 0);
        assert_eq!(grid.period(Position::new(2, 2), Direction::Down), 2);
        assert!(!grid.passage_open(Position::new(4, 0), Direction::Right, 2));
        assert!(grid.passage_open(Position::new(1, 1), Direction::Right, 4));
        assert!(!grid.passage_open(Position::new(1, 1), Direction::Right, 3));
    }

    #[test]
    fn island_is_rejected() {
        let mut grid = DoorGrid::from_fn(4, |_, _| 1);
        // One closed half is enough to cut a passage.
        grid.set_period(Position::new(3, 3), Direction::Left, 0);
        grid.set_period(Position::new(3, 2), Direction::Down, 0);
        assert_eq!(
            grid.validate(5),
            Err(MazeError::Unreachable {
                reached: 15,
                total: 16
            })
        );
    }

    #[test]
    fn bad_params_are_rejected() {
        assert_eq!(
            small(0.2).validate(),
            Err(MazeError::ClosedProbOutOfRange(0.2))
        );
        let p = MazeParams {
            start: Some(Position::new(1, 1)),
            end: Some(Position::new(1, 1)),
            ..small(0.0)
        };
        assert_eq!(generate(&p, 1), Err(MazeError::SameStartEnd(Position::new(1, 1))));
        let far = MazeParams {
            end: Some(Position::new(12, 0)),
            ..small(0.0)
        };
        assert_eq!(far.validate(), Err(MazeError::OutOfRange(Position::new(12, 0))));
    }
}
