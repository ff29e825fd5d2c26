//! Turn loop of the game: observation packets out, moves in.

use serde::{Deserialize, Serialize};
use timing_maze::agent::{DoorObservation, Observation};
use timing_maze::belief::DoorState;
use timing_maze::geometry::{Direction, Move, Position};

use crate::maze::Maze;

/// Shape of the visible area around the agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vision {
    /// Cells within Chebyshev distance `radius`.
    #[default]
    Square,
    /// Cells within Euclidean distance `radius`.
    Circle,
}

impl Vision {
    pub fn sees(self, dx: i32, dy: i32, radius: i32) -> bool {
        match self {
            Vision::Square => dx.abs() <= radius && dy.abs() <= radius,
            Vision::Circle => dx * dx + dy * dy <= radius * radius,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Simulator<'a> {
    maze: &'a Maze,
    radius: i32,
    vision: Vision,
    report_start_offset: bool,
    hide_target: bool,
    position: Position,
    turn: u32,
    seen: Vec<bool>,
}

impl<'a> Simulator<'a> {
    pub fn new(maze: &'a Maze, radius: u32, vision: Vision) -> Self {
        let dim = maze.dim() as usize;
        Self {
            maze,
            radius: radius as i32,
            vision,
            report_start_offset: false,
            hide_target: false,
            position: maze.start,
            turn: 0,
            seen: vec![false; dim * dim],
        }
    }

    /// Include the start cell's offset in every packet.
    pub fn with_start_offset(mut self, on: bool) -> Self {
        self.report_start_offset = on;
        self
    }

    /// Never report the target, so exploration runs on.
    pub fn with_target_hidden(mut self, hidden: bool) -> Self {
        self.hide_target = hidden;
        self
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Turns started so far.
    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn reached(&self) -> bool {
        self.position == self.maze.end
    }

    /// Start the next turn and report what the agent can see.
    pub fn begin_turn(&mut self) -> Observation {
        self.turn += 1;
        let bounds = self.maze.doors.bounds();
        let r = self.radius;
        let mut doors = Vec::new();
        let mut target = None;

        for dy in -r..=r {
            for dx in -r..=r {
                let cell = self.position.offset(dx, dy);
                if !bounds.contains(cell) || !self.vision.sees(dx, dy, r) {
                    continue;
                }
                self.mark_seen(cell);
                if cell == self.maze.end && !self.hide_target {
                    target = Some(Position::new(dx, dy));
                }
                for dir in Direction::ALL {
                    doors.push(DoorObservation::new(dx, dy, dir, self.door_state(cell, dir)));
                }
            }
        }

        let start_offset = self.report_start_offset.then(|| {
            Position::new(
                self.maze.start.x - self.position.x,
                self.maze.start.y - self.position.y,
            )
        });
        Observation {
            doors,
            target,
            start_offset,
        }
    }

    fn door_state(&self, cell: Position, dir: Direction) -> DoorState {
        if self.maze.doors.is_boundary(cell, dir) {
            DoorState::Boundary
        } else if self.maze.doors.is_open(cell, dir, self.turn) {
            DoorState::Open
        } else {
            DoorState::Closed
        }
    }

    /// Apply the agent's answer for the current turn. Returns whether it moved.
    pub fn apply(&mut self, m: Move) -> bool {
        match m.direction() {
            Some(dir) if self.maze.doors.passage_open(self.position, dir, self.turn) => {
                self.position = self.position.step(dir);
                true
            }
            _ => false,
        }
    }

    fn mark_seen(&mut self, cell: Position) {
        let i = (cell.y * self.maze.dim() as i32 + cell.x) as usize;
        if let Some(s) = self.seen.get_mut(i) {
            *s = true;
        }
    }

    pub fn cells_seen(&self) -> usize {
        self.seen.iter().filter(|&&s| s).count()
    }

    pub fn all_seen(&self) -> bool {
        self.seen.iter().all(|&s| s)
    }

    /// Cells never in sight, in row order.
    pub fn unseen(&self) -> Vec<Position> {
        self.maze
            .doors
            .bounds()
            .cells()
            .zip(&self.seen)
            .filter(|&(_, &s)| !s)
            .map(|(p, _)| p)
            .collect()
    }
}
