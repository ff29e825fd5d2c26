// Map builders shared by unit tests.

use crate::belief::DoorState;
use crate::geometry::{Direction, Position, Rect};
use crate::local_map::LocalMap;

/// Observe every door of every cell in `area` on turns `1..=turns`.
/// Doors facing out of `area` are walls; `state` decides the rest.
pub fn field(
    area: Rect,
    max_period: u32,
    map_dim: u32,
    turns: u32,
    state: impl Fn(Position, Direction, u32) -> DoorState,
) -> LocalMap {
    let mut m = LocalMap::new(max_period, map_dim);
    for t in 1..=turns {
        for cell in area.cells() {
            for dir in Direction::ALL {
                let s = if area.contains(cell.step(dir)) {
                    state(cell, dir, t)
                } else {
                    DoorState::Boundary
                };
                m.observe(t, cell, dir, s);
            }
        }
    }
    m
}

/// Every interior door open on every turn, so each settles on period 1.
pub fn open_field(area: Rect, max_period: u32, map_dim: u32) -> LocalMap {
    field(area, max_period, map_dim, max_period, |_, _, _| DoorState::Open)
}

/// True for the passage between `a` and `b` (either way round).
pub fn is_passage(cell: Position, dir: Direction, a: Position, b: Position) -> bool {
    let next = cell.step(dir);
    (cell == a && next == b) || (cell == b && next == a)
}
