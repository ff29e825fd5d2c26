//! Coverage sweep used while the target has not been seen.
//!
//! The controller walks three stages:
//!
//! 1. `GoToEdge`: head for the ring `radius - 1` cells inside the feasible
//!    bounds, so the nearest wall comes into view.
//! 2. `TraverseCorridors`: sweep a queue of rectangular corridors. The first
//!    one runs along the wall the agent reached; after that each ring of the
//!    bounds is cut into four bands of width `radius + 1`, walked in a fixed
//!    rotation, and the next ring sits `radius` cells further in. A ring too thin
//!    for four bands is finished with back-and-forth strips.
//! 3. `Detour`: entered when the planner cannot reach the corridor's far edge
//!    without leaving it; the target becomes the next cell along the sweep.
//!
//! Every cell of a band is within `radius` of the band's path, so once the
//! rings run out every cell of the bounds has been in sight.

use std::collections::VecDeque;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::geometry::{Direction, Position, Rect};
use crate::local_map::LocalMap;
use crate::planner::{plan, plan_within, Plan};
use crate::prng::Prng;

/// Stage transitions allowed within one turn before giving up and waiting.
const MAX_TRANSITIONS_PER_TURN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

impl Rotation {
    pub fn turn(self, dir: Direction) -> Direction {
        match self {
            Rotation::Clockwise => dir.clockwise(),
            Rotation::CounterClockwise => dir.counter_clockwise(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SearchStage {
    GoToEdge,
    TraverseCorridors,
    Detour { target: Position },
}

/// A rectangle swept from the edge facing away from `direction` to the edge
/// facing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Corridor {
    pub area: Rect,
    pub direction: Direction,
    reached_start: bool,
}

impl Corridor {
    pub fn new(area: Rect, direction: Direction) -> Self {
        Self {
            area,
            direction,
            reached_start: false,
        }
    }

    pub fn start_cells(&self) -> Vec<Position> {
        self.area.edge_cells(self.direction.opposite())
    }

    pub fn end_cells(&self) -> Vec<Position> {
        self.area.edge_cells(self.direction)
    }

    pub fn reached_start(&self) -> bool {
        self.reached_start
    }
}

/// The corridor along the wall nearest to `at`, heading for the nearer end of
/// that wall, plus the rotation that heading implies.
pub fn first_corridor(bounds: Rect, at: Position, radius: i32) -> (Corridor, Rotation) {
    let b = bounds;
    let dist = |d: Direction| match d {
        Direction::Left => at.x - b.left,
        Direction::Right => b.right - at.x,
        Direction::Up => at.y - b.top,
        Direction::Down => b.bottom - at.y,
    };
    let wall = Direction::ALL
        .into_iter()
        .min_by_key(|&d| dist(d))
        .unwrap_or(Direction::Left);

    let heading = match wall {
        Direction::Left | Direction::Right => {
            if dist(Direction::Up) <= dist(Direction::Down) {
                Direction::Up
            } else {
                Direction::Down
            }
        }
        Direction::Up | Direction::Down => {
            if dist(Direction::Left) <= dist(Direction::Right) {
                Direction::Left
            } else {
                Direction::Right
            }
        }
    };

    let band = slab(b, wall, 0, radius);
    let area = match heading {
        Direction::Up => Rect { bottom: at.y, ..band },
        Direction::Down => Rect { top: at.y, ..band },
        Direction::Left => Rect { right: at.x, ..band },
        Direction::Right => Rect { left: at.x, ..band },
    };
    let rotation = if heading == wall.clockwise() {
        Rotation::Clockwise
    } else {
        Rotation::CounterClockwise
    };
    (Corridor::new(area, heading), rotation)
}

/// Corridors covering the outer band of `ring`, the first one heading
/// `rotation.turn(after)`, plus the ring to sweep next (`None` once this one
/// finishes the sweep).
pub fn ring_corridors(
    ring: Rect,
    radius: i32,
    rotation: Rotation,
    after: Direction,
) -> (Vec<Corridor>, Option<Rect>) {
    if ring.is_empty() {
        return (Vec::new(), None);
    }
    let first = rotation.turn(after);
    if ring.width().min(ring.height()) <= 2 * radius {
        return (strips(ring, radius, after, first.opposite()), None);
    }

    let Rect {
        left: l,
        top: t,
        right: r,
        bottom: b,
    } = ring;
    let top = Rect::new(l, t, r - radius, t + radius);
    let right = Rect::new(r - radius, t, r, b - radius);
    let bottom = Rect::new(l + radius, b - radius, r, b);
    let left = Rect::new(l, t + radius, l + radius, b);
    let band = |dir: Direction| match (rotation, dir) {
        (Rotation::Clockwise, Direction::Right) => top,
        (Rotation::Clockwise, Direction::Down) => right,
        (Rotation::Clockwise, Direction::Left) => bottom,
        (Rotation::Clockwise, Direction::Up) => left,
        (Rotation::CounterClockwise, Direction::Left) => top,
        (Rotation::CounterClockwise, Direction::Up) => right,
        (Rotation::CounterClockwise, Direction::Right) => bottom,
        (Rotation::CounterClockwise, Direction::Down) => left,
    };

    let mut out = Vec::with_capacity(4);
    let mut dir = first;
    for _ in 0..4 {
        out.push(Corridor::new(band(dir), dir));
        dir = rotation.turn(dir);
    }
    (out, Some(ring.inset(radius)))
}

/// Back-and-forth strips of depth `radius + 1` tiling `ring` along its longer
/// axis. The sweep starts in the corner between sides `a` and `b`.
fn strips(ring: Rect, radius: i32, a: Direction, b: Direction) -> Vec<Corridor> {
    let horizontal = ring.width() >= ring.height();
    let is_vertical = |d: Direction| matches!(d, Direction::Up | Direction::Down);
    // Strips are stacked away from one corner side and run away from the other.
    let (stack_from, run_from) = if horizontal == is_vertical(a) { (a, b) } else { (b, a) };
    let depth = if horizontal {
        ring.height()
    } else {
        ring.width()
    };

    let mut out = Vec::new();
    let mut dir = run_from.opposite();
    let mut near = 0;
    while near < depth {
        out.push(Corridor::new(slab(ring, stack_from, near, near + radius), dir));
        dir = dir.opposite();
        near += radius + 1;
    }
    out
}

/// The part of `ring` lying `near..=far` cells in from its `side`.
fn slab(ring: Rect, side: Direction, near: i32, far: i32) -> Rect {
    let r = ring;
    let s = match side {
        Direction::Up => Rect::new(r.left, r.top + near, r.right, r.top + far),
        Direction::Down => Rect::new(r.left, r.bottom - far, r.right, r.bottom - near),
        Direction::Left => Rect::new(r.left + near, r.top, r.left + far, r.bottom),
        Direction::Right => Rect::new(r.right - far, r.top, r.right - near, r.bottom),
    };
    s.intersect(&ring)
}

enum Step {
    Go(Direction),
    Wait,
    Again,
}

impl Step {
    fn from_plan(plan: &Plan) -> Self {
        plan.path.first().map_or(Step::Wait, |&d| Step::Go(d))
    }
}

#[derive(Debug, Clone)]
pub struct ExplorationController {
    radius: i32,
    stage: SearchStage,
    rotation: Option<Rotation>,
    corridors: VecDeque<Corridor>,
    next_ring: Option<Rect>,
    last_direction: Direction,
    sweeps_completed: u32,
}

impl ExplorationController {
    pub fn new(radius: u32) -> Self {
        Self {
            radius: radius.max(1) as i32,
            stage: SearchStage::GoToEdge,
            rotation: None,
            corridors: VecDeque::new(),
            next_ring: None,
            last_direction: Direction::Up,
            sweeps_completed: 0,
        }
    }

    pub fn stage(&self) -> SearchStage {
        self.stage
    }

    pub fn rotation(&self) -> Option<Rotation> {
        self.rotation
    }

    pub fn active_corridor(&self) -> Option<&Corridor> {
        self.corridors.front()
    }

    pub fn pending_corridors(&self) -> usize {
        self.corridors.len()
    }

    /// Full sweeps finished without the caller stopping exploration.
    pub fn sweeps_completed(&self) -> u32 {
        self.sweeps_completed
    }

    /// Forget the current sweep and start again from `GoToEdge`.
    pub fn restart(&mut self) {
        self.stage = SearchStage::GoToEdge;
        self.rotation = None;
        self.corridors.clear();
        self.next_ring = None;
    }

    /// Direction to step this turn, or `None` to wait.
    pub fn next_step(&mut self, map: &LocalMap, turn: u32, rng: &mut Prng) -> Option<Direction> {
        for _ in 0..MAX_TRANSITIONS_PER_TURN {
            let step = match self.stage {
                SearchStage::GoToEdge => self.go_to_edge(map, turn, rng),
                SearchStage::TraverseCorridors => self.traverse(map, turn, rng),
                SearchStage::Detour { target } => self.detour(map, target, turn, rng),
            };
            match step {
                Step::Go(dir) => return Some(dir),
                Step::Wait => return None,
                Step::Again => {}
            }
        }
        debug!("Exploration made no decision this turn (stage {:?})", self.stage);
        None
    }

    fn go_to_edge(&mut self, map: &LocalMap, turn: u32, rng: &mut Prng) -> Step {
        let targets = map.bounds().inset(self.radius - 1).ring_cells();
        if targets.is_empty() || targets.contains(&map.position()) {
            debug!("Edge ring reached at {:?}", map.position());
            self.stage = SearchStage::TraverseCorridors;
            return Step::Again;
        }
        match plan(map, &targets, turn, rng) {
            Some(p) => Step::from_plan(&p),
            None => {
                warn!("Edge ring unreachable from {:?}; sweeping from here", map.position());
                self.stage = SearchStage::TraverseCorridors;
                Step::Again
            }
        }
    }

    fn traverse(&mut self, map: &LocalMap, turn: u32, rng: &mut Prng) -> Step {
        let pos = map.position();
        let bounds = map.bounds();

        if let Some(front) = self.corridors.front_mut() {
            front.area = front.area.intersect(&bounds);
        }
        let Some(corridor) = self.corridors.front().copied() else {
            return self.queue_next(map);
        };
        if corridor.area.is_empty() {
            self.corridors.pop_front();
            return Step::Again;
        }

        if !corridor.reached_start {
            let start = corridor.start_cells();
            if start.contains(&pos) {
                if let Some(front) = self.corridors.front_mut() {
                    front.reached_start = true;
                }
                return Step::Again;
            }
            return match plan(map, &start, turn, rng) {
                Some(p) => Step::from_plan(&p),
                None => self.abandon("start edge unreachable"),
            };
        }

        let end = corridor.end_cells();
        if end.contains(&pos) {
            debug!(
                "Corridor {:?} heading {:?} done; {} left",
                corridor.area,
                corridor.direction,
                self.corridors.len() - 1
            );
            self.corridors.pop_front();
            self.last_direction = corridor.direction;
            return Step::Again;
        }

        match plan_within(map, corridor.area, pos, &end, turn, rng) {
            Some(p) => Step::from_plan(&p),
            None => {
                let target = pos.step(corridor.direction);
                if !bounds.contains(target) {
                    return self.abandon("blocked at the edge of the maze");
                }
                debug!("Corridor blocked at {:?}; detouring to {:?}", pos, target);
                self.stage = SearchStage::Detour { target };
                Step::Again
            }
        }
    }

    fn detour(&mut self, map: &LocalMap, target: Position, turn: u32, rng: &mut Prng) -> Step {
        if map.position() == target {
            self.stage = SearchStage::TraverseCorridors;
            return Step::Again;
        }
        if !map.bounds().contains(target) {
            return self.abandon("detour target outside the maze");
        }
        match plan(map, &[target], turn, rng) {
            Some(p) => Step::from_plan(&p),
            None => self.abandon("detour target unreachable"),
        }
    }

    fn abandon(&mut self, why: &str) -> Step {
        if let Some(c) = self.corridors.pop_front() {
            warn!("Skipping corridor {:?} heading {:?}: {}", c.area, c.direction, why);
            self.last_direction = c.direction;
        }
        self.stage = SearchStage::TraverseCorridors;
        Step::Again
    }

    fn queue_next(&mut self, map: &LocalMap) -> Step {
        let bounds = map.bounds();
        let Some(rotation) = self.rotation else {
            let (corridor, rotation) = first_corridor(bounds, map.position(), self.radius);
            debug!(
                "First corridor {:?} heading {:?} ({:?})",
                corridor.area, corridor.direction, rotation
            );
            self.rotation = Some(rotation);
            self.last_direction = corridor.direction;
            self.next_ring = Some(bounds);
            self.corridors.push_back(corridor);
            return Step::Again;
        };

        let ring = self
            .next_ring
            .take()
            .map(|r| r.intersect(&bounds))
            .filter(|r| !r.is_empty());
        match ring {
            Some(ring) => {
                let (corridors, next) = ring_corridors(ring, self.radius, rotation, self.last_direction);
                debug!("Queued {} corridors for ring {:?}", corridors.len(), ring);
                self.corridors.extend(corridors);
                self.next_ring = next;
            }
            None => {
                self.sweeps_completed += 1;
                debug!("Sweep {} complete; starting over", self.sweeps_completed);
                self.restart();
            }
        }
        Step::Again
    }
}
