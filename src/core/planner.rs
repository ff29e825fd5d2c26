//! Time-aware shortest path over the local map.
//!
//! Dijkstra over cells, where each frontier entry also carries the turn the
//! agent is expected to arrive on. Edge weights come from [`crate::cost`]
//! evaluated at that arrival turn, so a door that opens on even turns looks
//! cheap or expensive depending on when the agent would get there. Keeping one
//! arrival turn per cell (rather than branching on absolute time) keeps the
//! search finite.
//!
//! The planner holds no state between calls; it is re-run every turn.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use hashbrown::{HashMap, HashSet};

use crate::cost::step_cost;
use crate::geometry::{Direction, Move, Position, Rect};
use crate::local_map::LocalMap;
use crate::prng::Prng;

#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// Directions from the start to `goal`.
    pub path: Vec<Direction>,
    /// Sum of expected step costs.
    pub cost: f64,
    pub goal: Position,
    /// Expected turn of arrival at `goal`.
    pub arrival_turn: u32,
}

impl Plan {
    pub fn first_move(&self) -> Move {
        self.path.first().copied().map(Move::from).unwrap_or(Move::Wait)
    }
}

#[derive(Debug, Clone, Copy)]
struct Frontier {
    cost: f64,
    tie: u64,
    pos: Position,
    arrival_turn: u32,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .total_cmp(&other.cost)
            .then(self.tie.cmp(&other.tie))
            .then(self.pos.cmp(&other.pos))
    }
}

/// Cheapest route from the map's current position to any of `goals`, searching
/// every cell the maze can still occupy.
pub fn plan(map: &LocalMap, goals: &[Position], turn: u32, rng: &mut Prng) -> Option<Plan> {
    plan_within(map, map.bounds(), map.position(), goals, turn, rng)
}

/// Like [`plan`], but only steps onto cells inside `area` (the start cell is
/// always allowed). Returns `None` when no goal is reachable.
pub fn plan_within(
    map: &LocalMap,
    area: Rect,
    start: Position,
    goals: &[Position],
    turn: u32,
    rng: &mut Prng,
) -> Option<Plan> {
    let area = area.intersect(&map.bounds());
    let goal_set: HashSet<Position> = goals
        .iter()
        .copied()
        .filter(|g| *g == start || area.contains(*g))
        .collect();
    if goal_set.is_empty() {
        return None;
    }

    let mut best: HashMap<Position, f64> = HashMap::new();
    let mut parent: HashMap<Position, (Position, Direction)> = HashMap::new();
    let mut settled: HashSet<Position> = HashSet::new();
    let mut heap = BinaryHeap::new();

    best.insert(start, 0.0);
    heap.push(Reverse(Frontier {
        cost: 0.0,
        tie: rng.next_u64(),
        pos: start,
        arrival_turn: turn,
    }));

    while let Some(Reverse(node)) = heap.pop() {
        if !settled.insert(node.pos) {
            continue;
        }
        if goal_set.contains(&node.pos) {
            return Some(Plan {
                path: reconstruct(&parent, start, node.pos),
                cost: node.cost,
                goal: node.pos,
                arrival_turn: node.arrival_turn,
            });
        }

        for dir in Direction::ALL {
            let next = node.pos.step(dir);
            if !area.contains(next) || settled.contains(&next) {
                continue;
            }
            let step = step_cost(map, node.pos, dir, node.arrival_turn);
            // Doors that never open are pruned outright.
            if !step.is_finite() {
                continue;
            }
            let cost = node.cost + step;
            if best.get(&next).is_some_and(|&c| c <= cost) {
                continue;
            }
            best.insert(next, cost);
            parent.insert(next, (node.pos, dir));
            heap.push(Reverse(Frontier {
                cost,
                tie: rng.next_u64(),
                pos: next,
                arrival_turn: node.arrival_turn + step.round() as u32,
            }));
        }
    }

    None
}

fn reconstruct(
    parent: &HashMap<Position, (Position, Direction)>,
    start: Position,
    goal: Position,
) -> Vec<Direction> {
    let mut path = Vec::new();
    let mut at = goal;
    while at != start {
        match parent.get(&at) {
            Some(&(prev, dir)) => {
                path.push(dir);
                at = prev;
            }
            None => break,
        }
    }
    path.reverse();
    path
}
