//! Expected-wait cost model.
//!
//! Turning schedule uncertainty into a number the planner can add up. Every
//! function here is pure: the turn is passed in, never read from shared state.

use crate::belief::DoorBelief;
use crate::geometry::{Direction, Position};
use crate::local_map::LocalMap;

/// Turns from `turn` until the next multiple of `period` (0 if `turn` is one).
pub fn wait_for_period(period: u32, turn: u32) -> u32 {
    debug_assert!(period > 0);
    (period - turn % period) % period
}

pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

pub fn lcm(a: u64, b: u64) -> u64 {
    if a == 0 || b == 0 {
        return 0;
    }
    a / gcd(a, b) * b
}

/// Mean wait over `periods`, each equally likely. Period 0 never opens; a set
/// made only of those is `+inf`.
fn mean_wait(periods: impl Iterator<Item = u32>, current_turn: u32) -> f64 {
    let (sum, n) = periods
        .filter(|&p| p > 0)
        .fold((0u64, 0u32), |(sum, n), p| {
            (sum + wait_for_period(p, current_turn) as u64, n + 1)
        });
    if n == 0 {
        return f64::INFINITY;
    }
    sum as f64 / n as f64
}

/// Mean wait over `candidates`.
///
/// An empty slice has lost every period and is costed pessimistically as a
/// door of period `max_possible_period`.
pub fn expected_wait_over(candidates: &[u32], current_turn: u32, max_possible_period: u32) -> f64 {
    if candidates.is_empty() {
        return wait_for_period(max_possible_period.max(1), current_turn) as f64;
    }
    mean_wait(candidates.iter().copied(), current_turn)
}

/// Expected turns until one half-door opens.
///
/// `None` means never observed, which is costed like a fresh belief: the mean
/// over every period in `1..=max_possible_period`.
pub fn expected_wait(
    belief: Option<&DoorBelief>,
    current_turn: u32,
    max_possible_period: u32,
) -> f64 {
    match belief {
        Some(b) => expected_wait_over(b.candidates(), current_turn, max_possible_period),
        None => mean_wait(1..=max_possible_period.max(1), current_turn),
    }
}

/// Expected turns until both halves of a passage are open together.
///
/// When both periods are known the joint schedule is exact: the passage opens
/// on multiples of their least common multiple. Otherwise the slower half
/// dominates.
pub fn passage_wait(
    own: Option<&DoorBelief>,
    mirror: Option<&DoorBelief>,
    current_turn: u32,
    max_possible_period: u32,
) -> f64 {
    let known = |b: Option<&DoorBelief>| b.and_then(DoorBelief::period);
    match (known(own), known(mirror)) {
        (Some(0), _) | (_, Some(0)) => f64::INFINITY,
        (Some(p), Some(q)) => {
            let joint = lcm(p as u64, q as u64);
            let t = current_turn as u64;
            ((joint - t % joint) % joint) as f64
        }
        _ => expected_wait(own, current_turn, max_possible_period).max(expected_wait(
            mirror,
            current_turn,
            max_possible_period,
        )),
    }
}

/// Cost of stepping from `cell` towards `dir`: one turn to move plus the wait.
pub fn step_cost(map: &LocalMap, cell: Position, dir: Direction, current_turn: u32) -> f64 {
    let (own, mirror) = map.passage(cell, dir);
    1.0 + passage_wait(own, mirror, current_turn, map.max_period())
}
