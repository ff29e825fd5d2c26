//! Per-door schedule inference.
//!
//! A door with period `p > 0` is open exactly on turns that are multiples of
//! `p`; period 0 means it never opens. Each [`DoorBelief`] keeps the periods
//! still consistent with what has been seen so far:
//!
//! - OPEN at turn `t` keeps only periods dividing `t`.
//! - CLOSED at turn `t` drops every period dividing `t`.
//! - BOUNDARY collapses the belief to "permanently closed".
//!
//! Both rules are set intersections/differences, so the final candidate set does
//! not depend on the order observations arrive in.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Observed state of one half-door. Wire codes follow the game: 1, 2, 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DoorState {
    Closed,
    Open,
    Boundary,
}

impl DoorState {
    pub fn code(self) -> u8 {
        match self {
            DoorState::Closed => 1,
            DoorState::Open => 2,
            DoorState::Boundary => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(DoorState::Closed),
            2 => Some(DoorState::Open),
            3 => Some(DoorState::Boundary),
            _ => None,
        }
    }
}

/// What a single observation did to a belief.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserveOutcome {
    /// Nothing new (repeat of a known observation, or already permanently closed).
    Unchanged,
    /// The candidate set shrank (possibly to certainty).
    Narrowed,
    /// The observation contradicts earlier ones; the door is now treated as
    /// permanently closed.
    Inconsistent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PeriodEstimate {
    /// Sorted, never empty.
    Candidates(Vec<u32>),
    Closed,
}

const CLOSED_CANDIDATES: [u32; 1] = [0];

#[derive(Debug, Clone)]
pub struct DoorBelief {
    history: BTreeMap<u32, DoorState>,
    estimate: PeriodEstimate,
    seen_open: bool,
}

impl DoorBelief {
    /// Fresh belief: every period in `1..=max_period` is possible.
    pub fn new(max_period: u32) -> Self {
        let max_period = max_period.max(1);
        Self {
            history: BTreeMap::new(),
            estimate: PeriodEstimate::Candidates((1..=max_period).collect()),
            seen_open: false,
        }
    }

    pub fn observe(&mut self, turn: u32, state: DoorState) -> ObserveOutcome {
        match self.history.entry(turn) {
            Entry::Occupied(prev) => {
                return if *prev.get() == state {
                    ObserveOutcome::Unchanged
                } else {
                    ObserveOutcome::Inconsistent
                };
            }
            Entry::Vacant(slot) => {
                slot.insert(state);
            }
        }

        let candidates = match &mut self.estimate {
            PeriodEstimate::Closed => {
                // An OPEN sighting of a door already known to be shut is a
                // contradiction; the belief stays closed either way.
                return if state == DoorState::Open {
                    self.seen_open = true;
                    ObserveOutcome::Inconsistent
                } else {
                    ObserveOutcome::Unchanged
                };
            }
            PeriodEstimate::Candidates(c) => c,
        };

        let before = candidates.len();
        match state {
            DoorState::Boundary => {
                self.estimate = PeriodEstimate::Closed;
                return ObserveOutcome::Narrowed;
            }
            DoorState::Open => {
                self.seen_open = true;
                candidates.retain(|p| turn % p == 0);
            }
            DoorState::Closed => {
                candidates.retain(|p| turn % p != 0);
            }
        }

        if candidates.is_empty() {
            self.estimate = PeriodEstimate::Closed;
            // Never having opened and running out of periods just means the
            // door is permanently shut; after an OPEN it is a contradiction.
            if self.seen_open {
                return ObserveOutcome::Inconsistent;
            }
            return ObserveOutcome::Narrowed;
        }

        if candidates.len() < before {
            ObserveOutcome::Narrowed
        } else {
            ObserveOutcome::Unchanged
        }
    }

    /// Remaining periods; `[0]` when the door is permanently closed.
    pub fn candidates(&self) -> &[u32] {
        match &self.estimate {
            PeriodEstimate::Candidates(c) => c,
            PeriodEstimate::Closed => &CLOSED_CANDIDATES,
        }
    }

    pub fn is_certain(&self) -> bool {
        match &self.estimate {
            PeriodEstimate::Candidates(c) => c.len() == 1,
            PeriodEstimate::Closed => true,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.estimate == PeriodEstimate::Closed
    }

    /// The period once it is certain (0 for permanently closed).
    pub fn period(&self) -> Option<u32> {
        if self.is_certain() {
            self.candidates().first().copied()
        } else {
            None
        }
    }

    /// Observations keyed by turn.
    pub fn history(&self) -> &BTreeMap<u32, DoorState> {
        &self.history
    }

    pub fn observed_at(&self, turn: u32) -> Option<DoorState> {
        self.history.get(&turn).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prng::Prng;

    fn is_subset(small: &[u32], big: &[u32]) -> bool {
        small.iter().all(|p| big.contains(p))
    }

    /// Observations a door of period `p` produces on `turns`.
    fn observations(p: u32, turns: impl Iterator<Item = u32>) -> Vec<(u32, DoorState)> {
        turns
            .map(|t| {
                let open = p != 0 && t % p == 0;
                (t, if open { DoorState::Open } else { DoorState::Closed })
            })
            .collect()
    }

    #[test]
    fn open_at_6_and_10_leaves_1_and_2() {
        let mut b = DoorBelief::new(12);
        b.observe(6, DoorState::Open);
        assert_eq!(b.candidates(), &[1, 2, 3, 6]);
        b.observe(10, DoorState::Open);
        assert_eq!(b.candidates(), &[1, 2]);
        assert!(!b.is_certain());

        // Closed at an odd turn rules out period 1.
        assert_eq!(b.observe(7, DoorState::Closed), ObserveOutcome::Narrowed);
        assert_eq!(b.period(), Some(2));
    }

    #[test]
    fn closed_at_4_removes_its_divisors() {
        let mut b = DoorBelief::new(12);
        b.observe(12, DoorState::Open);
        assert_eq!(b.candidates(), &[1, 2, 3, 4, 6, 12]);
        b.observe(4, DoorState::Closed);
        assert_eq!(b.candidates(), &[3, 6, 12]);
    }

    #[test]
    fn boundary_is_terminal() {
        let mut b = DoorBelief::new(5);
        assert_eq!(b.observe(1, DoorState::Boundary), ObserveOutcome::Narrowed);
        assert!(b.is_closed());
        assert!(b.is_certain());
        assert_eq!(b.candidates(), &[0]);
        assert_eq!(b.observe(2, DoorState::Closed), ObserveOutcome::Unchanged);
        assert_eq!(b.period(), Some(0));
    }

    #[test]
    fn never_open_door_becomes_closed_without_diagnostic() {
        let mut b = DoorBelief::new(4);
        let mut last = ObserveOutcome::Unchanged;
        for t in 1..=12 {
            last = b.observe(t, DoorState::Closed);
            if b.is_closed() {
                break;
            }
        }
        assert!(b.is_closed());
        assert_eq!(last, ObserveOutcome::Narrowed);
    }

    #[test]
    fn contradiction_is_reported_and_fails_closed() {
        let mut b = DoorBelief::new(6);
        b.observe(6, DoorState::Open);
        b.observe(2, DoorState::Closed);
        b.observe(3, DoorState::Closed);
        assert_eq!(b.candidates(), &[6]);
        assert_eq!(b.observe(12, DoorState::Closed), ObserveOutcome::Inconsistent);
        assert!(b.is_closed());

        let mut c = DoorBelief::new(3);
        c.observe(1, DoorState::Boundary);
        assert_eq!(c.observe(3, DoorState::Open), ObserveOutcome::Inconsistent);
        assert!(c.is_closed());
    }

    #[test]
    fn same_turn_twice() {
        let mut b = DoorBelief::new(5);
        b.observe(4, DoorState::Open);
        assert_eq!(b.observe(4, DoorState::Open), ObserveOutcome::Unchanged);
        assert_eq!(b.observe(4, DoorState::Closed), ObserveOutcome::Inconsistent);
        assert_eq!(b.history().len(), 1);
        assert_eq!(b.observed_at(4), Some(DoorState::Open));
    }

    #[test]
    fn long_watch_keeps_one_entry_per_turn() {
        let mut b = DoorBelief::new(5);
        let turns = 200_000u32;
        for t in 1..=turns {
            let s = if t % 4 == 0 {
                DoorState::Open
            } else {
                DoorState::Closed
            };
            b.observe(t, s);
        }
        assert_eq!(b.history().len(), turns as usize);
        assert_eq!(b.period(), Some(4));
        assert_eq!(b.observed_at(turns), Some(DoorState::Open));
        assert_eq!(b.observe(turns, DoorState::Closed), ObserveOutcome::Inconsistent);
        assert_eq!(b.observe(turns + 1, DoorState::Closed), ObserveOutcome::Unchanged);
    }

    #[test]
    fn candidates_only_shrink_and_keep_true_period() {
        for p in 0..=9u32 {
            let mut b = DoorBelief::new(9);
            let mut prev = b.candidates().to_vec();
            for (t, s) in observations(p, 1..=40) {
                b.observe(t, s);
                let now = b.candidates().to_vec();
                if !b.is_closed() {
                    assert!(is_subset(&now, &prev), "p={p} t={t}: {now:?} ⊄ {prev:?}");
                }
                if p != 0 {
                    assert!(now.contains(&p), "true period {p} dropped at t={t}: {now:?}");
                }
                prev = now;
            }
            assert_eq!(b.period(), Some(p));
        }
    }

    #[test]
    fn observation_order_does_not_matter() {
        let mut rng = Prng::new(0xD00D);
        for p in [0u32, 1, 3, 4, 7, 12] {
            let base = observations(p, [5u32, 8, 12, 14, 21, 24, 36].into_iter());
            let mut reference = DoorBelief::new(12);
            for &(t, s) in &base {
                reference.observe(t, s);
            }
            for _ in 0..10 {
                let mut shuffled = base.clone();
                rng.shuffle(&mut shuffled);
                let mut b = DoorBelief::new(12);
                for &(t, s) in &shuffled {
                    b.observe(t, s);
                }
                assert_eq!(b.candidates(), reference.candidates(), "p={p}");
            }
        }
    }

    #[test]
    fn state_codes_round_trip_through_wire_values() {
        assert_eq!(DoorState::from_code(2), Some(DoorState::Open));
        assert_eq!(DoorState::from_code(0), None);
        assert_eq!(DoorState::Boundary.code(), 3);
    }
}
