//! Per-turn orchestration.
//!
//! One [`Agent`] owns everything for one episode: the local map, the exploration
//! controller, the tie-breaking PRNG and the turn counter. Each observation packet
//! is one turn; the agent answers with exactly one [`Move`].

use hashbrown::HashSet;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::belief::{DoorState, ObserveOutcome};
use crate::error::{ConfigError, ObservationError};
use crate::explore::ExplorationController;
use crate::geometry::{Direction, Move, Position};
use crate::local_map::LocalMap;
use crate::planner::plan;
use crate::prng::Prng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AgentConfig {
    /// Doors of cells within this Chebyshev distance are observed each turn.
    pub radius: u32,
    /// Largest door period the maze can contain.
    pub max_door_frequency: u32,
    /// Side length of the (square) maze.
    pub map_dim: u32,
    /// Seed for tie-breaking between equal-cost routes.
    pub seed: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            radius: 15,
            max_door_frequency: 5,
            map_dim: 100,
            seed: 0,
        }
    }
}

impl AgentConfig {
    pub fn with_radius(mut self, radius: u32) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_max_door_frequency(mut self, max: u32) -> Self {
        self.max_door_frequency = max;
        self
    }

    pub fn with_map_dim(mut self, map_dim: u32) -> Self {
        self.map_dim = map_dim;
        self
    }

    /// Set the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.radius == 0 {
            return Err(ConfigError::ZeroRadius);
        }
        if self.max_door_frequency == 0 {
            return Err(ConfigError::ZeroFrequency);
        }
        if self.map_dim == 0 {
            return Err(ConfigError::ZeroMapDim);
        }
        Ok(())
    }
}

/// One half-door seen this turn, relative to the agent's cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DoorObservation {
    pub dx: i32,
    pub dy: i32,
    pub dir: Direction,
    pub state: DoorState,
}

impl DoorObservation {
    pub fn new(dx: i32, dy: i32, dir: Direction, state: DoorState) -> Self {
        Self { dx, dy, dir, state }
    }

    /// Decode the game's integer tuple: direction 0..=3 (left, up, right, down)
    /// and state 1..=3 (closed, open, boundary).
    pub fn from_codes(dx: i32, dy: i32, dir: u8, state: u8) -> Result<Self, ObservationError> {
        let dir = Direction::from_index(dir as usize)
            .ok_or(ObservationError::UnknownDirection(dir))?;
        let state = DoorState::from_code(state).ok_or(ObservationError::UnknownDoorState(state))?;
        Ok(Self::new(dx, dy, dir, state))
    }

    pub fn offset(&self) -> Position {
        Position::new(self.dx, self.dy)
    }
}

/// Everything the agent learns in one turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Observation {
    pub doors: Vec<DoorObservation>,
    /// Offset of the target from the agent's cell, when it is in sight.
    pub target: Option<Position>,
    /// Offset of the start cell from the agent's cell, when the game reports it.
    pub start_offset: Option<Position>,
}

impl Observation {
    pub fn from_codes(
        doors: &[(i32, i32, u8, u8)],
        target: Option<(i32, i32)>,
        start_offset: Option<(i32, i32)>,
    ) -> Result<Self, ObservationError> {
        let doors = doors
            .iter()
            .map(|&(dx, dy, dir, state)| DoorObservation::from_codes(dx, dy, dir, state))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            doors,
            target: target.map(|(x, y)| Position::new(x, y)),
            start_offset: start_offset.map(|(x, y)| Position::new(x, y)),
        })
    }

    /// Reject packets naming a door twice or reaching past `radius`.
    pub fn validate(&self, radius: u32) -> Result<(), ObservationError> {
        let mut seen = HashSet::with_capacity(self.doors.len());
        for d in &self.doors {
            let offset = d.offset();
            if offset.chebyshev(Position::ORIGIN) > radius {
                return Err(ObservationError::OutOfRange { offset, radius });
            }
            if !seen.insert((offset, d.dir)) {
                return Err(ObservationError::DuplicateDoor { offset, dir: d.dir });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AgentStats {
    pub turns: u64,
    pub moves: u64,
    pub waits: u64,
    /// Turns on which a known target had no route.
    pub planner_failures: u64,
    pub rejected_packets: u64,
    /// Observations that contradicted a door's history.
    pub inconsistencies: u64,
}

#[derive(Debug, Clone)]
pub struct Agent {
    config: AgentConfig,
    map: LocalMap,
    explorer: ExplorationController,
    rng: Prng,
    turn: u32,
    target: Option<Position>,
    stats: AgentStats,
}

impl Agent {
    pub fn new(config: AgentConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            map: LocalMap::new(config.max_door_frequency, config.map_dim),
            explorer: ExplorationController::new(config.radius),
            rng: Prng::new(config.seed),
            turn: 0,
            target: None,
            stats: AgentStats::default(),
        })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn map(&self) -> &LocalMap {
        &self.map
    }

    pub fn explorer(&self) -> &ExplorationController {
        &self.explorer
    }

    /// Turns seen so far; the first packet is turn 1.
    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn position(&self) -> Position {
        self.map.position()
    }

    /// Target cell in the agent's frame, once it has been seen.
    pub fn target(&self) -> Option<Position> {
        self.target
    }

    pub fn stats(&self) -> &AgentStats {
        &self.stats
    }

    /// Move for this turn. Malformed packets are logged and answered with WAIT.
    pub fn next_move(&mut self, obs: &Observation) -> Move {
        match self.try_next_move(obs) {
            Ok(m) => m,
            Err(e) => {
                warn!("Turn {}: packet rejected: {}", self.turn, e);
                Move::Wait
            }
        }
    }

    /// Like [`Agent::next_move`], but hands back the packet error.
    pub fn try_next_move(&mut self, obs: &Observation) -> Result<Move, ObservationError> {
        self.begin_turn();
        if let Err(e) = obs.validate(self.config.radius) {
            self.reject();
            return Err(e);
        }
        Ok(self.act(obs))
    }

    /// Entry point for raw `(dx, dy, direction, state)` tuples.
    pub fn next_move_from_codes(
        &mut self,
        doors: &[(i32, i32, u8, u8)],
        target: Option<(i32, i32)>,
        start_offset: Option<(i32, i32)>,
    ) -> Move {
        match Observation::from_codes(doors, target, start_offset) {
            Ok(obs) => self.next_move(&obs),
            Err(e) => {
                self.begin_turn();
                self.reject();
                warn!("Turn {}: packet rejected: {}", self.turn, e);
                Move::Wait
            }
        }
    }

    fn begin_turn(&mut self) {
        self.turn += 1;
        self.stats.turns += 1;
    }

    fn reject(&mut self) {
        self.stats.rejected_packets += 1;
        self.stats.waits += 1;
    }

    fn act(&mut self, obs: &Observation) -> Move {
        let turn = self.turn;
        if let Some(off) = obs.start_offset {
            self.map.set_position(Position::new(-off.x, -off.y));
        }
        let here = self.map.position();

        for d in &obs.doors {
            let cell = here.offset(d.dx, d.dy);
            if self.map.observe(turn, cell, d.dir, d.state) == ObserveOutcome::Inconsistent {
                self.stats.inconsistencies += 1;
                warn!(
                    "Turn {}: door {:?} of {:?} contradicts its history; treating it as closed",
                    turn, d.dir, cell
                );
            }
        }

        if let Some(off) = obs.target {
            let seen = here.offset(off.x, off.y);
            if self.target != Some(seen) {
                debug!("Turn {}: target sighted at {:?}", turn, seen);
            }
            self.target = Some(seen);
        }

        let step = match self.target {
            Some(t) if t == here => None,
            Some(t) => match plan(&self.map, &[t], turn, &mut self.rng) {
                Some(p) => p.path.first().copied(),
                None => {
                    self.stats.planner_failures += 1;
                    debug!("Turn {}: no route to target {:?}", turn, t);
                    None
                }
            },
            None => self.explorer.next_step(&self.map, turn, &mut self.rng),
        };

        match step {
            Some(dir) if self.map.is_passage_open_at(here, dir, turn) => {
                self.map.apply_move(dir);
                self.stats.moves += 1;
                Move::from(dir)
            }
            Some(dir) => {
                debug!("Turn {}: waiting for door {:?} of {:?}", turn, dir, here);
                self.stats.waits += 1;
                Move::Wait
            }
            None => {
                self.stats.waits += 1;
                Move::Wait
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    /// What a `dim`-sized world shows an agent standing at `at` on `turn`.
    fn packet(
        dim: i32,
        at: Position,
        radius: i32,
        turn: u32,
        period: impl Fn(Position, Direction) -> u32,
        target: Position,
    ) -> Observation {
        let world = Rect::new(0, 0, dim - 1, dim - 1);
        let mut doors = Vec::new();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let cell = at.offset(dx, dy);
                if !world.contains(cell) {
                    continue;
                }
                for dir in Direction::ALL {
                    let state = if !world.contains(cell.step(dir)) {
                        DoorState::Boundary
                    } else {
                        let p = period(cell, dir);
                        if p != 0 && turn % p == 0 {
                            DoorState::Open
                        } else {
                            DoorState::Closed
                        }
                    };
                    doors.push(DoorObservation::new(dx, dy, dir, state));
                }
            }
        }
        let target = (target.chebyshev(at) <= radius as u32)
            .then(|| Position::new(target.x - at.x, target.y - at.y));
        Observation {
            doors,
            target,
            start_offset: None,
        }
    }

    fn config(radius: u32, max: u32, dim: u32) -> AgentConfig {
        AgentConfig::default()
            .with_radius(radius)
            .with_max_door_frequency(max)
            .with_map_dim(dim)
            .with_seed(42)
    }

    #[test]
    fn config_defaults_and_validation() {
        let c = AgentConfig::default();
        assert_eq!((c.radius, c.max_door_frequency, c.map_dim), (15, 5, 100));
        assert!(c.validate().is_ok());
        assert_eq!(c.with_radius(0).validate(), Err(ConfigError::ZeroRadius));
        assert!(Agent::new(c.with_map_dim(0)).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn config_reads_partial_json() {
        let c: AgentConfig = serde_json::from_str(r#"{"radius": 4}"#).expect("parses");
        assert_eq!(c, AgentConfig::default().with_radius(4));
        let obs: Observation = serde_json::from_str(
            r#"{"doors": [{"dx": 0, "dy": -1, "dir": "up", "state": "boundary"}], "target": null, "start_offset": null}"#,
        )
        .expect("parses");
        assert_eq!(obs.doors[0].state, DoorState::Boundary);
    }

    #[test]
    fn walks_straight_to_visible_target() {
        let mut agent = Agent::new(config(3, 2, 4)).expect("valid");
        let goal = Position::new(3, 0);
        let mut at = Position::ORIGIN;
        let mut moves = Vec::new();
        for _ in 0..4 {
            let obs = packet(4, at, 3, agent.turn() + 1, |_, _| 1, goal);
            let m = agent.next_move(&obs);
            if let Some(d) = m.direction() {
                at = at.step(d);
            }
            moves.push(m);
        }
        assert_eq!(moves, vec![Move::Right, Move::Right, Move::Right, Move::Wait]);
        assert_eq!(agent.position(), goal);
        assert_eq!(agent.target(), Some(goal));
        assert_eq!(agent.stats().moves, 3);
    }

    #[test]
    fn unreachable_target_means_waiting_forever() {
        // The start cell of a 2x2 maze is sealed off by doors that never open.
        let sealed = |cell: Position, _: Direction| if cell == Position::ORIGIN { 0 } else { 1 };
        let mut agent = Agent::new(config(1, 2, 2)).expect("valid");
        for _ in 0..20 {
            let obs = packet(2, Position::ORIGIN, 1, agent.turn() + 1, sealed, Position::new(1, 1));
            assert_eq!(agent.next_move(&obs), Move::Wait);
        }
        assert!(agent.stats().planner_failures >= 18);
        assert_eq!(agent.stats().inconsistencies, 0);
        assert_eq!(agent.position(), Position::ORIGIN);
    }

    #[test]
    fn explores_until_target_found() {
        let dim = 12;
        let goal = Position::new(10, 11);
        let mut agent = Agent::new(config(2, 3, dim as u32)).expect("valid");
        let period = |cell: Position, dir: Direction| {
            let n = cell.step(dir);
            // Symmetric so both halves of a passage agree.
            1 + ((cell.x + n.x + cell.y + n.y).rem_euclid(3)) as u32
        };
        let mut at = Position::new(3, 2);
        let mut reached = false;
        for _ in 0..3000 {
            let obs = packet(dim, at, 2, agent.turn() + 1, period, goal);
            if let Some(d) = agent.next_move(&obs).direction() {
                at = at.step(d);
            }
            if at == goal {
                reached = true;
                break;
            }
        }
        assert!(reached, "stuck at {at:?} after {} turns", agent.turn());
        assert_eq!(agent.stats().rejected_packets, 0);
    }

    #[test]
    fn duplicate_door_rejects_whole_packet() {
        let mut agent = Agent::new(config(2, 3, 10)).expect("valid");
        let d = DoorObservation::new(0, 0, Direction::Left, DoorState::Open);
        let obs = Observation {
            doors: vec![DoorObservation::new(1, 0, Direction::Up, DoorState::Closed), d, d],
            ..Default::default()
        };
        assert_eq!(
            agent.try_next_move(&obs),
            Err(ObservationError::DuplicateDoor {
                offset: Position::ORIGIN,
                dir: Direction::Left
            })
        );
        assert_eq!(agent.map().door_count(), 0);
        assert_eq!(agent.next_move(&obs), Move::Wait);
        assert_eq!(agent.stats().rejected_packets, 2);
        assert_eq!(agent.turn(), 2);
    }

    #[test]
    fn out_of_range_and_bad_codes_are_rejected() {
        let mut agent = Agent::new(config(2, 3, 10)).expect("valid");
        let far = Observation {
            doors: vec![DoorObservation::new(3, 0, Direction::Up, DoorState::Open)],
            ..Default::default()
        };
        assert!(matches!(
            agent.try_next_move(&far),
            Err(ObservationError::OutOfRange { radius: 2, .. })
        ));

        assert_eq!(agent.next_move_from_codes(&[(0, 0, 1, 7)], None, None), Move::Wait);
        assert_eq!(
            Observation::from_codes(&[(0, 0, 9, 2)], None, None),
            Err(ObservationError::UnknownDirection(9))
        );
        assert_eq!(agent.stats().rejected_packets, 2);
        assert_eq!(agent.map().door_count(), 0);
    }

    #[test]
    fn contradicting_sightings_are_counted_and_play_goes_on() {
        let mut agent = Agent::new(config(2, 4, 10)).expect("valid");
        let seen = |state| Observation {
            doors: vec![DoorObservation::new(0, 0, Direction::Right, state)],
            ..Default::default()
        };

        // Open on turn 1 pins the period to 1, so closed on turn 2 is impossible.
        assert_eq!(agent.next_move(&seen(DoorState::Open)), Move::Wait);
        assert_eq!(agent.stats().inconsistencies, 0);
        assert_eq!(agent.next_move(&seen(DoorState::Closed)), Move::Wait);
        assert_eq!(agent.stats().inconsistencies, 1);
        let door = agent.map().belief(Position::ORIGIN, Direction::Right);
        assert!(door.is_some_and(|b| b.is_closed()));

        // Open again on a door now held closed is one more contradiction.
        assert_eq!(agent.next_move(&seen(DoorState::Open)), Move::Wait);
        assert_eq!(agent.stats().inconsistencies, 2);
        assert_eq!(agent.stats().rejected_packets, 0);
        assert_eq!(agent.stats().turns, 3);
        assert_eq!(agent.position(), Position::ORIGIN);
    }

    #[test]
    fn start_offset_resyncs_position() {
        let mut agent = Agent::new(config(2, 3, 10)).expect("valid");
        let obs = Observation {
            start_offset: Some(Position::new(-2, 1)),
            ..Default::default()
        };
        // No door has been seen open, so there is nowhere to go yet.
        assert_eq!(agent.next_move(&obs), Move::Wait);
        assert_eq!(agent.position(), Position::new(2, -1));
        assert_eq!(agent.stats().turns, 1);
    }

    #[test]
    fn moves_only_through_open_passages() {
        let mut agent = Agent::new(config(1, 2, 2)).expect("valid");
        // Only the door to the right is reported, and only its own half.
        let obs = Observation {
            doors: vec![DoorObservation::new(0, 0, Direction::Right, DoorState::Open)],
            target: Some(Position::new(1, 0)),
            start_offset: None,
        };
        assert_eq!(agent.next_move(&obs), Move::Wait);
        assert_eq!(agent.position(), Position::ORIGIN);
    }
}
