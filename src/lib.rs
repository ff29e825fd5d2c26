//! # timing_maze
//!
//! Navigation for a grid maze whose doors open on fixed periods.
//!
//! Each door opens on turns that are multiples of its period (0 means never).
//! The agent sees only doors near it, infers their periods from what it has seen,
//! plans routes that account for the expected wait at each door, and sweeps the
//! maze systematically until the target comes into view.
//!
//! ## Quick Start
//!
//! ```
//! use timing_maze::prelude::*;
//!
//! let cfg = AgentConfig::default().with_radius(3).with_map_dim(8).with_seed(42);
//! let mut agent = Agent::new(cfg).expect("valid config");
//!
//! // One observation packet per turn: (dx, dy, direction, state) tuples.
//! let doors = [(0, 0, 2, 2), (1, 0, 0, 2)];
//! let m = agent.next_move_from_codes(&doors, Some((1, 0)), None);
//! assert_eq!(m, Move::Right);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): Serialize/Deserialize for configs, packets and stats
//!
//! ## Modules
//!
//! - [`belief`]: Per-door period inference
//! - [`local_map`]: Sparse door beliefs in the agent's frame
//! - [`cost`]: Expected-wait edge costs
//! - [`planner`]: Time-aware shortest paths
//! - [`explore`]: Corridor sweep while the target is unseen
//! - [`agent`]: Per-turn orchestration

#[path = "core/geometry.rs"]
pub mod geometry;

#[path = "core/prng.rs"]
pub mod prng;

#[path = "core/belief.rs"]
pub mod belief;

#[path = "core/local_map.rs"]
pub mod local_map;

#[path = "core/cost.rs"]
pub mod cost;

#[path = "core/planner.rs"]
pub mod planner;

#[path = "core/explore.rs"]
pub mod explore;

#[path = "core/agent.rs"]
pub mod agent;

#[path = "core/error.rs"]
pub mod error;

#[cfg(test)]
#[path = "core/testing.rs"]
mod testing;

/// Prelude module for convenient imports.
///
/// ```
/// use timing_maze::prelude::*;
/// ```
pub mod prelude {
    pub use crate::agent::{Agent, AgentConfig, AgentStats, DoorObservation, Observation};
    pub use crate::belief::{DoorBelief, DoorState, ObserveOutcome};
    pub use crate::error::{ConfigError, ObservationError};
    pub use crate::explore::{Corridor, ExplorationController, Rotation, SearchStage};
    pub use crate::geometry::{Direction, Move, Position, Rect};
    pub use crate::local_map::LocalMap;
    pub use crate::planner::Plan;
}
