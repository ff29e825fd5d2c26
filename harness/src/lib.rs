//! # timing_maze_harness
//!
//! The world around the agent: maze generation and validation, a turn-by-turn
//! simulator that produces observation packets, and episode runners.
//!
//! ## Modules
//!
//! - [`maze`]: Door-period grids, seeded generation, reachability checks
//! - [`sim`]: Observation packets in, moves out
//! - [`runner`]: Single episodes and parallel batches

pub mod maze;
pub mod runner;
pub mod sim;

pub use maze::{generate, DoorGrid, Maze, MazeError, MazeParams};
pub use runner::{run_batch, run_episode, run_on_maze, BatchSummary, EpisodeConfig, EpisodeReport};
pub use sim::{Simulator, Vision};
