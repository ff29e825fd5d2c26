//! Whole episodes: generate a maze, run the agent to the target, report.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use timing_maze::agent::{Agent, AgentConfig, AgentStats};
use timing_maze::error::ConfigError;
use tracing::{debug, info};

use crate::maze::{generate, Maze, MazeError, MazeParams};
use crate::sim::{Simulator, Vision};

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("maze: {0}")]
    Maze(#[from] MazeError),

    #[error("agent config: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeConfig {
    pub maze: MazeParams,
    /// `map_dim` and `max_door_frequency` are taken from `maze`.
    pub agent: AgentConfig,
    pub vision: Vision,
    /// Report the start cell's offset in every packet.
    pub report_start_offset: bool,
    /// Give up after this many turns.
    pub max_turns: u32,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            maze: MazeParams::default(),
            agent: AgentConfig::default(),
            vision: Vision::Square,
            report_start_offset: false,
            max_turns: 100_000,
        }
    }
}

impl EpisodeConfig {
    /// Agent config matching the maze it will run in.
    pub fn agent_config(&self, seed: u64) -> AgentConfig {
        self.agent
            .with_map_dim(self.maze.map_dim)
            .with_max_door_frequency(self.maze.max_door_frequency)
            .with_seed(self.agent.seed ^ seed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeReport {
    pub seed: u64,
    pub reached: bool,
    pub turns: u32,
    pub cells_seen: usize,
    pub total_cells: usize,
    pub sweeps_completed: u32,
    pub stats: AgentStats,
}

pub fn run_episode(cfg: &EpisodeConfig, seed: u64) -> Result<EpisodeReport, HarnessError> {
    let maze = generate(&cfg.maze, seed)?;
    run_on_maze(&maze, cfg, seed)
}

pub fn run_on_maze(
    maze: &Maze,
    cfg: &EpisodeConfig,
    seed: u64,
) -> Result<EpisodeReport, HarnessError> {
    let agent_cfg = cfg.agent_config(seed).with_map_dim(maze.dim());
    let mut agent = Agent::new(agent_cfg)?;
    let mut sim = Simulator::new(maze, agent_cfg.radius, cfg.vision)
        .with_start_offset(cfg.report_start_offset);

    while !sim.reached() && sim.turn() < cfg.max_turns {
        let obs = sim.begin_turn();
        let m = agent.next_move(&obs);
        let moved = sim.apply(m);
        if m.direction().is_some() && !moved {
            debug!("Turn {}: move {:?} from {:?} failed", sim.turn(), m, sim.position());
        }
    }

    let report = EpisodeReport {
        seed,
        reached: sim.reached(),
        turns: sim.turn(),
        cells_seen: sim.cells_seen(),
        total_cells: (maze.dim() * maze.dim()) as usize,
        sweeps_completed: agent.explorer().sweeps_completed(),
        stats: agent.stats().clone(),
    };
    debug!(
        "Episode {}: reached={} in {} turns",
        seed, report.reached, report.turns
    );
    Ok(report)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub episodes: usize,
    pub reached: usize,
    pub mean_turns: f64,
    pub max_turns: u32,
    pub reports: Vec<EpisodeReport>,
}

impl BatchSummary {
    fn from_reports(reports: Vec<EpisodeReport>) -> Self {
        let reached: Vec<_> = reports.iter().filter(|r| r.reached).collect();
        let mean_turns = if reached.is_empty() {
            0.0
        } else {
            reached.iter().map(|r| r.turns as f64).sum::<f64>() / reached.len() as f64
        };
        Self {
            episodes: reports.len(),
            reached: reached.len(),
            mean_turns,
            max_turns: reports.iter().map(|r| r.turns).max().unwrap_or(0),
            reports,
        }
    }
}

/// Run every seed, in parallel. `jobs` caps the worker count.
pub fn run_batch(
    cfg: &EpisodeConfig,
    seeds: &[u64],
    jobs: Option<usize>,
) -> Result<BatchSummary, HarnessError> {
    let run_all = || -> Vec<Result<EpisodeReport, HarnessError>> {
        seeds.par_iter().map(|&seed| run_episode(cfg, seed)).collect()
    };
    let results = match jobs {
        Some(n) => rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build()?
            .install(run_all),
        None => run_all(),
    };

    let reports = results.into_iter().collect::<Result<Vec<_>, _>>()?;
    let summary = BatchSummary::from_reports(reports);
    info!(
        "Batch: {}/{} reached, mean {:.1} turns",
        summary.reached, summary.episodes, summary.mean_turns
    );
    Ok(summary)
}
