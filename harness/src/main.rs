use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use timing_maze_harness::{generate, run_batch, run_episode, EpisodeConfig, Vision};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "maze-run")]
#[command(about = "Run the periodic-door maze agent on generated mazes")]
struct Cli {
    /// JSON episode config; flags below override its fields
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate and validate one maze, printing it as JSON
    Generate {
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[command(flatten)]
        overrides: Overrides,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run a single episode and print its report
    Run {
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[command(flatten)]
        overrides: Overrides,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run consecutive seeds in parallel and print a summary
    Batch {
        #[arg(long, default_value_t = 0)]
        seed_start: u64,
        #[arg(long, default_value_t = 16)]
        seed_count: u64,
        #[arg(long)]
        jobs: Option<usize>,
        #[command(flatten)]
        overrides: Overrides,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Default)]
struct Overrides {
    #[arg(long)]
    map_dim: Option<u32>,
    #[arg(long)]
    max_door_frequency: Option<u32>,
    #[arg(long)]
    closed_prob: Option<f64>,
    #[arg(long)]
    radius: Option<u32>,
    #[arg(long)]
    max_turns: Option<u32>,
    #[arg(long, value_enum)]
    vision: Option<CliVision>,
    /// Report the start cell's offset in every packet
    #[arg(long)]
    start_offset: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliVision {
    Square,
    Circle,
}

impl From<CliVision> for Vision {
    fn from(value: CliVision) -> Self {
        match value {
            CliVision::Square => Vision::Square,
            CliVision::Circle => Vision::Circle,
        }
    }
}

impl Overrides {
    fn apply(&self, mut cfg: EpisodeConfig) -> EpisodeConfig {
        if let Some(v) = self.map_dim {
            cfg.maze.map_dim = v;
        }
        if let Some(v) = self.max_door_frequency {
            cfg.maze.max_door_frequency = v;
        }
        if let Some(v) = self.closed_prob {
            cfg.maze.closed_prob = v;
        }
        if let Some(v) = self.radius {
            cfg.agent.radius = v;
        }
        if let Some(v) = self.max_turns {
            cfg.max_turns = v;
        }
        if let Some(v) = self.vision {
            cfg.vision = v.into();
        }
        if self.start_offset {
            cfg.report_start_offset = true;
        }
        cfg
    }
}

fn load_config(path: Option<&Path>) -> Result<EpisodeConfig> {
    let Some(path) = path else {
        return Ok(EpisodeConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed reading config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed parsing config {}", path.display()))
}

fn emit(value: &impl serde::Serialize, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed serializing output")?;
    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("failed writing {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let Cli { config, command } = Cli::parse();
    let base = load_config(config.as_deref())?;

    match command {
        Commands::Generate {
            seed,
            overrides,
            output,
        } => {
            let cfg = overrides.apply(base);
            let maze = generate(&cfg.maze, seed)
                .with_context(|| format!("maze generation failed for seed {seed}"))?;
            info!(
                "Maze {}x{} from {:?} to {:?}",
                maze.dim(),
                maze.dim(),
                maze.start,
                maze.end
            );
            emit(&maze, output.as_deref())
        }
        Commands::Run {
            seed,
            overrides,
            output,
        } => {
            let cfg = overrides.apply(base);
            let report = run_episode(&cfg, seed)
                .with_context(|| format!("episode failed for seed {seed}"))?;
            info!(
                "Seed {}: reached={} after {} turns ({} moves, {} waits)",
                seed, report.reached, report.turns, report.stats.moves, report.stats.waits
            );
            emit(&report, output.as_deref())
        }
        Commands::Batch {
            seed_start,
            seed_count,
            jobs,
            overrides,
            output,
        } => {
            if jobs == Some(0) {
                anyhow::bail!("--jobs must be >= 1 when provided");
            }
            let cfg = overrides.apply(base);
            let seeds: Vec<u64> = (seed_start..seed_start + seed_count).collect();
            let summary = run_batch(&cfg, &seeds, jobs).context("batch run failed")?;
            emit(&summary, output.as_deref())
        }
    }
}
