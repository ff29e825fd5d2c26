use timing_maze::agent::{Agent, AgentConfig};
use timing_maze::geometry::Position;
use timing_maze_harness::{
    generate, run_batch, run_episode, run_on_maze, DoorGrid, EpisodeConfig, Maze, MazeParams,
    Simulator, Vision,
};

fn small_config(map_dim: u32, radius: u32, closed_prob: f64) -> EpisodeConfig {
    let mut cfg = EpisodeConfig {
        maze: MazeParams {
            map_dim,
            max_door_frequency: 4,
            closed_prob,
            ..Default::default()
        },
        max_turns: 40_000,
        ..Default::default()
    };
    cfg.agent.radius = radius;
    cfg
}

#[test]
fn agent_reaches_target_on_generated_mazes() {
    let cfg = small_config(20, 4, 0.05);
    for seed in 1..=4 {
        let report = run_episode(&cfg, seed).expect("episode runs");
        assert!(report.reached, "seed {seed}: {report:?}");
        assert_eq!(report.stats.rejected_packets, 0);
        assert_eq!(report.stats.inconsistencies, 0);
    }
}

#[test]
fn start_offset_and_circular_vision_also_work() {
    let mut cfg = small_config(16, 3, 0.0);
    cfg.vision = Vision::Circle;
    cfg.report_start_offset = true;
    let report = run_episode(&cfg, 9).expect("episode runs");
    assert!(report.reached, "{report:?}");
}

#[test]
fn visible_target_is_reached_by_shortest_route() {
    // Every door opens every turn; the target is in sight from the start.
    let maze = Maze {
        doors: DoorGrid::from_fn(10, |_, _| 1),
        start: Position::new(2, 2),
        end: Position::new(5, 4),
    };
    let cfg = small_config(10, 4, 0.0);
    let report = run_on_maze(&maze, &cfg, 0).expect("episode runs");
    assert!(report.reached);
    assert_eq!(report.turns, 5);
    assert_eq!(report.stats.moves, 5);
    assert_eq!(report.stats.waits, 0);
}

#[test]
fn full_sweep_sees_every_cell() {
    for (dim, radius, seed) in [(16, 3, 5u64), (23, 4, 6), (12, 2, 7)] {
        let params = MazeParams {
            map_dim: dim,
            max_door_frequency: 3,
            closed_prob: 0.0,
            ..Default::default()
        };
        let maze = generate(&params, seed).expect("valid maze");
        let cfg = AgentConfig::default()
            .with_radius(radius)
            .with_max_door_frequency(3)
            .with_map_dim(dim)
            .with_seed(seed);
        let mut agent = Agent::new(cfg).expect("valid config");
        let mut sim = Simulator::new(&maze, radius, Vision::Square).with_target_hidden(true);

        while agent.explorer().sweeps_completed() == 0 && sim.turn() < 50_000 {
            let obs = sim.begin_turn();
            let m = agent.next_move(&obs);
            sim.apply(m);
            assert_eq!(
                agent.position(),
                Position::new(sim.position().x - maze.start.x, sim.position().y - maze.start.y),
                "dead reckoning drifted"
            );
        }
        assert_eq!(agent.explorer().sweeps_completed(), 1, "dim {dim}: sweep never finished");
        assert!(sim.all_seen(), "dim {dim}: unseen {:?}", sim.unseen());
    }
}

#[test]
fn batch_is_deterministic() {
    let cfg = small_config(12, 3, 0.05);
    let seeds = [11, 12, 13];
    let a = run_batch(&cfg, &seeds, Some(2)).expect("batch runs");
    let b = run_batch(&cfg, &seeds, None).expect("batch runs");
    assert_eq!(a.episodes, 3);
    assert_eq!(a.reports, b.reports);
    assert_eq!(a.reached, 3);
}
