//! Ember Colony - Entry Point
//!
//! Loads the catalog, generates a random world, expands the task graph
//! from the pending construction sites, spawns the crew and runs the tick
//! simulator until every building stands (or the tick budget runs out).

use clap::Parser;
use ember_colony::catalog::{Catalog, PriorityWeights};
use ember_colony::core::config::SimConfig;
use ember_colony::core::error::Result;
use ember_colony::core::types::Pos;
use ember_colony::graph::TaskGraph;
use ember_colony::sim::{Simulator, Worker};
use ember_colony::world::gen::{generate_world, WorldGenParams};

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ember-colony", about = "Colony task planner and tick simulator")]
struct Args {
    /// Catalog TOML file (defaults to the built-in demo catalog)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Optional per-item priority weights TOML file
    #[arg(long)]
    weights: Option<PathBuf>,

    /// World generation and trade-sampling seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// World width and height
    #[arg(long, default_value_t = 2000)]
    world_size: i32,

    /// Number of workers spawned at the map center
    #[arg(long, default_value_t = 3)]
    workers: usize,

    /// Tick budget (20 ticks = 1 simulated second)
    #[arg(long, default_value_t = 24_000)]
    ticks: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ember_colony=info")),
        )
        .init();

    let args = Args::parse();
    tracing::info!(seed = args.seed, workers = args.workers, "Ember Colony starting");

    let catalog = match &args.catalog {
        Some(path) => Catalog::load_toml(path)?,
        None => Catalog::with_defaults(),
    };
    let weights = match &args.weights {
        Some(path) => PriorityWeights::load_toml(path)?,
        None => PriorityWeights::default(),
    };

    let config = SimConfig {
        rng_seed: args.seed,
        ..SimConfig::default()
    };
    if let Err(msg) = config.validate() {
        tracing::error!(%msg, "invalid configuration");
        std::process::exit(1);
    }

    let params = WorldGenParams {
        width: args.world_size,
        height: args.world_size,
        seed: args.seed,
    };
    let mut world = generate_world(&catalog, &params);
    let mut graph = TaskGraph::build(&catalog, &world, &weights)?;
    let center = Pos::new(args.world_size / 2, args.world_size / 2);
    let mut workers = Worker::default_crew(args.workers, center, &config);

    let mut simulator = Simulator::new(config);
    let simulated = simulator.run(&catalog, &mut world, &mut graph, &mut workers, args.ticks);

    let built = world.buildings().filter(|b| b.completed).count();
    let total = world.buildings().count();
    tracing::info!(
        ticks = simulated,
        built,
        total,
        complete = graph.all_builds_complete(),
        "simulation finished"
    );
    Ok(())
}
