// Fly the same mission with A* and RRT waypoints and print KPI tables.
// A* runs once; RRT is swept over seeds 0..N and summarised.

use argh::FromArgs;
use log::{info, warn};

use drone_gnc::common::params::{load_or_default, MissionParams};
use drone_gnc::path_planning::{AStarPlanner, RrtConfig, RrtPlanner};
use drone_gnc::simulation::{aggregate, fly_mission, markdown_table, sweep_markdown};
use drone_gnc::{GridCell, GridPathPlanner, OccupancyGrid};

/// Compares grid planners through the same waypoint loop
#[derive(Debug, FromArgs)]
struct Args {
    /// parameter file (TOML), defaults are used when it does not exist
    #[argh(option, short = 'p', default = "String::from(\"params/waypoint_demo.toml\")")]
    params: String,

    /// grid text file, the built-in 20x10 wall demo when absent
    #[argh(option, short = 'g')]
    grid: Option<String>,

    /// position fix noise std [m]; enables the estimator
    #[argh(option)]
    pos_noise_std: Option<f64>,

    /// measurement noise seed
    #[argh(option, default = "42")]
    seed: u64,

    /// number of RRT seeds to sweep
    #[argh(option, default = "10")]
    seeds: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args: Args = argh::from_env();

    let params: MissionParams = load_or_default(&args.params)?;
    let grid = match &args.grid {
        Some(path) => OccupancyGrid::load(path)?,
        None => OccupancyGrid::demo(),
    };
    let start = GridCell::new(0, 0);
    let goal = GridCell::new(grid.width() as i32 - 1, grid.height() as i32 - 1);

    let fly = |planner: &dyn GridPathPlanner| {
        fly_mission(planner, &grid, start, goal, &params, args.pos_noise_std, args.seed)
    };

    let astar = AStarPlanner::new(params.planner.astar.clone());
    let mut rows = Vec::new();
    match fly(&astar) {
        Ok(outcome) => rows.push((astar.name().to_string(), outcome.kpis)),
        Err(e) => warn!("{} failed: {}", astar.name(), e),
    }

    let rrt = RrtPlanner::new(params.planner.rrt.clone());
    match fly(&rrt) {
        Ok(outcome) => rows.push((
            format!("{} (seed {})", rrt.name(), params.planner.rrt.seed),
            outcome.kpis,
        )),
        Err(e) => warn!("{} failed: {}", rrt.name(), e),
    }
    print!("{}", markdown_table(&rows));

    let mut sweep = Vec::new();
    for seed in 0..args.seeds {
        let planner = RrtPlanner::new(RrtConfig {
            seed,
            ..params.planner.rrt.clone()
        });
        match fly(&planner) {
            Ok(outcome) => sweep.push(outcome.kpis),
            Err(e) => warn!("{} seed {} failed: {}", planner.name(), seed, e),
        }
    }
    info!("{}/{} RRT seeds flew", sweep.len(), args.seeds);

    if sweep.is_empty() {
        warn!("no RRT run to summarise");
    } else {
        println!();
        print!("{}", sweep_markdown(rrt.name(), &aggregate(&sweep)?));
    }
    Ok(())
}
