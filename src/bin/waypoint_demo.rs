// Waypoint demo: plan on a grid, fly the plan, write the per-tick CSV and
// print the run KPIs.

use argh::FromArgs;
use log::info;

use drone_gnc::common::params::{load_or_default, MissionParams};
use drone_gnc::control::ControllerKind;
use drone_gnc::path_planning::{AStarPlanner, RrtPlanner};
use drone_gnc::simulation::{fly_mission, write_run_file, CELL_SIZE};
use drone_gnc::utils::{PathStyle, Visualizer};
use drone_gnc::{GridCell, GridPathPlanner, OccupancyGrid, Point2D, RoboticsError};

/// Plans a path and flies it with the configured position controller
#[derive(Debug, FromArgs)]
struct Args {
    /// parameter file (TOML), defaults are used when it does not exist
    #[argh(option, short = 'p', default = "String::from(\"params/waypoint_demo.toml\")")]
    params: String,

    /// grid text file, the built-in 20x10 wall demo when absent
    #[argh(option, short = 'g')]
    grid: Option<String>,

    /// planner: astar or rrt
    #[argh(option, default = "String::from(\"astar\")")]
    planner: String,

    /// controller override: pid, lqr or pursuit
    #[argh(option, short = 'c')]
    controller: Option<ControllerKind>,

    /// start cell as x,y
    #[argh(option, default = "GridCell::new(0, 0)", from_str_fn(parse_cell))]
    start: GridCell,

    /// goal cell as x,y
    #[argh(option, default = "GridCell::new(19, 9)", from_str_fn(parse_cell))]
    goal: GridCell,

    /// position fix noise std [m]; enables the estimator
    #[argh(option)]
    pos_noise_std: Option<f64>,

    /// measurement noise seed
    #[argh(option, default = "42")]
    seed: u64,

    /// per-tick CSV output
    #[argh(option, short = 'o', default = "String::from(\"out/waypoint_demo.csv\")")]
    output: String,

    /// optional PNG plot of the run
    #[argh(option)]
    plot: Option<String>,
}

fn parse_cell(value: &str) -> Result<GridCell, String> {
    let mut parts = value.split(',').map(|p| p.trim().parse::<i32>());
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Ok(x)), Some(Ok(y)), None) => Ok(GridCell::new(x, y)),
        _ => Err(format!("expected a cell as x,y, got {:?}", value)),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args: Args = argh::from_env();

    let mut params: MissionParams = load_or_default(&args.params)?;
    if let Some(kind) = args.controller {
        params.controller.kind = kind;
    }

    let grid = match &args.grid {
        Some(path) => OccupancyGrid::load(path)?,
        None => OccupancyGrid::demo(),
    };

    let planner: Box<dyn GridPathPlanner> = match args.planner.as_str() {
        "astar" | "a_star" => Box::new(AStarPlanner::new(params.planner.astar.clone())),
        "rrt" => Box::new(RrtPlanner::new(params.planner.rrt.clone())),
        other => {
            return Err(RoboticsError::InvalidParameter(format!(
                "unknown planner {:?} (expected astar or rrt)",
                other
            ))
            .into())
        }
    };

    let outcome = fly_mission(
        planner.as_ref(),
        &grid,
        args.start,
        args.goal,
        &params,
        args.pos_noise_std,
        args.seed,
    )?;

    write_run_file(&outcome.log, &args.output)?;
    info!("Wrote {} ticks to {}", outcome.log.records.len(), args.output);

    let k = &outcome.kpis;
    println!("planner:          {}", planner.name());
    println!("controller:       {:?}", params.controller.kind);
    println!("waypoints:        {}/{}", k.hits, k.total_waypoints);
    println!("duration [s]:     {:.2}", k.duration);
    println!("mean error [m]:   {:.3}", k.mean_error);
    println!("rms error [m]:    {:.3}", k.rms_error);
    println!("max error [m]:    {:.3}", k.max_error);
    if let (Some(rms), Some(last)) = (k.estimator_rms, k.estimator_final_error) {
        println!("estimator rms:    {:.3}", rms);
        println!("estimator final:  {:.3}", last);
    }
    println!("rating:           {}", k.rating);

    if let Some(png) = &args.plot {
        let start = Point2D::new(args.start.x as f64 * CELL_SIZE, args.start.y as f64 * CELL_SIZE);
        let goal = Point2D::new(args.goal.x as f64 * CELL_SIZE, args.goal.y as f64 * CELL_SIZE);
        let mut vis = Visualizer::new();
        vis.set_title(&format!("{} + {:?}", planner.name(), params.controller.kind))
            .plot_grid(&grid, CELL_SIZE)
            .plot_path(&outcome.waypoints, &PathStyle::default().with_line_width(1.0))
            .plot_run(&outcome.log, "Flown")
            .plot_start(start)
            .plot_goal(goal);
        vis.save_png(png, 800, 500)?;
        info!("Plot saved to {}", png);
    }

    Ok(())
}
