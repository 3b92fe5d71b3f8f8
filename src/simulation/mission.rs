//! Plan on a grid, then fly the plan through the waypoint loop

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::common::params::MissionParams;
use crate::common::{GridCell, GridPathPlanner, Path2D, RoboticsResult, State2D};
use crate::control::build_controller;
use crate::localization::Ekf2D;
use crate::simulation::{compute_kpis, PointMass2D, RunKpis, RunLog, WaypointRunner};
use crate::utils::OccupancyGrid;

/// Metres per grid cell
pub const CELL_SIZE: f64 = 1.0;

#[derive(Debug, Clone)]
pub struct MissionOutcome {
    pub cells: Vec<GridCell>,
    pub waypoints: Path2D,
    pub log: RunLog,
    pub kpis: RunKpis,
}

/// Plan from `start` to `goal` and fly the resulting waypoints from rest at
/// the start cell. `pos_noise_std` enables the estimator with noisy position
/// fixes drawn from a generator seeded with `seed`.
pub fn fly_mission(
    planner: &dyn GridPathPlanner,
    grid: &OccupancyGrid,
    start: GridCell,
    goal: GridCell,
    params: &MissionParams,
    pos_noise_std: Option<f64>,
    seed: u64,
) -> RoboticsResult<MissionOutcome> {
    let cells = planner.plan(grid, start, goal)?;
    info!("{} planned {} cells from {:?} to {:?}", planner.name(), cells.len(), start, goal);
    let waypoints = Path2D::from_cells(&cells, CELL_SIZE);

    let mut controller = build_controller(&params.controller, &params.limits);
    let mut plant = PointMass2D::with_state(
        params.plant,
        State2D::at_rest(start.x as f64 * CELL_SIZE, start.y as f64 * CELL_SIZE),
    );
    let ekf = Ekf2D::new(params.estimator);
    let mut rng = StdRng::seed_from_u64(seed);

    let runner = WaypointRunner::new(params.simulation);
    let log = runner.run(
        controller.as_mut(),
        &mut plant,
        &waypoints,
        pos_noise_std.map(|std| (&ekf, std)),
        &mut rng,
    )?;
    let kpis = compute_kpis(&log);

    Ok(MissionOutcome {
        cells,
        waypoints,
        log,
        kpis,
    })
}
