//! Simulation: plant model, waypoint driver loop, plan-and-fly missions,
//! run records and KPIs, and point-mass system identification.

pub mod kpi;
pub mod mission;
pub mod point_mass;
pub mod record;
pub mod sysid;
pub mod waypoint_runner;

pub use kpi::{
    aggregate, compute_kpis, markdown_table, sweep_markdown, tracking_errors, MetricStats, Rating,
    RunKpis, SweepStats,
};
pub use mission::{fly_mission, MissionOutcome, CELL_SIZE};
pub use point_mass::{PointMass2D, PointMassParams};
pub use record::{write_rows, write_run, write_run_file, EstimatorRow, TruthRow};
pub use sysid::{fit_axis, generate, identify, AxisFit, SysIdConfig, SysIdFit, SysIdSample};
pub use waypoint_runner::{FeedbackSource, RunLog, SimConfig, TickRecord, WaypointRunner};
