//! drone_gnc - 2D guidance, navigation and control core for a small drone
//!
//! Grid planners (A*, RRT), position controllers (PID, LQR, pure pursuit)
//! with shared anti-windup, a Kalman position/velocity estimator, a
//! point-mass plant and the fixed-timestep waypoint driver that ties them
//! together.

// Core modules
pub mod common;
pub mod utils;

// Algorithm modules
pub mod control;
pub mod localization;
pub mod path_planning;
pub mod path_tracking;
pub mod simulation;

// Re-export common types for convenience
pub use common::{GridCell, IntegratorState, Path2D, Point2D, State2D};
pub use common::{GridPathPlanner, PositionController};
pub use common::{RoboticsError, RoboticsResult};
pub use utils::OccupancyGrid;
