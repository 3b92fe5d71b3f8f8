//! Common traits defining interfaces between planners, controllers and the driver

use nalgebra::Vector2;

use crate::common::error::RoboticsResult;
use crate::common::types::*;
use crate::utils::OccupancyGrid;

/// Trait for grid-based path planning algorithms
pub trait GridPathPlanner {
    /// Plan a cell sequence from start to goal (first = start, last = goal)
    fn plan(&self, grid: &OccupancyGrid, start: GridCell, goal: GridCell)
        -> RoboticsResult<Vec<GridCell>>;

    /// Short name used in logs and reports
    fn name(&self) -> &'static str;
}

/// Trait for position controllers producing acceleration commands
///
/// Implementations keep their integrators between calls; `reset` zeroes them.
pub trait PositionController {
    /// Compute the acceleration command (ax, ay)
    fn step(
        &mut self,
        dt: f64,
        position: Vector2<f64>,
        velocity: Vector2<f64>,
        target_position: Vector2<f64>,
        target_velocity: Vector2<f64>,
    ) -> Vector2<f64>;

    /// Reset controller state
    fn reset(&mut self);

    /// Integrator snapshot
    fn state(&self) -> IntegratorState;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct HoldController;

    impl PositionController for HoldController {
        fn step(
            &mut self,
            _dt: f64,
            _position: Vector2<f64>,
            velocity: Vector2<f64>,
            _target_position: Vector2<f64>,
            _target_velocity: Vector2<f64>,
        ) -> Vector2<f64> {
            -velocity
        }

        fn reset(&mut self) {}

        fn state(&self) -> IntegratorState {
            IntegratorState::zero()
        }
    }

    #[test]
    fn test_position_controller_trait_object() {
        let mut ctrl: Box<dyn PositionController> = Box::new(HoldController);
        let a = ctrl.step(
            0.1,
            Vector2::zeros(),
            Vector2::new(1.0, -2.0),
            Vector2::zeros(),
            Vector2::zeros(),
        );
        assert_eq!(a, Vector2::new(-1.0, 2.0));
        assert!(ctrl.state().is_zero());
    }
}
