// Pure pursuit velocity tracking for a point mass.
//
// The desired velocity points at the target (the waypoint the driver is
// currently chasing) with a fixed speed; a proportional velocity loop turns
// it into an acceleration command whose magnitude is clamped with its
// direction kept.

use log::debug;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::common::{IntegratorState, PositionController, RoboticsError, RoboticsResult};

/// Distance below which the leg to the target has no direction
const MIN_LEG_LENGTH: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PurePursuitConfig {
    /// cruise speed [m/s]
    pub desired_speed: f64,
    /// |a_cmd| bound [m/s^2]
    pub accel_limit: f64,
    /// velocity error -> acceleration gain
    pub vel_p: f64,
}

impl Default for PurePursuitConfig {
    fn default() -> Self {
        Self {
            desired_speed: 4.0,
            accel_limit: 3.0,
            vel_p: 1.5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PurePursuit {
    config: PurePursuitConfig,
}

impl PurePursuit {
    pub fn new(config: PurePursuitConfig) -> Self {
        PurePursuit { config }
    }

    pub fn config(&self) -> &PurePursuitConfig {
        &self.config
    }

    /// `desired_speed` along the unit vector from `position` to `target`
    pub fn desired_velocity(
        &self,
        position: Vector2<f64>,
        target: Vector2<f64>,
    ) -> RoboticsResult<Vector2<f64>> {
        let leg = target - position;
        let length = leg.norm();
        if length < MIN_LEG_LENGTH {
            return Err(RoboticsError::DegenerateConfiguration(format!(
                "target ({:.3}, {:.3}) coincides with the current position",
                target.x, target.y
            )));
        }
        Ok(leg * (self.config.desired_speed / length))
    }

    /// Acceleration toward `desired` velocity, clamped by magnitude
    pub fn accel_command(&self, velocity: Vector2<f64>, desired: Vector2<f64>) -> Vector2<f64> {
        let mut a = (desired - velocity) * self.config.vel_p;
        let mag = a.norm();
        if mag > self.config.accel_limit && mag > 1e-6 {
            a *= self.config.accel_limit / mag;
        }
        a
    }
}

impl Default for PurePursuit {
    fn default() -> Self {
        Self::new(PurePursuitConfig::default())
    }
}

impl PositionController for PurePursuit {
    fn step(
        &mut self,
        _dt: f64,
        position: Vector2<f64>,
        velocity: Vector2<f64>,
        target_position: Vector2<f64>,
        target_velocity: Vector2<f64>,
    ) -> Vector2<f64> {
        let desired = match self.desired_velocity(position, target_position) {
            Ok(v) => v,
            Err(e) => {
                // sitting on the target: hold its velocity (brake for a waypoint)
                debug!("pure pursuit fallback: {}", e);
                target_velocity
            }
        };
        self.accel_command(velocity, desired)
    }

    fn reset(&mut self) {}

    fn state(&self) -> IntegratorState {
        IntegratorState::zero()
    }
}
