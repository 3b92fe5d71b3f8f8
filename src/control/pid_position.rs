//! Two-axis position PID producing acceleration commands
//!
//! D acts on the velocity error (target_vel - vel), not on the position
//! error difference, so measurement noise on position is not differentiated.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::common::{IntegratorState, PositionController};
use crate::control::anti_windup::{conditional_integration, ControlLimits};

/// PID gains for one axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl PidGains {
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        PidGains { kp, ki, kd }
    }
}

impl Default for PidGains {
    fn default() -> Self {
        Self {
            kp: 0.6,
            ki: 0.02,
            kd: 0.8,
        }
    }
}

pub struct PidPositionController {
    gains_x: PidGains,
    gains_y: PidGains,
    limits: ControlLimits,
    integrator: IntegratorState,
}

impl PidPositionController {
    /// y gains default to the x gains
    pub fn new(gains_x: PidGains, gains_y: Option<PidGains>, limits: ControlLimits) -> Self {
        PidPositionController {
            gains_x,
            gains_y: gains_y.unwrap_or(gains_x),
            limits,
            integrator: IntegratorState::zero(),
        }
    }

    pub fn gains(&self) -> (PidGains, PidGains) {
        (self.gains_x, self.gains_y)
    }

    pub fn limits(&self) -> &ControlLimits {
        &self.limits
    }
}

impl PositionController for PidPositionController {
    fn step(
        &mut self,
        dt: f64,
        position: Vector2<f64>,
        velocity: Vector2<f64>,
        target_position: Vector2<f64>,
        target_velocity: Vector2<f64>,
    ) -> Vector2<f64> {
        let e = target_position - position;
        let d = target_velocity - velocity;

        let gx = self.gains_x;
        let gy = self.gains_y;
        let x = conditional_integration(
            gx.kp * e.x + gx.kd * d.x,
            e.x,
            gx.ki,
            self.integrator.ix,
            dt,
            &self.limits,
        );
        let y = conditional_integration(
            gy.kp * e.y + gy.kd * d.y,
            e.y,
            gy.ki,
            self.integrator.iy,
            dt,
            &self.limits,
        );

        self.integrator.ix = x.integrator;
        self.integrator.iy = y.integrator;
        Vector2::new(x.command, y.command)
    }

    fn reset(&mut self) {
        self.integrator = IntegratorState::zero();
    }

    fn state(&self) -> IntegratorState {
        self.integrator
    }
}
