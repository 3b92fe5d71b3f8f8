// Planar point mass with linear drag and per-axis acceleration saturation.
//
// Semi-implicit Euler: velocity is updated first and the new velocity moves
// the position.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::common::State2D;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointMassParams {
    /// linear drag coefficient [1/s]
    pub drag: f64,
    /// per-axis acceleration limit [m/s^2]
    pub accel_max: f64,
}

impl Default for PointMassParams {
    fn default() -> Self {
        Self {
            drag: 0.15,
            accel_max: 3.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PointMass2D {
    params: PointMassParams,
    state: State2D,
}

impl PointMass2D {
    pub fn new(params: PointMassParams) -> Self {
        PointMass2D {
            params,
            state: State2D::origin(),
        }
    }

    pub fn with_state(params: PointMassParams, state: State2D) -> Self {
        PointMass2D { params, state }
    }

    pub fn params(&self) -> &PointMassParams {
        &self.params
    }

    pub fn reset(&mut self, state: State2D) {
        self.state = state;
    }

    pub fn state(&self) -> State2D {
        self.state
    }

    /// Advance by `dt` under the commanded acceleration
    pub fn step(&mut self, dt: f64, commanded_ax: f64, commanded_ay: f64) -> State2D {
        let limit = self.params.accel_max;
        let command = Vector2::new(
            commanded_ax.max(-limit).min(limit),
            commanded_ay.max(-limit).min(limit),
        );
        let velocity = self.state.velocity();
        let accel = command - velocity * self.params.drag;

        let velocity = velocity + accel * dt;
        let position = self.state.position() + velocity * dt;
        self.state = State2D::new(position.x, position.y, velocity.x, velocity.y);
        self.state
    }
}
