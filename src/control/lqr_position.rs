//! LQR-style position controller
//!
//! State feedback on (position error, velocity) per axis, with an optional
//! integral on position error:
//!
//! `a = kx * e + kv * (-(v - v_target)) + ki * i`
//!
//! Gains can be given directly or synthesised from quadratic weights for the
//! discretised double integrator with [`LqrGains::from_weights`].

use log::debug;
use nalgebra::{Matrix1, Matrix2, Vector2};
use serde::{Deserialize, Serialize};

use crate::common::{IntegratorState, PositionController, RoboticsError, RoboticsResult};
use crate::control::anti_windup::{conditional_integration, ControlLimits};

const DARE_MAX_ITER: usize = 20_000;
const DARE_EPS: f64 = 1e-10;

/// Axis gains for position-velocity state feedback
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LqrGains {
    /// position gain
    pub kx: f64,
    /// velocity feedback gain (on -v)
    pub kv: f64,
    /// integral on position error
    pub ki: f64,
}

impl Default for LqrGains {
    fn default() -> Self {
        Self {
            kx: 2.0,
            kv: 3.5,
            ki: 0.1,
        }
    }
}

impl LqrGains {
    pub fn new(kx: f64, kv: f64, ki: f64) -> Self {
        LqrGains { kx, kv, ki }
    }

    /// Infinite-horizon discrete LQR gains for one axis of
    /// `p' = p + v dt + a dt^2 / 2`, `v' = v + a dt`, with state cost
    /// `diag(q_pos, q_vel)` and input cost `r`. `ki` is left at zero.
    pub fn from_weights(q_pos: f64, q_vel: f64, r: f64, dt: f64) -> RoboticsResult<Self> {
        if r <= 0.0 || dt <= 0.0 || q_pos < 0.0 || q_vel < 0.0 {
            return Err(RoboticsError::InvalidParameter(format!(
                "LQR weights need r > 0, dt > 0, q >= 0 (got q_pos={}, q_vel={}, r={}, dt={})",
                q_pos, q_vel, r, dt
            )));
        }

        let a = Matrix2::new(1.0, dt, 0.0, 1.0);
        let b = Vector2::new(0.5 * dt * dt, dt);
        let q = Matrix2::new(q_pos, 0.0, 0.0, q_vel);
        let r = Matrix1::new(r);

        let p = solve_dare(&a, &b, &q, &r)?;
        let bt_p = b.transpose() * p;
        let denominator = r + bt_p * b;
        let k = (1.0 / denominator[0]) * bt_p * a;

        Ok(LqrGains {
            kx: k[0],
            kv: k[1],
            ki: 0.0,
        })
    }
}

fn solve_dare(
    a: &Matrix2<f64>,
    b: &Vector2<f64>,
    q: &Matrix2<f64>,
    r: &Matrix1<f64>,
) -> RoboticsResult<Matrix2<f64>> {
    let mut p = *q;

    for iteration in 0..DARE_MAX_ITER {
        let bt_p = b.transpose() * p;
        let denominator = r + bt_p * b;
        if denominator[0].abs() < 1e-12 {
            return Err(RoboticsError::NumericInstability(
                "Riccati iteration hit a singular input term".to_string(),
            ));
        }

        let pn = a.transpose() * p * a - a.transpose() * p * b * (1.0 / denominator[0]) * bt_p * a + q;
        if pn.iter().any(|v| !v.is_finite()) {
            return Err(RoboticsError::NumericInstability(
                "Riccati iteration diverged".to_string(),
            ));
        }

        if (pn - p).abs().max() < DARE_EPS * (1.0 + pn.abs().max()) {
            debug!("DARE converged after {} iterations", iteration + 1);
            return Ok(pn);
        }
        p = pn;
    }

    Err(RoboticsError::NumericInstability(format!(
        "Riccati iteration did not converge in {} iterations",
        DARE_MAX_ITER
    )))
}

pub struct LqrPositionController {
    gains_x: LqrGains,
    gains_y: LqrGains,
    limits: ControlLimits,
    integrator: IntegratorState,
}

impl LqrPositionController {
    pub fn new(gains_x: LqrGains, gains_y: Option<LqrGains>, limits: ControlLimits) -> Self {
        LqrPositionController {
            gains_x,
            gains_y: gains_y.unwrap_or(gains_x),
            limits,
            integrator: IntegratorState::zero(),
        }
    }
}

impl PositionController for LqrPositionController {
    fn step(
        &mut self,
        dt: f64,
        position: Vector2<f64>,
        velocity: Vector2<f64>,
        target_position: Vector2<f64>,
        target_velocity: Vector2<f64>,
    ) -> Vector2<f64> {
        let e = target_position - position;
        let v_rel = velocity - target_velocity;

        let gx = self.gains_x;
        let gy = self.gains_y;
        let x = conditional_integration(
            gx.kx * e.x + gx.kv * (-v_rel.x),
            e.x,
            gx.ki,
            self.integrator.ix,
            dt,
            &self.limits,
        );
        let y = conditional_integration(
            gy.kx * e.y + gy.kv * (-v_rel.y),
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
