//! Kalman filter on a planar point mass
//!
//! State [px, py, vx, vy] driven by a known acceleration input, observed
//! through noisy position fixes. The models are linear, so this is a plain
//! Kalman filter; a nonlinear model would plug its Jacobians in where
//! `transition_matrix` and `observation_matrix` are used.

use nalgebra::{Matrix2, Matrix2x4, Matrix4, Matrix4x2, Vector2, Vector4};
use serde::{Deserialize, Serialize};

use crate::common::{RoboticsError, RoboticsResult, State2D};
use crate::localization::kalman::{check_noise, commit, KalmanState};

/// Noise parameters for the planar filter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EkfParams {
    /// position process noise variance per second
    pub q_pos: f64,
    /// velocity process noise variance per second
    pub q_vel: f64,
    /// position measurement variance [m^2]
    pub r_pos: f64,
    /// initial variance of every state
    pub p0: f64,
    /// floor for the covariance diagonal
    pub min_variance: f64,
}

impl Default for EkfParams {
    fn default() -> Self {
        Self {
            q_pos: 1e-3,
            q_vel: 1e-2,
            r_pos: 0.09,
            p0: 1.0,
            min_variance: 1e-9,
        }
    }
}

impl EkfParams {
    /// Noise terms finite and non-negative, `p0` positive
    pub fn validate(&self) -> RoboticsResult<()> {
        check_noise("q_pos", self.q_pos)?;
        check_noise("q_vel", self.q_vel)?;
        check_noise("r_pos", self.r_pos)?;
        check_noise("min_variance", self.min_variance)?;
        if !(self.p0 > 0.0) || !self.p0.is_finite() {
            return Err(RoboticsError::InvalidParameter(format!(
                "p0 must be positive and finite, got {}",
                self.p0
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Ekf2D {
    params: EkfParams,
}

impl Ekf2D {
    pub fn new(params: EkfParams) -> Self {
        Ekf2D { params }
    }

    pub fn params(&self) -> &EkfParams {
        &self.params
    }

    /// At rest at (x0, y0) with covariance `p0 * I`
    pub fn init(&self, x0: f64, y0: f64) -> KalmanState<4> {
        KalmanState::new(
            Vector4::new(x0, y0, 0.0, 0.0),
            Matrix4::identity() * self.params.p0,
        )
    }

    fn transition_matrix(dt: f64) -> Matrix4<f64> {
        Matrix4::new(
            1., 0., dt, 0.,
            0., 1., 0., dt,
            0., 0., 1., 0.,
            0., 0., 0., 1.,
        )
    }

    fn input_matrix(dt: f64) -> Matrix4x2<f64> {
        let h = 0.5 * dt * dt;
        Matrix4x2::new(
            h, 0.,
            0., h,
            dt, 0.,
            0., dt,
        )
    }

    fn observation_matrix() -> Matrix2x4<f64> {
        Matrix2x4::new(
            1., 0., 0., 0.,
            0., 1., 0., 0.,
        )
    }

    fn process_noise(&self, dt: f64) -> Matrix4<f64> {
        let q = &self.params;
        Matrix4::from_diagonal(&Vector4::new(q.q_pos, q.q_pos, q.q_vel, q.q_vel)) * dt
    }

    /// Time update. Without an acceleration input the state coasts.
    pub fn predict(
        &self,
        state: &mut KalmanState<4>,
        dt: f64,
        accel: Option<Vector2<f64>>,
    ) -> RoboticsResult<()> {
        self.params.validate()?;
        if !(dt >= 0.0) {
            return Err(RoboticsError::InvalidParameter(format!(
                "time step must be non-negative, got {}",
                dt
            )));
        }
        let f = Self::transition_matrix(dt);
        let mut x = f * state.x;
        if let Some(u) = accel {
            x += Self::input_matrix(dt) * u;
        }
        let p = f * state.p * f.transpose() + self.process_noise(dt);

        commit(state, KalmanState::new(x, p), self.params.min_variance)
    }

    /// Measurement update with a position fix
    pub fn update(&self, state: &mut KalmanState<4>, z: Vector2<f64>) -> RoboticsResult<()> {
        self.params.validate()?;
        let h = Self::observation_matrix();
        let r = Matrix2::identity() * self.params.r_pos;

        let y = z - h * state.x;
        let s = h * state.p * h.transpose() + r;
        let s_inv = s.try_inverse().ok_or_else(|| {
            RoboticsError::NumericInstability("innovation covariance is singular".to_string())
        })?;

        let k = state.p * h.transpose() * s_inv;
        let x = state.x + k * y;
        let p = (Matrix4::identity() - k * h) * state.p;

        commit(state, KalmanState::new(x, p), self.params.min_variance)
    }

    /// Predict, then update when a measurement is available
    pub fn step(
        &self,
        state: &mut KalmanState<4>,
        dt: f64,
        accel: Option<Vector2<f64>>,
        z: Option<Vector2<f64>>,
    ) -> RoboticsResult<State2D> {
        self.predict(state, dt, accel)?;
        if let Some(z) = z {
            self.update(state, z)?;
        }
        Ok(state.to_state2d())
    }
}
