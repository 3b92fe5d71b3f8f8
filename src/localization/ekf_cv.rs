//! Constant-velocity Kalman filter on [x, y, z, vx, vy, vz]
//!
//! No control input; only position is observed.

use nalgebra::{Matrix3, Matrix3x6, Matrix6, Vector3, Vector6};
use serde::{Deserialize, Serialize};

use crate::common::{RoboticsError, RoboticsResult};
use crate::localization::kalman::{check_noise, commit, KalmanState};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EkfCvParams {
    pub q_pos: f64,
    pub q_vel: f64,
    pub r_pos: f64,
    pub min_variance: f64,
}

impl Default for EkfCvParams {
    fn default() -> Self {
        Self {
            q_pos: 0.5,
            q_vel: 0.8,
            r_pos: 2.0,
            min_variance: 1e-9,
        }
    }
}

impl EkfCvParams {
    pub fn validate(&self) -> RoboticsResult<()> {
        check_noise("q_pos", self.q_pos)?;
        check_noise("q_vel", self.q_vel)?;
        check_noise("r_pos", self.r_pos)?;
        check_noise("min_variance", self.min_variance)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EkfCv {
    params: EkfCvParams,
}

impl EkfCv {
    pub fn new(params: EkfCvParams) -> Self {
        EkfCv { params }
    }

    pub fn init(&self, x0: f64, y0: f64, z0: f64) -> KalmanState<6> {
        KalmanState::new(
            Vector6::new(x0, y0, z0, 0.0, 0.0, 0.0),
            Matrix6::from_diagonal(&Vector6::new(10.0, 10.0, 10.0, 5.0, 5.0, 5.0)),
        )
    }

    fn transition_matrix(dt: f64) -> Matrix6<f64> {
        let mut f = Matrix6::identity();
        for i in 0..3 {
            f[(i, i + 3)] = dt;
        }
        f
    }

    fn observation_matrix() -> Matrix3x6<f64> {
        let mut h = Matrix3x6::zeros();
        for i in 0..3 {
            h[(i, i)] = 1.0;
        }
        h
    }

    pub fn predict(&self, state: &mut KalmanState<6>, dt: f64) -> RoboticsResult<()> {
        self.params.validate()?;
        if !(dt >= 0.0) {
            return Err(RoboticsError::InvalidParameter(format!(
                "time step must be non-negative, got {}",
                dt
            )));
        }
        let (qp, qv) = (self.params.q_pos * dt, self.params.q_vel * dt);
        let q = Matrix6::from_diagonal(&Vector6::new(qp, qp, qp, qv, qv, qv));
        let f = Self::transition_matrix(dt);

        let x = f * state.x;
        let p = f * state.p * f.transpose() + q;
        commit(state, KalmanState::new(x, p), self.params.min_variance)
    }

    /// Update with a position fix [zx, zy, zz]
    pub fn update(&self, state: &mut KalmanState<6>, z: Vector3<f64>) -> RoboticsResult<()> {
        self.params.validate()?;
        let h = Self::observation_matrix();
        let r = Matrix3::identity() * self.params.r_pos;

        let y = z - h * state.x;
        let s = h * state.p * h.transpose() + r;
        let s_inv = s.try_inverse().ok_or_else(|| {
            RoboticsError::NumericInstability("innovation covariance is singular".to_string())
        })?;

        let k = state.p * h.transpose() * s_inv;
        let x = state.x + k * y;
        let p = (Matrix6::identity() - k * h) * state.p;
        commit(state, KalmanState::new(x, p), self.params.min_variance)
    }

    pub fn step(
        &self,
        state: &mut KalmanState<6>,
        dt: f64,
        z: Option<Vector3<f64>>,
    ) -> RoboticsResult<Vector6<f64>> {
        self.predict(state, dt)?;
        if let Some(z) = z {
            self.update(state, z)?;
        }
        Ok(state.x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    #[test]
    fn test_init_covariance() {
        let state = EkfCv::default().init(1.0, 2.0, 3.0);
        assert_eq!(state.x, Vector6::new(1.0, 2.0, 3.0, 0.0, 0.0, 0.0));
        assert_eq!(state.variances(), Vector6::new(10.0, 10.0, 10.0, 5.0, 5.0, 5.0));
    }

    #[test]
    fn test_tracks_constant_velocity() {
        let ekf = EkfCv::new(EkfCvParams {
            q_pos: 1e-4,
            q_vel: 1e-4,
            r_pos: 0.25,
            ..Default::default()
        });
        let velocity = Vector3::new(1.0, -0.5, 0.2);
        let noise = Normal::new(0.0, 0.5).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        let dt = 0.1;
        let mut truth = Vector3::zeros();
        let mut state = ekf.init(0.0, 0.0, 0.0);
        for _ in 0..300 {
            truth += velocity * dt;
            let z = truth + Vector3::new(noise.sample(&mut rng), noise.sample(&mut rng), noise.sample(&mut rng));
            ekf.step(&mut state, dt, Some(z)).unwrap();
            assert!(state.variances().iter().all(|v| *v > 0.0));
        }

        let est_vel = Vector3::new(state.x[3], state.x[4], state.x[5]);
        assert!((est_vel - velocity).norm() < 0.3);
        let est_pos = Vector3::new(state.x[0], state.x[1], state.x[2]);
        assert!((est_pos - truth).norm() < 0.6);
    }

    #[test]
    fn test_prediction_only_grows_uncertainty() {
        let ekf = EkfCv::default();
        let mut state = ekf.init(0.0, 0.0, 0.0);
        let before = state.variances();
        ekf.step(&mut state, 1.0, None).unwrap();
        let after = state.variances();
        for i in 0..6 {
            assert!(after[i] > before[i]);
        }
    }

    #[test]
    fn test_non_finite_rejected() {
        let ekf = EkfCv::default();
        let mut state = ekf.init(0.0, 0.0, 0.0);
        let err = ekf.update(&mut state, Vector3::new(0.0, f64::INFINITY, 0.0)).unwrap_err();
        assert!(matches!(err, RoboticsError::NumericInstability(_)));
    }

    #[test]
    fn test_negative_noise_rejected() {
        let ekf = EkfCv::new(EkfCvParams {
            q_vel: -0.8,
            ..Default::default()
        });
        let mut state = ekf.init(0.0, 0.0, 0.0);
        let before = state.clone();
        assert!(matches!(ekf.predict(&mut state, 0.1), Err(RoboticsError::InvalidParameter(_))));
        assert_eq!(state, before);
    }
}
