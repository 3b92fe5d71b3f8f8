//! Shared pieces of the Kalman filters
//!
//! Filters keep the mean and covariance in a [`KalmanState`] owned by the
//! caller. After every predict/update the candidate is checked for health
//! first, so a covariance that lost positive variances is rejected rather
//! than clamped. Only then is it symmetrised and its diagonal floored
//! against round-off, and committed.

use nalgebra::{SMatrix, SVector};

use crate::common::{RoboticsError, RoboticsResult, State2D};

/// Mean and covariance of an `N`-dimensional Gaussian belief
#[derive(Debug, Clone, PartialEq)]
pub struct KalmanState<const N: usize> {
    pub x: SVector<f64, N>,
    pub p: SMatrix<f64, N, N>,
}

impl<const N: usize> KalmanState<N> {
    pub fn new(x: SVector<f64, N>, p: SMatrix<f64, N, N>) -> Self {
        KalmanState { x, p }
    }

    /// Diagonal of the covariance
    pub fn variances(&self) -> SVector<f64, N> {
        let mut v = SVector::<f64, N>::zeros();
        for i in 0..N {
            v[i] = self.p[(i, i)];
        }
        v
    }
}

impl KalmanState<4> {
    /// [px, py, vx, vy] mean as a planar state
    pub fn to_state2d(&self) -> State2D {
        State2D::new(self.x[0], self.x[1], self.x[2], self.x[3])
    }
}

/// Finite mean, finite covariance and strictly positive variances
pub fn check_health<const N: usize>(state: &KalmanState<N>) -> RoboticsResult<()> {
    if state.x.iter().any(|v| !v.is_finite()) {
        return Err(RoboticsError::NumericInstability(
            "state mean has a non-finite entry".to_string(),
        ));
    }
    if state.p.iter().any(|v| !v.is_finite()) {
        return Err(RoboticsError::NumericInstability(
            "covariance has a non-finite entry".to_string(),
        ));
    }
    for i in 0..N {
        if state.p[(i, i)] <= 0.0 {
            return Err(RoboticsError::NumericInstability(format!(
                "covariance diagonal {} is not positive ({})",
                i,
                state.p[(i, i)]
            )));
        }
    }
    Ok(())
}

/// Symmetrise `p` and floor its diagonal at `min_variance`
pub fn condition_covariance<const N: usize>(p: &mut SMatrix<f64, N, N>, min_variance: f64) {
    for i in 0..N {
        for j in (i + 1)..N {
            let m = 0.5 * (p[(i, j)] + p[(j, i)]);
            p[(i, j)] = m;
            p[(j, i)] = m;
        }
        if p[(i, i)] < min_variance {
            p[(i, i)] = min_variance;
        }
    }
}

/// Commit a candidate state only if it is healthy, then condition it
pub(crate) fn commit<const N: usize>(
    state: &mut KalmanState<N>,
    mut candidate: KalmanState<N>,
    min_variance: f64,
) -> RoboticsResult<()> {
    check_health(&candidate)?;
    condition_covariance(&mut candidate.p, min_variance);
    *state = candidate;
    Ok(())
}

/// Noise terms must be finite and non-negative
pub(crate) fn check_noise(name: &str, value: f64) -> RoboticsResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(RoboticsError::InvalidParameter(format!(
            "{} must be finite and non-negative, got {}",
            name, value
        )))
    }
}
