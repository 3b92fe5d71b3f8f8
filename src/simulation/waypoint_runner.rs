//! Fixed-timestep waypoint following loop
//!
//! Per tick: pick the current waypoint, run the controller on the feedback
//! state, advance the plant, optionally feed a noisy position fix and the
//! same command to the estimator, record, and move to the next waypoint once
//! the vehicle is within `wp_radius` of the current one. The loop stops at
//! the time horizon or when every waypoint is consumed.

use log::{debug, info};
use nalgebra::Vector2;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::common::{Path2D, Point2D, PositionController, RoboticsError, RoboticsResult, State2D};
use crate::localization::Ekf2D;
use crate::simulation::PointMass2D;

/// State handed to the controller each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackSource {
    /// plant ground truth
    Truth,
    /// estimator belief from the previous tick
    Estimate,
}

impl Default for FeedbackSource {
    fn default() -> Self {
        FeedbackSource::Truth
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// time step [s]
    pub dt: f64,
    /// simulated time limit [s]
    pub horizon: f64,
    /// waypoint acceptance radius [m]
    pub wp_radius: f64,
    pub feedback: FeedbackSource,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: 0.02,
            horizon: 30.0,
            wp_radius: 0.2,
            feedback: FeedbackSource::Truth,
        }
    }
}

/// One logged tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickRecord {
    pub t: f64,
    /// true state after the plant step
    pub truth: State2D,
    pub command: Vector2<f64>,
    pub target: Point2D,
    /// index of the waypoint targeted during this tick
    pub waypoint_index: usize,
    pub measurement: Option<Point2D>,
    pub estimate: Option<State2D>,
}

#[derive(Debug, Clone, Default)]
pub struct RunLog {
    pub records: Vec<TickRecord>,
    pub waypoints_reached: usize,
    pub total_waypoints: usize,
}

impl RunLog {
    /// All waypoints were consumed before the horizon
    pub fn completed(&self) -> bool {
        self.waypoints_reached == self.total_waypoints
    }

    pub fn duration(&self) -> f64 {
        self.records.last().map_or(0.0, |r| r.t)
    }

    pub fn has_estimates(&self) -> bool {
        !self.records.is_empty() && self.records.iter().all(|r| r.estimate.is_some())
    }
}

#[derive(Debug, Clone, Default)]
pub struct WaypointRunner {
    config: SimConfig,
}

impl WaypointRunner {
    pub fn new(config: SimConfig) -> Self {
        WaypointRunner { config }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Run the loop from the plant's current state.
    ///
    /// `estimator` pairs the filter with the standard deviation of the
    /// position noise drawn from `rng`; the filter starts at the plant's
    /// initial position.
    pub fn run<R: Rng + ?Sized>(
        &self,
        controller: &mut dyn PositionController,
        plant: &mut PointMass2D,
        waypoints: &Path2D,
        estimator: Option<(&Ekf2D, f64)>,
        rng: &mut R,
    ) -> RoboticsResult<RunLog> {
        let dt = self.config.dt;
        if !(dt > 0.0) || !dt.is_finite() {
            return Err(RoboticsError::InvalidParameter(format!(
                "time step must be positive, got {}",
                dt
            )));
        }
        if self.config.feedback == FeedbackSource::Estimate && estimator.is_none() {
            return Err(RoboticsError::InvalidParameter(
                "estimate feedback requires an estimator".to_string(),
            ));
        }

        let mut filter = match estimator {
            Some((ekf, noise_std)) => {
                let noise = Normal::new(0.0, noise_std).map_err(|e| {
                    RoboticsError::InvalidParameter(format!("measurement noise std {}: {}", noise_std, e))
                })?;
                let start = plant.state();
                Some((ekf, noise, ekf.init(start.x, start.y)))
            }
            None => None,
        };

        let mut log = RunLog {
            records: Vec::new(),
            waypoints_reached: 0,
            total_waypoints: waypoints.len(),
        };
        let last_tick = (self.config.horizon / dt + 1e-9).floor();
        let mut tick = 0.0;
        let mut wp_index = 0;

        while tick <= last_tick && wp_index < waypoints.len() {
            let t = tick * dt;
            let target = waypoints.points[wp_index];

            let feedback = match (&filter, self.config.feedback) {
                (Some((_, _, belief)), FeedbackSource::Estimate) => belief.to_state2d(),
                _ => plant.state(),
            };
            let command = controller.step(
                dt,
                feedback.position(),
                feedback.velocity(),
                target.to_vector(),
                Vector2::zeros(),
            );
            let truth = plant.step(dt, command.x, command.y);

            let (measurement, estimate) = match filter.as_mut() {
                Some((ekf, noise, belief)) => {
                    let z = Vector2::new(truth.x + noise.sample(rng), truth.y + noise.sample(rng));
                    let estimate = ekf.step(belief, dt, Some(command), Some(z))?;
                    (Some(Point2D::from(z)), Some(estimate))
                }
                None => (None, None),
            };

            log.records.push(TickRecord {
                t,
                truth,
                command,
                target,
                waypoint_index: wp_index,
                measurement,
                estimate,
            });

            if (target.to_vector() - truth.position()).norm() <= self.config.wp_radius {
                debug!("waypoint {} reached at t = {:.2} s", wp_index, t);
                wp_index += 1;
            }
            tick += 1.0;
        }

        log.waypoints_reached = wp_index;
        info!(
            "Run finished: {}/{} waypoints in {:.2} s ({} ticks)",
            log.waypoints_reached,
            log.total_waypoints,
            log.duration(),
            log.records.len()
        );
        Ok(log)
    }
}
