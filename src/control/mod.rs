//! Control algorithms module
//!
//! Position controllers producing acceleration commands for the point-mass
//! plant, their shared anti-windup, and a scalar PID building block.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::{PositionController, RoboticsError};
use crate::path_tracking::{PurePursuit, PurePursuitConfig};

pub mod anti_windup;
pub mod lqr_position;
pub mod pid;
pub mod pid_position;

pub use anti_windup::{conditional_integration, AxisOutput, ControlLimits, IntegratorMode};
pub use lqr_position::{LqrGains, LqrPositionController};
pub use pid::{Pid, PidConfig};
pub use pid_position::{PidGains, PidPositionController};

/// Which position controller drives the plant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerKind {
    Pid,
    Lqr,
    Pursuit,
}

impl Default for ControllerKind {
    fn default() -> Self {
        ControllerKind::Pid
    }
}

impl FromStr for ControllerKind {
    type Err = RoboticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pid" => Ok(ControllerKind::Pid),
            "lqr" => Ok(ControllerKind::Lqr),
            "pursuit" | "pure_pursuit" => Ok(ControllerKind::Pursuit),
            other => Err(RoboticsError::InvalidParameter(format!(
                "unknown controller kind {:?} (expected pid, lqr or pursuit)",
                other
            ))),
        }
    }
}

/// Controller section of the parameter file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerParams {
    pub kind: ControllerKind,
    pub pid: PidGains,
    /// y-axis PID gains, x gains when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid_y: Option<PidGains>,
    pub lqr: LqrGains,
    pub pursuit: PurePursuitConfig,
}

/// Build the configured controller behind the shared trait
pub fn build_controller(
    params: &ControllerParams,
    limits: &ControlLimits,
) -> Box<dyn PositionController> {
    match params.kind {
        ControllerKind::Pid => Box::new(PidPositionController::new(params.pid, params.pid_y, *limits)),
        ControllerKind::Lqr => Box::new(LqrPositionController::new(params.lqr, None, *limits)),
        ControllerKind::Pursuit => Box::new(PurePursuit::new(params.pursuit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector2;

    #[test]
    fn test_controller_kind_parse() {
        assert_eq!("PID".parse::<ControllerKind>().unwrap(), ControllerKind::Pid);
        assert_eq!("lqr".parse::<ControllerKind>().unwrap(), ControllerKind::Lqr);
        assert_eq!("pure_pursuit".parse::<ControllerKind>().unwrap(), ControllerKind::Pursuit);
        assert!("mpc".parse::<ControllerKind>().is_err());
    }

    #[test]
    fn test_build_each_kind() {
        let limits = ControlLimits::default();
        for kind in [ControllerKind::Pid, ControllerKind::Lqr, ControllerKind::Pursuit].iter() {
            let params = ControllerParams {
                kind: *kind,
                ..Default::default()
            };
            let mut ctrl = build_controller(&params, &limits);
            let a = ctrl.step(
                0.02,
                Vector2::zeros(),
                Vector2::zeros(),
                Vector2::new(5.0, 0.0),
                Vector2::zeros(),
            );
            assert!(a.x > 0.0, "{:?} should push toward the target", kind);
            assert!(a.y.abs() < 1e-12);
        }
    }
}
