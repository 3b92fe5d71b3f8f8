//! Parameter file loading
//!
//! Every tunable of the stack can be read from a TOML file. Sections that are
//! missing fall back to their defaults, so an empty file is a valid file.

use std::fs::read_to_string;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::common::error::RoboticsResult;
use crate::control::{ControlLimits, ControllerParams};
use crate::localization::EkfParams;
use crate::path_planning::{AStarConfig, RrtConfig};
use crate::simulation::{PointMassParams, SimConfig};

/// Planner section of the parameter file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerParams {
    pub astar: AStarConfig,
    pub rrt: RrtConfig,
}

/// Full parameter set for a waypoint mission run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionParams {
    pub controller: ControllerParams,
    pub limits: ControlLimits,
    pub plant: PointMassParams,
    pub estimator: EkfParams,
    pub simulation: SimConfig,
    pub planner: PlannerParams,
}

/// Load a parameter file into any deserialisable parameter struct.
pub fn load<P, A>(path: A) -> RoboticsResult<P>
where
    P: DeserializeOwned,
    A: AsRef<Path>,
{
    let params_str = read_to_string(path.as_ref())?;
    let params = toml::from_str(params_str.as_str())?;
    Ok(params)
}

/// Load a parameter file, or use the defaults when the file does not exist.
///
/// A file that exists but does not parse is still an error.
pub fn load_or_default<P, A>(path: A) -> RoboticsResult<P>
where
    P: DeserializeOwned + Default,
    A: AsRef<Path>,
{
    let path = path.as_ref();
    if !path.exists() {
        log::warn!("Parameter file {} not found, using defaults", path.display());
        return Ok(P::default());
    }
    load(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::RoboticsError;
    use crate::control::ControllerKind;

    #[test]
    fn test_empty_document_gives_defaults() {
        let params: MissionParams = toml::from_str("").unwrap();
        assert_eq!(params, MissionParams::default());
        assert_eq!(params.controller.pid.kp, 0.6);
        assert_eq!(params.limits.accel_max, 2.0);
        assert_eq!(params.plant.drag, 0.15);
    }

    #[test]
    fn test_partial_document_overrides() {
        let doc = r#"
            [controller]
            kind = "lqr"

            [controller.lqr]
            kx = 2.0
            kv = 3.5
            ki = 0.1

            [limits]
            accel_max = 3.0
            i_limit = 0.5

            [simulation]
            dt = 0.01
        "#;
        let params: MissionParams = toml::from_str(doc).unwrap();
        assert_eq!(params.controller.kind, ControllerKind::Lqr);
        assert_eq!(params.controller.lqr.kv, 3.5);
        assert_eq!(params.limits.i_limit, 0.5);
        assert_eq!(params.simulation.dt, 0.01);
        // untouched sections keep their defaults
        assert_eq!(params.plant, PointMassParams::default());
    }

    #[test]
    fn test_round_trip_through_toml() {
        let params = MissionParams::default();
        let text = toml::to_string(&params).unwrap();
        let back: MissionParams = toml::from_str(&text).unwrap();
        assert_eq!(params, back);
    }

    #[test]
    fn test_shipped_parameter_files() {
        let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("params");
        let params: MissionParams = load(dir.join("waypoint_demo.toml")).unwrap();
        assert_eq!(params.controller.kind, ControllerKind::Pid);
        assert!(params.planner.astar.simplify);
        assert_eq!(params.simulation.horizon, 60.0);

        let sysid: crate::simulation::SysIdConfig = load(dir.join("sysid.toml")).unwrap();
        assert_eq!(sysid, crate::simulation::SysIdConfig::default());
    }

    #[test]
    fn test_load_missing_file() {
        let missing = std::env::temp_dir().join("drone_gnc_params_does_not_exist.toml");
        let err = load::<MissionParams, _>(&missing).unwrap_err();
        assert!(matches!(err, RoboticsError::IoError(_)));

        let params: MissionParams = load_or_default(&missing).unwrap();
        assert_eq!(params, MissionParams::default());
    }

    #[test]
    fn test_load_malformed_file() {
        let path = std::env::temp_dir().join("drone_gnc_params_malformed.toml");
        std::fs::write(&path, "[limits]\naccel_max = \"fast\"\n").unwrap();
        let err = load_or_default::<MissionParams, _>(&path).unwrap_err();
        assert!(matches!(err, RoboticsError::ConfigError(_)));
        let _ = std::fs::remove_file(&path);
    }
}
