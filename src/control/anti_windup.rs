//! Conditional-integration anti-windup shared by the position controllers
//!
//! Per axis the integrator is either accepting new error (`Integrating`) or
//! held at its previous value because the output clamp engaged (`Frozen`).

use serde::{Deserialize, Serialize};

/// Output and integrator limits shared by the position controllers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlLimits {
    /// |a_cmd| bound per axis [m/s^2]
    pub accel_max: f64,
    /// |integrator| bound
    pub i_limit: f64,
}

impl Default for ControlLimits {
    fn default() -> Self {
        Self {
            accel_max: 2.0,
            i_limit: 0.8,
        }
    }
}

/// Integrator state machine for one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegratorMode {
    Integrating,
    Frozen,
}

/// Result of one axis update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisOutput {
    /// Saturated command
    pub command: f64,
    /// Integrator value to carry into the next step
    pub integrator: f64,
    pub mode: IntegratorMode,
}

fn clamp(v: f64, limit: f64) -> f64 {
    v.max(-limit).min(limit)
}

/// One axis of conditional integration.
///
/// `static_term` is everything but the integral contribution (P and D, or the
/// LQR state feedback). With `ki == 0` the integrator is held at zero.
pub fn conditional_integration(
    static_term: f64,
    error: f64,
    ki: f64,
    i_prev: f64,
    dt: f64,
    limits: &ControlLimits,
) -> AxisOutput {
    let candidate = if ki != 0.0 {
        clamp(i_prev + error * dt, limits.i_limit)
    } else {
        0.0
    };

    let unsaturated = static_term + ki * candidate;
    let command = clamp(unsaturated, limits.accel_max);

    if command != unsaturated && ki != 0.0 {
        let held = static_term + ki * i_prev;
        AxisOutput {
            command: clamp(held, limits.accel_max),
            integrator: i_prev,
            mode: IntegratorMode::Frozen,
        }
    } else {
        AxisOutput {
            command,
            integrator: candidate,
            mode: IntegratorMode::Integrating,
        }
    }
}
