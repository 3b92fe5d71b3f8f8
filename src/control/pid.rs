// Single-axis PID on an error signal
//
// Derivative on the error difference, optionally smoothed with an
// exponential filter (`d_alpha`), integrator and output clamps.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidConfig {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    /// (lo, hi) clamp on the output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_limits: Option<(f64, f64)>,
    /// (lo, hi) clamp on the integrator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub i_limits: Option<(f64, f64)>,
    /// 0 = no filter, 0.1..0.9 exponential smoothing of the derivative
    pub d_alpha: f64,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            kp: 1.0,
            ki: 0.0,
            kd: 0.0,
            output_limits: Some((-1.0, 1.0)),
            i_limits: Some((-0.5, 0.5)),
            d_alpha: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Pid {
    config: PidConfig,
    integral: f64,
    prev_error: Option<f64>,
    d_filtered: f64,
}

impl Pid {
    pub fn new(config: PidConfig) -> Self {
        Pid {
            config,
            integral: 0.0,
            prev_error: None,
            d_filtered: 0.0,
        }
    }

    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = None;
        self.d_filtered = 0.0;
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn step(&mut self, error: f64, dt: f64) -> f64 {
        self.integral += error * dt;
        if let Some((lo, hi)) = self.config.i_limits {
            self.integral = self.integral.max(lo).min(hi);
        }

        let d = match self.prev_error {
            Some(prev) if dt > 0.0 => (error - prev) / dt,
            _ => 0.0,
        };
        let d_term = if self.config.d_alpha != 0.0 {
            let a = self.config.d_alpha;
            self.d_filtered = a * self.d_filtered + (1.0 - a) * d;
            self.d_filtered
        } else {
            d
        };

        let mut u = self.config.kp * error + self.config.ki * self.integral + self.config.kd * d_term;
        if let Some((lo, hi)) = self.config.output_limits {
            u = u.max(lo).min(hi);
        }

        self.prev_error = Some(error);
        u
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_proportional_only() {
        let mut pid = Pid::new(PidConfig {
            kp: 0.5,
            output_limits: None,
            ..Default::default()
        });
        assert_abs_diff_eq!(pid.step(1.0, 0.1), 0.5);
        assert_abs_diff_eq!(pid.step(-4.0, 0.1), -2.0);
    }

    #[test]
    fn test_derivative_needs_previous_error() {
        let mut pid = Pid::new(PidConfig {
            kp: 0.0,
            kd: 1.0,
            output_limits: None,
            ..Default::default()
        });
        assert_eq!(pid.step(1.0, 0.1), 0.0);
        assert_abs_diff_eq!(pid.step(1.5, 0.1), 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_derivative_filter() {
        let mut pid = Pid::new(PidConfig {
            kp: 0.0,
            kd: 1.0,
            d_alpha: 0.5,
            output_limits: None,
            ..Default::default()
        });
        pid.step(0.0, 0.1);
        // raw derivative 10, half of it passes the filter
        assert_abs_diff_eq!(pid.step(1.0, 0.1), 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_clamps_and_reset() {
        let mut pid = Pid::new(PidConfig {
            kp: 10.0,
            ki: 1.0,
            ..Default::default()
        });
        for _ in 0..100 {
            assert_eq!(pid.step(1.0, 0.1), 1.0);
        }
        assert_eq!(pid.integral(), 0.5);
        pid.reset();
        assert_eq!(pid.integral(), 0.0);
    }
}
