//! Point-mass system identification
//!
//! Synthesises an excitation log of `a = u / m - (k / m) v` under
//! piecewise-constant random forces, then fits each axis by least squares on
//! `a[t] ~ b0 * u[t-1] + b1 * v[t-1]`, giving `m = 1 / b0` and `k = -b1 * m`.

use log::debug;
use nalgebra::{Matrix2, Vector2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal, Uniform};
use serde::{Deserialize, Serialize};

use crate::common::{RoboticsError, RoboticsResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SysIdConfig {
    /// log length [s]
    pub duration: f64,
    pub dt: f64,
    pub seed: u64,
    /// true mass [kg]
    pub mass: f64,
    /// true drag per axis [kg/s]
    pub drag_x: f64,
    pub drag_y: f64,
    /// forces are drawn from uniform(-force_max, force_max)
    pub force_max: f64,
    /// force hold time [s]
    pub segment: f64,
    /// accelerometer noise std [m/s^2]
    pub accel_noise: f64,
}

impl Default for SysIdConfig {
    fn default() -> Self {
        Self {
            duration: 12.0,
            dt: 0.02,
            seed: 7,
            mass: 1.5,
            drag_x: 0.4,
            drag_y: 0.55,
            force_max: 3.0,
            segment: 0.6,
            accel_noise: 0.05,
        }
    }
}

/// One row of the excitation log
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SysIdSample {
    pub t: f64,
    pub ux: f64,
    pub uy: f64,
    pub vx: f64,
    pub vy: f64,
    pub ax: f64,
    pub ay: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisFit {
    pub mass: f64,
    pub drag: f64,
    /// mean squared residual
    pub mse: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SysIdFit {
    /// mean of the per-axis mass estimates
    pub mass: f64,
    pub x: AxisFit,
    pub y: AxisFit,
}

/// Generate the synthetic excitation log
pub fn generate(config: &SysIdConfig) -> RoboticsResult<Vec<SysIdSample>> {
    let finite = [config.dt, config.duration, config.mass, config.force_max]
        .iter()
        .all(|v| v.is_finite());
    if !finite || !(config.dt > 0.0) || !(config.duration > 0.0) || !(config.mass > 0.0) || !(config.force_max >= 0.0) {
        return Err(RoboticsError::InvalidParameter(
            "sysid needs finite positive dt, duration and mass, and a finite non-negative force bound"
                .to_string(),
        ));
    }
    let force = Uniform::new_inclusive(-config.force_max, config.force_max);
    let noise = Normal::new(0.0, config.accel_noise)
        .map_err(|e| RoboticsError::InvalidParameter(format!("accel noise: {}", e)))?;
    let mut rng = StdRng::seed_from_u64(config.seed);

    let n = (config.duration / config.dt) as usize;
    let seg = ((config.segment / config.dt) as usize).max(1);
    let n_seg = n / seg + 1;
    let fx: Vec<f64> = (0..n_seg).map(|_| force.sample(&mut rng)).collect();
    let fy: Vec<f64> = (0..n_seg).map(|_| force.sample(&mut rng)).collect();

    let m = config.mass;
    let mut samples: Vec<SysIdSample> = Vec::with_capacity(n);
    for i in 0..n {
        let (ux, uy) = (fx[i / seg], fy[i / seg]);
        let (mut ax, mut ay, mut vx, mut vy) = (0.0, 0.0, 0.0, 0.0);
        if let Some(prev) = samples.last() {
            ax = prev.ux / m - (config.drag_x / m) * prev.vx;
            ay = prev.uy / m - (config.drag_y / m) * prev.vy;
            vx = prev.vx + config.dt * ax;
            vy = prev.vy + config.dt * ay;
        }
        samples.push(SysIdSample {
            t: i as f64 * config.dt,
            ux,
            uy,
            vx,
            vy,
            ax,
            ay,
        });
    }

    // noise goes on the logged acceleration only, after the dynamics
    for s in samples.iter_mut() {
        s.ax += noise.sample(&mut rng);
        s.ay += noise.sample(&mut rng);
    }
    Ok(samples)
}

/// Least-squares fit of one axis
pub fn fit_axis(u: &[f64], v: &[f64], a: &[f64]) -> RoboticsResult<AxisFit> {
    let n = a.len();
    if n < 3 || u.len() != n || v.len() != n {
        return Err(RoboticsError::DegenerateConfiguration(format!(
            "need at least 3 aligned samples, got u={}, v={}, a={}",
            u.len(),
            v.len(),
            n
        )));
    }

    // normal equations over (u[t-1], v[t-1]) -> a[t]
    let mut ata = Matrix2::zeros();
    let mut atb = Vector2::zeros();
    for t in 1..n {
        let phi = Vector2::new(u[t - 1], v[t - 1]);
        ata += phi * phi.transpose();
        atb += phi * a[t];
    }
    let theta = ata.try_inverse().map(|inv| inv * atb).ok_or_else(|| {
        RoboticsError::DegenerateConfiguration("regressors are collinear".to_string())
    })?;

    let (b0, b1) = (theta[0], theta[1]);
    if b0.abs() < 1e-9 {
        return Err(RoboticsError::DegenerateConfiguration(format!(
            "input gain {:e} too small to invert",
            b0
        )));
    }
    let mass = 1.0 / b0;
    let drag = -b1 * mass;

    let mse = (1..n)
        .map(|t| {
            let r = a[t] - (b0 * u[t - 1] + b1 * v[t - 1]);
            r * r
        })
        .sum::<f64>()
        / (n - 1) as f64;

    debug!("sysid axis fit: b0={:.5}, b1={:.5}, mse={:.3e}", b0, b1, mse);
    Ok(AxisFit { mass, drag, mse })
}

/// Fit both axes of a log
pub fn identify(samples: &[SysIdSample]) -> RoboticsResult<SysIdFit> {
    let column = |f: fn(&SysIdSample) -> f64| samples.iter().map(f).collect::<Vec<f64>>();
    let x = fit_axis(&column(|s| s.ux), &column(|s| s.vx), &column(|s| s.ax))?;
    let y = fit_axis(&column(|s| s.uy), &column(|s| s.vy), &column(|s| s.ay))?;
    Ok(SysIdFit {
        mass: 0.5 * (x.mass + y.mass),
        x,
        y,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn within(est: f64, truth: f64, rel: f64) -> bool {
        ((est - truth) / truth).abs() < rel
    }

    #[test]
    fn test_recovers_parameters() {
        let config = SysIdConfig::default();
        let samples = generate(&config).unwrap();
        assert_eq!(samples.len(), 600);

        let fit = identify(&samples).unwrap();
        assert!(within(fit.mass, 1.5, 0.1), "mass {}", fit.mass);
        assert!(within(fit.x.drag, 0.4, 0.1), "kx {}", fit.x.drag);
        assert!(within(fit.y.drag, 0.55, 0.1), "ky {}", fit.y.drag);
        assert!(fit.x.mse < 0.01);
    }

    #[test]
    fn test_noise_free_fit_is_exact() {
        let config = SysIdConfig {
            accel_noise: 0.0,
            ..Default::default()
        };
        let fit = identify(&generate(&config).unwrap()).unwrap();
        approx::assert_relative_eq!(fit.x.mass, 1.5, epsilon = 1e-6);
        approx::assert_relative_eq!(fit.y.drag, 0.55, epsilon = 1e-6);
    }

    #[test]
    fn test_same_seed_same_log() {
        let config = SysIdConfig::default();
        assert_eq!(generate(&config).unwrap(), generate(&config).unwrap());
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(matches!(
            fit_axis(&[1.0, 2.0], &[0.0, 0.0], &[0.0, 0.0]),
            Err(RoboticsError::DegenerateConfiguration(_))
        ));
        // zero input: no information about the mass
        let zeros = vec![0.0; 10];
        let v: Vec<f64> = (0..10).map(|i| i as f64).collect();
        assert!(matches!(
            fit_axis(&zeros, &v, &zeros),
            Err(RoboticsError::DegenerateConfiguration(_))
        ));
    }

    #[test]
    fn test_generate_rejects_bad_config() {
        let unbounded = SysIdConfig {
            force_max: f64::INFINITY,
            ..Default::default()
        };
        assert!(matches!(generate(&unbounded), Err(RoboticsError::InvalidParameter(_))));

        let endless = SysIdConfig {
            duration: f64::INFINITY,
            ..Default::default()
        };
        assert!(matches!(generate(&endless), Err(RoboticsError::InvalidParameter(_))));

        let massless = SysIdConfig {
            mass: 0.0,
            ..Default::default()
        };
        assert!(generate(&massless).is_err());
    }
}
