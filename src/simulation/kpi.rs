//! Tracking KPIs of a run
//!
//! Error per tick is the distance from the true position to the targeted
//! waypoint. The traffic-light rating is green when the RMS error is below
//! 1.5 m with at least two waypoint hits, yellow below 2.5 m, red otherwise.
//! Runs of a seed sweep are summarised per metric by mean and population
//! standard deviation.

use std::fmt;

use serde::Serialize;

use crate::common::{RoboticsError, RoboticsResult};
use crate::simulation::RunLog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Green,
    Yellow,
    Red,
}

impl Rating {
    pub fn from_errors(rms_error: f64, hits: usize) -> Self {
        if rms_error < 1.5 && hits >= 2 {
            Rating::Green
        } else if rms_error < 2.5 {
            Rating::Yellow
        } else {
            Rating::Red
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Rating::Green => "green",
            Rating::Yellow => "yellow",
            Rating::Red => "red",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunKpis {
    pub ticks: usize,
    pub duration: f64,
    pub hits: usize,
    pub total_waypoints: usize,
    pub mean_error: f64,
    pub rms_error: f64,
    pub max_error: f64,
    pub rating: Rating,
    /// RMS distance between estimated and true position
    pub estimator_rms: Option<f64>,
    /// estimated vs true position at the last tick
    pub estimator_final_error: Option<f64>,
}

/// Distance to the targeted waypoint at every tick
pub fn tracking_errors(log: &RunLog) -> Vec<f64> {
    log.records
        .iter()
        .map(|r| (r.target.to_vector() - r.truth.position()).norm())
        .collect()
}

fn rms(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    (values.iter().map(|e| e * e).sum::<f64>() / values.len() as f64).sqrt()
}

pub fn compute_kpis(log: &RunLog) -> RunKpis {
    let errors = tracking_errors(log);
    let hits = log.waypoints_reached;

    if errors.is_empty() {
        return RunKpis {
            ticks: 0,
            duration: 0.0,
            hits,
            total_waypoints: log.total_waypoints,
            mean_error: 0.0,
            rms_error: 0.0,
            max_error: 0.0,
            rating: Rating::Red,
            estimator_rms: None,
            estimator_final_error: None,
        };
    }

    let mean_error = errors.iter().sum::<f64>() / errors.len() as f64;
    let rms_error = rms(&errors);
    let max_error = errors.iter().cloned().fold(0.0, f64::max);

    let (estimator_rms, estimator_final_error) = if log.has_estimates() {
        let est_errors: Vec<f64> = log
            .records
            .iter()
            .filter_map(|r| r.estimate.map(|e| (e.position() - r.truth.position()).norm()))
            .collect();
        (Some(rms(&est_errors)), est_errors.last().cloned())
    } else {
        (None, None)
    };

    RunKpis {
        ticks: errors.len(),
        duration: log.duration(),
        hits,
        total_waypoints: log.total_waypoints,
        mean_error,
        rms_error,
        max_error,
        rating: Rating::from_errors(rms_error, hits),
        estimator_rms,
        estimator_final_error,
    }
}

/// Markdown table with one row per labelled run
pub fn markdown_table(rows: &[(String, RunKpis)]) -> String {
    let mut out = String::from(
        "| run | hits | duration [s] | mean err [m] | rms err [m] | max err [m] | rating |\n\
         |---|---|---|---|---|---|---|\n",
    );
    for (label, k) in rows {
        out.push_str(&format!(
            "| {} | {}/{} | {:.2} | {:.3} | {:.3} | {:.3} | {} |\n",
            label, k.hits, k.total_waypoints, k.duration, k.mean_error, k.rms_error, k.max_error, k.rating
        ));
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricStats {
    pub mean: f64,
    /// population standard deviation, zero for a single run
    pub std: f64,
}

impl MetricStats {
    fn of(values: &[f64]) -> Self {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = if values.len() > 1 {
            (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
        } else {
            0.0
        };
        MetricStats { mean, std }
    }
}

/// Summary of the same mission flown over several seeds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepStats {
    pub runs: usize,
    pub hits: MetricStats,
    pub mean_error: MetricStats,
    pub rms_error: MetricStats,
    pub max_error: MetricStats,
    pub green: usize,
    pub yellow: usize,
    pub red: usize,
}

fn metric(runs: &[RunKpis], f: impl Fn(&RunKpis) -> f64) -> MetricStats {
    MetricStats::of(&runs.iter().map(f).collect::<Vec<_>>())
}

pub fn aggregate(runs: &[RunKpis]) -> RoboticsResult<SweepStats> {
    if runs.is_empty() {
        return Err(RoboticsError::InvalidParameter(
            "cannot aggregate an empty sweep".to_string(),
        ));
    }
    let count = |rating: Rating| runs.iter().filter(|k| k.rating == rating).count();

    Ok(SweepStats {
        runs: runs.len(),
        hits: metric(runs, |k| k.hits as f64),
        mean_error: metric(runs, |k| k.mean_error),
        rms_error: metric(runs, |k| k.rms_error),
        max_error: metric(runs, |k| k.max_error),
        green: count(Rating::Green),
        yellow: count(Rating::Yellow),
        red: count(Rating::Red),
    })
}

/// Rating counts and a metric | mean | std table for a sweep
pub fn sweep_markdown(label: &str, stats: &SweepStats) -> String {
    let mut out = format!(
        "{} over {} runs, ratings: green {} / yellow {} / red {}\n\n\
         | metric | mean | std |\n\
         |---|---|---|\n",
        label, stats.runs, stats.green, stats.yellow, stats.red
    );
    out.push_str(&format!("| hits | {:.2} | {:.2} |\n", stats.hits.mean, stats.hits.std));
    for (name, m) in [
        ("mean err [m]", stats.mean_error),
        ("rms err [m]", stats.rms_error),
        ("max err [m]", stats.max_error),
    ]
    .iter()
    {
        out.push_str(&format!("| {} | {:.3} | {:.3} |\n", name, m.mean, m.std));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Point2D, State2D};
    use crate::simulation::TickRecord;
    use approx::assert_relative_eq;
    use nalgebra::Vector2;

    fn record(t: f64, x: f64, estimate: Option<State2D>) -> TickRecord {
        TickRecord {
            t,
            truth: State2D::at_rest(x, 0.0),
            command: Vector2::zeros(),
            target: Point2D::new(4.0, 0.0),
            waypoint_index: 0,
            measurement: estimate.map(|e| Point2D::new(e.x, e.y)),
            estimate,
        }
    }

    #[test]
    fn test_rating_thresholds() {
        assert_eq!(Rating::from_errors(1.0, 2), Rating::Green);
        assert_eq!(Rating::from_errors(1.0, 1), Rating::Yellow);
        assert_eq!(Rating::from_errors(2.4, 5), Rating::Yellow);
        assert_eq!(Rating::from_errors(2.5, 5), Rating::Red);
        assert_eq!(Rating::Green.to_string(), "green");
    }

    #[test]
    fn test_error_statistics() {
        let log = RunLog {
            records: vec![record(0.0, 1.0, None), record(0.5, 3.0, None)],
            waypoints_reached: 0,
            total_waypoints: 1,
        };
        let k = compute_kpis(&log);
        assert_eq!(k.ticks, 2);
        assert_relative_eq!(k.mean_error, 2.0);
        assert_relative_eq!(k.rms_error, 5.0_f64.sqrt());
        assert_relative_eq!(k.max_error, 3.0);
        assert_relative_eq!(k.duration, 0.5);
        assert_eq!(k.rating, Rating::Yellow);
        assert!(k.estimator_rms.is_none());
    }

    #[test]
    fn test_estimator_errors() {
        let log = RunLog {
            records: vec![
                record(0.0, 1.0, Some(State2D::at_rest(1.0, 0.3))),
                record(0.1, 1.0, Some(State2D::at_rest(1.0, 0.4))),
            ],
            waypoints_reached: 0,
            total_waypoints: 1,
        };
        let k = compute_kpis(&log);
        assert_relative_eq!(k.estimator_rms.unwrap(), (0.125_f64).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(k.estimator_final_error.unwrap(), 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_log_is_red() {
        let k = compute_kpis(&RunLog::default());
        assert_eq!(k.ticks, 0);
        assert_eq!(k.rating, Rating::Red);
    }

    #[test]
    fn test_markdown_table() {
        let k = compute_kpis(&RunLog {
            records: vec![record(0.0, 4.0, None)],
            waypoints_reached: 1,
            total_waypoints: 1,
        });
        let table = markdown_table(&[("A*".to_string(), k)]);
        assert!(table.lines().nth(2).unwrap().starts_with("| A* | 1/1 |"));
        assert_eq!(table.lines().count(), 3);
    }

    fn run(hits: usize, rms_error: f64) -> RunKpis {
        RunKpis {
            ticks: 10,
            duration: 0.2,
            hits,
            total_waypoints: 4,
            mean_error: rms_error * 0.5,
            rms_error,
            max_error: rms_error * 2.0,
            rating: Rating::from_errors(rms_error, hits),
            estimator_rms: None,
            estimator_final_error: None,
        }
    }

    #[test]
    fn test_aggregate_sweep() {
        let stats = aggregate(&[run(1, 1.0), run(3, 3.0)]).unwrap();
        assert_eq!(stats.runs, 2);
        assert_relative_eq!(stats.hits.mean, 2.0);
        assert_relative_eq!(stats.hits.std, 1.0);
        assert_relative_eq!(stats.rms_error.mean, 2.0);
        assert_relative_eq!(stats.rms_error.std, 1.0);
        assert_relative_eq!(stats.max_error.mean, 4.0);
        assert_relative_eq!(stats.mean_error.std, 0.5);
        // hits 1 at 1 m is yellow, 3 m is red
        assert_eq!((stats.green, stats.yellow, stats.red), (0, 1, 1));

        let single = aggregate(&[run(2, 1.0)]).unwrap();
        assert_eq!(single.green, 1);
        assert_relative_eq!(single.hits.std, 0.0);

        assert!(matches!(aggregate(&[]), Err(RoboticsError::InvalidParameter(_))));
    }

    #[test]
    fn test_sweep_markdown() {
        let stats = aggregate(&[run(1, 1.0), run(3, 3.0)]).unwrap();
        let text = sweep_markdown("RRT", &stats);
        assert!(text.starts_with("RRT over 2 runs, ratings: green 0 / yellow 1 / red 1"));
        assert!(text.contains("| hits | 2.00 | 1.00 |"));
        assert!(text.contains("| rms err [m] | 2.000 | 1.000 |"));
        assert_eq!(text.lines().filter(|l| l.starts_with('|')).count(), 6);
    }
}
