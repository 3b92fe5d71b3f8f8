// CSV output of run logs
//
// One row per tick. Runs with an estimator get the measurement and
// estimate columns appended.

use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::common::RoboticsResult;
use crate::simulation::{RunLog, TickRecord};

#[derive(Debug, Clone, Serialize)]
pub struct TruthRow {
    pub t: f64,
    pub px: f64,
    pub py: f64,
    pub vx: f64,
    pub vy: f64,
    pub target_x: f64,
    pub target_y: f64,
    pub waypoint_index: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EstimatorRow {
    pub t: f64,
    pub px: f64,
    pub py: f64,
    pub vx: f64,
    pub vy: f64,
    pub target_x: f64,
    pub target_y: f64,
    pub waypoint_index: usize,
    pub measured_x: f64,
    pub measured_y: f64,
    pub estimated_px: f64,
    pub estimated_py: f64,
    pub estimated_vx: f64,
    pub estimated_vy: f64,
}

impl From<&TickRecord> for TruthRow {
    fn from(r: &TickRecord) -> Self {
        TruthRow {
            t: r.t,
            px: r.truth.x,
            py: r.truth.y,
            vx: r.truth.vx,
            vy: r.truth.vy,
            target_x: r.target.x,
            target_y: r.target.y,
            waypoint_index: r.waypoint_index,
        }
    }
}

impl EstimatorRow {
    fn from_record(r: &TickRecord) -> Option<Self> {
        let z = r.measurement?;
        let est = r.estimate?;
        Some(EstimatorRow {
            t: r.t,
            px: r.truth.x,
            py: r.truth.y,
            vx: r.truth.vx,
            vy: r.truth.vy,
            target_x: r.target.x,
            target_y: r.target.y,
            waypoint_index: r.waypoint_index,
            measured_x: z.x,
            measured_y: z.y,
            estimated_px: est.x,
            estimated_py: est.y,
            estimated_vx: est.vx,
            estimated_vy: est.vy,
        })
    }
}

/// Serialise any rows to CSV, header taken from the field names
pub fn write_rows<S, I, W>(rows: I, writer: W) -> RoboticsResult<()>
where
    S: Serialize,
    I: IntoIterator<Item = S>,
    W: Write,
{
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a run log; estimator columns are included when every tick has them
pub fn write_run<W: Write>(log: &RunLog, writer: W) -> RoboticsResult<()> {
    if log.has_estimates() {
        write_rows(log.records.iter().filter_map(EstimatorRow::from_record), writer)
    } else {
        write_rows(log.records.iter().map(TruthRow::from), writer)
    }
}

/// Write a run log to `path`, creating parent directories
pub fn write_run_file<P: AsRef<Path>>(log: &RunLog, path: P) -> RoboticsResult<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            create_dir_all(dir)?;
        }
    }
    write_run(log, File::create(path)?)
}
