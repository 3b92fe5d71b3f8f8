//! Visualization utilities for drone_gnc
//!
//! Collects series (grid obstacles, planned waypoints, flown trajectories)
//! and renders them into a single gnuplot axes on save.

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PointSize, PointSymbol};

use crate::common::{Path2D, Point2D, RoboticsError, RoboticsResult};
use crate::simulation::RunLog;
use crate::utils::OccupancyGrid;

/// Color palette for consistent styling
pub mod colors {
    pub const BLACK: &str = "#000000";
    pub const RED: &str = "#FF0000";
    pub const GREEN: &str = "#00AA00";
    pub const BLUE: &str = "#0000FF";
    pub const GRAY: &str = "#808080";

    pub const OBSTACLE: &str = BLACK;
    pub const START: &str = GREEN;
    pub const GOAL: &str = BLUE;
    pub const PATH: &str = RED;
    pub const ESTIMATED: &str = "#35C788";
    pub const GROUND_TRUTH: &str = BLUE;
    pub const MEASUREMENT: &str = "#DD3355";
}

/// Style for path rendering
#[derive(Debug, Clone)]
pub struct PathStyle {
    pub color: String,
    pub line_width: f64,
    pub caption: String,
}

impl PathStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            line_width: 2.0,
            caption: caption.to_string(),
        }
    }

    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = width;
        self
    }
}

impl Default for PathStyle {
    fn default() -> Self {
        Self::new(colors::PATH, "Path")
    }
}

/// Style for point rendering
#[derive(Debug, Clone)]
pub struct PointStyle {
    pub color: String,
    pub size: f64,
    pub symbol: char,
    pub caption: String,
}

impl PointStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            size: 1.0,
            symbol: 'O',
            caption: caption.to_string(),
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_symbol(mut self, symbol: char) -> Self {
        self.symbol = symbol;
        self
    }
}

#[derive(Debug, Clone)]
enum Series {
    Lines { x: Vec<f64>, y: Vec<f64>, style: PathStyle },
    Points { x: Vec<f64>, y: Vec<f64>, style: PointStyle },
}

pub struct Visualizer {
    title: String,
    x_label: String,
    y_label: String,
    /// grid y runs downward, so draw the y axis top to bottom
    flip_y: bool,
    aspect_ratio: Option<f64>,
    series: Vec<Series>,
}

impl Visualizer {
    pub fn new() -> Self {
        Self {
            title: String::new(),
            x_label: "X [m]".to_string(),
            y_label: "Y [m]".to_string(),
            flip_y: true,
            aspect_ratio: Some(1.0),
            series: Vec::new(),
        }
    }

    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.title = title.to_string();
        self
    }

    pub fn set_flip_y(&mut self, flip: bool) -> &mut Self {
        self.flip_y = flip;
        self
    }

    pub fn set_aspect_ratio(&mut self, ratio: Option<f64>) -> &mut Self {
        self.aspect_ratio = ratio;
        self
    }

    /// Number of collected series
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn plot_path_xy(&mut self, x: &[f64], y: &[f64], style: &PathStyle) -> &mut Self {
        self.series.push(Series::Lines {
            x: x.to_vec(),
            y: y.to_vec(),
            style: style.clone(),
        });
        self
    }

    pub fn plot_points_xy(&mut self, x: &[f64], y: &[f64], style: &PointStyle) -> &mut Self {
        self.series.push(Series::Points {
            x: x.to_vec(),
            y: y.to_vec(),
            style: style.clone(),
        });
        self
    }

    pub fn plot_path(&mut self, path: &Path2D, style: &PathStyle) -> &mut Self {
        self.plot_path_xy(&path.x_coords(), &path.y_coords(), style)
    }

    /// Obstacle cells of `grid`, `scale` metres per cell
    pub fn plot_grid(&mut self, grid: &OccupancyGrid, scale: f64) -> &mut Self {
        let cells = grid.obstacle_cells();
        let x: Vec<f64> = cells.iter().map(|c| c.x as f64 * scale).collect();
        let y: Vec<f64> = cells.iter().map(|c| c.y as f64 * scale).collect();
        self.plot_points_xy(
            &x,
            &y,
            &PointStyle::new(colors::OBSTACLE, "Obstacles").with_symbol('S').with_size(1.5),
        )
    }

    /// Flown trajectory, plus estimate and measurements when present
    pub fn plot_run(&mut self, log: &RunLog, caption: &str) -> &mut Self {
        let x: Vec<f64> = log.records.iter().map(|r| r.truth.x).collect();
        let y: Vec<f64> = log.records.iter().map(|r| r.truth.y).collect();
        self.plot_path_xy(&x, &y, &PathStyle::new(colors::GROUND_TRUTH, caption));

        let measured: Vec<Point2D> = log.records.iter().filter_map(|r| r.measurement).collect();
        if !measured.is_empty() {
            let mx: Vec<f64> = measured.iter().map(|p| p.x).collect();
            let my: Vec<f64> = measured.iter().map(|p| p.y).collect();
            self.plot_points_xy(
                &mx,
                &my,
                &PointStyle::new(colors::MEASUREMENT, "Measurements").with_symbol('.').with_size(0.5),
            );
        }

        let estimated: Vec<(f64, f64)> = log
            .records
            .iter()
            .filter_map(|r| r.estimate.map(|e| (e.x, e.y)))
            .collect();
        if !estimated.is_empty() {
            let ex: Vec<f64> = estimated.iter().map(|p| p.0).collect();
            let ey: Vec<f64> = estimated.iter().map(|p| p.1).collect();
            self.plot_path_xy(
                &ex,
                &ey,
                &PathStyle::new(colors::ESTIMATED, "Estimate").with_line_width(1.0),
            );
        }
        self
    }

    pub fn plot_start(&mut self, point: Point2D) -> &mut Self {
        self.plot_points_xy(
            &[point.x],
            &[point.y],
            &PointStyle::new(colors::START, "Start").with_size(2.0),
        )
    }

    pub fn plot_goal(&mut self, point: Point2D) -> &mut Self {
        self.plot_points_xy(
            &[point.x],
            &[point.y],
            &PointStyle::new(colors::GOAL, "Goal").with_symbol('x').with_size(2.0),
        )
    }

    fn y_extent(&self) -> Option<(f64, f64)> {
        let ys = self.series.iter().flat_map(|s| match s {
            Series::Lines { y, .. } | Series::Points { y, .. } => y.iter().cloned(),
        });
        ys.fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    fn render(&self) -> Figure {
        let mut figure = Figure::new();
        {
            let axes = figure.axes2d();
            if !self.title.is_empty() {
                axes.set_title(&self.title, &[]);
            }
            axes.set_x_label(&self.x_label, &[]);
            axes.set_y_label(&self.y_label, &[]);
            if self.flip_y {
                if let Some((lo, hi)) = self.y_extent() {
                    axes.set_y_range(AutoOption::Fix(hi + 0.5), AutoOption::Fix(lo - 0.5));
                }
            }
            if let Some(ratio) = self.aspect_ratio {
                axes.set_aspect_ratio(AutoOption::Fix(ratio));
            }

            for s in &self.series {
                match s {
                    Series::Lines { x, y, style } => {
                        axes.lines(x, y, &[
                            Caption(style.caption.as_str()),
                            Color(style.color.as_str()),
                            LineWidth(style.line_width),
                        ]);
                    }
                    Series::Points { x, y, style } => {
                        axes.points(x, y, &[
                            Caption(style.caption.as_str()),
                            Color(style.color.as_str()),
                            PointSymbol(style.symbol),
                            PointSize(style.size),
                        ]);
                    }
                }
            }
        }
        figure
    }

    /// Save plot to PNG file
    pub fn save_png(&self, path: &str, width: u32, height: u32) -> RoboticsResult<()> {
        let mut figure = self.render();
        figure
            .save_to_png(path, width, height)
            .map_err(|e| RoboticsError::PlotError(e.to_string()))
    }

    /// Save plot to SVG file
    pub fn save_svg(&self, path: &str, width: u32, height: u32) -> RoboticsResult<()> {
        let mut figure = self.render();
        figure
            .save_to_svg(path, width, height)
            .map_err(|e| RoboticsError::PlotError(e.to_string()))
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{GridCell, State2D};
    use crate::simulation::TickRecord;
    use nalgebra::Vector2;

    #[test]
    fn test_path_style() {
        let style = PathStyle::new(colors::RED, "Test Path").with_line_width(3.0);
        assert_eq!(style.line_width, 3.0);
        assert_eq!(style.color, colors::RED);
    }

    #[test]
    fn test_collects_series() {
        let mut grid = OccupancyGrid::free(4, 4).unwrap();
        grid.set_obstacle(GridCell::new(1, 1), true);
        let path = Path2D::from_cells(&[GridCell::new(0, 0), GridCell::new(3, 3)], 1.0);

        let truth_only = RunLog {
            records: vec![TickRecord {
                t: 0.0,
                truth: State2D::origin(),
                command: Vector2::zeros(),
                target: Point2D::new(3.0, 3.0),
                waypoint_index: 1,
                measurement: None,
                estimate: None,
            }],
            waypoints_reached: 1,
            total_waypoints: 2,
        };

        let mut vis = Visualizer::new();
        vis.plot_grid(&grid, 1.0)
            .plot_path(&path, &PathStyle::default())
            .plot_run(&truth_only, "PID")
            .plot_start(Point2D::origin())
            .plot_goal(Point2D::new(3.0, 3.0));
        assert_eq!(vis.len(), 5);
    }
}
