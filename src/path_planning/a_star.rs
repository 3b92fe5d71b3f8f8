//! A* path planning on an occupancy grid
//!
//! Classic best-first search ordered by `f = g + h` with an admissible,
//! consistent heuristic, so returned paths have optimal cost:
//! - 4-connected: unit steps, Manhattan heuristic
//! - 8-connected: diagonal steps cost sqrt(2), octile heuristic
//!
//! Equal priorities are popped in insertion order, which makes the result
//! deterministic for a given grid and endpoints.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use itertools::iproduct;
use log::debug;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::common::{GridCell, GridPathPlanner, RoboticsError, RoboticsResult};
use crate::path_planning::line_of_sight::simplify_forward;
use crate::utils::OccupancyGrid;

/// Relaxation only happens when the cost improves by more than this
const RELAX_EPS: f64 = 1e-12;

/// Configuration for A* planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AStarConfig {
    /// Allow 8-connected moves
    pub allow_diagonal: bool,
    /// Line-of-sight prune the result
    pub simplify: bool,
}

impl Default for AStarConfig {
    fn default() -> Self {
        Self {
            allow_diagonal: false,
            simplify: false,
        }
    }
}

/// Open-set entry (min-heap on priority, then insertion order)
#[derive(Debug)]
struct PriorityNode {
    cell: GridCell,
    cost: f64,
    priority: f64,
    sequence: u64,
}

impl Eq for PriorityNode {}

impl PartialEq for PriorityNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Ord for PriorityNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior
        OrderedFloat(other.priority)
            .cmp(&OrderedFloat(self.priority))
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for PriorityNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* grid planner
#[derive(Debug, Clone)]
pub struct AStarPlanner {
    config: AStarConfig,
    motion: Vec<(i32, i32, f64)>,
}

impl AStarPlanner {
    /// Create a new A* planner
    pub fn new(config: AStarConfig) -> Self {
        let motion = Self::get_motion_model(config.allow_diagonal);
        AStarPlanner { config, motion }
    }

    pub fn config(&self) -> &AStarConfig {
        &self.config
    }

    fn get_motion_model(allow_diagonal: bool) -> Vec<(i32, i32, f64)> {
        // dx, dy, cost; axis-aligned moves first so they win cost ties
        let mut motion: Vec<(i32, i32, f64)> = vec![
            (1, 0, 1.0),
            (0, 1, 1.0),
            (-1, 0, 1.0),
            (0, -1, 1.0),
        ];
        if allow_diagonal {
            motion.extend(
                iproduct!([-1, 1].iter(), [-1, 1].iter())
                    .map(|(&dx, &dy)| (dx, dy, std::f64::consts::SQRT_2)),
            );
        }
        motion
    }

    fn calc_heuristic(&self, a: GridCell, b: GridCell) -> f64 {
        let dx = (a.x - b.x).abs() as f64;
        let dy = (a.y - b.y).abs() as f64;
        if self.config.allow_diagonal {
            dx + dy + (std::f64::consts::SQRT_2 - 2.0) * dx.min(dy)
        } else {
            dx + dy
        }
    }

    fn build_path(came_from: &HashMap<GridCell, GridCell>, goal: GridCell) -> Vec<GridCell> {
        let mut path = vec![goal];
        let mut current = goal;
        while let Some(&parent) = came_from.get(&current) {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }
}

/// Reject endpoints that are out of bounds or blocked
pub(crate) fn validate_endpoints(
    grid: &OccupancyGrid,
    start: GridCell,
    goal: GridCell,
) -> RoboticsResult<()> {
    for (name, cell) in [("start", start), ("goal", goal)].iter() {
        if !grid.in_bounds(*cell) {
            return Err(RoboticsError::InvalidEndpoint(format!(
                "{} ({}, {}) is outside the {}x{} grid",
                name,
                cell.x,
                cell.y,
                grid.width(),
                grid.height()
            )));
        }
        if !grid.is_free(*cell) {
            return Err(RoboticsError::InvalidEndpoint(format!(
                "{} ({}, {}) is on an obstacle",
                name, cell.x, cell.y
            )));
        }
    }
    Ok(())
}

impl Default for AStarPlanner {
    fn default() -> Self {
        Self::new(AStarConfig::default())
    }
}

impl GridPathPlanner for AStarPlanner {
    fn plan(
        &self,
        grid: &OccupancyGrid,
        start: GridCell,
        goal: GridCell,
    ) -> RoboticsResult<Vec<GridCell>> {
        validate_endpoints(grid, start, goal)?;

        let mut open_set = BinaryHeap::new();
        let mut g_values: HashMap<GridCell, f64> = HashMap::new();
        let mut came_from: HashMap<GridCell, GridCell> = HashMap::new();
        let mut sequence = 0u64;

        g_values.insert(start, 0.0);
        open_set.push(PriorityNode {
            cell: start,
            cost: 0.0,
            priority: self.calc_heuristic(start, goal),
            sequence,
        });

        let mut expanded = 0usize;
        while let Some(current) = open_set.pop() {
            // Skip stale entries superseded by a cheaper push
            let best = g_values.get(&current.cell).copied().unwrap_or(f64::INFINITY);
            if current.cost > best + RELAX_EPS {
                continue;
            }

            if current.cell == goal {
                debug!("A*: goal reached after {} expansions", expanded);
                let path = Self::build_path(&came_from, goal);
                return Ok(if self.config.simplify {
                    simplify_forward(grid, &path)
                } else {
                    path
                });
            }
            expanded += 1;

            for &(dx, dy, step_cost) in &self.motion {
                if !grid.can_step(current.cell, dx, dy) {
                    continue;
                }
                let next = current.cell.offset(dx, dy);
                let tentative = current.cost + step_cost;
                let existing_g = g_values.get(&next).copied().unwrap_or(f64::INFINITY);
                if tentative + RELAX_EPS < existing_g {
                    g_values.insert(next, tentative);
                    came_from.insert(next, current.cell);
                    sequence += 1;
                    open_set.push(PriorityNode {
                        cell: next,
                        cost: tentative,
                        priority: tentative + self.calc_heuristic(next, goal),
                        sequence,
                    });
                }
            }
        }

        debug!("A*: open set exhausted after {} expansions", expanded);
        Err(RoboticsError::NoPathFound(format!(
            "A* open set exhausted between ({}, {}) and ({}, {})",
            start.x, start.y, goal.x, goal.y
        )))
    }

    fn name(&self) -> &'static str {
        "A*"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_planning::line_of_sight::line_of_sight;
    use itertools::Itertools;

    fn wall_with_gap() -> OccupancyGrid {
        // 6x6 grid with a wall across row 3 except a gap at column 3
        let mut grid = OccupancyGrid::free(6, 6).unwrap();
        for x in 0..6 {
            if x != 3 {
                grid.set_obstacle(GridCell::new(x, 3), true);
            }
        }
        grid
    }

    fn path_cost(path: &[GridCell]) -> f64 {
        path.iter()
            .tuple_windows()
            .map(|(a, b)| (a.distance_sq(b) as f64).sqrt())
            .sum()
    }

    #[test]
    fn test_optimal_length_on_free_grid() {
        let grid = OccupancyGrid::free(10, 10).unwrap();
        let planner = AStarPlanner::new(AStarConfig::default());
        let path = planner.plan(&grid, GridCell::new(0, 0), GridCell::new(9, 9)).unwrap();
        assert_eq!(path.len(), 19);
        assert_eq!(path[0], GridCell::new(0, 0));
        assert_eq!(path[18], GridCell::new(9, 9));
    }

    #[test]
    fn test_avoids_wall_through_gap() {
        let grid = wall_with_gap();
        let planner = AStarPlanner::new(AStarConfig::default());
        let path = planner.plan(&grid, GridCell::new(0, 0), GridCell::new(5, 5)).unwrap();
        assert_eq!(path.first(), Some(&GridCell::new(0, 0)));
        assert_eq!(path.last(), Some(&GridCell::new(5, 5)));
        assert!(path.contains(&GridCell::new(3, 3)));
        for (a, b) in path.iter().tuple_windows() {
            assert_eq!(a.manhattan(b), 1);
            assert!(grid.is_free(*b));
        }
        // detour through the gap costs nothing extra here
        assert_eq!(path.len(), 11);
    }

    #[test]
    fn test_diagonal_uses_octile_cost() {
        let grid = OccupancyGrid::free(10, 10).unwrap();
        let planner = AStarPlanner::new(AStarConfig {
            allow_diagonal: true,
            simplify: false,
        });
        let path = planner.plan(&grid, GridCell::new(0, 0), GridCell::new(9, 4)).unwrap();
        let expected = 5.0 + 4.0 * std::f64::consts::SQRT_2;
        assert!((path_cost(&path) - expected).abs() < 1e-9);
        for (a, b) in path.iter().tuple_windows() {
            assert!((a.x - b.x).abs() <= 1 && (a.y - b.y).abs() <= 1);
        }
    }

    #[test]
    fn test_simplified_path_is_clear() {
        let grid = wall_with_gap();
        let planner = AStarPlanner::new(AStarConfig {
            allow_diagonal: true,
            simplify: true,
        });
        let path = planner.plan(&grid, GridCell::new(0, 0), GridCell::new(5, 5)).unwrap();
        assert_eq!(path.first(), Some(&GridCell::new(0, 0)));
        assert_eq!(path.last(), Some(&GridCell::new(5, 5)));
        assert!(path.len() < 8);
        for (a, b) in path.iter().tuple_windows() {
            assert!(line_of_sight(&grid, *a, *b));
        }
    }

    #[test]
    fn test_deterministic() {
        let grid = wall_with_gap();
        let planner = AStarPlanner::new(AStarConfig {
            allow_diagonal: true,
            simplify: false,
        });
        let a = planner.plan(&grid, GridCell::new(0, 5), GridCell::new(5, 0)).unwrap();
        let b = planner.plan(&grid, GridCell::new(0, 5), GridCell::new(5, 0)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_endpoints() {
        let grid = wall_with_gap();
        let planner = AStarPlanner::new(AStarConfig::default());
        let err = planner.plan(&grid, GridCell::new(-1, 0), GridCell::new(1, 1)).unwrap_err();
        assert!(matches!(err, RoboticsError::InvalidEndpoint(_)));
        let err = planner.plan(&grid, GridCell::new(0, 0), GridCell::new(6, 1)).unwrap_err();
        assert!(matches!(err, RoboticsError::InvalidEndpoint(_)));
        let err = planner.plan(&grid, GridCell::new(0, 3), GridCell::new(1, 1)).unwrap_err();
        assert!(matches!(err, RoboticsError::InvalidEndpoint(_)));
    }

    #[test]
    fn test_unreachable_goal() {
        let mut grid = wall_with_gap();
        grid.set_obstacle(GridCell::new(3, 3), true);
        let planner = AStarPlanner::new(AStarConfig::default());
        let err = planner.plan(&grid, GridCell::new(0, 0), GridCell::new(5, 5)).unwrap_err();
        assert!(matches!(err, RoboticsError::NoPathFound(_)));
    }

    #[test]
    fn test_start_equals_goal() {
        let grid = OccupancyGrid::free(3, 3).unwrap();
        let planner = AStarPlanner::new(AStarConfig::default());
        let path = planner.plan(&grid, GridCell::new(1, 1), GridCell::new(1, 1)).unwrap();
        assert_eq!(path, vec![GridCell::new(1, 1)]);
    }
}
