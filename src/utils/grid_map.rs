// occupancy grid definition
// rows are y (downward), columns are x (rightward); 0 = free, 1 = obstacle

use std::fs::read_to_string;
use std::ops::Deref;
use std::path::Path;
use std::str::FromStr;

extern crate nalgebra as na;

use crate::common::{GridCell, RoboticsError, RoboticsResult};

pub const FREE: u8 = 0;
pub const OBSTACLE: u8 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyGrid {
    grid: na::DMatrix<u8>,
}

impl OccupancyGrid {
    /// Wrap an existing matrix, validating it holds only 0/1 cells.
    pub fn new(matrix: na::DMatrix<u8>) -> RoboticsResult<Self> {
        if matrix.nrows() == 0 || matrix.ncols() == 0 {
            return Err(RoboticsError::InvalidParameter("grid must not be empty".to_string()));
        }
        if let Some(v) = matrix.iter().find(|&&v| v != FREE && v != OBSTACLE) {
            return Err(RoboticsError::InvalidParameter(format!(
                "grid cell value {} is neither 0 (free) nor 1 (obstacle)",
                v
            )));
        }
        Ok(Self { grid: matrix })
    }

    /// All-free grid of the given size
    pub fn free(width: usize, height: usize) -> RoboticsResult<Self> {
        Self::new(na::DMatrix::from_element(height, width, FREE))
    }

    /// Build from row-major rows, `rows[y][x]`
    pub fn from_rows(rows: &[Vec<u8>]) -> RoboticsResult<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.len());
        if let Some((y, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(RoboticsError::InvalidParameter(format!(
                "grid is not rectangular: row {} has {} cells, expected {}",
                y,
                row.len(),
                width
            )));
        }
        Self::new(na::DMatrix::from_fn(height, width, |r, c| rows[r][c]))
    }

    /// Each cell becomes a `scale` x `scale` block.
    pub fn upscale(&self, scale: usize) -> RoboticsResult<Self> {
        if scale < 1 {
            return Err(RoboticsError::InvalidParameter("scale must be >= 1".to_string()));
        }
        let grid = self.grid.kronecker(&na::DMatrix::<u8>::repeat(scale, scale, 1));
        Ok(Self { grid })
    }

    /// Read a grid text file, see the `FromStr` impl for the format
    pub fn load<P: AsRef<Path>>(path: P) -> RoboticsResult<Self> {
        read_to_string(path.as_ref())?.parse()
    }

    /// 20 x 10 field with a wall on row 5 spanning columns 5..15
    pub fn demo() -> Self {
        let mut matrix = na::DMatrix::from_element(10, 20, FREE);
        for x in 5..15 {
            matrix[(5, x)] = OBSTACLE;
        }
        Self { grid: matrix }
    }

    pub fn width(&self) -> usize {
        self.grid.ncols()
    }

    pub fn height(&self) -> usize {
        self.grid.nrows()
    }

    pub fn in_bounds(&self, cell: GridCell) -> bool {
        cell.x >= 0
            && cell.y >= 0
            && (cell.x as usize) < self.width()
            && (cell.y as usize) < self.height()
    }

    /// True when the cell is inside the grid and not an obstacle
    pub fn is_free(&self, cell: GridCell) -> bool {
        self.in_bounds(cell) && self.grid[(cell.y as usize, cell.x as usize)] == FREE
    }

    /// Mark a cell as obstacle or free. Out-of-bounds cells are ignored.
    pub fn set_obstacle(&mut self, cell: GridCell, blocked: bool) {
        if self.in_bounds(cell) {
            self.grid[(cell.y as usize, cell.x as usize)] = if blocked { OBSTACLE } else { FREE };
        }
    }

    /// A one-cell move is allowed when the destination is free and, for a
    /// diagonal move, neither orthogonal corner cell is blocked.
    pub fn can_step(&self, from: GridCell, dx: i32, dy: i32) -> bool {
        let to = from.offset(dx, dy);
        if !self.is_free(to) {
            return false;
        }
        if dx != 0 && dy != 0 {
            return self.is_free(from.offset(dx, 0)) && self.is_free(from.offset(0, dy));
        }
        true
    }

    /// Obstacle cells, for plotting
    pub fn obstacle_cells(&self) -> Vec<GridCell> {
        let mut cells = Vec::new();
        for y in 0..self.height() {
            for x in 0..self.width() {
                if self.grid[(y, x)] == OBSTACLE {
                    cells.push(GridCell::new(x as i32, y as i32));
                }
            }
        }
        cells
    }
}

impl Deref for OccupancyGrid {
    type Target = na::DMatrix<u8>;

    fn deref(&self) -> &Self::Target {
        &self.grid
    }
}

impl FromStr for OccupancyGrid {
    type Err = RoboticsError;

    /// One row per line; `0`/`1` cells optionally separated by spaces or
    /// commas; blank lines and lines starting with `#` are skipped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rows = Vec::new();
        for (line_no, line) in s.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut row = Vec::new();
            for ch in line.chars().filter(|c| !c.is_whitespace() && *c != ',') {
                match ch {
                    '0' => row.push(FREE),
                    '1' => row.push(OBSTACLE),
                    other => {
                        return Err(RoboticsError::InvalidParameter(format!(
                            "unexpected character {:?} on grid line {}",
                            other,
                            line_no + 1
                        )))
                    }
                }
            }
            rows.push(row);
        }
        Self::from_rows(&rows)
    }
}
