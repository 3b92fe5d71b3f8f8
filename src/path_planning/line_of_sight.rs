//! Grid line-of-sight checks and path simplification
//!
//! Bresenham rasterisation between two cells. A segment is clear when its
//! first cell is free and every raster step is a legal grid move, so a
//! diagonal step between two blocked corner cells counts as blocked, the
//! same rule the planners search with. Both simplifiers only ever drop
//! intermediate cells, so the first and last cells are preserved.

use crate::common::GridCell;
use crate::utils::OccupancyGrid;

/// Cells crossed by the Bresenham line from `a` to `b`, endpoints included
pub fn bresenham(a: GridCell, b: GridCell) -> Vec<GridCell> {
    let dx = (b.x - a.x).abs();
    let dy = -(b.y - a.y).abs();
    let sx = if a.x < b.x { 1 } else { -1 };
    let sy = if a.y < b.y { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (a.x, a.y);

    let mut cells = Vec::with_capacity((dx - dy) as usize + 1);
    loop {
        cells.push(GridCell::new(x, y));
        if x == b.x && y == b.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
    cells
}

/// True if the segment stays on free cells without cutting a corner
pub fn line_of_sight(grid: &OccupancyGrid, a: GridCell, b: GridCell) -> bool {
    let cells = bresenham(a, b);
    grid.is_free(cells[0])
        && cells
            .windows(2)
            .all(|w| grid.can_step(w[0], w[1].x - w[0].x, w[1].y - w[0].y))
}

/// Greedy forward pruning: from each anchor extend the segment while the
/// next cell is still visible, then jump to the last visible one.
pub fn simplify_forward(grid: &OccupancyGrid, path: &[GridCell]) -> Vec<GridCell> {
    if path.len() < 3 {
        return path.to_vec();
    }
    let mut out = vec![path[0]];
    let mut i = 0;
    while i < path.len() - 1 {
        let mut j = i + 1;
        while j + 1 < path.len() && line_of_sight(grid, path[i], path[j + 1]) {
            j += 1;
        }
        out.push(path[j]);
        i = j;
    }
    out
}

/// Backward pruning: from each anchor search from the end of the path for
/// the farthest visible cell.
pub fn simplify_backward(grid: &OccupancyGrid, path: &[GridCell]) -> Vec<GridCell> {
    if path.len() < 3 {
        return path.to_vec();
    }
    let mut out = vec![path[0]];
    let mut i = 0;
    while i < path.len() - 1 {
        let mut j = path.len() - 1;
        while j > i + 1 && !line_of_sight(grid, path[i], path[j]) {
            j -= 1;
        }
        out.push(path[j]);
        i = j;
    }
    out
}
