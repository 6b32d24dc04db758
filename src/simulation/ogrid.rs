//! Occupancy grids
//!
//! [`OGrid`] is a centred grid addressed by signed `(row, col)` offsets from
//! its origin cell. [`compute_ogrid_from_poses`] builds a coverage mask for a
//! corner-anchored grid from a trail of visited points.

use super::types::{Point2, Pose};

/// Value of a cell nothing has been written to
pub const UNKNOWN: f64 = -1.0;

/// 4-connected neighbour offsets, in the order they are reported
const NEIGHBOURS: [(i64, i64); 4] = [(1, 0), (0, -1), (-1, 0), (0, 1)];

#[derive(Debug, Clone, PartialEq)]
pub struct OGrid {
    /// World position of the centre of cell (0, 0)
    pub origin: Point2,
    pub rows: usize,
    pub cols: usize,
    /// Cell edge length in metres
    pub resolution: f64,
    max_row: i64,
    max_col: i64,
    cells: Vec<f64>,
}

impl OGrid {
    /// A grid of `rows` x `cols` cells, all [`UNKNOWN`].
    ///
    /// Rows run from `-(rows - 1) / 2` to `(rows - 1) / 2`, likewise columns,
    /// so odd dimensions use every cell.
    pub fn new(origin: Point2, rows: usize, cols: usize, resolution: f64) -> Self {
        let rows_i = rows as i64;
        let cols_i = cols as i64;
        Self {
            origin,
            rows,
            cols,
            resolution,
            max_row: (rows_i - 1).max(0) / 2,
            max_col: (cols_i - 1).max(0) / 2,
            cells: vec![UNKNOWN; rows * cols],
        }
    }

    /// Set every cell back to [`UNKNOWN`]
    pub fn reset(&mut self) {
        self.cells.fill(UNKNOWN);
    }

    pub fn is_in_bounds(&self, row: i64, col: i64) -> bool {
        !self.cells.is_empty()
            && row.unsigned_abs() <= self.max_row as u64
            && col.unsigned_abs() <= self.max_col as u64
    }

    /// Storage index of a cell, `None` outside the grid
    pub fn cell_to_index(&self, row: i64, col: i64) -> Option<usize> {
        if !self.is_in_bounds(row, col) {
            return None;
        }
        let r = (row + self.max_row) as usize;
        let c = (col + self.max_col) as usize;
        Some(r * self.cols + c)
    }

    pub fn get_cell(&self, row: i64, col: i64) -> Option<f64> {
        self.cell_to_index(row, col).map(|i| self.cells[i])
    }

    /// Write a cell; returns false (and writes nothing) outside the grid
    pub fn set_cell(&mut self, row: i64, col: i64, value: f64) -> bool {
        match self.cell_to_index(row, col) {
            Some(i) => {
                self.cells[i] = value;
                true
            }
            None => false,
        }
    }

    /// Nearest cell to a pose's position
    pub fn row_col_for_pose(&self, pose: &Pose) -> (i64, i64) {
        let row = ((pose.position.y - self.origin.y) / self.resolution).round() as i64;
        let col = ((pose.position.x - self.origin.x) / self.resolution).round() as i64;
        (row, col)
    }

    pub fn center_of_cell(&self, row: i64, col: i64) -> Point2 {
        Point2::new(
            self.origin.x + col as f64 * self.resolution,
            self.origin.y + row as f64 * self.resolution,
        )
    }

    pub fn value_for_cell_at_pose(&self, pose: &Pose) -> Option<f64> {
        let (row, col) = self.row_col_for_pose(pose);
        self.get_cell(row, col)
    }

    pub fn set_value_for_cell_at_pose(&mut self, pose: &Pose, value: f64) -> bool {
        let (row, col) = self.row_col_for_pose(pose);
        self.set_cell(row, col, value)
    }

    /// In-bounds 4-connected neighbours of a cell
    pub fn neighbors_of(&self, row: i64, col: i64) -> Vec<(i64, i64)> {
        NEIGHBOURS
            .iter()
            .filter_map(|(dr, dc)| Some((row.checked_add(*dr)?, col.checked_add(*dc)?)))
            .filter(|&(r, c)| self.is_in_bounds(r, c))
            .collect()
    }
}

/// Coverage mask of a corner-anchored grid.
///
/// `origin` is the world position of the grid's lower-left corner. Returns
/// `rows * cols` cells in row-major order, 1 where any point fell inside the
/// cell and 0 elsewhere. Points outside the grid are ignored.
pub fn compute_ogrid_from_poses<'a>(
    points: impl IntoIterator<Item = &'a Point2>,
    rows: usize,
    cols: usize,
    resolution: f64,
    origin: Point2,
) -> Vec<u8> {
    let mut grid = vec![0u8; rows * cols];
    for point in points {
        let r = ((point.y - origin.y) / resolution).floor();
        let c = ((point.x - origin.x) / resolution).floor();
        if r >= 0.0 && c >= 0.0 && r < rows as f64 && c < cols as f64 {
            grid[r as usize * cols + c as usize] = 1;
        }
    }
    grid
}
